//! Password policy enforcement for new accounts.

use bytecloud_core::config::AuthConfig;

/// Validates password strength against the configured policy.
///
/// The provider applies its own policy as well; this only rejects
/// passwords that would certainly fail there.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length in characters.
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a validator with an explicit minimum length.
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Creates a validator from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.password_min_length)
    }

    /// Returns every policy violation, in a stable order.
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut out = Vec::new();

        if password.chars().count() < self.min_length {
            out.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }

        if !password.chars().any(char::is_alphabetic) {
            out.push("Password must contain at least one letter".to_string());
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            out.push("Password must contain at least one digit".to_string());
        }

        out
    }
}

impl Default for PasswordValidator {
    fn default() -> Self {
        Self::new(8)
    }
}
