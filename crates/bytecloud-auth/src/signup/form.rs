//! Credential form and its local validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use bytecloud_core::error::AppError;

use crate::password::PasswordValidator;

/// Validation messages keyed by the form's JSON field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Credentials collected in the first step of sign-up.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    /// Account email.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Must equal `password`.
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub confirm_password: String,
}

impl fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignUpForm {
    /// Build a form from its three fields.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Validate the form and the password policy, collecting every field error.
    pub fn check(&self, policy: &PasswordValidator) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Err(report) = self.validate() {
            for (field, list) in report.field_errors() {
                errors.entry(json_field(&field)).or_default().extend(
                    list.iter().map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    }),
                );
            }
        }

        let weak = policy.violations(&self.password);
        if !weak.is_empty() {
            errors.entry("password".to_string()).or_default().extend(weak);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Turn field errors into a validation error with per-field details.
pub fn invalid_form(errors: FieldErrors) -> AppError {
    let details = serde_json::to_value(&errors).unwrap_or_default();
    AppError::validation("Invalid sign-up details").with_details(details)
}

fn json_field(field: &str) -> String {
    match field {
        "confirm_password" => "confirmPassword".to_string(),
        other => other.to_string(),
    }
}
