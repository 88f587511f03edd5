//! Password policy enforced before credentials leave the process.

pub mod validator;

pub use validator::PasswordValidator;
