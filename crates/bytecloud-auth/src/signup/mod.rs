//! Account creation and email verification.

pub mod flow;
pub mod form;
pub mod registry;

pub use flow::{
    INCOMPLETE_VERIFICATION, SIGN_UP_FALLBACK, SignUpCompletion, SignUpFlow, SignUpSettings,
    SignUpSnapshot, SignUpStep, VERIFICATION_FALLBACK,
};
pub use form::{FieldErrors, SignUpForm};
pub use registry::SignUpRegistry;
