//! # bytecloud-auth
//!
//! Everything ByteCloud consumes from the external identity provider.
//!
//! ## Modules
//!
//! - `provider`: the `IdentityProvider` contract, typed provider errors, HTTP client
//! - `password`: local password policy
//! - `signup`: credential form, sign-up/verification state machine, pending flow registry
//! - `session`: the session gate that holds requests until provider state is loaded

pub mod password;
pub mod provider;
pub mod session;
pub mod signup;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use password::PasswordValidator;
pub use provider::{
    ActiveSession, HttpIdentityProvider, IdentityProvider, ProviderError, ProviderErrorKind,
};
pub use session::{GateState, SessionGate};
pub use signup::{SignUpFlow, SignUpForm, SignUpRegistry, SignUpSettings};
