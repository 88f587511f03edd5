//! Session readiness.

pub mod gate;

pub use gate::{GateState, SessionGate};
