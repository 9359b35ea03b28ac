//! Ground-truth verification and the reference problem bank.

mod bank;
mod verifier;

pub use bank::*;
pub use verifier::*;
