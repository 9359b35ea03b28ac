//! Self-consistency voting over sampled reasoning traces.

mod self_consistency;

pub use self_consistency::*;
