//! Completion sources.

mod llm_client;
mod source;

pub use llm_client::*;
pub use source::*;

#[cfg(test)]
pub(crate) use source::mock;
