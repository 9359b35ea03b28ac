//! Prompt templates.

mod manager;

pub use manager::*;
