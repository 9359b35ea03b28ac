//! Answer extraction from model completions.

mod extractor;
mod rules;

pub use extractor::*;
pub use rules::*;
