//! cogsynth - chain-of-thought dataset synthesis with ground-truth filtering.
//!
//! ## Architecture
//!
//! - **AnswerExtractor**: ordered rules that pull a final answer out of free text
//! - **Verifier**: numeric-or-text comparison against a known answer
//! - **ConsistencyVoter**: samples N reasoning traces and takes the plurality answer
//! - **DatasetFilterPipeline**: keeps every trace whose own answer verifies
//!
//! The completion source is a trait so the pipeline runs the same against an
//! OpenAI-compatible endpoint or a scripted batch.

pub mod client;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod prompts;
pub mod reasoning;
pub mod verification;

// Re-exports for convenience
pub use client::{CompletionSource, LLMClient};
pub use models::{CogsynthError, Config, DatasetRecord, Problem, Result, RunOutcome, RunStats};
pub use parsing::{AnswerExtractor, AnswerRule};
pub use pipeline::{DatasetFilterPipeline, DatasetSink, JsonlSink, MemorySink};
pub use prompts::PromptManager;
pub use reasoning::{ConsistencyResult, ConsistencyVoter, VoteTally};
pub use verification::{ProblemBank, ProblemStore, Verifier};
