//! The completion source boundary.
//!
//! Anything that can turn a prompt into N sampled completions: the HTTP
//! client in production, a scripted list in tests.

use crate::models::Result;
use async_trait::async_trait;

/// Best-effort producer of sampled completions.
///
/// Implementations may return fewer than `n` completions. An `Err` means the
/// whole batch failed; callers treat that as an empty batch.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn complete_n(&self, prompt: &str, n: usize) -> Result<Vec<String>>;
}
