//! Error types for cogsynth.
//!
//! Only infrastructure failures are errors here. A missed extraction or a
//! wrong answer is represented as data (`None`, a rejected sample) and never
//! reaches this enum.

use thiserror::Error;

/// Top-level error type for cogsynth.
#[derive(Debug, Error)]
pub enum CogsynthError {
    // ═══════════════════════════════════════════════════════════════════
    // Expected failures (bad input, malformed data)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // Completion endpoint and filesystem failures
    // ═══════════════════════════════════════════════════════════════════

    #[error("Completion API error: {0}")]
    Api(#[from] ApiError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Invariant violations (bugs)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors reported by an OpenAI-compatible completion endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CogsynthError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for cogsynth.
pub type Result<T> = std::result::Result<T, CogsynthError>;
