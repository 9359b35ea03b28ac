//! Configuration models for cogsynth.
//!
//! Every field has a default so an empty (or missing) config file yields a
//! working setup against the OpenAI API.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

/// Marker phrases tried by the answer extractor, most specific first.
pub const DEFAULT_MARKERS: [&str; 3] = ["the final answer is", "the answer is", "the output is"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion endpoint
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Model used for sampling
    #[serde(default)]
    pub model: ModelSpec,

    /// Sampling settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Answer extraction rules
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Dataset output
    #[serde(default)]
    pub output: OutputConfig,
}

/// OpenAI-compatible endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key; `${VAR}` placeholders are expanded
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable read when `api_key` is absent
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    180
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Specification for the sampled model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model ID as understood by the endpoint
    #[serde(default = "default_model_id")]
    pub id: String,

    /// Sampling temperature; must be > 0 for diverse traces
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System message sent ahead of every prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_model_id() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            id: default_model_id(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of reasoning traces sampled per problem
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Problems JSONL file; the built-in bank is used when absent
    #[serde(default)]
    pub problems: Option<PathBuf>,
}

fn default_samples() -> usize {
    8
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            problems: None,
        }
    }
}

/// Answer extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Case-insensitive marker phrases, tried in order
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,

    /// How many plain words may follow a trailing number ("6 apples left.")
    #[serde(default = "default_max_trailing_words")]
    pub max_trailing_words: usize,
}

fn default_markers() -> Vec<String> {
    DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_max_trailing_words() -> usize {
    2
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            max_trailing_words: default_max_trailing_words(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Dataset JSONL file (appended to)
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output/dataset.jsonl")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load configuration, falling back to defaults when the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.endpoint.api_key {
            return Ok(expand_env_vars(key));
        }

        std::env::var(&self.endpoint.api_key_env).map_err(|_| ConfigError::MissingApiKey {
            env_var: self.endpoint.api_key_env.clone(),
        })
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.samples == 0 {
            return Err(ConfigError::Invalid(
                "generation.samples must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid(format!(
                "model.temperature must be within [0, 2], got {}",
                self.model.temperature
            )));
        }
        if self
            .extraction
            .markers
            .iter()
            .all(|m| m.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "extraction.markers must contain at least one phrase".to_string(),
            ));
        }
        Ok(())
    }
}

static ENV_VAR_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    for cap in ENV_VAR_RE.captures_iter(s) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing API key: set {env_var} env var or endpoint.api_key in config")]
    MissingApiKey { env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
