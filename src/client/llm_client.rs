//! LLM client for OpenAI-compatible chat completion endpoints.
//!
//! One request asks for `n` choices, so a single round trip yields a whole
//! batch of sampled reasoning traces. Failures are reported once; there is no
//! retry loop.

use crate::client::CompletionSource;
use crate::models::{ApiError, CogsynthError, Config, ModelSpec, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request payload.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
    n: usize,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// API error response (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response from a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// One trimmed text per returned choice
    pub contents: Vec<String>,
    /// Model used (may differ from requested)
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub duration: Duration,
}

/// Client for one OpenAI-compatible endpoint and one model.
pub struct LLMClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    model: ModelSpec,
    total_input_tokens: AtomicU64,
    total_output_tokens: AtomicU64,
}

impl LLMClient {
    pub fn new(
        api_key: Option<String>,
        base_url: String,
        timeout_secs: u64,
        model: ModelSpec,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CogsynthError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            model,
            total_input_tokens: AtomicU64::new(0),
            total_output_tokens: AtomicU64::new(0),
        })
    }

    /// Build a client from configuration, resolving the API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::new(
            Some(api_key),
            config.endpoint.base_url.clone(),
            config.endpoint.timeout_secs,
            config.model.clone(),
        )
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(ref api_key) = self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                CogsynthError::InvalidInput("API key contains invalid header characters".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    fn build_request(&self, prompt: &str, n: usize, temperature: f64) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.id.clone(),
            messages: vec![
                Message::system(self.model.system_prompt.as_str()),
                Message::user(prompt),
            ],
            max_tokens: self.model.max_tokens,
            temperature,
            n,
        }
    }

    /// Request `n` completions of `prompt` at the given temperature.
    pub async fn complete(
        &self,
        prompt: &str,
        n: usize,
        temperature: f64,
    ) -> Result<CompletionResponse> {
        let start = Instant::now();
        let request = self.build_request(prompt, n, temperature);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CogsynthError::Timeout(self.timeout)
                } else {
                    CogsynthError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body).into());
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CogsynthError::ParseError(format!("Failed to parse response: {e}")))?;

        let parsed = self.parse_completion(body, start.elapsed())?;
        debug!(
            model = %parsed.model,
            requested = n,
            received = parsed.contents.len(),
            elapsed_ms = parsed.duration.as_millis() as u64,
            "Completion batch received"
        );
        Ok(parsed)
    }

    fn parse_completion(
        &self,
        body: ChatCompletionResponse,
        duration: Duration,
    ) -> Result<CompletionResponse> {
        if body.choices.is_empty() {
            return Err(ApiError::InvalidResponse("No choices in response".to_string()).into());
        }

        let contents = body
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .collect();

        let usage = body.usage.unwrap_or_default();
        self.total_input_tokens
            .fetch_add(usage.prompt_tokens as u64, Ordering::Relaxed);
        self.total_output_tokens
            .fetch_add(usage.completion_tokens as u64, Ordering::Relaxed);

        Ok(CompletionResponse {
            contents,
            model: body.model.unwrap_or_else(|| self.model.id.clone()),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            duration,
        })
    }

    /// Single deterministic completion (temperature 0).
    pub async fn query(&self, prompt: &str) -> Result<String> {
        let response = self.complete(prompt, 1, 0.0).await?;
        response
            .contents
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse("Empty completion".to_string()).into())
    }

    /// Get total tokens tracked as (input, output).
    pub fn total_tokens(&self) -> (u64, u64) {
        (
            self.total_input_tokens.load(Ordering::Relaxed),
            self.total_output_tokens.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl CompletionSource for LLMClient {
    async fn complete_n(&self, prompt: &str, n: usize) -> Result<Vec<String>> {
        let response = self.complete(prompt, n, self.model.temperature).await?;
        Ok(response.contents)
    }
}

fn api_error(status: u16, body: &str) -> ApiError {
    if status == 401 {
        return ApiError::AuthenticationFailed;
    }
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    ApiError::ApiError { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LLMClient {
        LLMClient::new(
            Some("sk-test".to_string()),
            "http://localhost:1/v1/".to_string(),
            5,
            ModelSpec::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_request_payload_shape() {
        let client = client();
        let request = client.build_request("What is 2+2?\n\nLet's think step by step.", 5, 0.7);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["n"], 5);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are a helpful assistant.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(client.base_url, "http://localhost:1/v1");
    }

    #[test]
    fn test_response_collects_every_choice() {
        let client = client();
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "model": "gpt-4o-mini-2024",
                "choices": [
                    {"message": {"role": "assistant", "content": "  The answer is 70. "}},
                    {"message": {"role": "assistant", "content": null}},
                    {"message": {"role": "assistant", "content": "So 65"}}
                ],
                "usage": {"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}
            }"#,
        )
        .unwrap();

        let parsed = client
            .parse_completion(body, Duration::from_millis(1))
            .unwrap();
        assert_eq!(parsed.contents, vec!["The answer is 70.", "So 65"]);
        assert_eq!(parsed.model, "gpt-4o-mini-2024");
        assert_eq!(client.total_tokens(), (12, 30));
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let client = client();
        let body: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            client.parse_completion(body, Duration::ZERO),
            Err(CogsynthError::Api(ApiError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn test_api_error_mapping() {
        assert!(matches!(api_error(401, ""), ApiError::AuthenticationFailed));
        match api_error(429, r#"{"error": {"message": "slow down"}}"#) {
            ApiError::ApiError { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected {other:?}"),
        }
        match api_error(502, "bad gateway") {
            ApiError::ApiError { message, .. } => assert_eq!(message, "bad gateway"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
