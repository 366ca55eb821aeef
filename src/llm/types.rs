//! Text-generation request/response types
//!
//! Independent of any specific provider implementation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single-prompt completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Full prompt text
    pub prompt: String,
    /// Model override; the client's default model is used when unset
    pub model: Option<String>,
    /// Temperature for sampling (0.0 - 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Upper bound on the whole call
    pub timeout: Option<Duration>,
}

impl GenerationRequest {
    /// Creates a new request with a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }

    /// Sets the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Completion returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub content: String,
    /// Time taken for the request
    #[serde(with = "duration_millis")]
    pub response_time: Duration,
}

impl GenerationResponse {
    pub fn new(content: impl Into<String>, response_time: Duration) -> Self {
        Self {
            content: content.into(),
            response_time,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("Convert this")
            .with_model("qwen2.5-coder:7b")
            .with_temperature(0.1)
            .with_max_tokens(2048)
            .with_timeout(Duration::from_secs(30));

        assert_eq!(request.prompt, "Convert this");
        assert_eq!(request.model.as_deref(), Some("qwen2.5-coder:7b"));
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(2048));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_response_blank() {
        assert!(GenerationResponse::new("  \n", Duration::ZERO).is_blank());
        assert!(!GenerationResponse::new("code", Duration::ZERO).is_blank());
    }

    #[test]
    fn test_response_serializes_millis() {
        let response = GenerationResponse::new("x", Duration::from_millis(1500));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["response_time"], 1500);
    }
}
