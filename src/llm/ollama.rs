//! Ollama HTTP client for local text generation
//!
//! Talks to the `/api/generate` endpoint in non-streaming mode. Both the
//! conversion step and the code-generation step go through this client; the
//! model and timeout can be overridden per request.
//!
//! # Example
//!
//! ```no_run
//! use paramforge::llm::{GenerationRequest, OllamaClient, TextGenerator};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::with_timeout(
//!     "http://localhost:11434".to_string(),
//!     "qwen2.5-coder:7b".to_string(),
//!     Duration::from_secs(60),
//! )?;
//!
//! if client.health_check().await? {
//!     let response = client
//!         .generate(GenerationRequest::new("Make a 50mm cube"))
//!         .await?;
//!     println!("{}", response.content);
//! }
//! # Ok(())
//! # }
//! ```

use crate::llm::client::TextGenerator;
use crate::llm::error::BackendError;
use crate::llm::types::{GenerationRequest, GenerationResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default request timeout for Ollama API calls
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ollama client for local LLM inference
///
/// # Thread Safety
///
/// This client is thread-safe and can be shared across tasks using `Arc`.
pub struct OllamaClient {
    /// Ollama API endpoint URL
    endpoint: String,

    /// Default model name for requests that do not override it
    model: String,

    /// Shared HTTP client with connection pooling
    http_client: Client,

    /// Default request timeout
    timeout: Duration,
}

impl OllamaClient {
    /// Creates a new Ollama client with default timeout
    pub fn new(endpoint: String, model: String) -> Result<Self, BackendError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new Ollama client with custom timeout
    pub fn with_timeout(
        endpoint: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            http_client,
            timeout,
        })
    }

    /// Checks if the Ollama server is available and healthy
    ///
    /// Makes a lightweight request to the `/api/tags` endpoint. Returns
    /// `Ok(false)` when the server is unreachable or times out, and `Err`
    /// only for unexpected transport failures.
    pub async fn health_check(&self) -> Result<bool, BackendError> {
        let url = format!("{}/api/tags", self.endpoint);

        debug!("Checking Ollama health at {}", url);

        match self.http_client.get(&url).send().await {
            Ok(response) => {
                let is_healthy = response.status().is_success();
                if is_healthy {
                    info!("Ollama health check successful");
                } else {
                    warn!(
                        "Ollama health check failed with status: {}",
                        response.status()
                    );
                }
                Ok(is_healthy)
            }
            Err(e) => {
                if e.is_timeout() {
                    warn!("Ollama health check timed out");
                    Ok(false)
                } else if e.is_connect() {
                    warn!("Cannot connect to Ollama at {}", self.endpoint);
                    Ok(false)
                } else {
                    error!("Ollama health check error: {}", e);
                    Err(BackendError::NetworkError {
                        message: format!("Health check failed: {}", e),
                    })
                }
            }
        }
    }

    fn build_request(&self, request: GenerationRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            prompt: request.prompt,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let url = format!("{}/api/generate", self.endpoint);
        let timeout = request.timeout.unwrap_or(self.timeout);
        let body = self.build_request(request);

        debug!(
            "Sending request to Ollama: model={}, prompt_length={}",
            body.model,
            body.prompt.len()
        );

        let start = Instant::now();

        let response = self
            .http_client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Ollama request timed out after {:?}", timeout);
                    BackendError::TimeoutError {
                        seconds: timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    error!("Cannot connect to Ollama at {}", self.endpoint);
                    BackendError::NetworkError {
                        message: format!("Connection failed: {}", e),
                    }
                } else {
                    error!("Ollama request error: {}", e);
                    BackendError::NetworkError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            error!("Ollama API returned error status {}: {}", status, text);

            if status.as_u16() == 404 && text.contains("model") {
                return Err(BackendError::ModelNotFound { model: body.model });
            }

            return Err(BackendError::ApiError {
                message: format!("HTTP {}: {}", status, text),
                status_code: Some(status.as_u16()),
            });
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Ollama response: {}", e);
            BackendError::InvalidResponse {
                message: format!("JSON parse error: {}", e),
                raw_response: None,
            }
        })?;

        let elapsed = start.elapsed();

        if !ollama_response.done {
            warn!("Ollama response indicates incomplete generation");
        }

        info!(
            "Ollama generation completed in {:.2}s (model={})",
            elapsed.as_secs_f64(),
            ollama_response.model
        );

        debug!(
            "Ollama stats: prompt_tokens={}, eval_tokens={}, total_duration={:?}",
            ollama_response.prompt_eval_count.unwrap_or(0),
            ollama_response.eval_count.unwrap_or(0),
            ollama_response.total_duration
        );

        Ok(GenerationResponse::new(ollama_response.response, elapsed))
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model_info(&self) -> Option<String> {
        Some(format!("{} @ {}", self.model, self.endpoint))
    }
}

impl fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Request structure for Ollama generate API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    /// Always false; the client reads one complete response
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response structure from Ollama generate API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaResponse {
    model: String,

    #[serde(default)]
    created_at: String,

    /// Generated response text
    response: String,

    done: bool,

    /// Durations are in nanoseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    total_duration: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_eval_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    eval_count: Option<u32>,
}
