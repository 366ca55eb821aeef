//! Text-generation service abstraction
//!
//! The pipeline talks to the model only through [`TextGenerator`]. The Ollama
//! client is the production implementation; [`MockTextGenerator`] replays
//! scripted completions for tests and offline runs.

pub mod client;
pub mod error;
pub mod mock;
pub mod ollama;
pub mod types;

pub use client::TextGenerator;
pub use error::BackendError;
pub use mock::{MockResponse, MockTextGenerator};
pub use ollama::OllamaClient;
pub use types::{GenerationRequest, GenerationResponse};
