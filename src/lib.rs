//! paramforge - natural-language parametric edits for Fusion 360 scripts
//!
//! An instruction such as "make a 50x30x20mm block" is converted by a local
//! LLM into structured edit records, checked field by field, and used to
//! retrieve similar example scripts from a vector store. A second LLM call
//! writes a Fusion 360 Python add-in from the records and examples.
//!
//! # Core Concepts
//!
//! - **Edit Record**: one validated parametric change (part, feature,
//!   parameter, absolute value or delta, unit, confidence)
//! - **Edit Batch**: the ordered, bounded records from one instruction
//! - **Exemplar**: a retrieved example script with metadata and a distance
//! - **Pipeline Run**: the state-machine trace of one instruction, ending in
//!   `DONE` with a generated script or `FAILED` with a diagnostic
//!
//! # Example Usage
//!
//! ```no_run
//! use paramforge::pipeline::{PipelineOrchestrator, PipelineSettings, ScriptedOperator};
//! use paramforge::ParamforgeConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ParamforgeConfig::default();
//! let orchestrator = PipelineOrchestrator::new(
//!     config.create_generator()?,
//!     config.create_store()?,
//!     Arc::new(ScriptedOperator::new(Vec::new())),
//! )
//! .with_settings(PipelineSettings::from(&config));
//!
//! let run = orchestrator.run("Make a rectangular block 50x30x20mm").await;
//! if let Some(artifact) = &run.artifact {
//!     println!("{}", artifact.code);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`extraction`]: pulling JSON candidates out of free-form model output
//! - [`validation`]: per-field rules and the batch size guard
//! - [`retrieval`]: query synthesis, store clients and context rendering
//! - [`generation`]: prompt building and code refinement
//! - [`pipeline`]: the run state machine and operator fallback
//! - [`llm`]: text-generation service clients

pub mod cli;
pub mod config;
pub mod edit;
pub mod extraction;
pub mod generation;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod retrieval;
pub mod util;
pub mod validation;

pub use config::{ConfigError, ParamforgeConfig};
pub use edit::{EditBatch, EditRecord, EditValue, FeatureKind};
pub use llm::{BackendError, TextGenerator};
pub use pipeline::{PipelineError, PipelineOrchestrator, PipelineRun, PipelineState};
pub use retrieval::{ExemplarStore, StoreError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
