//! Instruction pipeline: the run state machine and its collaborators

pub mod error;
pub mod operator;
pub mod orchestrator;
pub mod state;

pub use error::PipelineError;
pub use operator::{ConsoleInput, OperatorInput, OperatorReply, ScriptedOperator, StdinOperator};
pub use orchestrator::{PipelineOrchestrator, PipelineRun, PipelineSettings};
pub use state::{IllegalTransition, PipelineState, Transition};
