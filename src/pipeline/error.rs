use crate::llm::BackendError;
use crate::retrieval::StoreError;
use crate::validation::{BatchRejection, RejectedCandidate, Violation};
use thiserror::Error;

/// Everything that can go wrong in one pipeline run.
///
/// Recoverable errors are handled inside the run (manual fallback or the
/// empty retrieval placeholder); the rest end it in `FAILED`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("no JSON candidates found in the conversion response")]
    ExtractionEmpty,

    #[error("no candidate passed validation: {}", summarize(.0))]
    SchemaInvalid(Vec<RejectedCandidate>),

    #[error("runaway conversion output: {candidates} candidates exceeds the limit of {limit}")]
    RunawayBatch { candidates: usize, limit: usize },

    #[error("model reported the instruction as invalid: {0}")]
    SelfReportedInvalid(String),

    #[error("conversion call failed: {0}")]
    ConversionUnavailable(BackendError),

    #[error("exemplar retrieval failed: {0}")]
    RetrievalUnavailable(StoreError),

    #[error("code generation failed: {0}")]
    GenerationUnavailable(BackendError),

    #[error("operator aborted manual input")]
    OperatorAborted,

    #[error("operator did not respond within {seconds}s")]
    OperatorTimedOut { seconds: u64 },

    #[error("manual input unusable: {0}")]
    ManualInputUnusable(String),
}

fn summarize(rejected: &[RejectedCandidate]) -> String {
    if rejected.is_empty() {
        return "no candidates".to_string();
    }
    rejected
        .iter()
        .map(RejectedCandidate::summary)
        .collect::<Vec<_>>()
        .join(" | ")
}

impl PipelineError {
    /// True for failures the run recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::ExtractionEmpty
                | PipelineError::SchemaInvalid(_)
                | PipelineError::RunawayBatch { .. }
                | PipelineError::SelfReportedInvalid(_)
                | PipelineError::ConversionUnavailable(_)
                | PipelineError::RetrievalUnavailable(_)
        )
    }

    /// Maps a guard rejection to the pipeline taxonomy.
    ///
    /// An empty batch whose every rejection was the model flagging its own
    /// output is reported as self-reported rather than schema-invalid.
    pub fn from_rejection(rejection: BatchRejection) -> Self {
        match rejection {
            BatchRejection::Runaway { candidates, limit } => {
                PipelineError::RunawayBatch { candidates, limit }
            }
            BatchRejection::Empty { candidates: 0, .. } => PipelineError::ExtractionEmpty,
            BatchRejection::Empty { rejected, .. }
                if RejectedCandidate::all_self_reported(&rejected) =>
            {
                let messages: Vec<&str> = rejected
                    .iter()
                    .flat_map(|r| r.violations.iter())
                    .filter_map(|v| match v {
                        Violation::SelfReported(msg) => Some(msg.as_str()),
                        _ => None,
                    })
                    .collect();
                PipelineError::SelfReportedInvalid(messages.join("; "))
            }
            BatchRejection::Empty { rejected, .. } => PipelineError::SchemaInvalid(rejected),
        }
    }
}
