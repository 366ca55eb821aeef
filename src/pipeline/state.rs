use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Stage of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Submitted,
    Extracting,
    Validating,
    ValidBatch,
    FallbackManual,
    QuerySynth,
    Retrieving,
    Generating,
    Refining,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Submitted => "SUBMITTED",
            PipelineState::Extracting => "EXTRACTING",
            PipelineState::Validating => "VALIDATING",
            PipelineState::ValidBatch => "VALID_BATCH",
            PipelineState::FallbackManual => "FALLBACK_MANUAL",
            PipelineState::QuerySynth => "QUERY_SYNTH",
            PipelineState::Retrieving => "RETRIEVING",
            PipelineState::Generating => "GENERATING",
            PipelineState::Refining => "REFINING",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, next),
            (Submitted, Extracting)
                | (Extracting, Validating)
                | (Extracting, FallbackManual)
                | (Validating, ValidBatch)
                | (Validating, FallbackManual)
                | (ValidBatch, QuerySynth)
                | (FallbackManual, QuerySynth)
                | (FallbackManual, Failed)
                | (QuerySynth, Retrieving)
                | (Retrieving, Generating)
                | (Generating, Refining)
                | (Generating, Failed)
                | (Refining, Done)
        )
    }

    /// Like [`can_transition_to`](Self::can_transition_to), but names the
    /// offending edge.
    pub fn check_transition(self, next: PipelineState) -> Result<(), IllegalTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub from: PipelineState,
    pub to: PipelineState,
    /// Time since the run was submitted
    #[serde(serialize_with = "serialize_millis")]
    pub at: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal pipeline transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}
