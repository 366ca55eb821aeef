use crate::edit::EditBatch;
use crate::validation::validator::{RejectedCandidate, ValidationReport};
use thiserror::Error;
use tracing::{info, warn};

/// Upper bound on candidates in one response before it is treated as runaway
pub const MAX_BATCH_SIZE: usize = 20;

/// Why a whole batch was discarded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchRejection {
    #[error("no candidate passed validation ({candidates} extracted)")]
    Empty {
        candidates: usize,
        rejected: Vec<RejectedCandidate>,
    },

    #[error("runaway output: {candidates} candidates exceeds the limit of {limit}")]
    Runaway { candidates: usize, limit: usize },
}

/// Fail-closed gate between validation and the rest of the pipeline.
///
/// Either every accepted record goes through as one batch or nothing does.
#[derive(Debug, Clone, Copy)]
pub struct EditBatchGuard {
    limit: usize,
}

impl EditBatchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn admit(&self, report: ValidationReport) -> Result<EditBatch, BatchRejection> {
        if report.candidate_count > self.limit {
            warn!(
                "Discarding batch: {} candidates exceeds limit {}",
                report.candidate_count, self.limit
            );
            return Err(BatchRejection::Runaway {
                candidates: report.candidate_count,
                limit: self.limit,
            });
        }

        if report.accepted.is_empty() {
            warn!(
                "Discarding batch: 0 of {} candidates valid",
                report.candidate_count
            );
            return Err(BatchRejection::Empty {
                candidates: report.candidate_count,
                rejected: report.rejected,
            });
        }

        if !report.rejected.is_empty() {
            warn!(
                "{} of {} candidates rejected; admitting the remaining {}",
                report.rejected.len(),
                report.candidate_count,
                report.accepted.len()
            );
        }

        info!("Admitted edit batch of {} record(s)", report.accepted.len());
        Ok(EditBatch::from_guarded(report.accepted))
    }
}

impl Default for EditBatchGuard {
    fn default() -> Self {
        Self {
            limit: MAX_BATCH_SIZE,
        }
    }
}
