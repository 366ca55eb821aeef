//! Edit-record schema enforcement and batch bounding

pub mod batch;
pub mod rules;
pub mod validator;

pub use batch::{BatchRejection, EditBatchGuard, MAX_BATCH_SIZE};
pub use rules::{ValidationRule, Violation};
pub use validator::{EditRecordValidator, RejectedCandidate, ValidationOutcome, ValidationReport};
