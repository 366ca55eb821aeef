//! Turning raw model output into candidate JSON values

mod normalize;
mod scanner;

pub use normalize::normalize_response;
pub use scanner::{extract_candidates, find_json_blocks};

/// Normalizes raw completion text and extracts candidate values in one step.
pub fn candidates_from_response(raw: &str) -> Vec<serde_json::Value> {
    extract_candidates(&normalize_response(raw))
}
