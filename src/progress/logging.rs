//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                run_id,
                instruction,
            } => {
                info!(run = %run_id, instruction = %instruction, "Starting pipeline run");
            }
            ProgressEvent::StateChanged { from, to } => {
                debug!(from = %from, to = %to, "State transition");
            }
            ProgressEvent::LlmRequestStarted { purpose } => {
                debug!(purpose = %purpose, "Sending request to LLM");
            }
            ProgressEvent::LlmResponseReceived {
                purpose,
                response_time,
                chars,
            } => {
                debug!(
                    purpose = %purpose,
                    chars,
                    response_time_ms = response_time.as_millis(),
                    "Received LLM response"
                );
            }
            ProgressEvent::CandidatesExtracted { count } => {
                if *count == 0 {
                    warn!("No JSON candidates in response");
                } else {
                    debug!(count, "Extracted JSON candidates");
                }
            }
            ProgressEvent::ValidationComplete { accepted, rejected } => {
                if *rejected > 0 {
                    warn!(accepted, rejected, "Validation complete with rejections");
                } else {
                    info!(accepted, "Validation complete");
                }
            }
            ProgressEvent::ManualInputRequested { reason } => {
                warn!(reason = %reason, "Falling back to manual input");
            }
            ProgressEvent::RetrievalComplete {
                exemplars,
                degraded,
            } => {
                if *degraded {
                    warn!("Retrieval unavailable, continuing without examples");
                } else {
                    info!(exemplars, "Retrieval complete");
                }
            }
            ProgressEvent::Completed { total_time } => {
                info!(
                    total_time_ms = total_time.as_millis(),
                    "Pipeline run complete"
                );
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Pipeline run failed");
            }
        }
    }
}
