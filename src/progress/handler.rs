//! Progress handler trait and events

use crate::pipeline::state::PipelineState;
use std::fmt;
use std::time::Duration;

/// Which of the two text-generation calls a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    Conversion,
    Generation,
}

impl fmt::Display for RequestPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPurpose::Conversion => f.write_str("conversion"),
            RequestPurpose::Generation => f.write_str("generation"),
        }
    }
}

/// Events emitted during a pipeline run
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { run_id: String, instruction: String },

    /// State machine moved
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },

    /// LLM request started
    LlmRequestStarted { purpose: RequestPurpose },

    /// LLM response received
    LlmResponseReceived {
        purpose: RequestPurpose,
        response_time: Duration,
        chars: usize,
    },

    /// Candidate JSON values found in a response
    CandidatesExtracted { count: usize },

    /// Validation completed
    ValidationComplete { accepted: usize, rejected: usize },

    /// Automated conversion gave nothing usable; asking the operator
    ManualInputRequested { reason: String },

    /// Exemplar retrieval finished; `degraded` when the store failed
    RetrievalComplete { exemplars: usize, degraded: bool },

    /// Run completed successfully
    Completed { total_time: Duration },

    /// Run failed
    Failed { error: String },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::Started {
            run_id: "r".to_string(),
            instruction: "make a cube".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::LlmRequestStarted {
            purpose: RequestPurpose::Conversion,
        });
        handler.on_progress(&ProgressEvent::CandidatesExtracted { count: 3 });
        handler.on_progress(&ProgressEvent::Completed {
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_purpose_display() {
        assert_eq!(RequestPurpose::Conversion.to_string(), "conversion");
        assert_eq!(RequestPurpose::Generation.to_string(), "generation");
    }
}
