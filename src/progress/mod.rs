//! Progress reporting for pipeline runs

mod handler;
mod logging;

pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler, RequestPurpose};
pub use logging::LoggingHandler;
