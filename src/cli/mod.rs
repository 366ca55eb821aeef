pub mod commands;
pub mod handlers;
pub mod output;
pub mod repl;

pub use commands::{
    CliArgs, Commands, ConvertArgs, GenerateArgs, HealthArgs, RunArgs, SaveArgs, ServiceArgs,
};
pub use output::{save_artifact, HealthStatus, OutputFormat, OutputFormatter};
pub use repl::{InteractiveSession, SessionCommand};
