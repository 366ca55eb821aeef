//! Interactive line-oriented session

use super::commands::SaveArgs;
use super::handlers::maybe_save;
use super::output::{OutputFormat, OutputFormatter};
use crate::pipeline::{ConsoleInput, PipelineOrchestrator};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

const EXIT_TOKEN: &str = "exit";
const INSTRUCTION_PROMPT: &str = "\nInstruction (or 'exit'): ";

/// What one line typed at the instruction prompt means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Exit,
    Skip,
    Instruction(String),
}

impl SessionCommand {
    /// `None` is end of input.
    pub fn parse(line: Option<&str>) -> Self {
        match line.map(str::trim) {
            None => SessionCommand::Exit,
            Some("") => SessionCommand::Skip,
            Some(text) if text.eq_ignore_ascii_case(EXIT_TOKEN) => SessionCommand::Exit,
            Some(text) => SessionCommand::Instruction(text.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub save: SaveArgs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub runs: usize,
    pub succeeded: usize,
}

/// Reads instructions from the shared console until `exit` or end of input.
///
/// The manual fallback reads from the same [`ConsoleInput`], so operator
/// replies and instructions never race for buffered stdin.
pub struct InteractiveSession {
    orchestrator: PipelineOrchestrator,
    console: Arc<ConsoleInput>,
    options: SessionOptions,
    formatter: OutputFormatter,
}

impl InteractiveSession {
    pub fn new(
        orchestrator: PipelineOrchestrator,
        console: Arc<ConsoleInput>,
        options: SessionOptions,
    ) -> Self {
        Self {
            orchestrator,
            console,
            options,
            formatter: OutputFormatter::new(OutputFormat::Human),
        }
    }

    pub async fn run(&self) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        println!("paramforge interactive session. Describe an edit, or type 'exit' to quit.");

        loop {
            let line = self.console.read_line(INSTRUCTION_PROMPT).await?;
            let instruction = match SessionCommand::parse(line.as_deref()) {
                SessionCommand::Exit => break,
                SessionCommand::Skip => continue,
                SessionCommand::Instruction(instruction) => instruction,
            };

            debug!(instruction = %instruction, "Read instruction");
            let run = self.orchestrator.run(&instruction).await;
            summary.runs += 1;

            println!("{}", self.formatter.format_run(&run)?);

            if let Some(artifact) = &run.artifact {
                summary.succeeded += 1;
                if let Err(e) = maybe_save(&self.options.save, artifact) {
                    warn!("{:#}", e);
                    eprintln!("Error: {:#}", e);
                }
            }
        }

        println!("Goodbye.");
        Ok(summary)
    }
}
