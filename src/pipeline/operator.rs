//! Human operator suspension point
//!
//! When automated conversion yields nothing usable the pipeline asks a human
//! for one structured line. The wait is bounded: the operator can abort
//! explicitly (the `abort` token or end of input) or let it time out.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};

/// Token an operator types to give up on manual input
pub const ABORT_TOKEN: &str = "abort";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorReply {
    Line(String),
    Aborted,
    TimedOut,
}

impl OperatorReply {
    /// Interprets one raw line; `None` means end of input.
    ///
    /// Returns `None` for a blank line, which callers re-prompt on.
    pub fn from_line(line: Option<String>) -> Option<Self> {
        match line {
            None => Some(OperatorReply::Aborted),
            Some(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    None
                } else if trimmed.eq_ignore_ascii_case(ABORT_TOKEN) {
                    Some(OperatorReply::Aborted)
                } else {
                    Some(OperatorReply::Line(trimmed.to_string()))
                }
            }
        }
    }
}

#[async_trait]
pub trait OperatorInput: Send + Sync {
    /// Shows `prompt` and waits at most `timeout` for a reply.
    async fn request_line(&self, prompt: &str, timeout: Duration) -> OperatorReply;
}

/// Line reader over the process stdin, shared by the interactive loop and
/// the manual fallback so neither steals buffered input from the other.
pub struct ConsoleInput {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Prints `prompt` without a newline and reads one line.
    /// `Ok(None)` signals end of input.
    pub async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        {
            let mut stdout = std::io::stdout();
            write!(stdout, "{}", prompt)?;
            stdout.flush()?;
        }
        let mut lines = self.lines.lock().await;
        lines.next_line().await
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Operator reading replies from the console
pub struct StdinOperator {
    console: Arc<ConsoleInput>,
}

impl StdinOperator {
    pub fn new(console: Arc<ConsoleInput>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl OperatorInput for StdinOperator {
    async fn request_line(&self, prompt: &str, timeout: Duration) -> OperatorReply {
        let wait = async {
            loop {
                match self.console.read_line(prompt).await {
                    Ok(line) => {
                        if let Some(reply) = OperatorReply::from_line(line) {
                            return reply;
                        }
                        debug!("Blank operator input, prompting again");
                    }
                    Err(e) => {
                        warn!("Failed to read operator input: {}", e);
                        return OperatorReply::Aborted;
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(reply) => reply,
            Err(_) => {
                println!();
                OperatorReply::TimedOut
            }
        }
    }
}

/// Operator replaying a fixed script of replies; aborts once exhausted
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    replies: Mutex<VecDeque<OperatorReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(replies: impl IntoIterator<Item = OperatorReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// An operator that answers with a single line.
    pub fn answering(line: impl Into<String>) -> Self {
        Self::new([OperatorReply::Line(line.into())])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OperatorInput for ScriptedOperator {
    async fn request_line(&self, prompt: &str, _timeout: Duration) -> OperatorReply {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or(OperatorReply::Aborted)
    }
}
