//! Output formatting for the CLI
//!
//! Human-readable text for terminals, JSON for scripts. Generated code always
//! goes to stdout unchanged so it can be piped into a file.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ParamforgeConfig;
use crate::edit::EditBatch;
use crate::generation::GeneratedArtifact;
use crate::pipeline::{PipelineError, PipelineRun};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the records of a converted instruction
    pub fn format_batch(&self, batch: &EditBatch) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(batch).context("Failed to serialize edit batch")
            }
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str(&format!("Edit Records ({})\n", batch.len()));
                output.push_str(RULE);
                output.push_str("\n\n");
                for (i, record) in batch.iter().enumerate() {
                    output.push_str(&format!(
                        "{}. {}  (confidence {:.0}%)\n",
                        i + 1,
                        record,
                        record.confidence * 100.0
                    ));
                }
                Ok(output)
            }
        }
    }

    /// Formats a conversion that produced no usable batch
    pub fn format_conversion_error(&self, error: &PipelineError) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&json!({
                "error": error.to_string(),
            }))
            .context("Failed to serialize conversion error"),
            OutputFormat::Human => Ok(format!("\u{2717} Conversion failed: {}\n", error)),
        }
    }

    /// Formats a whole pipeline run
    pub fn format_run(&self, run: &PipelineRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_run_json(run),
            OutputFormat::Human => Ok(self.format_run_human(run)),
        }
    }

    fn format_run_json(&self, run: &PipelineRun) -> Result<String> {
        let value = json!({
            "id": run.id,
            "instruction": run.instruction,
            "state": run.final_state(),
            "transitions": run.transitions,
            "batch": run.batch,
            "query": run.query.as_ref().map(|q| q.as_text()),
            "exemplar_count": run.exemplar_count,
            "artifact": run.artifact,
            "failure": run.failure.as_ref().map(|e| e.to_string()),
            "recovered": run.recovered.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        serde_json::to_string_pretty(&value).context("Failed to serialize pipeline run")
    }

    fn format_run_human(&self, run: &PipelineRun) -> String {
        let mut output = String::new();

        if let Some(batch) = &run.batch {
            output.push_str(&format!("Edit Records ({})\n", batch.len()));
            for record in batch.iter() {
                output.push_str(&format!("  \u{2022} {}\n", record));
            }
            output.push('\n');
        }

        if let Some(query) = &run.query {
            output.push_str(&format!(
                "Retrieval: \"{}\" ({} example(s))\n",
                query.as_text(),
                run.exemplar_count
            ));
        }

        for recovered in &run.recovered {
            output.push_str(&format!("  ! {}\n", recovered));
        }

        match (&run.artifact, &run.failure) {
            (Some(artifact), _) => {
                output.push_str("\nGenerated Script\n");
                output.push_str(RULE);
                output.push('\n');
                output.push_str(&artifact.code);
                if !artifact.code.ends_with('\n') {
                    output.push('\n');
                }
                if !artifact.has_entrypoint {
                    output.push_str("\n! Script has no run(context) entrypoint\n");
                }
            }
            (None, Some(failure)) => {
                output.push_str(&format!("\n\u{2717} {}: {}\n", run.final_state(), failure));
            }
            (None, None) => {}
        }

        output
    }

    /// Formats health check results
    pub fn format_health(
        &self,
        config: &ParamforgeConfig,
        health_results: &BTreeMap<String, HealthStatus>,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&json!({
                "ollama_host": config.ollama_host,
                "store_url": config.store_url,
                "collection": config.collection,
                "services": health_results,
            }))
            .context("Failed to serialize health results"),
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str("Service Health Status\n");
                output.push_str(RULE);
                output.push_str("\n\n");

                for (service, status) in health_results {
                    let symbol = if status.available {
                        "\u{2713}"
                    } else {
                        "\u{2717}"
                    };
                    output.push_str(&format!("{} {}\n", symbol, service));
                    output.push_str(&format!(
                        "  Status: {}\n",
                        if status.available {
                            "Available"
                        } else {
                            "Unavailable"
                        }
                    ));
                    output.push_str(&format!("  Message: {}\n", status.message));
                    if let Some(details) = &status.details {
                        output.push_str(&format!("  Details: {}\n", details));
                    }
                    output.push('\n');
                }

                output.push_str(&config.to_string());
                Ok(output)
            }
        }
    }
}

/// Health status for one external service
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthStatus {
    pub available: bool,
    pub message: String,
    pub details: Option<String>,
}

impl HealthStatus {
    pub fn available(message: String) -> Self {
        Self {
            available: true,
            message,
            details: None,
        }
    }

    pub fn unavailable(message: String) -> Self {
        Self {
            available: false,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// File name for a script saved at `unix_seconds`.
pub fn artifact_file_name(unix_seconds: i64) -> String {
    format!("fusion_generated_{}.py", unix_seconds)
}

/// Writes the refined script into `dir`, creating it if needed.
pub fn save_artifact(dir: &Path, artifact: &GeneratedArtifact) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(artifact_file_name(Utc::now().timestamp()));
    std::fs::write(&path, &artifact.code)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{EditRecord, EditValue, FeatureKind};
    use crate::generation::refine;
    use crate::llm::BackendError;
    use crate::pipeline::{PipelineState, Transition};
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn record(parameter: &str, value: f64) -> EditRecord {
        EditRecord {
            part: "block".to_string(),
            feature: FeatureKind::Extrusion,
            parameter: parameter.to_string(),
            value: EditValue::NewValue(value),
            unit: "mm".to_string(),
            confidence: 0.9,
        }
    }

    fn batch() -> EditBatch {
        EditBatch::from_guarded(vec![record("Length", 50.0), record("Width", 30.0)])
    }

    fn failed_run() -> PipelineRun {
        PipelineRun {
            id: Uuid::new_v4(),
            instruction: "make a block".to_string(),
            transitions: vec![Transition {
                from: PipelineState::Generating,
                to: PipelineState::Failed,
                at: Duration::from_millis(12),
            }],
            batch: Some(batch()),
            query: None,
            exemplar_count: 0,
            artifact: None,
            failure: Some(PipelineError::GenerationUnavailable(
                BackendError::EmptyCompletion,
            )),
            recovered: Vec::new(),
        }
    }

    #[test]
    fn test_batch_json_is_a_list() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_batch(&batch())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert_eq!(parsed[0]["parameter"], "Length");
        assert_eq!(parsed[0]["new_value"], 50.0);
    }

    #[test]
    fn test_batch_human() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_batch(&batch())
            .unwrap();
        assert!(output.contains("Edit Records (2)"));
        assert!(output.contains("1. block Length"));
        assert!(output.contains("90%"));
    }

    #[test]
    fn test_failed_run_human_shows_diagnostic() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_run(&failed_run())
            .unwrap();
        assert!(output.contains("FAILED"));
        assert!(output.contains("code generation failed"));
        assert!(!output.contains("Generated Script"));
    }

    #[test]
    fn test_failed_run_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_run(&failed_run())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["state"], "FAILED");
        assert_eq!(parsed["transitions"][0]["at"], 12);
        assert!(parsed["artifact"].is_null());
        assert!(parsed["failure"].as_str().unwrap().contains("empty"));
    }

    #[test]
    fn test_health_human() {
        let mut results = BTreeMap::new();
        results.insert(
            "ollama".to_string(),
            HealthStatus::available("Ollama is running".to_string()),
        );
        results.insert(
            "chroma".to_string(),
            HealthStatus::unavailable("Chroma not reachable".to_string())
                .with_details("connection refused".to_string()),
        );

        let output = OutputFormatter::new(OutputFormat::Human)
            .format_health(&ParamforgeConfig::default(), &results)
            .unwrap();
        assert!(output.contains("\u{2713} ollama"));
        assert!(output.contains("\u{2717} chroma"));
        assert!(output.contains("Details: connection refused"));
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name(1_700_000_000),
            "fusion_generated_1700000000.py"
        );
    }

    #[test]
    fn test_save_artifact_writes_code() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("scripts");
        let artifact = refine("def run(context):\n    pass\n");

        let path = save_artifact(&target, &artifact).unwrap();

        assert!(path.starts_with(&target));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("fusion_generated_"));
        assert!(name.ends_with(".py"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), artifact.code);
    }
}
