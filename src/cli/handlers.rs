//! Command handlers. Each returns the process exit code.

use super::commands::{ConvertArgs, GenerateArgs, HealthArgs, RunArgs, SaveArgs, ServiceArgs};
use super::output::{save_artifact, HealthStatus, OutputFormat, OutputFormatter};
use super::repl::{InteractiveSession, SessionOptions};
use crate::config::ParamforgeConfig;
use crate::generation::GeneratedArtifact;
use crate::pipeline::{
    ConsoleInput, OperatorInput, PipelineOrchestrator, PipelineSettings, StdinOperator,
};
use crate::progress::LoggingHandler;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Loads configuration from the environment, applies flags and validates.
pub fn load_config(services: &ServiceArgs) -> Result<ParamforgeConfig> {
    let mut config = ParamforgeConfig::default();
    services.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    debug!("{}", config);
    Ok(config)
}

/// Builds the orchestrator with production clients.
pub fn build_orchestrator(
    config: &ParamforgeConfig,
    operator: Arc<dyn OperatorInput>,
) -> Result<PipelineOrchestrator> {
    let generator = config
        .create_generator()
        .context("Failed to create text-generation client")?;
    let store = config
        .create_store()
        .context("Failed to create exemplar store client")?;

    Ok(PipelineOrchestrator::new(generator, store, operator)
        .with_settings(PipelineSettings::from(config))
        .with_progress(Arc::new(LoggingHandler)))
}

fn report(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Saves the artifact when requested and reports the path on stderr.
pub fn maybe_save(save: &SaveArgs, artifact: &GeneratedArtifact) -> Result<()> {
    if !save.save {
        return Ok(());
    }
    let path = save_artifact(&save.output_dir, artifact).with_context(|| {
        format!(
            "Failed to save script to {}",
            save.output_dir.display()
        )
    })?;
    info!(path = %path.display(), "Saved generated script");
    eprintln!("Saved to {}", path.display());
    Ok(())
}

pub async fn handle_run(args: &RunArgs, services: &ServiceArgs) -> i32 {
    report(run_interactive(args, services).await)
}

async fn run_interactive(args: &RunArgs, services: &ServiceArgs) -> Result<i32> {
    let config = load_config(services)?;
    let console = Arc::new(ConsoleInput::new());
    let operator = Arc::new(StdinOperator::new(console.clone()));
    let orchestrator = build_orchestrator(&config, operator)?;

    let options = SessionOptions {
        save: args.save.clone(),
    };
    let session = InteractiveSession::new(orchestrator, console, options);
    let summary = session.run().await?;

    info!(
        runs = summary.runs,
        succeeded = summary.succeeded,
        "Interactive session finished"
    );
    Ok(0)
}

pub async fn handle_generate(args: &GenerateArgs, services: &ServiceArgs) -> i32 {
    report(generate_once(args, services).await)
}

async fn generate_once(args: &GenerateArgs, services: &ServiceArgs) -> Result<i32> {
    let config = load_config(services)?;
    let console = Arc::new(ConsoleInput::new());
    let orchestrator = build_orchestrator(&config, Arc::new(StdinOperator::new(console)))?;

    let run = orchestrator.run(&args.instruction).await;
    let formatter = OutputFormatter::new(args.format.into());
    println!("{}", formatter.format_run(&run)?);

    match &run.artifact {
        Some(artifact) => {
            maybe_save(&args.save, artifact)?;
            Ok(0)
        }
        None => Ok(1),
    }
}

pub async fn handle_convert(args: &ConvertArgs, services: &ServiceArgs) -> i32 {
    report(convert_once(args, services).await)
}

async fn convert_once(args: &ConvertArgs, services: &ServiceArgs) -> Result<i32> {
    let config = load_config(services)?;
    let console = Arc::new(ConsoleInput::new());
    let orchestrator = build_orchestrator(&config, Arc::new(StdinOperator::new(console)))?;
    let formatter = OutputFormatter::new(args.format.into());

    match orchestrator.convert(&args.instruction).await {
        Ok(batch) => {
            println!("{}", formatter.format_batch(&batch)?);
            Ok(0)
        }
        Err(e) => {
            println!("{}", formatter.format_conversion_error(&e)?);
            Ok(1)
        }
    }
}

pub async fn handle_health(args: &HealthArgs, services: &ServiceArgs) -> i32 {
    report(check_health(args, services).await)
}

async fn check_health(args: &HealthArgs, services: &ServiceArgs) -> Result<i32> {
    let config = load_config(services)?;
    let mut results = BTreeMap::new();

    let generator = config.create_generator()?;
    let ollama = match generator.health_check().await {
        Ok(true) => HealthStatus::available(format!("Ollama is running at {}", config.ollama_host))
            .with_details(format!(
                "conversion: {}, generation: {}",
                config.conversion_model, config.generation_model
            )),
        Ok(false) => HealthStatus::unavailable(format!(
            "Ollama not reachable at {}",
            config.ollama_host
        )),
        Err(e) => HealthStatus::unavailable("Ollama health check failed".to_string())
            .with_details(e.to_string()),
    };
    results.insert("ollama".to_string(), ollama);

    let store = config.create_store()?;
    let chroma = match store.health_check().await {
        Ok(true) => HealthStatus::available(format!("Chroma is running at {}", config.store_url))
            .with_details(format!("collection: {}", store.collection())),
        Ok(false) => HealthStatus::unavailable(format!(
            "Chroma not reachable at {}",
            config.store_url
        )),
        Err(e) => HealthStatus::unavailable("Chroma health check failed".to_string())
            .with_details(e.to_string()),
    };
    results.insert("chroma".to_string(), chroma);

    let all_available = results.values().all(|s| s.available);
    let format: OutputFormat = args.format.into();
    println!(
        "{}",
        OutputFormatter::new(format).format_health(&config, &results)?
    );

    Ok(if all_available { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_config_rejects_bad_override() {
        let services = ServiceArgs {
            results: Some(0),
            ..Default::default()
        };
        assert!(load_config(&services).is_err());
    }

    #[test]
    #[serial]
    fn test_load_config_applies_overrides() {
        let services = ServiceArgs {
            model: Some("llama3.1:8b".to_string()),
            ..Default::default()
        };
        let config = load_config(&services).unwrap();
        assert_eq!(config.generation_model, "llama3.1:8b");
    }

    #[test]
    fn test_maybe_save_respects_flag() {
        let temp_dir = TempDir::new().unwrap();
        let artifact = crate::generation::refine("def run(context):\n    pass\n");

        let skip = SaveArgs {
            save: false,
            output_dir: temp_dir.path().to_path_buf(),
        };
        maybe_save(&skip, &artifact).unwrap();
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);

        let save = SaveArgs {
            save: true,
            output_dir: temp_dir.path().to_path_buf(),
        };
        maybe_save(&save, &artifact).unwrap();
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_report_maps_errors_to_exit_code() {
        assert_eq!(report(Ok(0)), 0);
        assert_eq!(report(Err(anyhow::anyhow!("boom"))), 1);
    }
}
