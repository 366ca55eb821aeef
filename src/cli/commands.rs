use crate::config::ParamforgeConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Natural-language parametric edits to Fusion 360 scripts
#[derive(Parser, Debug)]
#[command(
    name = "paramforge",
    about = "Turn natural-language CAD edits into Fusion 360 Python scripts",
    version,
    author,
    long_about = "paramforge converts an instruction such as \"make a 50x30x20mm block\" into \
                  validated edit records, retrieves similar example scripts from a vector \
                  store, and asks a local LLM to write a Fusion 360 add-in script."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub services: ServiceArgs,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Interactive session",
        long_about = "Reads one instruction per line and runs each through the full pipeline. \
                      Type 'exit' to leave.\n\n\
                      Examples:\n  \
                      paramforge run\n  \
                      paramforge run --save --output-dir ./scripts"
    )]
    Run(RunArgs),

    #[command(
        about = "Generate a script for one instruction",
        long_about = "Runs a single instruction through the full pipeline and prints the \
                      generated script.\n\n\
                      Examples:\n  \
                      paramforge generate \"Make a rectangular block 50x30x20mm\"\n  \
                      paramforge generate \"Add a 5mm fillet\" --save"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Convert an instruction to edit records",
        long_about = "Runs conversion and validation only, without the manual fallback or \
                      code generation.\n\n\
                      Examples:\n  \
                      paramforge convert \"Make the hole 8mm wide\"\n  \
                      paramforge convert \"Make the hole 8mm wide\" --format json"
    )]
    Convert(ConvertArgs),

    #[command(
        about = "Check service availability",
        long_about = "Checks that the text-generation service and the exemplar store respond.\n\n\
                      Examples:\n  \
                      paramforge health\n  \
                      paramforge health --format json"
    )]
    Health(HealthArgs),
}

/// Endpoint and model overrides shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceArgs {
    #[arg(long, global = true, value_name = "URL", help = "Ollama base URL")]
    pub ollama_host: Option<String>,

    #[arg(
        short = 'm',
        long,
        global = true,
        value_name = "MODEL",
        help = "Model for both conversion and generation"
    )]
    pub model: Option<String>,

    #[arg(long, global = true, value_name = "URL", help = "Chroma base URL")]
    pub store_url: Option<String>,

    #[arg(long, global = true, value_name = "NAME", help = "Exemplar collection")]
    pub collection: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "CATEGORY",
        help = "Only retrieve exemplars of this category"
    )]
    pub category: Option<String>,

    #[arg(
        short = 'n',
        long,
        global = true,
        value_name = "COUNT",
        help = "Number of exemplars to retrieve"
    )]
    pub results: Option<usize>,
}

impl ServiceArgs {
    /// Applies the flags given on the command line over `config`.
    pub fn apply(&self, config: &mut ParamforgeConfig) {
        if let Some(host) = &self.ollama_host {
            config.ollama_host = host.clone();
        }
        if let Some(model) = &self.model {
            config.conversion_model = model.clone();
            config.generation_model = model.clone();
        }
        if let Some(url) = &self.store_url {
            config.store_url = url.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if let Some(category) = &self.category {
            config.category = Some(category.clone());
        }
        if let Some(results) = self.results {
            config.result_count = results;
        }
    }
}

/// Where generated scripts go
#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    #[arg(short = 's', long, help = "Save each generated script to a file")]
    pub save: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory for saved scripts"
    )]
    pub output_dir: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub save: SaveArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(value_name = "INSTRUCTION", help = "Natural-language edit")]
    pub instruction: String,

    #[command(flatten)]
    pub save: SaveArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    #[arg(value_name = "INSTRUCTION", help = "Natural-language edit")]
    pub instruction: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
