use paramforge::cli::commands::{CliArgs, Commands};
use paramforge::cli::handlers::{handle_convert, handle_generate, handle_health, handle_run};
use paramforge::util::logging::{init_logging, parse_level, LoggingConfig};
use paramforge::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("paramforge v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Run(run_args) => handle_run(run_args, &args.services).await,
        Commands::Generate(generate_args) => handle_generate(generate_args, &args.services).await,
        Commands::Convert(convert_args) => handle_convert(convert_args, &args.services).await,
        Commands::Health(health_args) => handle_health(health_args, &args.services).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("PARAMFORGE_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        parse_level(&level_str)
    };

    let use_json = args.log_json
        || env::var("PARAMFORGE_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..Default::default()
    });
}
