//! Structured logging setup for paramforge
//!
//! Console output by default, JSON on request. `RUST_LOG` is respected; when
//! it is unset the noisy HTTP crates are capped at `warn`.
//!
//! # Example
//!
//! ```no_run
//! use paramforge::util::logging;
//! use tracing::{info, warn};
//!
//! logging::init_from_env();
//!
//! info!("Application started");
//! warn!(store = "chroma", "Retrieval degraded");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

const HTTP_CRATES: [&str; 3] = ["h2", "hyper", "reqwest"];

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for this crate
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., paramforge::pipeline) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Write to stderr so stdout stays clean for generated code and JSON
    pub to_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            to_stderr: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            to_stderr: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            ..Default::default()
        }
    }
}

/// Parses a log level from a string, falling back to INFO.
///
/// ```
/// use paramforge::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("INFO"), Level::INFO);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Filter directives applied on top of `RUST_LOG`.
fn directives(config: &LoggingConfig, rust_log_set: bool) -> Vec<Directive> {
    let mut raw = vec![format!("paramforge={}", config.level)];
    if !rust_log_set {
        raw.extend(HTTP_CRATES.iter().map(|name| format!("{}=warn", name)));
    }
    raw.into_iter().filter_map(|d| d.parse().ok()).collect()
}

/// Initializes the logging system. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let rust_log_set = env::var("RUST_LOG").is_ok();
        let filter = directives(&config, rust_log_set)
            .into_iter()
            .fold(EnvFilter::from_default_env(), |filter, directive| {
                filter.add_directive(directive)
            });

        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);

        match (config.use_json, config.to_stderr) {
            (true, true) => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json().with_writer(std::io::stderr))
                .init(),
            (true, false) => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init(),
            (false, true) => tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(std::io::stderr))
                .init(),
            (false, false) => tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init(),
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `PARAMFORGE_LOG_LEVEL` and `PARAMFORGE_LOG_JSON`.
pub fn init_from_env() {
    let level_str = env::var("PARAMFORGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = parse_level(&level_str);

    let use_json = env::var("PARAMFORGE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..Default::default()
    });
}
