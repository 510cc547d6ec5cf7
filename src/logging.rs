//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. Provides configurable
//! log levels, output formats, and destinations. Both runtimes own the terminal for
//! their console, so logs default to a file.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_ENV: &str = "ROSTERSYNC_LOG";
pub const LOG_FORMAT_ENV: &str = "ROSTERSYNC_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "ROSTERSYNC_LOG_OUTPUT";
pub const LOG_FILE_ENV: &str = "ROSTERSYNC_LOG_FILE";
pub const LOG_MODULES_ENV: &str = "ROSTERSYNC_LOG_MODULES";

/// Resolve the log file path with precedence: CLI, ROSTERSYNC_LOG_FILE env, config file, default.
///
/// Default is `rostersync.log` in the `ProjectDirs` state directory.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    if let Some(p) = cli_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    if let Ok(env_path) = std::env::var(LOG_FILE_ENV) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let project_dirs =
        directories::ProjectDirs::from("", "rostersync", "rostersync").ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine platform state directory for log file".to_string(),
            )
        })?;
    // Platforms without a state dir (macOS, Windows) log under local data.
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir())
        .to_path_buf();
    Ok(dir.join("rostersync.log"))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "file".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Settings given on the command line; these beat environment and config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOverrides {
    pub level: Option<String>,
    pub format: Option<String>,
    pub output: Option<String>,
    pub file: Option<PathBuf>,
    /// Shorthand for `debug` when no level is given
    pub verbose: bool,
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (ROSTERSYNC_LOG, ROSTERSYNC_LOG_FORMAT, etc.)
/// 3. Configuration file
/// 4. Defaults
pub fn init_logging(
    config: Option<&LoggingConfig>,
    overrides: &LogOverrides,
) -> Result<(), ApiError> {
    let disabled = config.map(|c| !c.enabled).unwrap_or(false);
    if disabled && overrides.level.is_none() && !overrides.verbose {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)));
    }

    let filter = build_env_filter(config, overrides)?;
    let format = determine_format(config, overrides)?;
    let output = determine_output(config, overrides)?;
    let use_color = config.map(|c| c.color).unwrap_or(true);

    let writer = if output.file {
        let path = resolve_log_file_path(
            overrides.file.clone(),
            config.and_then(|c| c.file.clone()),
        )?;
        let file = Arc::new(open_log_file(&path)?);
        if output.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        }
    } else if output.stdout && output.stderr {
        BoxMakeWriter::new(std::io::stdout.and(std::io::stderr))
    } else if output.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let (json_layer, text_layer) = if format == "json" {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer);
        (Some(layer), None)
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(use_color && !output.file)
            .with_writer(writer);
        (None, Some(layer))
    };

    Registry::default()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn open_log_file(path: &std::path::Path) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::ConfigError(format!("Failed to create log directory: {}", e))
            })?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Build environment filter from CLI, environment variables or config
fn build_env_filter(
    config: Option<&LoggingConfig>,
    overrides: &LogOverrides,
) -> Result<EnvFilter, ApiError> {
    let cli_level = overrides
        .level
        .clone()
        .or_else(|| overrides.verbose.then(|| "debug".to_string()));

    if cli_level.is_none() {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
    }

    let level = cli_level
        .or_else(|| config.map(|c| c.level.clone()))
        .unwrap_or_else(default_log_level);

    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::try_new(&level)
        .map_err(|e| ApiError::ConfigError(format!("Invalid log level '{}': {}", level, e)))?;

    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            let directive = format!("{}={}", module, module_level);
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))?,
            );
        }
    }

    if let Ok(modules_str) = std::env::var(LOG_MODULES_ENV) {
        for directive in parse_module_directives(&modules_str) {
            filter = filter.add_directive(directive.parse().map_err(|e| {
                ApiError::ConfigError(format!("Invalid log directive from env: {}", e))
            })?);
        }
    }

    Ok(filter)
}

/// `a=debug, b = warn` -> `["a=debug", "b=warn"]`; malformed entries are skipped.
fn parse_module_directives(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|entry| {
            let (module, level) = entry.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            (!module.is_empty() && !level.is_empty()).then(|| format!("{}={}", module, level))
        })
        .collect()
}

/// Determine output format from CLI, environment or config
fn determine_format(
    config: Option<&LoggingConfig>,
    overrides: &LogOverrides,
) -> Result<String, ApiError> {
    let format = match &overrides.format {
        Some(format) => format.clone(),
        None => match std::env::var(LOG_FORMAT_ENV) {
            Ok(format) if format == "json" || format == "text" => format,
            _ => config
                .map(|c| c.format.clone())
                .unwrap_or_else(default_format),
        },
    };

    if format != "json" && format != "text" {
        return Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }

    Ok(format)
}

/// Output destinations
#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

/// Determine output destinations from CLI, environment or config
fn determine_output(
    config: Option<&LoggingConfig>,
    overrides: &LogOverrides,
) -> Result<OutputDestinations, ApiError> {
    if let Some(output) = &overrides.output {
        return parse_output_destinations(output);
    }
    if let Ok(output) = std::env::var(LOG_OUTPUT_ENV) {
        return parse_output_destinations(&output);
    }
    let output = config.map(|c| c.output.as_str()).unwrap_or("file");
    parse_output_destinations(output)
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, ApiError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}
