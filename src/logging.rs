//! Tracing setup
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and one fmt
//! layer in the configured format. `RUST_LOG` takes precedence over the
//! configured level when it is set.
//!
//! All output goes to stderr. In stdio mode stdout carries the command
//! protocol and must not see a single log byte.
//!
//! # Example
//! ```no_run
//! use coxiris_link::logging::{self, LogSettings, OutputFormat};
//! use tracing::Level;
//!
//! logging::init(LogSettings::new(Level::DEBUG).with_format(OutputFormat::Json))?;
//! tracing::info!(port = "/dev/ttyACM0", "link starting");
//! # Ok::<(), coxiris_link::LinkError>(())
//! ```

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{LinkError, LinkResult};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed format with colors (for development)
    Pretty,
    /// Compact format without colors (for production)
    Compact,
    /// JSON format for structured logging (for log aggregation)
    Json,
}

impl From<LogFormat> for OutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => OutputFormat::Pretty,
            LogFormat::Compact => OutputFormat::Compact,
            LogFormat::Json => OutputFormat::Json,
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Log level used when `RUST_LOG` is not set
    pub level: Level,
    /// Output format
    pub format: OutputFormat,
    /// Whether to include file and line numbers
    pub with_file_and_line: bool,
    /// Whether to include thread names
    pub with_thread_names: bool,
    /// Whether to enable ANSI colors (only for Pretty format)
    pub with_ansi: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Pretty,
            with_file_and_line: false,
            with_thread_names: false,
            with_ansi: true,
        }
    }
}

impl LogSettings {
    /// Settings with a custom level and defaults otherwise
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Settings from the `[logging]` configuration section
    pub fn from_config(config: &LoggingConfig) -> Result<Self, String> {
        let level = parse_log_level(&config.level)?;
        Ok(Self::new(level).with_format(config.format.into()))
    }

    /// Set output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable ANSI colors
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }
}

/// Initialize tracing from the `[logging]` configuration section.
pub fn init_from_config(config: &LoggingConfig) -> LinkResult<()> {
    let settings = LogSettings::from_config(config).map_err(LinkError::Logging)?;
    init(settings)
}

/// Install the global subscriber.
///
/// Idempotent: if a global subscriber is already set this returns `Ok(())`,
/// so tests and embedding hosts can call it freely.
pub fn init(settings: LogSettings) -> LinkResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_string(settings.level)));

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(settings.with_file_and_line)
        .with_line_number(settings.with_file_and_line)
        .with_thread_names(settings.with_thread_names);

    let layer = match settings.format {
        OutputFormat::Pretty => base.pretty().with_ansi(settings.with_ansi).boxed(),
        OutputFormat::Compact => base.compact().with_ansi(false).boxed(),
        OutputFormat::Json => base.json().with_ansi(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            if e.to_string()
                .contains("a global default trace dispatcher has already been set")
            {
                Ok(())
            } else {
                Err(LinkError::Logging(format!("Failed to initialize tracing: {}", e)))
            }
        })
}

/// Parse log level string into tracing Level
pub(crate) fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}

fn level_to_filter_string(level: Level) -> String {
    match level {
        Level::TRACE => "trace".to_string(),
        Level::DEBUG => "debug".to_string(),
        Level::INFO => "info".to_string(),
        Level::WARN => "warn".to_string(),
        Level::ERROR => "error".to_string(),
    }
}
