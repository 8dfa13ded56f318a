//! Link configuration using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults (the firmware's own constants)
//! 2. A TOML file, when one is given
//! 3. Environment variables prefixed with `COXIRIS_`, using `__` between
//!    section and key, e.g. `COXIRIS_TRANSPORT__BAUD_RATE=9600`
//!
//! # Example
//! ```no_run
//! use coxiris_link::config::LinkConfig;
//! use std::path::Path;
//!
//! let config = LinkConfig::load(Some(Path::new("config/coxiris.toml")))?;
//! println!("Serving at {} baud", config.transport.baud_rate);
//! # Ok::<(), coxiris_link::LinkError>(())
//! ```

use crate::error::{LinkError, LinkResult};
use coxiris_core::{line_buffer::MIN_CAPACITY, LineEnding, DEFAULT_CAPACITY, DEFAULT_DEVICE_ID};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "COXIRIS_";

/// Top-level link configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial transport settings
    pub transport: TransportConfig,
    /// Command protocol settings
    pub protocol: ProtocolConfig,
    /// Simulated stage settings
    pub simulator: SimulatorConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Serial transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Serial device path, e.g. `/dev/ttyACM0`
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Quiet period that ends the stale-input drain after opening, in milliseconds
    pub drain_timeout_ms: u64,
    /// Discard bytes already queued on the port before serving, see `drain_timeout_ms`
    pub drain_on_open: bool,
}

/// Command protocol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Line buffer size in bytes, including room for the terminator
    pub buffer_capacity: usize,
    /// Identifier reported by `GET_ID`
    pub device_id: String,
    /// Response line terminator
    pub line_ending: LineEndingSetting,
}

/// Response line terminator as spelled in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingSetting {
    /// `\r\n`
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl From<LineEndingSetting> for LineEnding {
    fn from(setting: LineEndingSetting) -> Self {
        match setting {
            LineEndingSetting::Crlf => LineEnding::CrLf,
            LineEndingSetting::Lf => LineEnding::Lf,
        }
    }
}

/// Simulated stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Initial speed in mm/s
    pub speed: f64,
    /// Lowest accepted speed in mm/s
    pub min_speed: f64,
    /// Highest accepted speed in mm/s
    pub max_speed: f64,
    /// Travel per axis in mm, either side of the power-on position
    pub travel_mm: f64,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Log output format as spelled in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored
    #[default]
    Pretty,
    /// Single-line, no colors
    Compact,
    /// One JSON object per event
    Json,
}

// Default value functions
fn default_baud_rate() -> u32 {
    115_200
}

fn default_drain_timeout_ms() -> u64 {
    50
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            drain_timeout_ms: default_drain_timeout_ms(),
            drain_on_open: true,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            device_id: DEFAULT_DEVICE_ID.to_string(),
            line_ending: LineEndingSetting::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            min_speed: 0.5,
            max_speed: 50.0,
            travel_mm: 100.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LinkConfig {
    /// Build the layered figment without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(LinkConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, an optional TOML file and the
    /// environment.
    ///
    /// A file that was asked for but does not exist is an error.
    pub fn load(path: Option<&Path>) -> LinkResult<Self> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(LinkError::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(Self::figment(path).extract()?)
    }

    /// Load and validate in one step.
    pub fn load_validated(path: Option<&Path>) -> LinkResult<Self> {
        let config = Self::load(path)?;
        config.validate().map_err(LinkError::Configuration)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        // Validate log level
        crate::logging::parse_log_level(&self.logging.level)?;

        if self.transport.baud_rate == 0 {
            return Err("baud_rate must be non-zero".to_string());
        }

        if self.protocol.buffer_capacity < MIN_CAPACITY {
            return Err(format!(
                "Invalid buffer_capacity {}. Must be at least {}",
                self.protocol.buffer_capacity, MIN_CAPACITY
            ));
        }

        let id = &self.protocol.device_id;
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_graphic()) {
            return Err(format!(
                "Invalid device_id '{}'. Must be non-empty printable ASCII without spaces",
                id
            ));
        }

        let sim = &self.simulator;
        if sim.min_speed <= 0.0 {
            return Err(format!("min_speed must be positive, got {}", sim.min_speed));
        }
        if sim.min_speed > sim.max_speed {
            return Err(format!(
                "min_speed {} exceeds max_speed {}",
                sim.min_speed, sim.max_speed
            ));
        }
        if !(sim.min_speed..=sim.max_speed).contains(&sim.speed) {
            return Err(format!(
                "speed {} outside [{}, {}]",
                sim.speed, sim.min_speed, sim.max_speed
            ));
        }
        if sim.travel_mm <= 0.0 {
            return Err(format!("travel_mm must be positive, got {}", sim.travel_mm));
        }

        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
