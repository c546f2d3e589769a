//! Runtime settings loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working dashboard on the simulated adapter. Command-line flags are applied
//! on top by the binary, then [`Settings::validate`] runs once before startup.
//!
//! ```toml
//! [adapter]
//! kind = "elm327"
//! address = "192.168.0.10:35000"
//!
//! [polling]
//! max_failed_cycles = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::config::{
    DEFAULT_CYCLE_INTERVAL,
    DEFAULT_MAX_FAILED_CYCLES,
    DEFAULT_RECONNECT_BACKOFF,
    DEFAULT_UI_TICK,
    GAUGE_COLUMNS,
    GAUGE_PITCH_X,
    SCREEN_HEIGHT,
    SCREEN_WIDTH,
    STATUS_LINE_HEIGHT,
    WINDOW_TITLE,
    gauge_rows,
    status_top,
};
use crate::error::ConfigError;
use crate::sensors::{SENSOR_COUNT, SensorKey};

/// Settings file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

/// Root of the settings file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub adapter: AdapterSettings,
    pub polling: PollingSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

/// Which adapter implementation to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Synthetic signals, no hardware.
    #[default]
    Simulated,
    /// ELM327 over TCP or a serial device node.
    Elm327,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterSettings {
    pub kind: AdapterKind,
    /// `host:port` of a TCP adapter.
    pub address: Option<String>,
    /// Serial device node of a wired or Bluetooth adapter.
    pub device: Option<PathBuf>,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Simulated only: sensors answering `NO DATA`.
    pub unsupported: Vec<SensorKey>,
    /// Simulated only: stored trouble codes, e.g. `["P0171"]`.
    pub stored_dtcs: Vec<String>,
    /// Simulated only: connection attempts refused before one succeeds.
    pub failed_connects: u32,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            kind: AdapterKind::Simulated,
            address: None,
            device: None,
            connect_timeout_ms: 5000,
            read_timeout_ms: 2000,
            unsupported: Vec::new(),
            stored_dtcs: Vec::new(),
            failed_connects: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingSettings {
    pub cycle_interval_ms: u64,
    pub reconnect_backoff_ms: u64,
    /// Fully failed cycles before the connection is dropped; 0 never drops it.
    pub max_failed_cycles: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL.as_millis() as u64,
            reconnect_backoff_ms: DEFAULT_RECONNECT_BACKOFF.as_millis() as u64,
            max_failed_cycles: DEFAULT_MAX_FAILED_CYCLES,
        }
    }
}

impl PollingSettings {
    pub const fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub const fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Integer pixel scale of the simulator window.
    pub scale: u32,
    pub ui_tick_ms: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            title: WINDOW_TITLE.to_string(),
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            scale: 1,
            ui_tick_ms: DEFAULT_UI_TICK.as_millis() as u64,
        }
    }
}

impl DisplaySettings {
    pub const fn ui_tick(&self) -> Duration {
        Duration::from_millis(self.ui_tick_ms)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `tracing` filter directive, e.g. `info` or `retro_dash=debug`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Command-line values layered over the file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub adapter: Option<AdapterKind>,
    pub address: Option<String>,
    pub device: Option<PathBuf>,
    pub scale: Option<u32>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Apply command-line overrides.
    ///
    /// An endpoint given on the command line replaces the file's endpoint and,
    /// unless an adapter kind is also given, selects the ELM327 adapter.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(address) = overrides.address {
            self.adapter.address = Some(address);
            self.adapter.device = None;
            self.adapter.kind = AdapterKind::Elm327;
        }
        if let Some(device) = overrides.device {
            self.adapter.device = Some(device);
            self.adapter.address = None;
            self.adapter.kind = AdapterKind::Elm327;
        }
        if let Some(kind) = overrides.adapter {
            self.adapter.kind = kind;
        }
        if let Some(scale) = overrides.scale {
            self.display.scale = scale;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// The file to read: an explicit path, else [`DEFAULT_CONFIG_PATH`] if it
    /// exists. `None` means run on defaults.
    pub fn source_path(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        }
    }

    /// Load an explicit file, or [`DEFAULT_CONFIG_PATH`] if it exists, or defaults.
    ///
    /// An explicitly named file must exist; the default path is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::source_path(path).map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Reject values the dashboard cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.polling.cycle_interval_ms == 0 {
            return invalid("polling.cycle_interval_ms must be > 0".into());
        }
        if self.polling.reconnect_backoff_ms == 0 {
            return invalid("polling.reconnect_backoff_ms must be > 0".into());
        }
        if self.display.ui_tick_ms == 0 {
            return invalid("display.ui_tick_ms must be > 0".into());
        }
        if self.display.scale == 0 {
            return invalid("display.scale must be > 0".into());
        }
        if self.adapter.connect_timeout_ms == 0 || self.adapter.read_timeout_ms == 0 {
            return invalid("adapter timeouts must be > 0".into());
        }

        let min_width = GAUGE_COLUMNS as u32 * GAUGE_PITCH_X;
        let min_height = status_top(gauge_rows(SENSOR_COUNT)) as u32 + 2 * STATUS_LINE_HEIGHT;
        if self.display.width < min_width || self.display.height < min_height {
            return invalid(format!(
                "display {}x{} is smaller than the gauge grid ({min_width}x{min_height})",
                self.display.width, self.display.height
            ));
        }

        if self.adapter.kind == AdapterKind::Elm327 {
            match (&self.adapter.address, &self.adapter.device) {
                (None, None) => return invalid("elm327 adapter needs adapter.address or adapter.device".into()),
                (Some(_), Some(_)) => {
                    return invalid("adapter.address and adapter.device are mutually exclusive".into());
                }
                _ => {}
            }
        }
        Ok(())
    }
}
