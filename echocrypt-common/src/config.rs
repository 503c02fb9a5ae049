//! Client configuration loading
//!
//! The service base URL used to be a module-level constant in the browser
//! client. Here it is resolved once into a [`ClientConfig`] that is passed to
//! every component at construction, so tests can point the client at a
//! local double.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line argument (`--api-base`)
//! 2. Environment variable (`ECHOCRYPT_API_BASE`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Service address used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment variable overriding the service address
pub const API_BASE_ENV: &str = "ECHOCRYPT_API_BASE";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration file contents
///
/// Every field is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the watermarking service
    #[serde(default)]
    pub api_base: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Waveform rendering settings (optional)
    #[serde(default)]
    pub waveform: WaveformSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Waveform rendering settings
///
/// Defaults match the bar layout of the original waveform viewer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WaveformSettings {
    /// Drawing height (pixels, or text rows scaled down by the renderer)
    #[serde(default = "default_waveform_height")]
    pub height: u32,

    /// Width of one bar
    #[serde(default = "default_bar_width")]
    pub bar_width: u32,

    /// Gap between bars
    #[serde(default = "default_bar_gap")]
    pub bar_gap: u32,

    /// Scale bars so the loudest one fills the height
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            height: default_waveform_height(),
            bar_width: default_bar_width(),
            bar_gap: default_bar_gap(),
            normalize: default_normalize(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_waveform_height() -> u32 {
    100
}

fn default_bar_width() -> u32 {
    2
}

fn default_bar_gap() -> u32 {
    1
}

fn default_normalize() -> bool {
    true
}

/// Resolved client configuration, injected into the API client and workflow
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the watermarking service, without trailing slash
    pub api_base: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    pub logging: LoggingConfig,

    pub waveform: WaveformSettings,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the base URL
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(api_base.into()),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            logging: LoggingConfig::default(),
            waveform: WaveformSettings::default(),
        }
    }

    /// Absolute URL for a service endpoint path such as `/upload`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Download locator for a server-side output file
    pub fn download_url(&self, output_file: &str) -> String {
        self.endpoint(&format!("download/{}", output_file))
    }

    /// Apply settings read from a TOML file
    fn apply_toml(&mut self, toml_config: TomlConfig) {
        if let Some(api_base) = toml_config.api_base {
            self.api_base = normalize_base(api_base);
        }
        if let Some(secs) = toml_config.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        self.logging = toml_config.logging;
        self.waveform = toml_config.waveform;
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

fn normalize_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Resolves [`ClientConfig`] from CLI, environment, TOML file and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_api_base: Option<String>,
    config_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL given on the command line (highest priority)
    pub fn with_cli_api_base(mut self, api_base: Option<String>) -> Self {
        self.cli_api_base = api_base;
        self
    }

    /// Explicit config file path; unlike the default location it must exist
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn resolve(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::default();

        match &self.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                config.apply_toml(load_toml_config(path)?);
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    config.apply_toml(load_toml_config(&path)?);
                }
                Some(path) => {
                    debug!("No config file at {}, using defaults", path.display());
                }
                None => {
                    warn!("Could not determine config directory, using defaults");
                }
            },
        }

        if let Ok(api_base) = std::env::var(API_BASE_ENV) {
            if !api_base.trim().is_empty() {
                config.api_base = normalize_base(api_base);
            }
        }

        if let Some(api_base) = &self.cli_api_base {
            config.api_base = normalize_base(api_base.clone());
        }

        if config.api_base.is_empty() {
            return Err(Error::Config("api_base must not be empty".to_string()));
        }
        if !(config.api_base.starts_with("http://") || config.api_base.starts_with("https://")) {
            return Err(Error::InvalidInput(format!(
                "api_base must be an http(s) URL: {}",
                config.api_base
            )));
        }

        Ok(config)
    }
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Default configuration file location (`<config dir>/echocrypt/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("echocrypt").join("config.toml"))
}
