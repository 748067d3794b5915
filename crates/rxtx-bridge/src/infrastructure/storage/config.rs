//! TOML-based runtime configuration for the host binary.
//!
//! Reads and writes [`AppConfig`] from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RxtxBridge\config.toml`
//! - Linux:    `~/.config/rxtx-bridge/config.toml`
//! - macOS:    `~/Library/Application Support/RxtxBridge/config.toml`
//!
//! This file configures the host adapters only.  The device settings (SSID,
//! port, pins...) live in the EEPROM image and are edited through the menu.
//!
//! # What is TOML? (for beginners)
//!
//! TOML is a configuration file format designed to be easy to read and
//! write.  Example:
//!
//! ```toml
//! [device]
//! log_level = "debug"
//! access_point = true
//!
//! [bridge]
//! serial_path = "/dev/ttyUSB0"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so a missing file, a
//! missing section or a missing key all fall back to the built-in default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
}

/// Logging and hardware capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// The radio supports access-point mode; unlocks the `m`/`a` menu keys.
    #[serde(default)]
    pub access_point: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// File holding the EEPROM image.
    #[serde(default = "default_eeprom_path")]
    pub eeprom_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleConfig {
    /// Sleep between console polls while the menu waits for input.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Address the bridge listener binds to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// How many times the link polls for readiness before giving up.
    #[serde(default = "default_bring_up_attempts")]
    pub bring_up_attempts: u32,
    /// Sleep between bring-up polls.
    #[serde(default = "default_bring_up_interval_ms")]
    pub bring_up_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Serial device the TCP stream is forwarded to.  Without one, incoming
    /// bytes are logged and dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_path: Option<PathBuf>,
    /// Sleep between bridge-mode ticks.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpioConfig {
    /// Drive real pins through sysfs.  When off every pin reads low and
    /// writes are discarded.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_eeprom_path() -> PathBuf {
    platform_config_dir()
        .map(|dir| dir.join("eeprom.bin"))
        .unwrap_or_else(|| PathBuf::from("rxtx-eeprom.bin"))
}
fn default_poll_interval_ms() -> u32 {
    200
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_bring_up_attempts() -> u32 {
    10
}
fn default_bring_up_interval_ms() -> u64 {
    1000
}
fn default_idle_interval_ms() -> u32 {
    500
}
fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            access_point: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            eeprom_path: default_eeprom_path(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bring_up_attempts: default_bring_up_attempts(),
            bring_up_interval_ms: default_bring_up_interval_ms(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial_path: None,
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sysfs_root: default_sysfs_root(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory for this application.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RxtxBridge"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rxtx-bridge"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("RxtxBridge"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
