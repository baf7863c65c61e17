//! Driver configuration and persistence.
//!
//! Handles loading and saving the tuning file. Cross-platform: uses the
//! config directory of each OS. Device state is never written here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BladeError, Result};
use crate::transport::HidTiming;

// =============================================================================
// Config Path
// =============================================================================

const APP_NAME: &str = "razer-rust";
const CONFIG_FILE: &str = "config.json";

/// Get the configuration directory path.
/// - Linux: ~/.config/razer-rust/
/// - Windows: %APPDATA%\razer-rust\
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| BladeError::Config("Could not find config directory".into()))
}

/// Get the full path to the config file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

// =============================================================================
// AppConfig
// =============================================================================

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Delay between a request and reading its answer, in microseconds
    #[serde(default = "default_response_delay_us")]
    pub response_delay_us: u64,

    /// Delay between reads while the controller is busy, in microseconds
    #[serde(default = "default_busy_poll_us")]
    pub busy_poll_us: u64,

    /// Give up on a busy controller after this many milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Product id to open when several laptops are attached
    #[serde(default)]
    pub default_pid: Option<u16>,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_response_delay_us() -> u64 {
    1000
}

fn default_busy_poll_us() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_log_filter() -> String {
    "razer_rust_devices=info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            response_delay_us: default_response_delay_us(),
            busy_poll_us: default_busy_poll_us(),
            timeout_ms: default_timeout_ms(),
            default_pid: None,
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Transport timing from the configured delays.
    pub fn timing(&self) -> HidTiming {
        HidTiming {
            response_delay: Duration::from_micros(self.response_delay_us),
            busy_poll: Duration::from_micros(self.busy_poll_us),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

// =============================================================================
// Storage Functions
// =============================================================================

/// Load configuration from disk.
///
/// Uses `path` when given, the default location otherwise. A missing file
/// yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_config_path()?,
    };

    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| BladeError::Config(format!("Failed to read config: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| BladeError::Config(format!("Failed to parse config: {}", e)))
}

/// Save configuration to disk.
pub fn save_config(config: &AppConfig, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_config_path()?,
    };

    // Create directory if needed
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| BladeError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| BladeError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(&path, content)
        .map_err(|e| BladeError::Config(format!("Failed to write config: {}", e)))?;

    Ok(path)
}
