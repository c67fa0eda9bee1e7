//! Configuration loading and assets-root resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recognition pipeline settings from the `[recognition]` table of config.toml
///
/// Every field has a compiled default so a missing file or missing table yields
/// a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Apply the confidence-enhancement pass after tier resolution
    pub enhancement_enabled: bool,
    /// Whether heuristic-tier results are surfaced to callers at all.
    /// When false, native-tier exhaustion is reported as an unresolvable call
    /// instead of falling back to derived output.
    pub surface_heuristic: bool,
    /// Timeout for a single native inference call (milliseconds)
    pub bridge_timeout_ms: u64,
    /// Timeout for native bridge initialization (milliseconds)
    pub init_timeout_ms: u64,
    /// Minimum confidence for a native prediction to be considered
    pub confidence_threshold: f64,
    /// Event bus channel capacity
    pub event_capacity: usize,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            enhancement_enabled: true,
            surface_heuristic: true,
            bridge_timeout_ms: 10_000,
            init_timeout_ms: 15_000,
            confidence_threshold: 0.25,
            event_capacity: 1000,
        }
    }
}

impl RecognitionSettings {
    /// Bridge call timeout as a Duration
    pub fn bridge_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.bridge_timeout_ms)
    }

    /// Bridge initialization timeout as a Duration
    pub fn init_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.init_timeout_ms)
    }
}

/// Full config file shape (only the tables this crate consumes)
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    recognition: RecognitionSettings,
}

/// Assets root resolution priority order:
/// 1. Explicit argument (highest priority)
/// 2. Environment variable
/// 3. `assets_root` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_assets_root(explicit: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: explicit argument
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml_content.parse::<toml::Table>() {
                if let Some(root) = config.get("assets_root").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_assets_root())
}

/// Load recognition settings, falling back to defaults when the config file or
/// `[recognition]` table is absent. Parse errors are reported rather than
/// silently defaulted so a malformed file is noticed.
pub fn load_settings(config_path: Option<&Path>) -> Result<RecognitionSettings> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => match locate_config_file() {
            Ok(p) => p,
            Err(_) => return Ok(RecognitionSettings::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    parse_settings(&content)
}

/// Parse the `[recognition]` table out of config file contents
pub fn parse_settings(toml_content: &str) -> Result<RecognitionSettings> {
    let config: ConfigFile = toml::from_str(toml_content)
        .map_err(|e| Error::Config(format!("invalid config file: {}", e)))?;
    Ok(config.recognition)
}

/// Get the configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/whisker/config.toml first, then /etc/whisker/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("whisker").join("config.toml"));
        let system_config = PathBuf::from("/etc/whisker/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("whisker").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {}",
            config_path.display()
        )))
    }
}

/// Get OS-dependent default assets root path
fn default_assets_root() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("whisker"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/whisker"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("whisker"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/whisker"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("whisker"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\whisker"))
    } else {
        PathBuf::from("./whisker_data")
    }
}
