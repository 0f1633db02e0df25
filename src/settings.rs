use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{SETTINGS_DIR_NAME, SETTINGS_FILE_NAME};
use crate::error::{GateError, GateResult};

/// Optional settings file. Every key mirrors a `check` option.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GateSettings {
    pub app_name: Option<String>,
    pub target_build: Option<String>,
    pub target_version: Option<String>,
    pub baseline_build: Option<String>,
    pub baseline_version: Option<String>,
    pub api_token: Option<String>,
    pub server_url: Option<String>,
    pub comparison_strategy: Option<String>,
    pub slow_requests_allowed: Option<u64>,
    pub excessive_io_allowed: Option<u64>,
    pub exceptions_allowed: Option<u64>,
    pub sla_global_limit: Option<u64>,
    pub issue_types: Option<Vec<String>>,
    pub params: Option<Vec<String>>,
    pub update_default_baseline: Option<bool>,
    pub description_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

/// Load an explicitly requested settings file. Missing or malformed files are errors.
pub fn load_settings(path: &Path) -> GateResult<GateSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GateError::config(format!("Cannot read settings file {:?}: {}", path, e))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| GateError::config(format!("Invalid settings file {:?}: {}", path, e)))
}

/// Load the implicit settings file, falling back to defaults.
pub fn load_settings_or_default(path: &Path) -> GateSettings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring invalid settings file {:?}: {}", path, e);
            GateSettings::default()
        }),
        Err(_) => {
            debug!("No settings file at {:?}", path);
            GateSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &GateSettings) -> GateResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}
