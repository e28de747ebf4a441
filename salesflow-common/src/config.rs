//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Optional TOML configuration file contents
///
/// Lives at `~/.config/salesflow/config.toml` (or the platform equivalent).
/// Every field is optional; missing values fall back to environment variables
/// or compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<String>,
    pub google_api_key: Option<String>,
    pub pipedrive_api_key: Option<String>,
    pub pipedrive_base_url: Option<String>,
}

impl TomlConfig {
    /// Load the TOML config file if one exists, otherwise return defaults
    pub fn load() -> Self {
        match find_config_file() {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<TomlConfig>(&contents) {
                    Ok(config) => {
                        info!("Loaded config file: {}", path.display());
                        config
                    }
                    Err(e) => {
                        warn!("Ignoring malformed config file {}: {}", path.display(), e);
                        TomlConfig::default()
                    }
                },
                Err(e) => {
                    warn!("Could not read config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }
            },
            Err(_) => TomlConfig::default(),
        }
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `SALESFLOW_ROOT` environment variable
/// 3. TOML config file `root_folder` key
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("SALESFLOW_ROOT") {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve an API key with ENV -> TOML priority
///
/// Returns `None` when no source provides a non-empty key; the service still
/// starts and the voice/CRM endpoints report the missing configuration at
/// call time, keeping catalog and dossier features usable offline.
pub fn resolve_api_key(
    label: &str,
    env_var_name: &str,
    toml_value: Option<&String>,
) -> Option<String> {
    let env_key = std::env::var(env_var_name).ok().filter(|k| !k.trim().is_empty());
    let toml_key = toml_value.filter(|k| !k.trim().is_empty());

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in both environment and TOML config; using environment (highest priority)",
            label
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", label);
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", label);
        return Some(key.clone());
    }

    warn!("{} API key not configured (set {} or the config file)", label, env_var_name);
    None
}

/// Database file path under the root folder
pub fn database_path(root_folder: &std::path::Path) -> PathBuf {
    root_folder.join("salesflow.db")
}

/// Directory for uploaded product images under the root folder
pub fn images_dir(root_folder: &std::path::Path) -> PathBuf {
    root_folder.join("images")
}

/// Get default configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("salesflow").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/salesflow/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("salesflow"))
        .unwrap_or_else(|| PathBuf::from("./salesflow_data"))
}
