use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Error type for config and preference files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Directory for config.toml and preferences.toml, respecting XDG_CONFIG_HOME
pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".config"))
        .join("i4check")
}

/// Default storage directory for lists, respecting XDG_DATA_HOME
pub fn default_data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".local").join("share"))
        .join("i4check")
}

/// Get the user's home directory
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read config.toml. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// The storage directory: explicit override, then config, then the XDG default
pub fn storage_dir(config: &AppConfig, override_dir: Option<&Path>) -> PathBuf {
    override_dir
        .map(Path::to_path_buf)
        .or_else(|| config.storage.dir.clone())
        .unwrap_or_else(default_data_dir)
}

/// Resolved file locations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_file: PathBuf,
    /// Lives next to the config file
    pub preferences_file: PathBuf,
    pub storage_dir: PathBuf,
}

/// Read the configuration and resolve where everything lives.
///
/// `config_override` replaces `<config_dir>/config.toml`; `data_dir_override`
/// wins over `[storage] dir`.
pub fn load_app_config(
    config_override: Option<&Path>,
    data_dir_override: Option<&Path>,
) -> Result<(AppConfig, AppPaths), ConfigError> {
    let config_file = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir().join("config.toml"));
    let config = read_config(&config_file)?;
    let preferences_file = config_file
        .parent()
        .map(|p| p.join("preferences.toml"))
        .unwrap_or_else(|| PathBuf::from("preferences.toml"));
    let storage_dir = storage_dir(&config, data_dir_override);
    Ok((
        config,
        AppPaths {
            config_file,
            preferences_file,
            storage_dir,
        },
    ))
}
