use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError};

use super::apply_env_overrides;
use super::defaults::DEFAULT_CONFIG_FILES;
use super::types::{ConfigFile, EngineConfig};

/// Resolves the engine configuration: defaults, then the config file (the
/// given path, or the first default file found), then `APIPROBE_*` variables.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed, or when an
/// environment override is invalid.
pub fn load_config(path: Option<&Path>) -> AppResult<EngineConfig> {
    let mut config = EngineConfig::default();

    let file_path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()),
    };

    if let Some(file_path) = file_path {
        debug!("Loading config from {}", file_path.display());
        let file = load_config_file(&file_path)?;
        config.apply_file(&file).map_err(AppError::config)?;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())
        .map_err(AppError::config)?;

    Ok(config)
}

/// Reads and parses a `.toml` or `.json` config file.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has an unsupported
/// extension, or fails to parse.
pub fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
