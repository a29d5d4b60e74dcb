use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ConfigError};

use super::types::WorkloadConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: WorkloadConfig,
    /// True when the file was missing and has just been written with defaults.
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            Some(_) | None => Self::Json,
        }
    }
}

/// Loads the workload config, writing a default one first when the file does
/// not exist.
///
/// # Errors
///
/// Returns an error when the file cannot be read, parsed, or created.
pub fn load_or_create_config(path: &Path) -> AppResult<LoadedConfig> {
    if path.exists() {
        return Ok(LoadedConfig {
            path: path.to_path_buf(),
            config: load_config_file(path)?,
            created: false,
        });
    }

    let config = WorkloadConfig::default();
    write_config_file(path, &config)?;
    Ok(LoadedConfig {
        path: path.to_path_buf(),
        config,
        created: true,
    })
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<WorkloadConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match ConfigFormat::for_path(path) {
        ConfigFormat::Toml => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
    }
}

fn write_config_file(path: &Path, config: &WorkloadConfig) -> AppResult<()> {
    let mut content = match ConfigFormat::for_path(path) {
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|err| AppError::config(ConfigError::SerializeToml { source: err }))?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|err| AppError::config(ConfigError::SerializeJson { source: err }))?,
    };
    if !content.ends_with('\n') {
        content.push('\n');
    }

    let write_error = |err: std::io::Error| {
        AppError::config(ConfigError::WriteConfig {
            path: path.to_path_buf(),
            source: err,
        })
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, content).map_err(write_error)
}
