use thiserror::Error;

use super::{ConfigError, WireError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("HTTP client error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid payload: {0}")]
    Wire(#[from] WireError),
    #[error("The probe engine must be created inside a Tokio runtime: {source}")]
    NoRuntime {
        #[from]
        source: tokio::runtime::TryCurrentError,
    },
    #[error("Failed to read batch file '{path}': {source}")]
    ReadBatchFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }
}
