// File: src/error.rs
// Purpose: Configuration and validation pass errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors from parsing or loading option overrides
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML options: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read options file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a validation pass.
///
/// Field failures are not errors; they end up in the report and the document.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The host renderer failed; passed through as is
    #[error(transparent)]
    Render(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ValidateError>;
