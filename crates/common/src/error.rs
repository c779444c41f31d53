//! Workspace-wide error type for configuration and persistence plumbing

use thiserror::Error;

/// Errors from loading configuration or reading/writing the session file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias using the workspace Error
pub type Result<T> = std::result::Result<T, Error>;
