//! Error types for CLI operations.

use contracts::ContractError;
use session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration failed to load or validate
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// Session could not start or stop
    #[error("Session failed: {0}")]
    Session(#[from] SessionError),

    /// Overlay export error
    #[error("Failed to write overlay: {0}")]
    Overlay(#[from] overlay::OverlayError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
