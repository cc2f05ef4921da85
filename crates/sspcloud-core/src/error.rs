//! Unified error types for the launch button

use thiserror::Error;

/// Unified error type for all launch button operations
#[derive(Error, Debug)]
pub enum LaunchError {
    // Forge errors
    #[error("Invalid forge: {0}")]
    InvalidForge(String),

    #[error("Forge not found: {0}")]
    ForgeNotFound(String),

    // Repository errors
    #[error("Invalid repository URL: {0}")]
    InvalidRepository(String),

    // Settings errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    // Registration errors
    #[error("Content script registration failed: {0}")]
    Registration(String),

    #[error("Storage watcher error: {0}")]
    Watcher(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using LaunchError
pub type Result<T> = std::result::Result<T, LaunchError>;
