//! Recording errors
//!
//! Shared error type for the hook boundary, the session state machine and
//! script persistence.

use thiserror::Error;

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Failed to install input hook: {0}")]
    HookInstall(String),

    #[error("Already recording")]
    AlreadyRecording,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Recorder engine has shut down")]
    EngineStopped,
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;
