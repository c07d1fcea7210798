use crate::runner::RunState;
use scan_config::error::ConfigurationError;
use scan_core::error::InvocationError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// The scan engine could not run, or its promised result artifact is unusable.
#[derive(Debug, Error)]
pub enum ScanExecutionError {
    /// Engine failure; `message` is the engine's own diagnostic text.
    #[error("Soda scan failed: {message}")]
    Engine { message: String, logs: Vec<String> },

    #[error("Scan result artifact {} could not be read: {source}", .path.display())]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Previous scan result artifact {} could not be removed: {source}", .path.display())]
    ArtifactClear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Scan result artifact {} is not valid JSON: {source}", .path.display())]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid scan state transition: {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },
}

/// Top-level error for one scan pipeline run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Execution(#[from] ScanExecutionError),
}
