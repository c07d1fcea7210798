use crate::error::ScanExecutionError;
use std::{io, path::Path};
use tracing::debug;

/// Removes a result artifact left behind by an earlier run.
///
/// A missing file is fine; the engine has not written anything yet.
pub async fn clear_artifact(path: &Path) -> Result<(), ScanExecutionError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed previous scan result artifact");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ScanExecutionError::ArtifactClear {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads and parses the JSON result artifact written by the scan engine.
pub async fn read_artifact(path: &Path) -> Result<serde_json::Value, ScanExecutionError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScanExecutionError::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&content).map_err(|source| ScanExecutionError::ArtifactParse {
        path: path.to_path_buf(),
        source,
    })
}
