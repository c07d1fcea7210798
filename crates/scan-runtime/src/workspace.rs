use scan_config::{error::ConfigurationError, source::SourceLocation};
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::debug;

/// Per-run scratch directory for inline sources that have no target path.
///
/// Files live until the workspace is dropped at the end of the run.
#[derive(Debug, Default)]
pub struct ScanWorkspace {
    dir: Option<TempDir>,
    files: Vec<PathBuf>,
}

impl ScanWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scratch files written so far; they are removed with the workspace.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Writes inline text to `<kind>.yml` in the scratch directory; other locations pass through.
    pub async fn materialize(
        &mut self,
        kind: &'static str,
        location: SourceLocation,
    ) -> Result<SourceLocation, ConfigurationError> {
        let SourceLocation::Inline(text) = location else {
            return Ok(location);
        };

        let dir = match self.dir.take() {
            Some(dir) => dir,
            None => tempfile::Builder::new()
                .prefix("soda-scan-")
                .tempdir()
                .map_err(|source| ConfigurationError::Persist {
                    kind,
                    path: std::env::temp_dir(),
                    source,
                })?,
        };
        let dir = self.dir.insert(dir);

        let path = dir.path().join(format!("{kind}.yml"));
        tokio::fs::write(&path, text)
            .await
            .map_err(|source| ConfigurationError::Persist {
                kind,
                path: path.clone(),
                source,
            })?;

        debug!(kind, path = %path.display(), "Materialized inline YAML");
        self.files.push(path.clone());
        Ok(SourceLocation::File(path))
    }
}
