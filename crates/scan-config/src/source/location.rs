use crate::error::ConfigurationError;
use std::path::{Path, PathBuf};

/// Where resolved scan material lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A single YAML file.
    File(PathBuf),
    /// A directory and the YAML files found directly inside it, sorted by name.
    Directory { root: PathBuf, files: Vec<PathBuf> },
    /// Inline text with no target path; it must be written somewhere before use.
    Inline(String),
}

impl SourceLocation {
    /// Files to hand to the scan engine, or `None` for unmaterialized inline text.
    pub fn paths(&self) -> Option<Vec<PathBuf>> {
        match self {
            SourceLocation::File(path) => Some(vec![path.clone()]),
            SourceLocation::Directory { files, .. } => Some(files.clone()),
            SourceLocation::Inline(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, SourceLocation::Inline(_))
    }
}

pub(crate) async fn list_yaml_files(
    kind: &'static str,
    root: &Path,
) -> Result<SourceLocation, ConfigurationError> {
    let read_err = |source| ConfigurationError::ReadDirectory {
        kind,
        path: root.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(root).await.map_err(read_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let file_type = entry.file_type().await.map_err(read_err)?;
        if file_type.is_file() && is_yaml(&entry.path()) {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        return Err(ConfigurationError::EmptyDirectory {
            kind,
            path: root.to_path_buf(),
        });
    }

    files.sort();
    Ok(SourceLocation::Directory {
        root: root.to_path_buf(),
        files,
    })
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
        .unwrap_or(false)
}
