use crate::error::ConfigurationError;
use std::{
    fmt,
    marker::PhantomData,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

mod location;
mod precedence;

pub use location::SourceLocation;
pub use precedence::{Precedence, SourceField};

/// Marker describing what kind of material a [`YamlSource`] carries.
pub trait SourceKind: Send + Sync + 'static {
    const LABEL: &'static str;
}

/// Connection and environment settings for data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration;

impl SourceKind for Configuration {
    const LABEL: &'static str = "configuration";
}

/// SodaCL check definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checks;

impl SourceKind for Checks {
    const LABEL: &'static str = "checks";
}

pub type ConfigurationSource = YamlSource<Configuration>;
pub type ChecksSource = YamlSource<Checks>;

pub type ConfigurationSourceBuilder = YamlSourceBuilder<Configuration>;
pub type ChecksSourceBuilder = YamlSourceBuilder<Checks>;

/// Scan material supplied as a file, a directory of files, or inline YAML.
///
/// At least one field is always set, and inline text always parses as YAML.
/// When both inline text and a file path are set, the file path is the target
/// that [`YamlSource::persist`] writes the text to.
#[derive(Clone, PartialEq, Eq)]
pub struct YamlSource<K: SourceKind> {
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
    inline: Option<String>,
    _kind: PhantomData<K>,
}

impl<K: SourceKind> YamlSource<K> {
    pub fn builder() -> YamlSourceBuilder<K> {
        YamlSourceBuilder::new()
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigurationError> {
        Self::builder().file(path).build()
    }

    pub fn from_directory(path: impl Into<PathBuf>) -> Result<Self, ConfigurationError> {
        Self::builder().directory(path).build()
    }

    pub fn from_inline(text: impl Into<String>) -> Result<Self, ConfigurationError> {
        Self::builder().inline(text).build()
    }

    pub fn kind(&self) -> &'static str {
        K::LABEL
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn inline(&self) -> Option<&str> {
        self.inline.as_deref()
    }

    /// Replaces the inline text after validating it.
    ///
    /// Blank text clears the inline option, which is only allowed while a file
    /// or directory is still set.
    pub fn set_inline(&mut self, text: impl Into<String>) -> Result<(), ConfigurationError> {
        match non_empty_text(Some(text.into())) {
            Some(text) => {
                validate_yaml::<K>(&text)?;
                self.inline = Some(text);
            }
            None if self.file.is_some() || self.directory.is_some() => self.inline = None,
            None => return Err(ConfigurationError::MissingSource { kind: K::LABEL }),
        }
        Ok(())
    }

    /// Writes the inline text verbatim to the file path, creating or truncating it.
    ///
    /// Returns the written path, or `None` when there is nothing to persist.
    pub async fn persist(&self) -> Result<Option<&Path>, ConfigurationError> {
        let (Some(text), Some(path)) = (self.inline.as_deref(), self.file.as_deref()) else {
            return Ok(None);
        };

        tokio::fs::write(path, text)
            .await
            .map_err(|source| ConfigurationError::Persist {
                kind: K::LABEL,
                path: path.to_path_buf(),
                source,
            })?;

        debug!(kind = K::LABEL, path = %path.display(), "Persisted inline YAML");
        Ok(Some(path))
    }

    /// Picks the single location the scan engine should read, following `precedence`.
    ///
    /// Selecting inline text resolves to the file path when one is set, since
    /// that is where [`YamlSource::persist`] writes it.
    pub async fn resolve(
        &self,
        precedence: &Precedence,
    ) -> Result<SourceLocation, ConfigurationError> {
        if self.has_competing_fields() {
            warn!(
                kind = K::LABEL,
                "Several {} options are set; using the first of {:?}",
                K::LABEL,
                precedence.order()
            );
        }

        for field in precedence.order() {
            match field {
                SourceField::File => {
                    if let Some(path) = &self.file {
                        return Ok(SourceLocation::File(path.clone()));
                    }
                }
                SourceField::Directory => {
                    if let Some(root) = &self.directory {
                        return location::list_yaml_files(K::LABEL, root).await;
                    }
                }
                SourceField::Inline => {
                    if let Some(text) = &self.inline {
                        return Ok(match &self.file {
                            Some(path) => SourceLocation::File(path.clone()),
                            None => SourceLocation::Inline(text.clone()),
                        });
                    }
                }
            }
        }

        Err(ConfigurationError::MissingSource { kind: K::LABEL })
    }

    // A file path with inline text is one source: the text is persisted to the path.
    fn has_competing_fields(&self) -> bool {
        let file_or_inline = self.file.is_some() || self.inline.is_some();
        file_or_inline && self.directory.is_some()
    }
}

impl<K: SourceKind> fmt::Debug for YamlSource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Inline configuration may hold credentials, so only its size is shown.
        f.debug_struct("YamlSource")
            .field("kind", &K::LABEL)
            .field("file", &self.file)
            .field("directory", &self.directory)
            .field("inline_len", &self.inline.as_ref().map(String::len))
            .finish()
    }
}

/// Collects source options; [`YamlSourceBuilder::build`] validates them.
#[derive(Debug)]
pub struct YamlSourceBuilder<K: SourceKind> {
    file: Option<PathBuf>,
    directory: Option<PathBuf>,
    inline: Option<String>,
    _kind: PhantomData<K>,
}

impl<K: SourceKind> YamlSourceBuilder<K> {
    pub fn new() -> Self {
        Self {
            file: None,
            directory: None,
            inline: None,
            _kind: PhantomData,
        }
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directory = Some(path.into());
        self
    }

    pub fn inline(mut self, text: impl Into<String>) -> Self {
        self.inline = Some(text.into());
        self
    }

    pub fn build(self) -> Result<YamlSource<K>, ConfigurationError> {
        let file = non_empty_path(self.file);
        let directory = non_empty_path(self.directory);
        let inline = non_empty_text(self.inline);

        if file.is_none() && directory.is_none() && inline.is_none() {
            return Err(ConfigurationError::MissingSource { kind: K::LABEL });
        }

        if let Some(text) = &inline {
            validate_yaml::<K>(text)?;
        }

        Ok(YamlSource {
            file,
            directory,
            inline,
            _kind: PhantomData,
        })
    }
}

impl<K: SourceKind> Default for YamlSourceBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn non_empty_text(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn validate_yaml<K: SourceKind>(text: &str) -> Result<(), ConfigurationError> {
    serde_yaml::from_str::<serde_yaml::Value>(text)
        .map(|_| ())
        .map_err(|e| ConfigurationError::InvalidYaml {
            kind: K::LABEL,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    const CONFIG_YAML: &str = r#"data_source sales:
  type: postgres
  host: localhost
  username: ${POSTGRES_USER}
"#;

    #[test]
    fn test_missing_every_option_fails() {
        let err = ConfigurationSource::builder().build().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingSource {
                kind: "configuration"
            }
        ));

        let err = ChecksSource::builder().build().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingSource { kind: "checks" }));
    }

    #[test]
    fn test_blank_options_count_as_missing() {
        let err = ConfigurationSource::builder()
            .file("")
            .directory("")
            .inline("   \n")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingSource { .. }));
    }

    #[test]
    fn test_invalid_inline_yaml_fails_at_construction() {
        let text = "checks for orders:\n  - row_count > 0\n bad: [";
        let parser_message = serde_yaml::from_str::<serde_yaml::Value>(text)
            .unwrap_err()
            .to_string();

        let err = ChecksSource::from_inline(text).unwrap_err();
        assert!(err.to_string().contains(&parser_message));
        match err {
            ConfigurationError::InvalidYaml { kind, message } => {
                assert_eq!(kind, "checks");
                assert_eq!(message, parser_message);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_file_source_construction() {
        let source = ConfigurationSource::from_file("/path/to/configuration.yaml").unwrap();
        assert_eq!(source.file(), Some(Path::new("/path/to/configuration.yaml")));
        assert_eq!(source.directory(), None);
        assert_eq!(source.inline(), None);
        assert_eq!(source.kind(), "configuration");
    }

    #[tokio::test]
    async fn persist_round_trips_inline_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configuration.yml");
        let source = ConfigurationSource::builder()
            .file(&path)
            .inline(CONFIG_YAML)
            .build()
            .unwrap();

        let written = source.persist().await.unwrap();
        assert_eq!(written, Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_YAML);
    }

    #[tokio::test]
    async fn persist_twice_keeps_latest_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checks.yml");
        std::fs::write(&path, "stale: true\nwith: many lines\nof: content\n").unwrap();

        let mut source = ChecksSource::builder()
            .file(&path)
            .inline("checks for orders:\n  - row_count > 0\n")
            .build()
            .unwrap();
        source.persist().await.unwrap();

        source
            .set_inline("checks for users:\n  - missing_count(email) = 0\n")
            .unwrap();
        source.persist().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "checks for users:\n  - missing_count(email) = 0\n"
        );
    }

    #[tokio::test]
    async fn persist_without_inline_or_target_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configuration.yml");

        let file_only = ConfigurationSource::from_file(&path).unwrap();
        assert_eq!(file_only.persist().await.unwrap(), None);
        assert!(!path.exists());

        let inline_only = ConfigurationSource::from_inline(CONFIG_YAML).unwrap();
        assert_eq!(inline_only.persist().await.unwrap(), None);
    }

    #[tokio::test]
    async fn persist_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let source = ConfigurationSource::builder()
            .file(dir.path().join("missing").join("configuration.yml"))
            .inline(CONFIG_YAML)
            .build()
            .unwrap();

        let err = source.persist().await.unwrap_err();
        assert!(matches!(err, ConfigurationError::Persist { .. }));
    }

    #[test]
    fn test_set_inline_validates() {
        let mut source = ConfigurationSource::from_inline(CONFIG_YAML).unwrap();
        assert!(source.set_inline("a: [").is_err());
        assert_eq!(source.inline(), Some(CONFIG_YAML));

        // Clearing the only option is refused.
        assert!(source.set_inline("").is_err());
    }

    #[tokio::test]
    async fn resolve_prefers_file_over_directory_and_inline() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("orders.yml"), "checks for orders: []").unwrap();

        let source = ChecksSource::builder()
            .file("/checks.yaml")
            .directory(dir.path())
            .build()
            .unwrap();
        let location = source.resolve(&Precedence::default()).await.unwrap();
        assert_eq!(location, SourceLocation::File(PathBuf::from("/checks.yaml")));
    }

    #[traced_test]
    #[tokio::test]
    async fn resolve_warns_only_when_fields_compete() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("checks.yml");
        std::fs::write(dir.path().join("orders.yml"), "checks for orders: []").unwrap();

        let persisted = ChecksSource::builder()
            .file(&target)
            .inline("checks for orders: []")
            .build()
            .unwrap();
        persisted.resolve(&Precedence::default()).await.unwrap();
        assert!(!logs_contain("Several checks options are set"));

        let competing = ChecksSource::builder()
            .file(&target)
            .directory(dir.path())
            .build()
            .unwrap();
        competing.resolve(&Precedence::default()).await.unwrap();
        assert!(logs_contain("Several checks options are set"));
    }

    #[tokio::test]
    async fn resolve_directory_before_inline() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("orders.yml"), "checks for orders: []").unwrap();

        let source = ChecksSource::builder()
            .directory(dir.path())
            .inline("checks for users: []")
            .build()
            .unwrap();
        let location = source.resolve(&Precedence::default()).await.unwrap();
        assert_eq!(
            location.paths().unwrap(),
            vec![dir.path().join("orders.yml")]
        );
    }

    #[tokio::test]
    async fn resolve_inline_without_target() {
        let source = ConfigurationSource::from_inline(CONFIG_YAML).unwrap();
        let location = source.resolve(&Precedence::default()).await.unwrap();
        assert_eq!(location, SourceLocation::Inline(CONFIG_YAML.to_string()));
    }

    #[tokio::test]
    async fn resolve_honours_custom_precedence() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("orders.yml"), "checks for orders: []").unwrap();

        let source = ChecksSource::builder()
            .directory(dir.path())
            .inline("checks for users: []")
            .build()
            .unwrap();
        let precedence: Precedence = "inline,directory,file".parse().unwrap();
        let location = source.resolve(&precedence).await.unwrap();
        assert!(location.is_inline());
    }

    #[test]
    fn test_debug_hides_inline_text() {
        let source = ConfigurationSource::from_inline("api_key_secret: hunter2").unwrap();
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("inline_len"));
    }
}
