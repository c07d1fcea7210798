use crate::error::InvocationError;
use scan_config::source::{Checks, Configuration, SourceKind, SourceLocation};
use serde::{Serialize, Serializer};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Everything the scan engine needs for one execution.
///
/// Built once through [`InvocationBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanInvocation {
    data_source_name: String,
    configuration_paths: Vec<PathBuf>,
    checks_paths: Vec<PathBuf>,
    variables: BTreeMap<String, String>,
    verbose: bool,
    result_artifact_path: Option<PathBuf>,
    #[serde(serialize_with = "keys_only")]
    env_overrides: BTreeMap<String, String>,
    disable_telemetry: bool,
}

impl ScanInvocation {
    pub fn builder(data_source_name: impl Into<String>) -> InvocationBuilder {
        InvocationBuilder::new(data_source_name)
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source_name
    }

    pub fn configuration_paths(&self) -> &[PathBuf] {
        &self.configuration_paths
    }

    pub fn checks_paths(&self) -> &[PathBuf] {
        &self.checks_paths
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn result_artifact_path(&self) -> Option<&Path> {
        self.result_artifact_path.as_deref()
    }

    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env_overrides
    }

    pub fn disable_telemetry(&self) -> bool {
        self.disable_telemetry
    }
}

// Override values often carry secrets; only their names are serialized.
fn keys_only<S: Serializer>(map: &BTreeMap<String, String>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(map.keys())
}

#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    data_source_name: String,
    configuration: Option<SourceLocation>,
    checks: Option<SourceLocation>,
    variables: BTreeMap<String, String>,
    verbose: bool,
    result_artifact_path: Option<PathBuf>,
    env_overrides: BTreeMap<String, String>,
    disable_telemetry: bool,
}

impl InvocationBuilder {
    pub fn new(data_source_name: impl Into<String>) -> Self {
        Self {
            data_source_name: data_source_name.into(),
            configuration: None,
            checks: None,
            variables: BTreeMap::new(),
            verbose: false,
            result_artifact_path: None,
            env_overrides: BTreeMap::new(),
            disable_telemetry: true,
        }
    }

    pub fn configuration(mut self, location: SourceLocation) -> Self {
        self.configuration = Some(location);
        self
    }

    pub fn checks(mut self, location: SourceLocation) -> Self {
        self.checks = Some(location);
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn result_artifact_path(mut self, path: Option<PathBuf>) -> Self {
        self.result_artifact_path = path;
        self
    }

    pub fn env_overrides(mut self, env: BTreeMap<String, String>) -> Self {
        self.env_overrides.extend(env);
        self
    }

    pub fn disable_telemetry(mut self, disable: bool) -> Self {
        self.disable_telemetry = disable;
        self
    }

    /// Checks everything except the source locations.
    ///
    /// Useful before touching the file system, so bad parameters fail without side effects.
    pub fn validate(&self) -> Result<(), InvocationError> {
        if self.data_source_name.trim().is_empty() {
            return Err(InvocationError::EmptyDataSource);
        }

        if let Some(name) = self
            .variables
            .keys()
            .find(|name| name.trim().is_empty() || name.contains('='))
        {
            return Err(InvocationError::InvalidVariable(name.clone()));
        }

        if let Some(key) = self
            .env_overrides
            .keys()
            .find(|key| key.is_empty() || key.contains('=') || key.contains('\0'))
        {
            return Err(InvocationError::InvalidEnvOverride(key.clone()));
        }

        Ok(())
    }

    pub fn build(self) -> Result<ScanInvocation, InvocationError> {
        self.validate()?;

        let configuration_paths = location_paths::<Configuration>(self.configuration)?;
        let checks_paths = location_paths::<Checks>(self.checks)?;

        Ok(ScanInvocation {
            data_source_name: self.data_source_name.trim().to_string(),
            configuration_paths,
            checks_paths,
            variables: self.variables,
            verbose: self.verbose,
            result_artifact_path: self.result_artifact_path,
            env_overrides: self.env_overrides,
            disable_telemetry: self.disable_telemetry,
        })
    }
}

fn location_paths<K: SourceKind>(
    location: Option<SourceLocation>,
) -> Result<Vec<PathBuf>, InvocationError> {
    let location = location.ok_or(InvocationError::MissingLocation(K::LABEL))?;
    location
        .paths()
        .ok_or(InvocationError::UnmaterializedSource(K::LABEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> SourceLocation {
        SourceLocation::File(PathBuf::from(path))
    }

    fn builder() -> InvocationBuilder {
        ScanInvocation::builder("sales")
            .configuration(file("/cfg.yaml"))
            .checks(file("/checks.yaml"))
    }

    #[test]
    fn test_build_records_every_option() {
        let invocation = builder()
            .variable("env", "prod")
            .verbose(true)
            .result_artifact_path(Some(PathBuf::from("/out.json")))
            .env_overrides(BTreeMap::from([("PGPASSWORD".into(), "s3cret".into())]))
            .build()
            .unwrap();

        assert_eq!(invocation.data_source_name(), "sales");
        assert_eq!(invocation.configuration_paths(), &[PathBuf::from("/cfg.yaml")]);
        assert_eq!(invocation.checks_paths(), &[PathBuf::from("/checks.yaml")]);
        assert_eq!(invocation.variables().get("env").map(String::as_str), Some("prod"));
        assert!(invocation.is_verbose());
        assert_eq!(invocation.result_artifact_path(), Some(Path::new("/out.json")));
        assert!(invocation.disable_telemetry());
    }

    #[test]
    fn test_empty_data_source_rejected() {
        let err = ScanInvocation::builder("  ")
            .configuration(file("/cfg.yaml"))
            .checks(file("/checks.yaml"))
            .build()
            .unwrap_err();
        assert_eq!(err, InvocationError::EmptyDataSource);
    }

    #[test]
    fn test_missing_and_unmaterialized_locations() {
        let err = ScanInvocation::builder("sales")
            .checks(file("/checks.yaml"))
            .build()
            .unwrap_err();
        assert_eq!(err, InvocationError::MissingLocation("configuration"));

        let err = ScanInvocation::builder("sales")
            .configuration(file("/cfg.yaml"))
            .checks(SourceLocation::Inline("checks for orders: []".into()))
            .build()
            .unwrap_err();
        assert_eq!(err, InvocationError::UnmaterializedSource("checks"));
    }

    #[test]
    fn test_directory_expands_to_files() {
        let invocation = ScanInvocation::builder("sales")
            .configuration(file("/cfg.yaml"))
            .checks(SourceLocation::Directory {
                root: PathBuf::from("/checks"),
                files: vec![PathBuf::from("/checks/a.yml"), PathBuf::from("/checks/b.yml")],
            })
            .build()
            .unwrap();
        assert_eq!(invocation.checks_paths().len(), 2);
    }

    #[test]
    fn test_invalid_variable_and_env_names() {
        let err = builder().variable("a=b", "c").build().unwrap_err();
        assert_eq!(err, InvocationError::InvalidVariable("a=b".into()));

        let err = builder().variable("", "c").build().unwrap_err();
        assert_eq!(err, InvocationError::InvalidVariable(String::new()));

        let err = builder()
            .env_overrides(BTreeMap::from([("BAD=KEY".into(), "v".into())]))
            .build()
            .unwrap_err();
        assert_eq!(err, InvocationError::InvalidEnvOverride("BAD=KEY".into()));
    }

    #[test]
    fn test_serialization_hides_env_values() {
        let invocation = builder()
            .env_overrides(BTreeMap::from([("PGPASSWORD".into(), "s3cret".into())]))
            .build()
            .unwrap();
        let json = serde_json::to_string(&invocation).unwrap();
        assert!(json.contains("PGPASSWORD"));
        assert!(!json.contains("s3cret"));
    }
}
