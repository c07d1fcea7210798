use crate::{
    error::ScanError, outcome::ScanOutcome, runner::ScanRunner, workspace::ScanWorkspace,
};
use scan_config::source::{ChecksSource, ConfigurationSource, Precedence};
use scan_core::{
    engine::ScanEngine,
    error::InvocationError,
    invocation::{InvocationBuilder, ScanInvocation},
};
use std::{collections::BTreeMap, path::PathBuf};
use tracing::info;

/// Caller options for a single scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Values for variables referenced in the checks.
    pub variables: BTreeMap<String, String>,
    pub verbose: bool,
    /// Where the engine should write its JSON scan result.
    pub result_artifact_path: Option<PathBuf>,
    /// Read the result artifact back into the outcome; requires `result_artifact_path`.
    pub return_parsed_result: bool,
    /// Extra environment for the engine process.
    pub env_overrides: BTreeMap<String, String>,
    pub disable_telemetry: bool,
    pub precedence: Precedence,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            variables: BTreeMap::new(),
            verbose: false,
            result_artifact_path: None,
            return_parsed_result: false,
            env_overrides: BTreeMap::new(),
            disable_telemetry: true,
            precedence: Precedence::default(),
        }
    }
}

/// Runs one Soda scan against `data_source_name`.
///
/// Inline sources are persisted (or written to a scratch file) and both sources
/// are resolved before the engine is called. Failed checks come back as
/// [`ScanOutcome::ChecksFailed`]; only engine failures are errors.
pub async fn run_scan(
    engine: &dyn ScanEngine,
    data_source_name: &str,
    configuration: &ConfigurationSource,
    checks: &ChecksSource,
    options: &ScanOptions,
) -> Result<ScanOutcome, ScanError> {
    let mut workspace = ScanWorkspace::new();
    let invocation =
        prepare_invocation(data_source_name, configuration, checks, options, &mut workspace)
            .await?;

    let mut runner = ScanRunner::new(engine, &invocation);
    let outcome = runner.run(options.return_parsed_result).await?;

    // The workspace must outlive the engine call.
    drop(workspace);
    Ok(outcome)
}

/// Persists and resolves both sources, then builds the invocation without running it.
///
/// Parameter errors are reported before anything is written to disk.
pub async fn prepare_invocation(
    data_source_name: &str,
    configuration: &ConfigurationSource,
    checks: &ChecksSource,
    options: &ScanOptions,
    workspace: &mut ScanWorkspace,
) -> Result<ScanInvocation, ScanError> {
    if options.return_parsed_result && options.result_artifact_path.is_none() {
        return Err(InvocationError::ParsedResultWithoutArtifact.into());
    }

    let builder = InvocationBuilder::new(data_source_name)
        .variables(options.variables.clone())
        .verbose(options.verbose)
        .result_artifact_path(options.result_artifact_path.clone())
        .env_overrides(options.env_overrides.clone())
        .disable_telemetry(options.disable_telemetry);
    builder.validate()?;

    configuration.persist().await?;
    checks.persist().await?;

    let configuration_location = configuration.resolve(&options.precedence).await?;
    let configuration_location = workspace
        .materialize(configuration.kind(), configuration_location)
        .await?;

    let checks_location = checks.resolve(&options.precedence).await?;
    let checks_location = workspace.materialize(checks.kind(), checks_location).await?;

    let invocation = builder
        .configuration(configuration_location)
        .checks(checks_location)
        .build()?;

    info!(
        data_source = invocation.data_source_name(),
        configuration = ?invocation.configuration_paths(),
        checks = ?invocation.checks_paths(),
        variables = invocation.variables().len(),
        "Prepared Soda scan"
    );

    Ok(invocation)
}
