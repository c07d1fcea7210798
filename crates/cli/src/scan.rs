use crate::{
    commands::{CloudArgs, ScanArgs},
    env::EnvManager,
    error::CliError,
};
use scan_config::{
    credentials::SodaCloudCredentials,
    source::{
        ChecksSource, ConfigurationSource, Precedence, SourceKind, SourceLocation, YamlSource,
        YamlSourceBuilder,
    },
};
use scan_core::engine::SubprocessEngine;
use scan_runtime::ScanOptions;
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, info};

/// A scan assembled from command line arguments, ready to hand to the pipeline.
#[derive(Debug)]
pub struct ScanRequest {
    pub data_source: String,
    pub configuration: ConfigurationSource,
    pub checks: ChecksSource,
    pub options: ScanOptions,
    pub engine: SubprocessEngine,
    /// Engine environment with sensitive values masked, for reports.
    pub masked_env: BTreeMap<String, String>,
}

impl ScanArgs {
    pub async fn into_request(self) -> Result<ScanRequest, CliError> {
        let mut env = EnvManager::new();
        if let Some(path) = &self.env_file {
            env.load_from_file(path)?;
        }
        for (key, value) in &self.env {
            env.set(key, value);
        }
        let masked_env = env.masked();
        debug!(env = ?masked_env, "Engine environment overrides");

        let checks = build_source(
            ChecksSource::builder(),
            self.checks_file.as_deref(),
            self.checks_dir.as_deref(),
            self.checks_inline.as_deref(),
        )?;
        let configuration = self.configuration_source().await?;

        let options = ScanOptions {
            variables: self.vars.into_iter().collect(),
            verbose: self.verbose,
            result_artifact_path: self.result_file,
            return_parsed_result: self.parse_result,
            env_overrides: env.into_vars(),
            disable_telemetry: !self.keep_telemetry,
            precedence: self.precedence,
        };

        Ok(ScanRequest {
            data_source: self.data_source,
            configuration,
            checks,
            options,
            engine: SubprocessEngine::new(self.soda_bin),
            masked_env,
        })
    }

    async fn configuration_source(&self) -> Result<ConfigurationSource, CliError> {
        let source = build_source(
            ConfigurationSource::builder(),
            self.config_file.as_deref(),
            self.config_dir.as_deref(),
            self.config_inline.as_deref(),
        )?;

        match self.cloud.credentials()? {
            Some(credentials) => with_credentials(source, &credentials, &self.precedence).await,
            None => Ok(source),
        }
    }
}

fn build_source<K: SourceKind>(
    mut builder: YamlSourceBuilder<K>,
    file: Option<&Path>,
    directory: Option<&Path>,
    inline: Option<&str>,
) -> Result<YamlSource<K>, CliError> {
    if let Some(path) = file {
        builder = builder.file(path);
    }
    if let Some(path) = directory {
        builder = builder.directory(path);
    }
    if let Some(text) = inline {
        builder = builder.inline(text);
    }
    Ok(builder.build()?)
}

/// Merges Soda Cloud credentials into the configuration that would be used.
///
/// The result is inline only, so credentials are never written into the
/// user's configuration file; they land in the per-run scratch directory.
async fn with_credentials(
    source: ConfigurationSource,
    credentials: &SodaCloudCredentials,
    precedence: &Precedence,
) -> Result<ConfigurationSource, CliError> {
    source.persist().await?;

    let base = match source.resolve(precedence).await? {
        SourceLocation::Inline(text) => text,
        SourceLocation::File(path) => tokio::fs::read_to_string(&path).await?,
        SourceLocation::Directory { root, .. } => {
            return Err(CliError::Config(format!(
                "Soda Cloud credentials cannot be merged into configuration directory {}",
                root.display()
            )));
        }
    };

    info!(host = credentials.host(), "Adding Soda Cloud credentials to the configuration");
    Ok(ConfigurationSource::from_inline(credentials.merge_into(&base)?)?)
}

impl CloudArgs {
    pub fn credentials(&self) -> Result<Option<SodaCloudCredentials>, CliError> {
        match (&self.soda_cloud_api_key_id, &self.soda_cloud_api_key_secret) {
            (None, None) => Ok(None),
            (Some(id), Some(secret)) => {
                let credentials = SodaCloudCredentials::new(id, secret)?;
                Ok(Some(match &self.soda_cloud_host {
                    Some(host) => credentials.with_host(host),
                    None => credentials,
                }))
            }
            _ => Err(CliError::Config(
                "Soda Cloud needs both an API key id and an API key secret".into(),
            )),
        }
    }
}
