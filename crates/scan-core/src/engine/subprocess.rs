use crate::{
    engine::{EngineFailure, EngineReport, ExitDisposition, ScanEngine, split_lines},
    invocation::ScanInvocation,
};
use async_trait::async_trait;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::process::Command;
use tracing::{debug, error};

pub const DEFAULT_SODA_PROGRAM: &str = "soda";

/// Standard OpenTelemetry switch; Soda Core reports usage through OpenTelemetry.
const TELEMETRY_ENV: &str = "OTEL_SDK_DISABLED";

/// Runs scans through the `soda scan` command line.
///
/// The child is killed if the returned future is dropped, so a host that
/// cancels a run does not leave the scan running.
#[derive(Debug, Clone)]
pub struct SubprocessEngine {
    program: PathBuf,
}

impl SubprocessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `scan -d NAME -c CFG... [-v NAME=VALUE]... [-V] [-srf PATH] CHECKS...`
    pub fn arguments(&self, invocation: &ScanInvocation) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["scan".into(), "-d".into()];
        args.push(invocation.data_source_name().into());

        for path in invocation.configuration_paths() {
            args.push("-c".into());
            args.push(path.into());
        }

        for (name, value) in invocation.variables() {
            args.push("-v".into());
            args.push(format!("{name}={value}").into());
        }

        if invocation.is_verbose() {
            args.push("-V".into());
        }

        if let Some(path) = invocation.result_artifact_path() {
            args.push("-srf".into());
            args.push(path.into());
        }

        args.extend(invocation.checks_paths().iter().map(OsString::from));
        args
    }

    /// The full command line, for logging and inspection.
    pub fn command_line(&self, invocation: &ScanInvocation) -> Vec<String> {
        std::iter::once(self.program.as_os_str().to_os_string())
            .chain(self.arguments(invocation))
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

impl Default for SubprocessEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SODA_PROGRAM)
    }
}

#[async_trait]
impl ScanEngine for SubprocessEngine {
    fn name(&self) -> &str {
        "soda-cli"
    }

    async fn execute(&self, invocation: &ScanInvocation) -> EngineReport {
        let mut command = Command::new(&self.program);
        command
            .args(self.arguments(invocation))
            .envs(invocation.env_overrides())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if invocation.disable_telemetry() {
            command.env(TELEMETRY_ENV, "true");
        }

        debug!("Command is: {}", self.command_line(invocation).join(" "));

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                error!(
                    "Failed to launch scan engine '{}': {}",
                    self.program.display(),
                    e
                );
                return EngineReport::Errored(EngineFailure {
                    message: format!(
                        "failed to launch scan engine '{}': {e}",
                        self.program.display()
                    ),
                    logs: Vec::new(),
                });
            }
        };

        let logs = split_lines(&output.stdout);
        ExitDisposition::from_status(&output.status).into_report(logs, |logs| {
            failure_message(&output.status, &output.stderr, logs)
        })
    }
}

/// Prefers the engine's stderr, then its stdout, then the bare exit status.
fn failure_message(status: &ExitStatus, stderr: &[u8], logs: &[String]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    if !logs.is_empty() {
        return logs.join("\n");
    }
    format!("scan engine exited with {status}")
}
