use crate::invocation::ScanInvocation;
use async_trait::async_trait;
use std::process::ExitStatus;

pub mod in_process;
pub mod subprocess;

pub use in_process::{InProcessEngine, LibraryScan};
pub use subprocess::{DEFAULT_SODA_PROGRAM, SubprocessEngine};

/// The one exit code the Soda engine reserves for "the scan ran but checks failed".
pub const CHECKS_FAILED_EXIT_CODE: i32 = 2;

/// What the scan engine reported for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReport {
    /// The scan ran and every check passed.
    Completed { logs: Vec<String> },
    /// The scan ran but at least one check did not pass.
    ChecksFailed { logs: Vec<String> },
    /// The engine could not run the scan.
    Errored(EngineFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    /// Engine diagnostic text, verbatim when the engine provided any.
    pub message: String,
    pub logs: Vec<String>,
}

/// Translation of the engine's integer completion signal.
///
/// This is the only place integer exit codes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    Completed,
    ChecksFailed,
    Errored,
}

impl ExitDisposition {
    /// `None` means the engine never produced a code (e.g. killed by a signal).
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ExitDisposition::Completed,
            Some(CHECKS_FAILED_EXIT_CODE) => ExitDisposition::ChecksFailed,
            _ => ExitDisposition::Errored,
        }
    }

    pub fn from_status(status: &ExitStatus) -> Self {
        Self::from_code(status.code())
    }

    /// Builds the report; `failure` is only evaluated for [`ExitDisposition::Errored`].
    pub fn into_report(
        self,
        logs: Vec<String>,
        failure: impl FnOnce(&[String]) -> String,
    ) -> EngineReport {
        match self {
            ExitDisposition::Completed => EngineReport::Completed { logs },
            ExitDisposition::ChecksFailed => EngineReport::ChecksFailed { logs },
            ExitDisposition::Errored => EngineReport::Errored(EngineFailure {
                message: failure(&logs),
                logs,
            }),
        }
    }
}

/// The invocation surface of a scan engine.
///
/// Implementations never return checks-failed as an error; the typed
/// [`EngineReport`] keeps it apart from engine failures.
#[async_trait]
pub trait ScanEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, invocation: &ScanInvocation) -> EngineReport;
}

pub(crate) fn split_lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
