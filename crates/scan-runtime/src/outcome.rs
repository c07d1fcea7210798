use serde::Serialize;

/// Result of a scan that ran to completion.
///
/// Failed checks are an outcome, not an error; engine failures are reported
/// through [`ScanError`](crate::error::ScanError) instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Succeeded {
        logs: Vec<String>,
        /// Parsed result artifact, present only when it was requested.
        artifact: Option<serde_json::Value>,
    },
    ChecksFailed {
        logs: Vec<String>,
    },
}

impl ScanOutcome {
    pub fn logs(&self) -> &[String] {
        match self {
            ScanOutcome::Succeeded { logs, .. } | ScanOutcome::ChecksFailed { logs } => logs,
        }
    }

    pub fn artifact(&self) -> Option<&serde_json::Value> {
        match self {
            ScanOutcome::Succeeded { artifact, .. } => artifact.as_ref(),
            ScanOutcome::ChecksFailed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Succeeded { .. })
    }

    pub fn checks_failed(&self) -> bool {
        matches!(self, ScanOutcome::ChecksFailed { .. })
    }
}
