use crate::{
    engine::{CHECKS_FAILED_EXIT_CODE, EngineReport, ExitDisposition, ScanEngine},
    invocation::ScanInvocation,
};
use async_trait::async_trait;

/// Raw result of a library-level scan call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryScan {
    pub exit_code: i32,
    pub logs: Vec<String>,
    /// Human readable error text, if the library exposes one.
    pub error_text: Option<String>,
}

impl LibraryScan {
    pub fn passed(logs: Vec<String>) -> Self {
        Self {
            exit_code: 0,
            logs,
            error_text: None,
        }
    }

    pub fn checks_failed(logs: Vec<String>) -> Self {
        Self {
            exit_code: CHECKS_FAILED_EXIT_CODE,
            logs,
            error_text: None,
        }
    }

    pub fn errored(exit_code: i32, error_text: impl Into<String>) -> Self {
        Self {
            exit_code,
            logs: Vec::new(),
            error_text: Some(error_text.into()),
        }
    }
}

/// Runs scans through an in-process callable instead of an external command.
///
/// The callable runs on the calling task, so long blocking scans belong on a
/// multi-threaded runtime.
pub struct InProcessEngine<F> {
    name: String,
    scan: F,
}

impl<F> InProcessEngine<F> {
    pub fn new(name: impl Into<String>, scan: F) -> Self
    where
        F: Fn(&ScanInvocation) -> LibraryScan + Send + Sync,
    {
        Self {
            name: name.into(),
            scan,
        }
    }
}

#[async_trait]
impl<F> ScanEngine for InProcessEngine<F>
where
    F: Fn(&ScanInvocation) -> LibraryScan + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, invocation: &ScanInvocation) -> EngineReport {
        let LibraryScan {
            exit_code,
            logs,
            error_text,
        } = (self.scan)(invocation);

        ExitDisposition::from_code(Some(exit_code)).into_report(logs, |_| {
            error_text.unwrap_or_else(|| format!("scan engine exited with code {exit_code}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_config::source::SourceLocation;

    fn invocation() -> ScanInvocation {
        ScanInvocation::builder("sales")
            .configuration(SourceLocation::File("/cfg.yaml".into()))
            .checks(SourceLocation::File("/checks.yaml".into()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn maps_library_codes_to_reports() {
        let passed = InProcessEngine::new("lib", |_| LibraryScan::passed(vec!["ok".into()]));
        assert_eq!(
            passed.execute(&invocation()).await,
            EngineReport::Completed {
                logs: vec!["ok".into()]
            }
        );

        let failed = InProcessEngine::new("lib", |_| LibraryScan::checks_failed(vec![]));
        assert!(matches!(
            failed.execute(&invocation()).await,
            EngineReport::ChecksFailed { .. }
        ));

        let errored =
            InProcessEngine::new("lib", |_| LibraryScan::errored(3, "connection refused"));
        match errored.execute(&invocation()).await {
            EngineReport::Errored(failure) => assert_eq!(failure.message, "connection refused"),
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_without_text_reports_the_code() {
        let engine = InProcessEngine::new("lib", |_| LibraryScan {
            exit_code: 4,
            ..Default::default()
        });
        match engine.execute(&invocation()).await {
            EngineReport::Errored(failure) => {
                assert_eq!(failure.message, "scan engine exited with code 4")
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[tokio::test]
    async fn callable_sees_the_invocation() {
        let engine = InProcessEngine::new("lib", |invocation: &ScanInvocation| {
            LibraryScan::passed(vec![format!("scanning {}", invocation.data_source_name())])
        });
        assert_eq!(
            engine.execute(&invocation()).await,
            EngineReport::Completed {
                logs: vec!["scanning sales".into()]
            }
        );
    }
}
