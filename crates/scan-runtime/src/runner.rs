use crate::{artifact, error::ScanExecutionError, outcome::ScanOutcome};
use scan_core::{
    engine::{EngineReport, ScanEngine},
    invocation::ScanInvocation,
};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Lifecycle of a single scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Built,
    Running,
    Succeeded,
    ChecksFailed,
    Errored,
}

impl RunState {
    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Built, RunState::Running)
                | (RunState::Running, RunState::Succeeded)
                | (RunState::Running, RunState::ChecksFailed)
                | (RunState::Running, RunState::Errored)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::ChecksFailed | RunState::Errored
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Built => "built",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::ChecksFailed => "checks_failed",
            RunState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Executes one [`ScanInvocation`] and classifies what the engine reported.
pub struct ScanRunner<'a> {
    engine: &'a dyn ScanEngine,
    invocation: &'a ScanInvocation,
    state: RunState,
}

impl<'a> ScanRunner<'a> {
    pub fn new(engine: &'a dyn ScanEngine, invocation: &'a ScanInvocation) -> Self {
        Self {
            engine,
            invocation,
            state: RunState::Built,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs the scan once. A second call fails with an invalid transition.
    ///
    /// With `return_parsed_result`, a successful run also reads the result
    /// artifact; a missing or malformed artifact is an execution error.
    pub async fn run(
        &mut self,
        return_parsed_result: bool,
    ) -> Result<ScanOutcome, ScanExecutionError> {
        self.transition(RunState::Running)?;

        let invocation = self.invocation;
        let data_source = invocation.data_source_name();

        if let Some(path) = invocation.result_artifact_path() {
            if let Err(e) = artifact::clear_artifact(path).await {
                self.transition(RunState::Errored)?;
                error!(data_source, "{e}");
                return Err(e);
            }
        }

        info!(data_source, engine = self.engine.name(), "Running Soda scan");

        match self.engine.execute(invocation).await {
            EngineReport::Completed { logs } => {
                self.transition(RunState::Succeeded)?;
                self.surface(&logs);
                info!(data_source, "Soda scan completed");

                let artifact = match invocation.result_artifact_path() {
                    Some(path) if return_parsed_result => {
                        Some(artifact::read_artifact(path).await?)
                    }
                    _ => None,
                };

                Ok(ScanOutcome::Succeeded { logs, artifact })
            }
            EngineReport::ChecksFailed { logs } => {
                self.transition(RunState::ChecksFailed)?;
                self.surface(&logs);
                warn!(data_source, "Soda scan completed with failed checks");
                Ok(ScanOutcome::ChecksFailed { logs })
            }
            EngineReport::Errored(failure) => {
                self.transition(RunState::Errored)?;
                self.surface(&failure.logs);
                error!(data_source, "Soda scan failed: {}", failure.message);
                Err(ScanExecutionError::Engine {
                    message: failure.message,
                    logs: failure.logs,
                })
            }
        }
    }

    fn transition(&mut self, next: RunState) -> Result<(), ScanExecutionError> {
        if !self.state.can_transition_to(next) {
            return Err(ScanExecutionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Scan state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    // Verbose runs echo engine output at info level.
    fn surface(&self, logs: &[String]) {
        for line in logs {
            if self.invocation.is_verbose() {
                info!("{line}");
            } else {
                debug!("{line}");
            }
        }
    }
}
