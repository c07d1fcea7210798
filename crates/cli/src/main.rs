use crate::{error::CliError, shutdown::ExitCode, shutdown::ShutdownCoordinator};
use clap::Parser;
use commands::Commands;
use scan_core::{engine::SubprocessEngine, invocation::ScanInvocation};
use scan_runtime::{prepare_invocation, run_scan, workspace::ScanWorkspace};
use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;
mod scan;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "soda-scan",
    version = "0.1.0",
    about = "Run Soda data-quality scans"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// What `validate` prints: the resolved invocation and the command it would run.
#[derive(Serialize)]
struct ValidationReport<'a> {
    invocation: &'a ScanInvocation,
    command: Vec<String>,
    environment: BTreeMap<String, String>,
    /// Inline sources written to scratch files; these are deleted when `validate` exits.
    removed_on_exit: &'a [PathBuf],
}

impl<'a> ValidationReport<'a> {
    fn new(
        engine: &SubprocessEngine,
        invocation: &'a ScanInvocation,
        workspace: &'a ScanWorkspace,
        environment: BTreeMap<String, String>,
    ) -> Self {
        Self {
            command: engine.command_line(invocation),
            invocation,
            environment,
            removed_on_exit: workspace.files(),
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.command.scan_args().verbose);

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();
    let cancel_token = shutdown.cancel_token();

    // Losing the race drops the scan future, which kills the engine process.
    let result = tokio::select! {
        result = execute(cli.command) => result,
        _ = cancel_token.cancelled() => Err(CliError::ShutdownRequested),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::for_error(&err)
        }
    };
    code.into()
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Run { scan, output } => {
            let request = scan.into_request().await?;
            let outcome = run_scan(
                &request.engine,
                &request.data_source,
                &request.configuration,
                &request.checks,
                &request.options,
            )
            .await?;

            match output {
                Some(path) => output::write_report(&outcome, &path).await?,
                None => output::print_report(&outcome)?,
            }
            Ok(ExitCode::for_outcome(&outcome))
        }
        Commands::Validate { scan, output } => {
            let request = scan.into_request().await?;
            info!("Validating scan for data source '{}'", request.data_source);

            let mut workspace = ScanWorkspace::new();
            let invocation = prepare_invocation(
                &request.data_source,
                &request.configuration,
                &request.checks,
                &request.options,
                &mut workspace,
            )
            .await?;

            let report = ValidationReport::new(
                &request.engine,
                &invocation,
                &workspace,
                request.masked_env,
            );
            match output {
                Some(path) => output::write_report(&report, &path).await?,
                None => output::print_report(&report)?,
            }
            Ok(ExitCode::Success)
        }
    }
}
