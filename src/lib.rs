// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod supervisor;
pub mod watch;

pub use supervisor::{ShutdownTrigger, Supervisor, SupervisorHandle, create_supervisor};

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_command, discover, resolve_options};
use crate::fs::RealFileSystem;

/// How `run` ended, mapped to the process exit status by `main.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The supervisor ran and was shut down.
    Finished,
    /// No command was given and none could be derived; usage was printed.
    ShowedUsage,
}

impl RunOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Finished => 0,
            RunOutcome::ShowedUsage => cli::USAGE_EXIT_CODE,
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config discovery and merging with the flags
/// - command resolution (explicit, or `npm start` from package.json)
/// - the supervisor itself
/// - the event reporter
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<RunOutcome> {
    let cwd = std::env::current_dir()?;
    run_in(args, &cwd).await
}

/// [`run`] with an explicit working directory.
pub async fn run_in(args: CliArgs, cwd: &Path) -> Result<RunOutcome> {
    let fs = RealFileSystem;
    let cwd = cwd.to_path_buf();

    let file_cfg = discover(&fs, &cwd, args.config.as_deref())?;
    let options = resolve_options(&fs, &cwd, &args.overrides(), file_cfg.as_ref())?;

    let Some(command) = cli::parse_command(&args.command).or_else(|| default_command(&fs, &cwd))
    else {
        cli::print_help();
        return Ok(RunOutcome::ShowedUsage);
    };
    debug!(%command, ?options, "resolved configuration");

    let quiet = options.quiet;
    let mut supervisor = create_supervisor(command, options)?;

    // Subscribe before spawning so the first `executing` is not missed.
    let reporter = if quiet {
        None
    } else {
        info!("{}", report::startup_banner(supervisor.command(), supervisor.options()));
        let events = supervisor.subscribe();
        let root = supervisor.options().cwd.clone();
        Some(tokio::spawn(async move {
            report::report_events(events, &root).await;
        }))
    };

    let handle = supervisor.spawn()?;

    // Ctrl-C → graceful shutdown.
    {
        let trigger = handle.shutdown_trigger();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            trigger.shutdown().await;
        });
    }

    let result = handle.wait().await;

    // The emitter is dropped with the runtime, which ends the reporter.
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    result?;
    info!("eye exiting");
    Ok(RunOutcome::Finished)
}
