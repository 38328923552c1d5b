// src/report.rs

//! Human-readable rendering of supervisor events for the CLI.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::{CommandSpec, SupervisorOptions};
use crate::events::{LAUNCH_FAILURE_EXIT_CODE, SupervisorEvent};
use crate::watch::path_utils::display_path;

/// Log line for a single event.
pub fn describe(event: &SupervisorEvent, root: &Path) -> String {
    match event {
        SupervisorEvent::Executing => "executing child...".to_string(),
        SupervisorEvent::Changes { kind, path } => {
            format!("file changes detected ({kind} {})", display_path(root, path))
        }
        SupervisorEvent::Success { duration } => format!(
            "command exited without error ({}ms), waiting for changes...",
            duration.as_millis()
        ),
        SupervisorEvent::Failure {
            duration,
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
        } => format!(
            "command could not be started ({}ms), waiting for changes...",
            duration.as_millis()
        ),
        SupervisorEvent::Failure {
            duration,
            exit_code,
        } => format!(
            "command exited with code {exit_code} ({}ms), waiting for changes...",
            duration.as_millis()
        ),
        SupervisorEvent::Killed { signal } => format!("child killed ({signal})"),
    }
}

/// Startup banner listing the effective configuration.
pub fn startup_banner(command: &CommandSpec, options: &SupervisorOptions) -> String {
    let watch: Vec<String> = options
        .watch
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    format!(
        "starting with config:\n\tcommand: {command}\n\twatch: {}\n\tignore: {}",
        watch.join(", "),
        options.ignore.join(", ")
    )
}

/// Log every event from `events` until the channel closes.
pub async fn report_events(mut events: mpsc::UnboundedReceiver<SupervisorEvent>, root: &Path) {
    while let Some(event) = events.recv().await {
        let line = describe(&event, root);
        match event {
            SupervisorEvent::Failure { .. } => error!("{line}"),
            _ => info!("{line}"),
        }
    }
}
