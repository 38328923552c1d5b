// src/events.rs

//! Public lifecycle notifications.
//!
//! A supervisor emits exactly five kinds of events. Subscribers receive them
//! in emission order over an unbounded channel, so a slow listener never
//! stalls the runtime loop.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use crate::watch::ChangeKind;

/// Exit code reported in [`SupervisorEvent::Failure`] when the command could
/// not be launched at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A child is about to be spawned.
    Executing,
    /// A debounced change was observed.
    Changes { kind: ChangeKind, path: PathBuf },
    /// The child exited with status 0.
    Success { duration: Duration },
    /// The child exited non-zero, died from a foreign signal, or could not be
    /// launched (`exit_code == LAUNCH_FAILURE_EXIT_CODE`).
    Failure { duration: Duration, exit_code: i32 },
    /// The child was terminated by the supervisor to make room for a restart.
    Killed { signal: String },
}

impl SupervisorEvent {
    /// Stable event name, as used by listeners that dispatch on names.
    pub fn name(&self) -> &'static str {
        match self {
            SupervisorEvent::Executing => "executing",
            SupervisorEvent::Changes { .. } => "changes",
            SupervisorEvent::Success { .. } => "success",
            SupervisorEvent::Failure { .. } => "failure",
            SupervisorEvent::Killed { .. } => "killed",
        }
    }

    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            SupervisorEvent::Failure {
                exit_code: LAUNCH_FAILURE_EXIT_CODE,
                ..
            }
        )
    }
}

impl fmt::Display for SupervisorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorEvent::Executing => write!(f, "executing"),
            SupervisorEvent::Changes { kind, path } => {
                write!(f, "changes({kind} {})", path.display())
            }
            SupervisorEvent::Success { duration } => {
                write!(f, "success({}ms)", duration.as_millis())
            }
            SupervisorEvent::Failure {
                duration,
                exit_code,
            } => write!(f, "failure({}ms, {exit_code})", duration.as_millis()),
            SupervisorEvent::Killed { signal } => write!(f, "killed({signal})"),
        }
    }
}

/// Fan-out of [`SupervisorEvent`]s to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventEmitter {
    subscribers: Vec<mpsc::UnboundedSender<SupervisorEvent>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SupervisorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every live subscriber; dropped receivers are pruned.
    pub fn emit(&mut self, event: SupervisorEvent) {
        trace!(event = %event, "emitting supervisor event");
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
