// src/engine/mod.rs

//! Supervision engine.
//!
//! The pure state machine lives in [`core`]: it owns the debouncer and the
//! [`RunState`], consumes [`RuntimeEvent`]s together with the current time
//! and answers with [`CoreCommand`]s. The async shell in [`runtime`] reads
//! events from a channel, sleeps until the debounce deadline, and carries
//! the commands out against a [`crate::exec::ProcessBackend`].

use std::time::Instant;

use crate::exec::{ExitCause, ExitResult, KillSignal, RunId};
use crate::watch::ChangeEvent;

/// Phase of the single managed child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Nothing has run yet.
    Idle,
    /// A child for `run_id` is alive (or being launched).
    Executing {
        run_id: RunId,
        started: Instant,
        /// A stop was requested and a restart follows the exit.
        restart_pending: bool,
    },
    /// The last run finished; waiting for the next trigger.
    AwaitingChange,
}

/// Options read by the core.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Defer the first run until the first trigger.
    pub lazy: bool,
    /// Signal used to stop a child before restarting it.
    pub stop_signal: KillSignal,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            lazy: false,
            stop_signal: KillSignal::Terminate,
        }
    }
}

/// Events flowing into the runtime from the watcher, the process backend
/// and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Raw filesystem change.
    FileChanged(ChangeEvent),
    /// The debounce deadline may have passed.
    Tick,
    /// The child of `run_id` is gone.
    ChildExited {
        run_id: RunId,
        exit: ExitResult,
        cause: ExitCause,
    },
    /// The backend could not launch `run_id`.
    SpawnFailed { run_id: RunId, error: String },
    /// The child of `run_id` survived SIGKILL.
    KillFailed { run_id: RunId, pid: u32 },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use runtime::Runtime;
