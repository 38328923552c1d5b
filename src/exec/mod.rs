// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`controller`] owns the single child process: spawn, stop with
//!   escalation, and exit reporting via `RuntimeEvent`s.
//! - [`backend`] provides the `ProcessBackend` trait the runtime talks to, so
//!   tests can swap in a fake that never spawns anything.
//! - [`signal`] names the stop signals.

pub mod backend;
pub mod controller;
pub mod signal;

use std::process::ExitStatus;
use std::time::{Duration, Instant};

pub use backend::ProcessBackend;
pub use controller::{ChildProcessController, DEFAULT_KILL_GRACE};
pub use signal::{KillSignal, signal_name};

/// Monotonic id of a child launch. Exit reports carry it so that late
/// notifications from an already-replaced child can be recognised.
pub type RunId = u64;

/// Reference to the live child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildHandle {
    pub run_id: RunId,
    pub pid: u32,
    pub started: Instant,
}

/// How a child ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitResult {
    /// Exit code, if the child exited on its own.
    pub exit_code: Option<i32>,
    /// Terminating signal number (unix only).
    pub signal: Option<i32>,
    /// Time from spawn to exit.
    pub duration: Duration,
}

impl ExitResult {
    pub fn from_status(status: ExitStatus, duration: Duration) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            exit_code: status.code(),
            signal,
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code to report for a failed run: the real code, or the shell
    /// convention `128 + signal` when the child died from a signal.
    pub fn failure_code(&self) -> i32 {
        match (self.exit_code, self.signal) {
            (Some(code), _) => code,
            (None, Some(sig)) => 128 + sig,
            (None, None) => -1,
        }
    }
}

/// Why a child exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    /// The command finished (or crashed) by itself.
    Natural,
    /// The supervisor stopped it. `signal` is the last signal sent;
    /// `escalated` is set when the initial signal was ignored.
    Killed { signal: KillSignal, escalated: bool },
}
