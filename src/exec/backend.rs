// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The runtime talks to a `ProcessBackend` instead of a concrete controller.
//! This makes it easy to swap in a fake backend in tests while keeping the
//! production implementation in [`super::controller`].
//!
//! Contract for implementors:
//! - `start` spawns synchronously and reports launch failures as
//!   [`EyeError::SpawnError`](crate::errors::EyeError::SpawnError).
//! - Exits are reported asynchronously as `RuntimeEvent::ChildExited` on the
//!   runtime channel, with `ExitCause::Killed` after a `request_kill`.
//! - `shutdown` stops any live child and resolves once it is gone.

use std::future::Future;
use std::pin::Pin;

use crate::config::CommandSpec;
use crate::errors::Result;
use crate::exec::controller::ChildProcessController;
use crate::exec::signal::KillSignal;
use crate::exec::RunId;

pub trait ProcessBackend: Send {
    fn start(&mut self, run_id: RunId, command: &CommandSpec) -> Result<()>;

    fn request_kill(&mut self, run_id: RunId, signal: KillSignal);

    fn reap(&mut self, run_id: RunId);

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

impl ProcessBackend for ChildProcessController {
    fn start(&mut self, run_id: RunId, command: &CommandSpec) -> Result<()> {
        ChildProcessController::start(self, run_id, command).map(|_| ())
    }

    fn request_kill(&mut self, run_id: RunId, signal: KillSignal) {
        ChildProcessController::request_kill(self, run_id, signal);
    }

    fn reap(&mut self, run_id: RunId) {
        ChildProcessController::reap(self, run_id);
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.kill(KillSignal::Terminate).await?;
            Ok(())
        })
    }
}
