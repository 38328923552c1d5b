use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use bigeye::config::CommandSpec;
use bigeye::engine::RuntimeEvent;
use bigeye::errors::{EyeError, Result};
use bigeye::exec::{ExitCause, ExitResult, KillSignal, ProcessBackend, RunId};

/// What a fake child does once "started".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeRun {
    /// Keeps running until killed.
    StayAlive,
    /// Exits on its own with the given code.
    ExitWith(i32),
    /// Cannot be launched at all.
    FailToSpawn,
}

/// Calls observed by the fake backend, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Start(RunId),
    Kill(RunId, KillSignal),
    Shutdown,
}

/// A fake process backend that:
/// - records every call
/// - follows a script of `FakeRun`s, one per start (`StayAlive` once the
///   script runs out)
/// - reports exits straight back into the runtime channel.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    script: VecDeque<FakeRun>,
    live: Option<RunId>,
}

impl FakeBackend {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, calls: Arc<Mutex<Vec<BackendCall>>>) -> Self {
        Self {
            runtime_tx,
            calls,
            script: VecDeque::new(),
            live: None,
        }
    }

    pub fn with_script(mut self, script: impl IntoIterator<Item = FakeRun>) -> Self {
        self.script = script.into_iter().collect();
        self
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn report(&self, run_id: RunId, exit: ExitResult, cause: ExitCause) -> anyhow::Result<()> {
        debug!(run_id, ?cause, "fake child exited");
        self.runtime_tx
            .try_send(RuntimeEvent::ChildExited {
                run_id,
                exit,
                cause,
            })
            .map_err(|e| anyhow::anyhow!("cannot report exit of run {run_id}: {e}"))
    }
}

impl ProcessBackend for FakeBackend {
    fn start(&mut self, run_id: RunId, command: &CommandSpec) -> Result<()> {
        self.record(BackendCall::Start(run_id));

        match self.script.pop_front().unwrap_or(FakeRun::StayAlive) {
            FakeRun::StayAlive => {
                self.live = Some(run_id);
            }
            FakeRun::ExitWith(code) => {
                self.report(
                    run_id,
                    ExitResult {
                        exit_code: Some(code),
                        signal: None,
                        duration: Duration::from_millis(1),
                    },
                    ExitCause::Natural,
                )?;
            }
            FakeRun::FailToSpawn => {
                return Err(EyeError::SpawnError {
                    program: command.program.clone(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
                });
            }
        }
        Ok(())
    }

    fn request_kill(&mut self, run_id: RunId, signal: KillSignal) {
        self.record(BackendCall::Kill(run_id, signal));

        if self.live == Some(run_id) {
            self.live = None;
            let reported = self.report(
                run_id,
                ExitResult {
                    exit_code: None,
                    signal: Some(15),
                    duration: Duration::from_millis(1),
                },
                ExitCause::Killed {
                    signal,
                    escalated: false,
                },
            );
            if let Err(err) = reported {
                warn!(error = %err, "fake backend dropped a kill report");
            }
        }
    }

    fn reap(&mut self, run_id: RunId) {
        if self.live == Some(run_id) {
            self.live = None;
        }
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.record(BackendCall::Shutdown);
        self.live = None;
        Box::pin(async { Ok(()) })
    }
}
