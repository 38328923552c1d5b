// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::CommandSpec;
use crate::errors::{EyeError, Result};
use crate::events::EventEmitter;
use crate::exec::ProcessBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the core state machine in response to `RuntimeEvent`s and
/// delegates process handling to a `ProcessBackend`.
///
/// This is a pure IO shell around `CoreRuntime`: it reads events from the
/// channel, sleeps until the debounce deadline, publishes events and starts
/// or stops children. All decisions are made by the core.
pub struct Runtime<B: ProcessBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    command: CommandSpec,
    emitter: EventEmitter,
}

impl<B: ProcessBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// Current time on Tokio's clock, so paused-time tests see consistent
/// deadlines.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl<B: ProcessBackend> Runtime<B> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        command: CommandSpec,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            command,
            emitter,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the core (first run unless lazy).
    /// - Waits for either the next `RuntimeEvent` or the debounce deadline.
    /// - Feeds each into the core and executes the returned commands.
    ///
    /// On exit the live child, if any, is stopped and awaited.
    pub async fn run(mut self) -> Result<()> {
        info!(cmd = %self.command, "eye runtime started");

        let step = self.core.start(now());
        let mut keep_running = self.execute(step.commands).await?;

        while keep_running {
            let event = match self.core.next_deadline() {
                Some(deadline) => {
                    let sleep =
                        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline));
                    tokio::select! {
                        ev = self.event_rx.recv() => ev,
                        _ = sleep => Some(RuntimeEvent::Tick),
                    }
                }
                None => self.event_rx.recv().await,
            };

            let Some(event) = event else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            if let RuntimeEvent::ChildExited { run_id, .. } = &event {
                self.backend.reap(*run_id);
            }

            let step = self.core.step(event, now());
            let commands_keep_running = self.execute(step.commands).await?;
            keep_running = step.keep_running && commands_keep_running;
        }

        self.backend.shutdown().await?;
        info!("runtime exiting");
        Ok(())
    }

    /// Execute commands from the core, in order.
    ///
    /// A failed launch is fed straight back into the core so its `failure`
    /// event is emitted before anything queued behind it. Returns whether
    /// the loop should continue.
    async fn execute(&mut self, commands: Vec<CoreCommand>) -> Result<bool> {
        let mut queue: VecDeque<CoreCommand> = commands.into();
        let mut keep_running = true;

        while let Some(command) = queue.pop_front() {
            match command {
                CoreCommand::Emit(event) => self.emitter.emit(event),
                CoreCommand::StartChild { run_id } => {
                    match self.backend.start(run_id, &self.command) {
                        Ok(()) => {}
                        Err(err @ EyeError::SpawnError { .. }) => {
                            let step = self.core.step(
                                RuntimeEvent::SpawnFailed {
                                    run_id,
                                    error: err.to_string(),
                                },
                                now(),
                            );
                            keep_running &= step.keep_running;
                            for (i, cmd) in step.commands.into_iter().enumerate() {
                                queue.insert(i, cmd);
                            }
                        }
                        Err(err) => return Err(err),
                    }
                }
                CoreCommand::StopChild { run_id, signal } => {
                    self.backend.request_kill(run_id, signal);
                }
                CoreCommand::Shutdown => {
                    info!("stopping child before exit");
                    self.backend.shutdown().await?;
                    keep_running = false;
                }
                CoreCommand::KillTimedOut { pid, .. } => {
                    warn!(pid, "giving up: child process could not be terminated");
                    return Err(EyeError::KillTimeout { pid });
                }
            }
        }

        Ok(keep_running)
    }
}
