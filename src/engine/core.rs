// src/engine/core.rs

//! Pure supervision state machine.
//!
//! `CoreRuntime` is synchronous and deterministic: it performs no IO, owns
//! no channels and reads no clock. Every call takes the current [`Instant`]
//! and returns a [`CoreStep`] listing what the shell should do. This keeps
//! the restart rules unit-testable with a logical clock.
//!
//! Rules:
//! - a trigger while idle or awaiting change emits `changes` and starts a run;
//! - a trigger while executing emits `changes` and asks for the child to be
//!   stopped; the restart happens once its exit is confirmed;
//! - further triggers while a stop is in flight are coalesced into that one
//!   restart;
//! - exits of runs that are no longer current are ignored.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::{RunState, RuntimeEvent, RuntimeOptions};
use crate::events::{LAUNCH_FAILURE_EXIT_CODE, SupervisorEvent};
use crate::exec::{ExitCause, ExitResult, KillSignal, RunId};
use crate::watch::{ChangeDebouncer, Trigger};

/// Command produced by the core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Publish a lifecycle event to subscribers.
    Emit(SupervisorEvent),
    /// Spawn the command as `run_id`.
    StartChild { run_id: RunId },
    /// Stop the child of `run_id`; its exit is reported later.
    StopChild { run_id: RunId, signal: KillSignal },
    /// Stop any live child and wait for it before the loop ends.
    Shutdown,
    /// The child of `run_id` could not be terminated.
    KillTimedOut { run_id: RunId, pid: u32 },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    /// Just the emitted events, in order.
    pub fn events(&self) -> Vec<&SupervisorEvent> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Emit(ev) => Some(ev),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct CoreRuntime {
    state: RunState,
    debouncer: ChangeDebouncer,
    options: RuntimeOptions,
    next_run_id: RunId,
    stopping: bool,
}

impl CoreRuntime {
    pub fn new(debouncer: ChangeDebouncer, options: RuntimeOptions) -> Self {
        Self {
            state: RunState::Idle,
            debouncer,
            options,
            next_run_id: 1,
            stopping: false,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Run id of the child currently alive or being stopped.
    pub fn current_run(&self) -> Option<RunId> {
        match self.state {
            RunState::Executing { run_id, .. } => Some(run_id),
            _ => None,
        }
    }

    /// When the shell should wake up to close the debounce window.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.stopping {
            return None;
        }
        self.debouncer.deadline()
    }

    /// Leave `Idle`: run immediately, or wait for the first change in lazy
    /// mode.
    pub fn start(&mut self, now: Instant) -> CoreStep {
        let mut commands = Vec::new();

        if self.state != RunState::Idle {
            return CoreStep::running(commands);
        }

        if self.options.lazy {
            info!("lazy mode: waiting for changes before the first run");
            self.state = RunState::AwaitingChange;
        } else {
            self.launch(now, &mut commands);
        }

        CoreStep::running(commands)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent, now: Instant) -> CoreStep {
        let mut commands = Vec::new();

        match event {
            RuntimeEvent::FileChanged(change) => {
                if !self.stopping {
                    self.debouncer.observe(change, now);
                    self.poll_trigger(now, &mut commands);
                }
            }
            RuntimeEvent::Tick => {
                if !self.stopping {
                    self.poll_trigger(now, &mut commands);
                }
            }
            RuntimeEvent::ChildExited {
                run_id,
                exit,
                cause,
            } => self.handle_exit(run_id, exit, cause, now, &mut commands),
            RuntimeEvent::SpawnFailed { run_id, error } => {
                self.handle_spawn_failure(run_id, &error, now, &mut commands)
            }
            RuntimeEvent::KillFailed { run_id, pid } => {
                warn!(run_id, pid, "child survived forced termination");
                self.stopping = true;
                return CoreStep {
                    commands: vec![CoreCommand::KillTimedOut { run_id, pid }],
                    keep_running: false,
                };
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                self.stopping = true;
                return CoreStep {
                    commands: vec![CoreCommand::Shutdown],
                    keep_running: false,
                };
            }
        }

        CoreStep::running(commands)
    }

    fn poll_trigger(&mut self, now: Instant, commands: &mut Vec<CoreCommand>) {
        if let Some(trigger) = self.debouncer.poll(now) {
            self.handle_trigger(trigger, now, commands);
        }
    }

    fn handle_trigger(&mut self, trigger: Trigger, now: Instant, commands: &mut Vec<CoreCommand>) {
        commands.push(CoreCommand::Emit(SupervisorEvent::Changes {
            kind: trigger.kind,
            path: trigger.path,
        }));

        let RunState::Executing {
            run_id,
            restart_pending,
            ..
        } = &mut self.state
        else {
            self.launch(now, commands);
            return;
        };

        if *restart_pending {
            debug!(run_id = *run_id, "restart already in flight; coalescing trigger");
        } else {
            *restart_pending = true;
            debug!(run_id = *run_id, "change while executing; stopping child");
            commands.push(CoreCommand::StopChild {
                run_id: *run_id,
                signal: self.options.stop_signal,
            });
        }
    }

    fn handle_exit(
        &mut self,
        exited: RunId,
        exit: ExitResult,
        cause: ExitCause,
        now: Instant,
        commands: &mut Vec<CoreCommand>,
    ) {
        let RunState::Executing {
            run_id,
            restart_pending,
            ..
        } = self.state
        else {
            debug!(run_id = exited, "exit reported while no run is active; ignoring");
            return;
        };

        if run_id != exited {
            debug!(run_id = exited, current = run_id, "exit of a stale run; ignoring");
            return;
        }

        match cause {
            ExitCause::Killed { signal, escalated } => {
                debug!(run_id, %signal, escalated, "child stopped by supervisor");
                commands.push(CoreCommand::Emit(SupervisorEvent::Killed {
                    signal: signal.name().to_string(),
                }));
            }
            ExitCause::Natural if exit.success() => {
                commands.push(CoreCommand::Emit(SupervisorEvent::Success {
                    duration: exit.duration,
                }));
            }
            ExitCause::Natural => {
                commands.push(CoreCommand::Emit(SupervisorEvent::Failure {
                    duration: exit.duration,
                    exit_code: exit.failure_code(),
                }));
            }
        }

        if restart_pending && !self.stopping {
            self.launch(now, commands);
        } else {
            self.state = RunState::AwaitingChange;
        }
    }

    fn handle_spawn_failure(
        &mut self,
        failed: RunId,
        error: &str,
        now: Instant,
        commands: &mut Vec<CoreCommand>,
    ) {
        let RunState::Executing { run_id, started, .. } = self.state else {
            return;
        };
        if run_id != failed {
            return;
        }

        warn!(run_id, %error, "command could not be launched");
        commands.push(CoreCommand::Emit(SupervisorEvent::Failure {
            duration: now.saturating_duration_since(started),
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
        }));
        self.state = RunState::AwaitingChange;
    }

    fn launch(&mut self, now: Instant, commands: &mut Vec<CoreCommand>) {
        let run_id = self.next_run_id;
        self.next_run_id += 1;

        commands.push(CoreCommand::Emit(SupervisorEvent::Executing));
        commands.push(CoreCommand::StartChild { run_id });

        self.state = RunState::Executing {
            run_id,
            started: now,
            restart_pending: false,
        };
    }
}
