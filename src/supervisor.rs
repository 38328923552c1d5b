// src/supervisor.rs

//! Library entry point: build a supervisor, subscribe to its events, spawn
//! it, and shut it down.
//!
//! ```no_run
//! # async fn demo() -> bigeye::errors::Result<()> {
//! use bigeye::config::{CommandSpec, SupervisorOptions};
//!
//! let options = SupervisorOptions::new(std::env::current_dir()?);
//! let mut supervisor = bigeye::create_supervisor(CommandSpec::new("cargo", ["test"]), options)?;
//! let mut events = supervisor.subscribe();
//! let handle = supervisor.spawn()?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event}");
//! }
//! handle.shutdown().await
//! # }
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::{CommandSpec, SupervisorOptions, validate_options};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{EyeError, Result};
use crate::events::{EventEmitter, SupervisorEvent};
use crate::exec::ChildProcessController;
use crate::watch::{ChangeDebouncer, IgnoreSet, WatcherHandle, spawn_watcher};

/// Capacity of the runtime event channel.
const RUNTIME_CHANNEL_CAPACITY: usize = 64;

/// Validate `command` and `options` and build a supervisor that has not
/// started yet.
pub fn create_supervisor(command: CommandSpec, options: SupervisorOptions) -> Result<Supervisor> {
    Supervisor::new(command, options)
}

#[derive(Debug)]
pub struct Supervisor {
    command: CommandSpec,
    options: SupervisorOptions,
    emitter: EventEmitter,
}

impl Supervisor {
    pub fn new(command: CommandSpec, options: SupervisorOptions) -> Result<Self> {
        validate_options(&command, &options)?;
        Ok(Self {
            command,
            options,
            emitter: EventEmitter::new(),
        })
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    /// Receive every lifecycle event, in order. Subscribe before `spawn`
    /// to see the initial `executing`.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SupervisorEvent> {
        self.emitter.subscribe()
    }

    /// Start watching and supervising. Must be called inside a Tokio
    /// runtime.
    ///
    /// Fails with [`EyeError::WatchError`] if any watch path cannot be
    /// watched, or [`EyeError::ConfigError`] if an ignore entry is not a
    /// valid pattern; nothing is spawned in that case.
    pub fn spawn(self) -> Result<SupervisorHandle> {
        let Supervisor {
            command,
            options,
            emitter,
        } = self;

        let ignore = IgnoreSet::new(&options.cwd, &options.ignore)
            .map_err(|e| EyeError::ConfigError(format!("{e:#}")))?;
        debug!(patterns = ?ignore.patterns(), "compiled ignore set");

        let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(RUNTIME_CHANNEL_CAPACITY);

        let watcher = spawn_watcher(&options.watch, rt_tx.clone())?;

        let debouncer = ChangeDebouncer::new(options.delay, ignore);
        let core = CoreRuntime::new(
            debouncer,
            RuntimeOptions {
                lazy: options.lazy,
                stop_signal: options.stop_signal,
            },
        );
        let controller =
            ChildProcessController::new(&options.cwd, options.kill_grace, rt_tx.clone());

        let runtime = Runtime::new(core, rt_rx, controller, command, emitter);
        let task = tokio::spawn(runtime.run());

        debug!("supervisor spawned");
        Ok(SupervisorHandle {
            tx: rt_tx,
            task,
            watcher,
        })
    }
}

/// Cloneable way to request shutdown from elsewhere (e.g. a signal handler).
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl ShutdownTrigger {
    pub async fn shutdown(&self) {
        let _ = self.tx.send(RuntimeEvent::ShutdownRequested).await;
    }
}

/// A running supervisor.
#[derive(Debug)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<RuntimeEvent>,
    task: JoinHandle<Result<()>>,
    watcher: WatcherHandle,
}

impl SupervisorHandle {
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            tx: self.tx.clone(),
        }
    }

    pub fn watcher(&self) -> &WatcherHandle {
        &self.watcher
    }

    /// Stop the live child, wait for it to exit, and stop watching.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.tx.send(RuntimeEvent::ShutdownRequested).await;
        self.wait().await
    }

    /// Wait until the supervisor stops on its own (shutdown requested via a
    /// [`ShutdownTrigger`], or a fatal error).
    pub async fn wait(self) -> Result<()> {
        let SupervisorHandle {
            tx, task, watcher, ..
        } = self;
        // Our own sender must not keep the runtime channel open.
        drop(tx);
        let res = match task.await {
            Ok(res) => res,
            Err(join_err) => Err(EyeError::Other(anyhow::anyhow!(
                "supervisor task failed: {join_err}"
            ))),
        };
        drop(watcher);
        res
    }
}
