// src/exec/controller.rs

//! Owner of the single supervised child process.
//!
//! Each spawned child gets a monitor task that owns the `tokio::process::Child`
//! and either waits for a natural exit or, when asked through its kill
//! channel, stops the child (graceful signal, grace period, SIGKILL) and
//! waits for it to be gone. Either way the exit is reported to the runtime as
//! [`RuntimeEvent::ChildExited`], and the monitor's join handle resolves to
//! the same [`ExitResult`].

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::CommandSpec;
use crate::engine::RuntimeEvent;
use crate::errors::{EyeError, Result};
use crate::exec::signal::{KillSignal, signal_name};
use crate::exec::{ChildHandle, ExitCause, ExitResult, RunId};

/// Default grace period between the stop signal and SIGKILL.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// How long to wait for the child after SIGKILL before giving up.
const FORCED_KILL_TIMEOUT: Duration = Duration::from_secs(5);

struct ActiveChild {
    handle: ChildHandle,
    kill_tx: Option<oneshot::Sender<KillSignal>>,
    monitor: JoinHandle<Result<ExitResult>>,
}

pub struct ChildProcessController {
    cwd: PathBuf,
    kill_grace: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    active: Option<ActiveChild>,
}

impl std::fmt::Debug for ChildProcessController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildProcessController")
            .field("cwd", &self.cwd)
            .field("kill_grace", &self.kill_grace)
            .field("active", &self.active.as_ref().map(|a| &a.handle))
            .finish()
    }
}

impl ChildProcessController {
    pub fn new(
        cwd: impl Into<PathBuf>,
        kill_grace: Duration,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            cwd: cwd.into(),
            kill_grace,
            runtime_tx,
            active: None,
        }
    }

    /// The live child, if any.
    pub fn current(&self) -> Option<&ChildHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    pub fn is_live(&self) -> bool {
        self.active.is_some()
    }

    /// Spawn `command` as run `run_id`.
    ///
    /// Fails with [`EyeError::ChildStillRunning`] if the previous child has
    /// not been reaped, and with [`EyeError::SpawnError`] if the program
    /// cannot be launched.
    pub fn start(&mut self, run_id: RunId, command: &CommandSpec) -> Result<ChildHandle> {
        if self.active.is_some() {
            return Err(EyeError::ChildStillRunning { run_id });
        }

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Own process group, so stop signals reach everything the command
        // forks (e.g. `sh -c 'a && b'`).
        #[cfg(unix)]
        cmd.process_group(0);

        let started = Instant::now();
        let child = cmd.spawn().map_err(|source| EyeError::SpawnError {
            program: command.program.clone(),
            source,
        })?;
        let pid = child.id().unwrap_or_default();

        info!(run_id, pid, cmd = %command, "child process started");

        let handle = ChildHandle {
            run_id,
            pid,
            started,
        };
        let (kill_tx, kill_rx) = oneshot::channel::<KillSignal>();
        let monitor = tokio::spawn(monitor_child(
            child,
            handle.clone(),
            self.kill_grace,
            kill_rx,
            self.runtime_tx.clone(),
        ));

        self.active = Some(ActiveChild {
            handle: handle.clone(),
            kill_tx: Some(kill_tx),
            monitor,
        });

        Ok(handle)
    }

    /// Ask the live child to stop without waiting for it.
    ///
    /// The exit arrives later as `ChildExited { cause: Killed, .. }`. Calls
    /// for a stale `run_id`, or repeated calls, are no-ops.
    pub fn request_kill(&mut self, run_id: RunId, signal: KillSignal) {
        let Some(active) = self.active.as_mut() else {
            debug!(run_id, "kill requested but no child is alive");
            return;
        };
        if active.handle.run_id != run_id {
            debug!(
                run_id,
                live = active.handle.run_id,
                "kill requested for a stale run; ignoring"
            );
            return;
        }
        match active.kill_tx.take() {
            Some(tx) => {
                info!(run_id, pid = active.handle.pid, %signal, "stopping child process");
                if tx.send(signal).is_err() {
                    debug!(run_id, "child already exited while requesting kill");
                }
            }
            None => debug!(run_id, "kill already in flight"),
        }
    }

    /// Stop the live child and wait until it is gone.
    ///
    /// Returns `Ok(None)` when no child was alive. If a kill is already in
    /// flight this simply waits for it to complete.
    pub async fn kill(&mut self, signal: KillSignal) -> Result<Option<ExitResult>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };

        if let Some(tx) = active.kill_tx.take() {
            info!(
                run_id = active.handle.run_id,
                pid = active.handle.pid,
                %signal,
                "stopping child process and waiting for exit"
            );
            let _ = tx.send(signal);
        }

        match active.monitor.await {
            Ok(res) => res.map(Some),
            Err(join_err) => Err(EyeError::Other(anyhow::anyhow!(
                "child monitor task failed: {join_err}"
            ))),
        }
    }

    /// Release the slot for `run_id` once its exit has been observed.
    pub fn reap(&mut self, run_id: RunId) {
        if self
            .active
            .as_ref()
            .is_some_and(|a| a.handle.run_id == run_id)
        {
            debug!(run_id, "reaped child process");
            self.active = None;
        }
    }
}

async fn monitor_child(
    mut child: Child,
    handle: ChildHandle,
    grace: Duration,
    mut kill_rx: oneshot::Receiver<KillSignal>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<ExitResult> {
    let run_id = handle.run_id;

    let (status, cause) = tokio::select! {
        status = child.wait() => (status?, ExitCause::Natural),
        request = &mut kill_rx => {
            // A dropped controller is treated like an immediate hard stop.
            let signal = request.unwrap_or(KillSignal::Kill);
            match stop_child(&mut child, &handle, signal, grace).await {
                Ok(stopped) => stopped,
                Err(err) => {
                    let _ = runtime_tx
                        .send(RuntimeEvent::KillFailed { run_id, pid: handle.pid })
                        .await;
                    return Err(err);
                }
            }
        }
    };

    let exit = ExitResult::from_status(status, handle.started.elapsed());
    match exit.signal {
        Some(sig) => debug!(
            run_id,
            signal = %signal_name(sig),
            ?cause,
            "child process terminated by signal"
        ),
        None => debug!(run_id, code = ?exit.exit_code, ?cause, "child process exited"),
    }

    // Deliver from a separate task: during shutdown nobody drains the
    // runtime channel and the monitor must still finish.
    let tx = runtime_tx.clone();
    let event = RuntimeEvent::ChildExited {
        run_id,
        exit: exit.clone(),
        cause,
    };
    tokio::spawn(async move {
        let _ = tx.send(event).await;
    });

    Ok(exit)
}

/// Graceful stop with escalation to SIGKILL after `grace`.
async fn stop_child(
    child: &mut Child,
    handle: &ChildHandle,
    signal: KillSignal,
    grace: Duration,
) -> Result<(ExitStatus, ExitCause)> {
    // Already gone on its own: nothing was killed.
    if let Some(status) = child.try_wait()? {
        return Ok((status, ExitCause::Natural));
    }

    send_signal(child, handle.pid, signal);

    if signal != KillSignal::Kill {
        match timeout(grace, child.wait()).await {
            Ok(status) => {
                return Ok((
                    status?,
                    ExitCause::Killed {
                        signal,
                        escalated: false,
                    },
                ));
            }
            Err(_) => {
                warn!(
                    run_id = handle.run_id,
                    pid = handle.pid,
                    grace_ms = grace.as_millis() as u64,
                    "child ignored {signal}; escalating to SIGKILL"
                );
                send_signal(child, handle.pid, KillSignal::Kill);
            }
        }
    }

    match timeout(FORCED_KILL_TIMEOUT, child.wait()).await {
        Ok(status) => Ok((
            status?,
            ExitCause::Killed {
                signal: KillSignal::Kill,
                escalated: signal != KillSignal::Kill,
            },
        )),
        Err(_) => Err(EyeError::KillTimeout { pid: handle.pid }),
    }
}

#[cfg(unix)]
fn send_signal(child: &mut Child, pid: u32, signal: KillSignal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if pid == 0 {
        let _ = child.start_kill();
        return;
    }

    // Negative pid addresses the whole process group.
    let group = Pid::from_raw(-(pid as i32));
    if let Err(err) = kill(group, signal.to_nix()) {
        debug!(pid, %signal, error = %err, "group signal failed; signalling child directly");
        if let Err(err) = kill(Pid::from_raw(pid as i32), signal.to_nix()) {
            debug!(pid, %signal, error = %err, "direct signal failed");
        }
    }
}

#[cfg(not(unix))]
fn send_signal(child: &mut Child, pid: u32, signal: KillSignal) {
    debug!(pid, %signal, "no POSIX signals on this platform; terminating child");
    let _ = child.start_kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn controller(grace_ms: u64) -> (ChildProcessController, mpsc::Receiver<RuntimeEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let ctl = ChildProcessController::new(
            std::env::temp_dir(),
            Duration::from_millis(grace_ms),
            tx,
        );
        (ctl, rx)
    }

    async fn next_exit(rx: &mut mpsc::Receiver<RuntimeEvent>) -> (RunId, ExitResult, ExitCause) {
        match timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(RuntimeEvent::ChildExited {
                run_id,
                exit,
                cause,
            })) => (run_id, exit, cause),
            other => panic!("expected a child exit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn natural_exit_is_reported_with_its_code() {
        let (mut ctl, mut rx) = controller(500);
        ctl.start(1, &CommandSpec::shell("exit 3")).unwrap();

        let (run_id, exit, cause) = next_exit(&mut rx).await;
        assert_eq!(run_id, 1);
        assert_eq!(exit.exit_code, Some(3));
        assert_eq!(cause, ExitCause::Natural);

        ctl.reap(1);
        assert!(!ctl.is_live());
    }

    #[tokio::test]
    async fn second_start_while_live_is_refused() {
        let (mut ctl, _rx) = controller(500);
        ctl.start(1, &CommandSpec::new("sleep", ["5"])).unwrap();
        assert_eq!(ctl.current().map(|h| h.run_id), Some(1));

        let err = ctl.start(2, &CommandSpec::new("true", Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, EyeError::ChildStillRunning { run_id: 2 }));

        ctl.kill(KillSignal::Terminate).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_program_is_a_spawn_error() {
        let (mut ctl, _rx) = controller(500);
        let err = ctl
            .start(1, &CommandSpec::new("bigeye-missing-binary", Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, EyeError::SpawnError { .. }));
        assert!(!ctl.is_live());
    }

    #[tokio::test]
    async fn requested_kill_is_reported_as_killed() {
        let (mut ctl, mut rx) = controller(500);
        ctl.start(4, &CommandSpec::new("sleep", ["5"])).unwrap();

        ctl.request_kill(4, KillSignal::Terminate);
        // Repeated requests are no-ops.
        ctl.request_kill(4, KillSignal::Terminate);

        let (run_id, exit, cause) = next_exit(&mut rx).await;
        assert_eq!(run_id, 4);
        assert_eq!(exit.signal, Some(15));
        assert_eq!(
            cause,
            ExitCause::Killed {
                signal: KillSignal::Terminate,
                escalated: false
            }
        );
    }

    #[tokio::test]
    async fn stubborn_child_is_escalated_to_sigkill() {
        let (mut ctl, _rx) = controller(100);
        ctl.start(1, &CommandSpec::shell("trap '' TERM; sleep 5; true"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let exit = ctl.kill(KillSignal::Terminate).await.unwrap().unwrap();
        assert_eq!(exit.signal, Some(9));
        assert!(!ctl.is_live());
    }

    #[tokio::test]
    async fn kill_without_a_child_is_a_no_op() {
        let (mut ctl, _rx) = controller(100);
        assert_eq!(ctl.kill(KillSignal::Terminate).await.unwrap(), None);
    }
}
