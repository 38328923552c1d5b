// tests/real_process.rs
//
// Drives the runtime with the real `ChildProcessController` and real
// processes. File changes are injected directly into the runtime channel.

#![cfg(unix)]

use bigeye_test_utils::builders::{core_runtime, modified};
use bigeye_test_utils::{drain_after, events_until, init_tracing, next_event, with_timeout};

use std::error::Error;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use bigeye::config::CommandSpec;
use bigeye::engine::{Runtime, RuntimeEvent};
use bigeye::events::{EventEmitter, SupervisorEvent};
use bigeye::exec::ChildProcessController;

type TestResult = Result<(), Box<dyn Error>>;

struct Running {
    _dir: TempDir,
    tx: mpsc::Sender<RuntimeEvent>,
    events: mpsc::UnboundedReceiver<SupervisorEvent>,
    task: JoinHandle<bigeye::errors::Result<()>>,
}

fn supervise(command: CommandSpec, delay_ms: u64, lazy: bool) -> Running {
    let dir = tempfile::tempdir().expect("tempdir");
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let controller = ChildProcessController::new(dir.path(), Duration::from_millis(500), tx.clone());

    let mut emitter = EventEmitter::new();
    let events = emitter.subscribe();

    let runtime = Runtime::new(core_runtime(delay_ms, lazy), rx, controller, command, emitter);
    let task = tokio::spawn(runtime.run());

    Running {
        _dir: dir,
        tx,
        events,
        task,
    }
}

impl Running {
    async fn change(&self, path: &str) {
        self.tx
            .send(RuntimeEvent::FileChanged(modified(path)))
            .await
            .expect("runtime channel closed");
    }

    async fn shutdown(self) -> bigeye::errors::Result<()> {
        let _ = self.tx.send(RuntimeEvent::ShutdownRequested).await;
        with_timeout(self.task).await.expect("runtime task panicked")
    }
}

#[tokio::test]
async fn successful_command_reports_success_without_changes() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::new("echo", ["hi"]), 10, false);
    assert_eq!(events_until(&mut r.events, "success").await, vec!["executing", "success"]);
    assert!(drain_after(&mut r.events, Duration::from_millis(50)).await.is_empty());

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn success_carries_the_time_the_child_ran() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::shell("sleep 0.2"), 10, false);
    assert_eq!(next_event(&mut r.events).await, SupervisorEvent::Executing);
    match next_event(&mut r.events).await {
        SupervisorEvent::Success { duration } => {
            assert!(duration >= Duration::from_millis(200), "too short: {duration:?}");
            assert!(duration < Duration::from_secs(3), "too long: {duration:?}");
        }
        other => panic!("expected success, got {other}"),
    }

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_reports_failure_with_code() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::shell("sleep 0.1; exit 7"), 10, false);
    assert_eq!(next_event(&mut r.events).await, SupervisorEvent::Executing);
    match next_event(&mut r.events).await {
        SupervisorEvent::Failure {
            exit_code,
            duration,
        } => {
            assert_eq!(exit_code, 7);
            assert!(duration >= Duration::from_millis(100), "too short: {duration:?}");
            assert!(duration < Duration::from_secs(3), "too long: {duration:?}");
        }
        other => panic!("expected failure, got {other}"),
    }

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn child_killed_by_foreign_signal_is_a_failure() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::shell("kill -TERM $$"), 10, false);
    assert_eq!(next_event(&mut r.events).await, SupervisorEvent::Executing);
    match next_event(&mut r.events).await {
        SupervisorEvent::Failure { exit_code, .. } => assert_eq!(exit_code, 128 + 15),
        other => panic!("expected failure, got {other}"),
    }

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn missing_program_fails_to_launch_and_is_retried() -> TestResult {
    init_tracing();

    let mut r = supervise(
        CommandSpec::new("bigeye-no-such-program-xyz", Vec::<String>::new()),
        10,
        false,
    );

    assert_eq!(next_event(&mut r.events).await, SupervisorEvent::Executing);
    assert!(next_event(&mut r.events).await.is_launch_failure());

    r.change("/project/app.js").await;
    assert_eq!(
        events_until(&mut r.events, "failure").await,
        vec!["changes", "executing", "failure"]
    );

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn two_quick_changes_restart_a_long_running_child_once() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::new("sleep", ["5"]), 10, false);
    assert_eq!(next_event(&mut r.events).await, SupervisorEvent::Executing);

    r.change("/project/a.txt").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    r.change("/project/b.txt").await;

    let seen = events_until(&mut r.events, "executing").await;
    assert_eq!(seen, vec!["changes", "killed", "executing"]);

    let rest = drain_after(&mut r.events, Duration::from_millis(200)).await;
    assert!(
        rest.iter().all(|ev| !matches!(ev, SupervisorEvent::Killed { .. } | SupervisorEvent::Executing)),
        "unexpected extra restart: {rest:?}"
    );

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn lazy_mode_does_not_spawn_until_a_change() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::new("true", Vec::<String>::new()), 10, true);
    assert!(drain_after(&mut r.events, Duration::from_millis(100)).await.is_empty());

    r.change("/project/src/main.rs").await;
    assert_eq!(
        events_until(&mut r.events, "success").await,
        vec!["changes", "executing", "success"]
    );

    r.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_terminates_the_live_child() -> TestResult {
    init_tracing();

    let mut r = supervise(CommandSpec::new("sleep", ["30"]), 10, false);
    assert_eq!(next_event(&mut r.events).await, SupervisorEvent::Executing);

    // Well under the child's own lifetime.
    let started = std::time::Instant::now();
    r.shutdown().await?;
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}
