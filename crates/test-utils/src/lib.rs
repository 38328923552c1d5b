pub mod builders;
pub mod fake_backend;

use std::sync::Once;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

use bigeye::events::SupervisorEvent;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Receive the next event, failing the test after 5 seconds.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<SupervisorEvent>) -> SupervisorEvent {
    with_timeout(rx.recv())
        .await
        .expect("event channel closed")
}

/// Collect event names until one named `name` arrives (inclusive).
pub async fn events_until(
    rx: &mut mpsc::UnboundedReceiver<SupervisorEvent>,
    name: &str,
) -> Vec<&'static str> {
    let mut seen = Vec::new();
    loop {
        let ev = next_event(rx).await;
        seen.push(ev.name());
        if ev.name() == name {
            return seen;
        }
    }
}

/// Every event still buffered in `rx` after waiting `quiet_for`.
pub async fn drain_after(
    rx: &mut mpsc::UnboundedReceiver<SupervisorEvent>,
    quiet_for: Duration,
) -> Vec<SupervisorEvent> {
    tokio::time::sleep(quiet_for).await;
    let mut rest = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        rest.push(ev);
    }
    rest
}
