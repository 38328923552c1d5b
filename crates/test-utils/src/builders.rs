#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use bigeye::config::SupervisorOptions;
use bigeye::engine::{CoreRuntime, RuntimeOptions};
use bigeye::exec::KillSignal;
use bigeye::watch::{ChangeDebouncer, ChangeEvent, ChangeKind, IgnoreSet};

/// Builder for `SupervisorOptions` to simplify test setup.
pub struct OptionsBuilder {
    options: SupervisorOptions,
}

impl OptionsBuilder {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            options: SupervisorOptions::new(cwd),
        }
    }

    /// Replace the default watch list (the cwd) on first use.
    pub fn watch(mut self, path: impl AsRef<Path>) -> Self {
        let path = self.options.cwd.join(path);
        if self.options.watch == [self.options.cwd.clone()] {
            self.options.watch.clear();
        }
        self.options.watch.push(path);
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.options.ignore.push(pattern.to_string());
        self
    }

    pub fn lazy(mut self, val: bool) -> Self {
        self.options.lazy = val;
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.options.delay = Duration::from_millis(ms);
        self
    }

    pub fn kill_grace_ms(mut self, ms: u64) -> Self {
        self.options.kill_grace = Duration::from_millis(ms);
        self
    }

    pub fn build(self) -> SupervisorOptions {
        self.options
    }
}

/// Core runtime with no ignore patterns, rooted at `/project`.
pub fn core_runtime(delay_ms: u64, lazy: bool) -> CoreRuntime {
    let debouncer = ChangeDebouncer::new(
        Duration::from_millis(delay_ms),
        IgnoreSet::empty("/project"),
    );
    CoreRuntime::new(
        debouncer,
        RuntimeOptions {
            lazy,
            stop_signal: KillSignal::Terminate,
        },
    )
}

/// A `modified` change for `path`.
pub fn modified(path: impl Into<PathBuf>) -> ChangeEvent {
    ChangeEvent::new(ChangeKind::Modified, path)
}
