// src/watch/debounce.rs

//! Fixed-window debouncing of change notifications.
//!
//! The first event that arrives while no window is open starts a window of
//! `delay`. Every further event inside that window is absorbed without moving
//! the deadline, so a continuous stream of changes still produces a trigger
//! at most `delay` after it started.
//!
//! The debouncer has no timer of its own: callers pass the current
//! [`Instant`] into [`ChangeDebouncer::observe`] and [`ChangeDebouncer::poll`]
//! and sleep until [`ChangeDebouncer::deadline`] in between. Tests drive it
//! with synthetic instants.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::watch::event::{ChangeEvent, ChangeKind};
use crate::watch::patterns::IgnoreSet;

/// The single signal emitted when a window closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Kind of the event that opened the window.
    pub kind: ChangeKind,
    /// Path of the event that opened the window.
    pub path: PathBuf,
    /// How many events were collapsed into this trigger (at least 1).
    pub collapsed: usize,
}

#[derive(Debug)]
struct DebounceWindow {
    deadline: Instant,
    first: ChangeEvent,
    collapsed: usize,
}

#[derive(Debug)]
pub struct ChangeDebouncer {
    delay: Duration,
    ignore: IgnoreSet,
    window: Option<DebounceWindow>,
}

impl ChangeDebouncer {
    pub fn new(delay: Duration, ignore: IgnoreSet) -> Self {
        Self {
            delay,
            ignore,
            window: None,
        }
    }

    /// Record a change. Returns `true` if the event was accepted (not
    /// ignored), whether it opened a window or was absorbed into one.
    pub fn observe(&mut self, event: ChangeEvent, now: Instant) -> bool {
        if self.ignore.is_ignored(&event.path) {
            trace!(path = ?event.path, "change ignored");
            return false;
        }

        match self.window.as_mut() {
            Some(window) => {
                window.collapsed += 1;
                trace!(
                    path = ?event.path,
                    collapsed = window.collapsed,
                    "change absorbed into open debounce window"
                );
            }
            None => {
                let deadline = now + self.delay;
                debug!(
                    kind = %event.kind,
                    path = ?event.path,
                    delay_ms = self.delay.as_millis() as u64,
                    "opening debounce window"
                );
                self.window = Some(DebounceWindow {
                    deadline,
                    first: event,
                    collapsed: 1,
                });
            }
        }

        true
    }

    /// Deadline of the open window, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.window.as_ref().map(|w| w.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.window.is_some()
    }

    /// Close the window and hand out its trigger once `now` has reached the
    /// deadline. Each window yields exactly one trigger.
    pub fn poll(&mut self, now: Instant) -> Option<Trigger> {
        let due = self.window.as_ref().is_some_and(|w| now >= w.deadline);
        if !due {
            return None;
        }

        let window = self.window.take()?;
        debug!(
            kind = %window.first.kind,
            path = ?window.first.path,
            collapsed = window.collapsed,
            "debounce window elapsed"
        );
        Some(Trigger {
            kind: window.first.kind,
            path: window.first.path,
            collapsed: window.collapsed,
        })
    }
}
