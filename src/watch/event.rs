// src/watch/event.rs

//! Raw change notifications as seen by the supervisor.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use notify::EventKind;
use notify::event::ModifyKind;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    /// Map a `notify` event kind onto a change kind.
    ///
    /// Access events and `Any`/`Other` notifications carry no content change
    /// and yield `None`.
    pub fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
            EventKind::Modify(_) => Some(ChangeKind::Modified),
            EventKind::Remove(_) => Some(ChangeKind::Deleted),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
    pub timestamp: Instant,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self::at(kind, path, Instant::now())
    }

    pub fn at(kind: ChangeKind, path: impl Into<PathBuf>, timestamp: Instant) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp,
        }
    }
}
