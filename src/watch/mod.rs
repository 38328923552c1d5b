// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Compiling `--ignore` entries into a glob set.
//! - Collapsing bursts of changes into single triggers (the debouncer).
//!
//! It does **not** know about child processes; it only turns filesystem
//! changes into triggers for the engine.

pub mod debounce;
pub mod event;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::{ChangeDebouncer, Trigger};
pub use event::{ChangeEvent, ChangeKind};
pub use patterns::IgnoreSet;
pub use watcher::{WatcherHandle, spawn_watcher};
