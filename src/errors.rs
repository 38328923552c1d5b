// src/errors.rs

//! Crate-wide error type.
//!
//! Configuration and watch failures are fatal and propagate out of
//! [`crate::run`]. Spawn failures never leave the supervisor: they are turned
//! into a `failure` event by the core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EyeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to launch '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("child process {pid} did not exit after forced termination")]
    KillTimeout { pid: u32 },

    #[error("cannot start run {run_id}: a child process is still alive")]
    ChildStillRunning { run_id: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<notify::Error> for EyeError {
    fn from(err: notify::Error) -> Self {
        EyeError::WatchError(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, EyeError>;
