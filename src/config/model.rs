// src/config/model.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::{DEFAULT_KILL_GRACE, KillSignal};

/// Default debounce window in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 10;

/// Optional project config file (`eye.toml`).
///
/// ```toml
/// watch = ["src"]
/// ignore = ["target", "*.pyc"]
/// lazy = false
/// delay = 10
/// quiet = false
/// kill_grace_ms = 2000
/// ```
///
/// Every key is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    #[serde(default)]
    pub lazy: Option<bool>,

    /// Signed so that a negative value is reported as a configuration
    /// error instead of a TOML type error.
    #[serde(default)]
    pub delay: Option<i64>,

    #[serde(default)]
    pub quiet: Option<bool>,

    #[serde(default)]
    pub kill_grace_ms: Option<u64>,
}

/// Values given on the command line. Empty / `false` / `None` mean "not
/// given" and fall through to the config file and then the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub watch: Vec<String>,
    pub ignore: Vec<String>,
    pub lazy: bool,
    pub delay: Option<String>,
    pub quiet: bool,
}

/// The program to supervise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Run `line` through the platform shell.
    pub fn shell(line: impl Into<String>) -> Self {
        let line = line.into();
        if cfg!(windows) {
            Self::new("cmd", ["/C".to_string(), line])
        } else {
            Self::new("sh", ["-c".to_string(), line])
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Validated, immutable supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Working directory of the child; base for relative watch/ignore entries.
    pub cwd: PathBuf,
    /// Absolute paths to watch (non-empty).
    pub watch: Vec<PathBuf>,
    /// Ignore entries, compiled into an `IgnoreSet` at startup.
    pub ignore: Vec<String>,
    /// Do not run the command until the first change.
    pub lazy: bool,
    /// Debounce window.
    pub delay: Duration,
    /// Suppress supervisor output (the command's own output is untouched).
    pub quiet: bool,
    /// Grace period between the stop signal and SIGKILL.
    pub kill_grace: Duration,
    /// Signal used to stop the child before a restart.
    pub stop_signal: KillSignal,
}

impl SupervisorOptions {
    /// Options watching `cwd` itself with every other setting at its default.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        Self {
            watch: vec![cwd.clone()],
            cwd,
            ignore: Vec::new(),
            lazy: false,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            quiet: false,
            kill_grace: DEFAULT_KILL_GRACE,
            stop_signal: KillSignal::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_rejects_unknown_keys() {
        let err = toml::from_str::<FileConfig>("delay = 5\nwatchh = []\n");
        assert!(err.is_err());
    }

    #[test]
    fn file_config_accepts_partial_tables() {
        let cfg: FileConfig = toml::from_str("lazy = true\nignore = [\"target\"]\n").unwrap();
        assert_eq!(cfg.lazy, Some(true));
        assert_eq!(cfg.ignore, Some(vec!["target".to_string()]));
        assert_eq!(cfg.delay, None);
    }

    #[test]
    fn command_spec_display_joins_args() {
        let cmd = CommandSpec::new("python", ["module.py", "-v"]);
        assert_eq!(cmd.to_string(), "python module.py -v");
    }

    #[cfg(unix)]
    #[test]
    fn shell_command_uses_sh() {
        let cmd = CommandSpec::shell("make && ./a.out");
        assert_eq!(cmd.program, "sh");
        assert_eq!(cmd.args, vec!["-c".to_string(), "make && ./a.out".to_string()]);
    }
}
