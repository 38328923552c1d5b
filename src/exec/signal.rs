// src/exec/signal.rs

//! Signals the supervisor sends to its child and their display names.

use std::fmt;

/// Signal used to stop a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KillSignal {
    Interrupt,
    #[default]
    Terminate,
    Kill,
}

impl KillSignal {
    pub fn name(&self) -> &'static str {
        match self {
            KillSignal::Interrupt => "SIGINT",
            KillSignal::Terminate => "SIGTERM",
            KillSignal::Kill => "SIGKILL",
        }
    }

    #[cfg(unix)]
    pub(crate) fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;
        match self {
            KillSignal::Interrupt => Signal::SIGINT,
            KillSignal::Terminate => Signal::SIGTERM,
            KillSignal::Kill => Signal::SIGKILL,
        }
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable name for a raw signal number, e.g. `15 -> "SIGTERM"`.
pub fn signal_name(signal: i32) -> String {
    #[cfg(unix)]
    {
        if let Ok(sig) = nix::sys::signal::Signal::try_from(signal) {
            return sig.as_str().to_string();
        }
    }
    format!("signal {signal}")
}
