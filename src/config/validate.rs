// src/config/validate.rs

use std::path::Path;
use std::time::Duration;

use crate::config::defaults::default_ignore;
use crate::config::model::{
    CommandSpec, DEFAULT_DELAY_MS, FileConfig, Overrides, SupervisorOptions,
};
use crate::errors::{EyeError, Result};
use crate::exec::DEFAULT_KILL_GRACE;
use crate::fs::FileSystem;
use crate::watch::path_utils::resolve_against;

/// Merge command-line overrides, the optional config file and the built-in
/// defaults into validated [`SupervisorOptions`].
///
/// Precedence is flag > file > default for every setting.
pub fn resolve_options(
    fs: &dyn FileSystem,
    cwd: &Path,
    overrides: &Overrides,
    file: Option<&FileConfig>,
) -> Result<SupervisorOptions> {
    let file_cfg = file.cloned().unwrap_or_default();

    let watch_entries: Vec<String> = if !overrides.watch.is_empty() {
        overrides.watch.clone()
    } else if let Some(watch) = file_cfg.watch {
        watch
    } else {
        vec![".".to_string()]
    };

    let watch = watch_entries
        .iter()
        .map(|entry| {
            let joined = resolve_against(cwd, Path::new(entry));
            fs.canonicalize(&joined).unwrap_or(joined)
        })
        .collect();

    let ignore = if !overrides.ignore.is_empty() {
        overrides.ignore.clone()
    } else if let Some(ignore) = file_cfg.ignore {
        ignore
    } else {
        default_ignore(fs, cwd)
    };

    let delay = match (&overrides.delay, file_cfg.delay) {
        (Some(raw), _) => parse_delay(raw)?,
        (None, Some(ms)) => delay_from_millis(ms)?,
        (None, None) => Duration::from_millis(DEFAULT_DELAY_MS),
    };

    let kill_grace = file_cfg
        .kill_grace_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_KILL_GRACE);

    let options = SupervisorOptions {
        cwd: cwd.to_path_buf(),
        watch,
        ignore,
        lazy: overrides.lazy || file_cfg.lazy.unwrap_or(false),
        delay,
        quiet: overrides.quiet || file_cfg.quiet.unwrap_or(false),
        kill_grace,
        stop_signal: Default::default(),
    };

    Ok(options)
}

/// Parse a `--delay` value given in milliseconds.
pub fn parse_delay(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let ms: i64 = trimmed.parse().map_err(|_| {
        EyeError::ConfigError(format!(
            "invalid delay '{trimmed}': expected a whole number of milliseconds"
        ))
    })?;
    delay_from_millis(ms)
}

pub fn delay_from_millis(ms: i64) -> Result<Duration> {
    if ms < 0 {
        return Err(EyeError::ConfigError(format!(
            "delay must be >= 0 milliseconds (got {ms})"
        )));
    }
    Ok(Duration::from_millis(ms as u64))
}

/// Check the invariants every supervisor relies on.
pub fn validate_options(command: &CommandSpec, options: &SupervisorOptions) -> Result<()> {
    if command.program.trim().is_empty() {
        return Err(EyeError::ConfigError(
            "command must not be empty".to_string(),
        ));
    }

    if options.watch.is_empty() {
        return Err(EyeError::ConfigError(
            "at least one watch path is required".to_string(),
        ));
    }

    Ok(())
}
