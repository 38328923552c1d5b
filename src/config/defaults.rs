// src/config/defaults.rs

//! Defaults derived from the working directory: the ignore list from
//! `.gitignore` and the `npm start` fallback command.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::model::CommandSpec;
use crate::fs::FileSystem;

/// Always ignored, regardless of `.gitignore`.
pub const ALWAYS_IGNORED: &[&str] = &[".git"];

/// Ignore entries used when neither the command line nor the config file
/// names any: [`ALWAYS_IGNORED`] plus the plain entries of `cwd/.gitignore`.
///
/// Comments, blank lines and negations (`!keep.me`) are skipped; negations
/// have no equivalent in a flat ignore list.
pub fn default_ignore(fs: &dyn FileSystem, cwd: &Path) -> Vec<String> {
    let mut entries: Vec<String> = ALWAYS_IGNORED.iter().map(|s| s.to_string()).collect();

    let gitignore = cwd.join(".gitignore");
    if !fs.is_file(&gitignore) {
        return entries;
    }

    match fs.read_to_string(&gitignore) {
        Ok(contents) => {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                if !entries.iter().any(|e| e == line) {
                    entries.push(line.to_string());
                }
            }
            debug!(count = entries.len(), "ignore entries taken from .gitignore");
        }
        Err(err) => warn!(error = %err, "could not read .gitignore; using built-in ignores"),
    }

    entries
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: std::collections::BTreeMap<String, serde_json::Value>,
}

/// `npm start` if `cwd/package.json` declares a `start` script.
pub fn default_command(fs: &dyn FileSystem, cwd: &Path) -> Option<CommandSpec> {
    let manifest = cwd.join("package.json");
    if !fs.is_file(&manifest) {
        return None;
    }

    let contents = fs.read_to_string(&manifest).ok()?;
    let pkg: PackageJson = match serde_json::from_str(&contents) {
        Ok(pkg) => pkg,
        Err(err) => {
            warn!(error = %err, "package.json is not valid JSON; no default command");
            return None;
        }
    };

    if pkg.scripts.contains_key("start") {
        debug!("using `npm start` from package.json as the command");
        Some(CommandSpec::new("npm", ["start"]))
    } else {
        None
    }
}
