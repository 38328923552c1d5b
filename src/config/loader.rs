// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::FileConfig;
use crate::errors::{EyeError, Result};
use crate::fs::FileSystem;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "eye.toml";

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; merging with command-line
/// flags and validation happen in [`crate::config::resolve_options`].
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<FileConfig> {
    let path = path.as_ref();
    let contents = fs
        .read_to_string(path)
        .map_err(|e| EyeError::ConfigError(format!("cannot read {}: {e:#}", path.display())))?;

    let config: FileConfig = toml::from_str(&contents)?;
    debug!(path = %path.display(), ?config, "loaded config file");

    Ok(config)
}

/// Load `explicit` if given, otherwise `eye.toml` in `cwd` if it exists.
///
/// An explicitly requested file that does not exist is an error; a missing
/// default file is not.
pub fn discover(
    fs: &dyn FileSystem,
    cwd: &Path,
    explicit: Option<&Path>,
) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        let path = resolve(cwd, path);
        if !fs.is_file(&path) {
            return Err(EyeError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return load_from_path(fs, path).map(Some);
    }

    let default_path = default_config_path(cwd);
    if fs.is_file(&default_path) {
        return load_from_path(fs, default_path).map(Some);
    }

    Ok(None)
}

/// Default config location inside `cwd`.
pub fn default_config_path(cwd: &Path) -> PathBuf {
    cwd.join(CONFIG_FILE_NAME)
}

fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn missing_default_file_is_not_an_error() {
        let fs = MockFileSystem::new();
        assert_eq!(discover(&fs, Path::new("/proj"), None).unwrap(), None);
    }

    #[test]
    fn default_file_is_picked_up() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/eye.toml", "delay = 250\nlazy = true\n");

        let cfg = discover(&fs, Path::new("/proj"), None).unwrap().unwrap();
        assert_eq!(cfg.delay, Some(250));
        assert_eq!(cfg.lazy, Some(true));
    }

    #[test]
    fn explicit_relative_path_is_resolved_against_cwd() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/conf/dev.toml", "quiet = true\n");

        let cfg = discover(&fs, Path::new("/proj"), Some(Path::new("conf/dev.toml")))
            .unwrap()
            .unwrap();
        assert_eq!(cfg.quiet, Some(true));
    }

    #[test]
    fn explicit_missing_file_is_a_config_error() {
        let fs = MockFileSystem::new();
        let err = discover(&fs, Path::new("/proj"), Some(Path::new("nope.toml"))).unwrap_err();
        assert!(matches!(err, EyeError::ConfigError(msg) if msg.contains("nope.toml")));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/eye.toml", "delay = [");
        let err = discover(&fs, Path::new("/proj"), None).unwrap_err();
        assert!(matches!(err, EyeError::TomlError(_)));
    }
}
