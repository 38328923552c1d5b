// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::watch::path_utils::relative_str;

/// Compiled `--ignore` entries.
///
/// Entries may be plain paths (`target`, `build/`, `/dist`), absolute paths
/// (`/home/me/app/logs`) or glob patterns (`*.pyc`, `**/tmp/*.log`). An
/// absolute entry covers that path and everything below it. They are
/// evaluated against:
///
/// - the absolute path of the event,
/// - the path relative to the project root,
/// - every ancestor directory of the relative path (`a`, `a/b`, ...),
/// - every single path component.
///
/// So `target` ignores `target/debug/foo.o`, and `*.pyc` ignores
/// `pkg/mod.pyc`.
#[derive(Clone)]
pub struct IgnoreSet {
    root: PathBuf,
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreSet")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl IgnoreSet {
    /// Compile `patterns`, resolving relative entries against `root`.
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let root = root.into();
        let mut builder = GlobSetBuilder::new();

        let bases = anchor_bases(&root);
        for raw in patterns {
            for pat in compile_entry(&bases, raw) {
                let glob =
                    Glob::new(&pat).with_context(|| format!("invalid ignore pattern: {raw}"))?;
                builder.add(glob);
            }
        }

        let set = builder
            .build()
            .with_context(|| "building ignore globset".to_string())?;

        Ok(Self {
            root,
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// An ignore set that matches nothing.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.set.is_empty() {
            return false;
        }

        let full = path.to_string_lossy().replace('\\', "/");
        if self.set.is_match(&full) {
            return true;
        }

        let Some(rel) = relative_str(&self.root, path) else {
            // Outside the root: only the component check still makes sense.
            return path
                .components()
                .any(|c| self.set.is_match(c.as_os_str().to_string_lossy().as_ref()));
        };

        let mut prefix = String::new();
        for part in rel.split('/').filter(|p| !p.is_empty()) {
            if self.set.is_match(part) {
                return true;
            }
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if self.set.is_match(&prefix) {
                return true;
            }
        }

        false
    }
}

/// Root directory as given, plus its canonical form when that differs
/// (e.g. `/var/...` vs `/private/var/...`), so anchored entries match either
/// spelling of an event path.
fn anchor_bases(root: &Path) -> Vec<PathBuf> {
    let mut bases = vec![root.to_path_buf()];
    if let Ok(canon) = root.canonicalize() {
        if canon != root {
            bases.push(canon);
        }
    }
    bases
}

/// Turn a user entry into glob strings.
///
/// - Relative entries (`target`, `build/`, `*.pyc`) are kept as globs and
///   checked against every component and ancestor of a path.
/// - Absolute entries under the root are anchored there: the directory
///   itself and everything below it.
/// - Other absolute entries match that path and everything below it, and
///   are also read as `.gitignore`-style root anchors (`/dist`).
///
/// Blank entries yield nothing.
fn compile_entry(bases: &[PathBuf], raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let without_trailing = trimmed.trim_end_matches(['/', '\\']);
    if without_trailing.is_empty() {
        return Vec::new();
    }

    let entry = Path::new(without_trailing);
    if !entry.is_absolute() {
        let pat = without_trailing
            .trim_start_matches("./")
            .replace('\\', "/");
        return if pat.is_empty() { Vec::new() } else { vec![pat] };
    }

    let under_root = bases
        .iter()
        .find_map(|base| entry.strip_prefix(base).ok().map(Path::to_path_buf));

    match under_root {
        Some(rel) => anchored(bases, &rel),
        None => {
            let mut pats = subtree(entry);
            let rel = without_trailing.trim_start_matches(['/', '\\']);
            if !rel.is_empty() {
                pats.extend(anchored(bases, Path::new(rel)));
            }
            pats
        }
    }
}

fn anchored(bases: &[PathBuf], rel: &Path) -> Vec<String> {
    bases.iter().flat_map(|base| subtree(&base.join(rel))).collect()
}

/// Literal glob for `path` and for everything below it.
fn subtree(path: &Path) -> Vec<String> {
    let literal = globset::escape(&path.to_string_lossy().replace('\\', "/"));
    let below = format!("{}/**", literal.trim_end_matches('/'));
    vec![literal, below]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> IgnoreSet {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        IgnoreSet::new("/project", &patterns).unwrap()
    }

    #[test]
    fn plain_directory_ignores_everything_below_it() {
        let ignore = set(&["target"]);
        assert!(ignore.is_ignored(Path::new("/project/target/debug/app")));
        assert!(ignore.is_ignored(Path::new("/project/target")));
        assert!(!ignore.is_ignored(Path::new("/project/src/target.rs")));
    }

    #[test]
    fn extension_glob_matches_file_names_at_any_depth() {
        let ignore = set(&["*.pyc"]);
        assert!(ignore.is_ignored(Path::new("/project/pkg/mod.pyc")));
        assert!(!ignore.is_ignored(Path::new("/project/pkg/mod.py")));
    }

    #[test]
    fn gitignore_style_slashes_are_normalized() {
        let ignore = set(&["/dist", "node_modules/"]);
        assert!(ignore.is_ignored(Path::new("/project/dist/bundle.js")));
        assert!(ignore.is_ignored(Path::new("/project/web/node_modules/x/index.js")));
    }

    #[test]
    fn nested_relative_paths_match_as_prefixes() {
        let ignore = set(&["src/generated"]);
        assert!(ignore.is_ignored(Path::new("/project/src/generated/out.rs")));
        assert!(!ignore.is_ignored(Path::new("/project/src/lib.rs")));
    }

    #[test]
    fn empty_set_ignores_nothing() {
        let ignore = IgnoreSet::empty("/project");
        assert!(!ignore.is_ignored(Path::new("/project/anything")));
    }

    #[test]
    fn blank_entries_are_skipped_and_invalid_globs_rejected() {
        assert!(IgnoreSet::new("/p", &["   ".to_string(), "/".to_string()]).is_ok());
        assert!(IgnoreSet::new("/p", &["a[".to_string()]).is_err());
    }

    #[test]
    fn absolute_entry_for_existing_dir_covers_its_contents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::create_dir(root.join("logs")).unwrap();

        let entry = root.join("logs").to_string_lossy().into_owned();
        let ignore = IgnoreSet::new(&root, &[entry]).unwrap();

        assert!(ignore.is_ignored(&root.join("logs")));
        assert!(ignore.is_ignored(&root.join("logs").join("out.txt")));
        assert!(ignore.is_ignored(&root.join("logs").join("a").join("b.txt")));
        assert!(!ignore.is_ignored(&root.join("src").join("logs.rs")));
    }

    #[test]
    fn absolute_entry_for_missing_dir_covers_it_once_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        let entry = format!("{}/", root.join("dist").display());
        let ignore = IgnoreSet::new(&root, &[entry]).unwrap();

        assert!(ignore.is_ignored(&root.join("dist").join("bundle.js")));
        assert!(!ignore.is_ignored(&root.join("src").join("dist.js")));
        // Anchored at the root, not matched as a bare component.
        assert!(!ignore.is_ignored(&root.join("web").join("dist").join("x.js")));
    }

    #[test]
    fn absolute_entry_outside_root_covers_its_subtree() {
        let ignore = set(&["/var/cache/app"]);
        assert!(ignore.is_ignored(Path::new("/var/cache/app/blob")));
        assert!(!ignore.is_ignored(Path::new("/var/cache/other/blob")));
        assert!(!ignore.is_ignored(Path::new("/project/src/main.rs")));
    }
}
