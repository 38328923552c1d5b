// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem. Paths are used verbatim: tests should use absolute
/// paths so `canonicalize` can return them unchanged.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();

        // Parent directories exist implicitly.
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            files.entry(dir.to_path_buf()).or_insert(MockEntry::Dir);
            parent = dir.parent();
        }

        files.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        files.insert(path.as_ref().to_path_buf(), MockEntry::Dir);
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if self.files.lock().unwrap().contains_key(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }
}
