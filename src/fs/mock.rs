// src/fs/mock.rs

use super::{FileStat, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { size: u64, modified: SystemTime },
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem whose entries can be touched, resized, and removed
/// from a test while a watcher is polling it.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    /// Number of `stat` calls that should fail before succeeding again.
    failing_stats: Arc<Mutex<usize>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            failing_stats: Arc::new(Mutex::new(0)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or replace a file with the given size and an epoch-based mtime.
    pub fn set_file(&self, path: impl AsRef<Path>, size: u64, mtime_secs: u64) {
        let path = path.as_ref().to_path_buf();
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs);
        let mut files = self.entries();
        files.insert(path.clone(), MockEntry::File { size, modified });
        Self::link_to_parent(&mut files, &path);
    }

    /// Create an (empty) directory entry.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.entries();
        files
            .entry(path.clone())
            .or_insert_with(|| MockEntry::Dir(Vec::new()));
        Self::link_to_parent(&mut files, &path);
    }

    /// Remove an entry, as an atomic-replace editor briefly would.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut files = self.entries();
        files.remove(path.as_ref());
    }

    /// Make the next `count` calls to `stat` fail with a transient error.
    pub fn fail_next_stats(&self, count: usize) {
        *self
            .failing_stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = count;
    }

    fn link_to_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if parent == path {
            return;
        }

        if !files.contains_key(parent) {
            files.insert(parent.to_path_buf(), MockEntry::Dir(Vec::new()));
            Self::link_to_parent(files, parent);
        }

        if let (Some(MockEntry::Dir(children)), Some(name)) =
            (files.get_mut(parent), path.file_name().and_then(|n| n.to_str()))
        {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<FileStat> {
        {
            let mut failing = self
                .failing_stats
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *failing > 0 {
                *failing -= 1;
                return Err(anyhow!("transient stat failure: {:?}", path));
            }
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::File { size, modified }) => Ok(FileStat {
                name,
                size: *size,
                modified: Some(*modified),
                is_dir: false,
            }),
            Some(MockEntry::Dir(children)) => Ok(FileStat {
                name,
                size: children.len() as u64,
                modified: None,
                is_dir: true,
            }),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
