//! In-memory store, mainly for tests and dry runs.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::IndexStore;
use crate::types::{IndexError, Result};

/// Concurrent map of path -> contents.
///
/// Mirrors filesystem rules loosely: a write needs its parent directory to
/// have been created first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: DashMap<PathBuf, Vec<u8>>,
    dirs: DashMap<PathBuf, ()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.get(path.as_ref()).map(|entry| entry.value().clone())
    }

    pub fn read_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let bytes = self
            .read(path)
            .ok_or_else(|| IndexError::store(path, "no such file"))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains_key(path.as_ref())
    }

    pub fn dir_exists(&self, path: impl AsRef<Path>) -> bool {
        self.dirs.contains_key(path.as_ref())
    }

    /// Every written path, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.files.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Written paths directly inside `dir`, sorted.
    pub fn files_in(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        self.files()
            .into_iter()
            .filter(|p| p.parent() == Some(dir))
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl IndexStore for MemoryStore {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf(), ());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.dir_exists(parent) => {
                Err(IndexError::store(path, "parent directory does not exist"))
            }
            _ => {
                self.files.insert(path.to_path_buf(), contents.to_vec());
                Ok(())
            }
        }
    }
}
