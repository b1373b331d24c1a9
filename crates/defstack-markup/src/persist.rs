//! Persistence writers
//!
//! Writing is fire-and-forget: the caller never observes a result. Failures
//! are logged by the writer itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for serialized definition documents
pub trait DefWriter {
    /// Store `bytes` at `path`
    fn write(&mut self, path: &Path, bytes: &[u8]);
}

/// Writes documents to the filesystem, creating parent directories
#[derive(Debug, Default)]
pub struct FsWriter {
    root: Option<PathBuf>,
    failures: usize,
}

impl FsWriter {
    /// Write paths as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            failures: 0,
        }
    }

    /// Number of writes that failed so far
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn target(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl DefWriter for FsWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) {
        let target = self.target(path);
        let result = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
            _ => Ok(()),
        }
        .and_then(|()| fs::write(&target, bytes));
        if let Err(e) = result {
            self.failures += 1;
            log::error!("failed to write {}: {}", target.display(), e);
        }
    }
}

/// Keeps written documents in memory, keyed by path
#[derive(Debug, Default, Clone)]
pub struct MemoryWriter {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes last written to `path`
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    /// Bytes last written to `path`, as text
    pub fn get_str(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.get(path).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Written paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl DefWriter for MemoryWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) {
        self.files.insert(path.to_path_buf(), bytes.to_vec());
    }
}
