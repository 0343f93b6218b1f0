//! File access for configuration updates, with writes staged in memory.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// The file operations a configuration update needs.
pub trait FileSystem {
    /// Read a whole file. Fails with [`io::ErrorKind::NotFound`] if it does
    /// not exist.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Write a whole file, replacing any previous content.
    fn write(&mut self, path: &Path, contents: String) -> io::Result<()>;

    /// Whether the file exists.
    fn exists(&self, path: &Path) -> bool;
}

/// A file system that keeps writes in memory until [`MemFs::commit`].
///
/// Reads see staged content first. With [`MemFs::with_disk`], paths that were
/// never written are read from disk; otherwise only staged files exist.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    staged: BTreeMap<PathBuf, String>,
    read_through: bool,
}

impl MemFs {
    /// A purely in-memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// A staging layer over the real disk.
    pub fn with_disk() -> Self {
        Self {
            staged: BTreeMap::new(),
            read_through: true,
        }
    }

    /// Paths with staged content, in sorted order.
    pub fn staged_paths(&self) -> impl Iterator<Item = &Path> {
        self.staged.keys().map(PathBuf::as_path)
    }

    /// Whether `path` has staged content.
    pub fn is_staged(&self, path: &Path) -> bool {
        self.staged.contains_key(path)
    }

    /// Drop all staged content.
    pub fn discard(&mut self) {
        self.staged.clear();
    }

    /// Write all staged files to disk, creating parent directories, and
    /// return their paths. Files written before a failure stay written and
    /// are no longer staged.
    pub fn commit(&mut self) -> io::Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        while let Some((path, contents)) = self.staged.pop_first() {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    self.staged.insert(path, contents);
                    return Err(err);
                }
            }
            if let Err(err) = std::fs::write(&path, &contents) {
                self.staged.insert(path, contents);
                return Err(err);
            }
            tracing::debug!(path = %path.display(), "committed file");
            written.push(path);
        }
        Ok(written)
    }
}

impl FileSystem for MemFs {
    fn read(&self, path: &Path) -> io::Result<String> {
        if let Some(contents) = self.staged.get(path) {
            return Ok(contents.clone());
        }
        if self.read_through {
            return std::fs::read_to_string(path);
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not staged", path.display()),
        ))
    }

    fn write(&mut self, path: &Path, contents: String) -> io::Result<()> {
        tracing::trace!(path = %path.display(), bytes = contents.len(), "staged write");
        self.staged.insert(path.to_path_buf(), contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.staged.contains_key(path) || (self.read_through && path.exists())
    }
}
