use atomicwrites::{AtomicFile, OverwriteBehavior};
use log::debug;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {error}")]
    Read { path: PathBuf, error: io::Error },

    #[error("Failed to write {path}: {error}")]
    Write { path: PathBuf, error: io::Error },
}

/// Whole-file text access used by the driver.
pub trait FileStore {
    /// Read the full contents of `path`, byte for byte.
    fn load(&self, path: &Path) -> Result<String, StoreError>;

    /// Replace the contents of `path` with `content` in one step.
    fn store(&self, path: &Path, content: &str) -> Result<(), StoreError>;
}

impl<T: FileStore + ?Sized> FileStore for &T {
    fn load(&self, path: &Path) -> Result<String, StoreError> {
        (**self).load(path)
    }

    fn store(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        (**self).store(path, content)
    }
}

/// The local filesystem. Writes go through a temporary file that is renamed
/// over the target, so readers see either the old or the new blob.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn load(&self, path: &Path) -> Result<String, StoreError> {
        debug!("Loading {}", path.display());
        std::fs::read_to_string(path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::Read {
                path: path.to_path_buf(),
                error,
            },
        })
    }

    fn store(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        debug!("Writing {} ({} bytes)", path.display(), content.len());
        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(content.as_bytes())?;
                f.flush()
            })
            .map_err(|err| {
                let error = match err {
                    atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
                };
                StoreError::Write {
                    path: path.to_path_buf(),
                    error,
                }
            })
    }
}

/// In-memory files, for driving the migration without touching disk.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RefCell<HashMap<PathBuf, String>>,
    read_only: HashSet<PathBuf>,
    writes: RefCell<Vec<PathBuf>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.borrow_mut().insert(path.into(), content.into());
        self
    }

    /// Make every write to `path` fail.
    pub fn read_only(mut self, path: impl Into<PathBuf>) -> Self {
        self.read_only.insert(path.into());
        self
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    /// Paths successfully written, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }
}

impl FileStore for InMemoryStore {
    fn load(&self, path: &Path) -> Result<String, StoreError> {
        self.get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn store(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        if self.read_only.contains(path) {
            return Err(StoreError::Write {
                path: path.to_path_buf(),
                error: io::Error::new(io::ErrorKind::PermissionDenied, "read-only file"),
            });
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        self.writes.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}
