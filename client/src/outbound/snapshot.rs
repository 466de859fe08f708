//! Snapshot repositories: an in-memory map and a directory of JSON files.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cap_std::{ambient_authority, fs::Dir};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{SliceKey, SnapshotRepository, SnapshotRepositoryError};

/// Snapshot repository that forgets everything when dropped.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: Mutex<HashMap<SliceKey, Value>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slices that currently have a snapshot, in key order.
    pub fn keys(&self) -> Vec<SliceKey> {
        let mut keys: Vec<SliceKey> = self
            .snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        keys.sort();
        keys
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn load(&self, key: SliceKey) -> Result<Option<Value>, SnapshotRepositoryError> {
        Ok(self
            .snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }

    fn save(&self, key: SliceKey, snapshot: &Value) -> Result<(), SnapshotRepositoryError> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, snapshot.clone());
        Ok(())
    }

    fn remove(&self, key: SliceKey) -> Result<(), SnapshotRepositoryError> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

/// Snapshot repository storing one `<slice>.json` file per key in a
/// directory.
///
/// Writes go to a staging file first and are renamed into place, so a crash
/// mid-write leaves the previous snapshot intact.
pub struct FileSnapshotRepository {
    dir: Dir,
    root: PathBuf,
}

impl FileSnapshotRepository {
    /// Open (creating if needed) the snapshot directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotRepositoryError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotRepositoryError> {
        let root = path.as_ref().to_path_buf();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        Ok(Self { dir, root })
    }

    /// Directory the snapshots live in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(key: SliceKey) -> String {
        format!("{}.json", key.as_str())
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn load(&self, key: SliceKey) -> Result<Option<Value>, SnapshotRepositoryError> {
        let name = Self::file_name(key);
        let bytes = match self.dir.read(&name) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(io_error(&self.root.join(&name), &error)),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|error| {
            SnapshotRepositoryError::corrupt(format!(
                "{}: {error}",
                self.root.join(&name).display()
            ))
        })
    }

    fn save(&self, key: SliceKey, snapshot: &Value) -> Result<(), SnapshotRepositoryError> {
        let name = Self::file_name(key);
        let staging = format!(".{name}.tmp-{}", Uuid::new_v4().simple());
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|error| SnapshotRepositoryError::corrupt(error.to_string()))?;
        self.dir
            .write(&staging, bytes)
            .map_err(|error| io_error(&self.root.join(&staging), &error))?;
        let renamed = self.dir.rename(&staging, &self.dir, &name);
        if let Err(error) = renamed {
            // Best effort: the staging file is garbage either way.
            self.dir.remove_file(&staging).ok();
            return Err(io_error(&self.root.join(&name), &error));
        }
        Ok(())
    }

    fn remove(&self, key: SliceKey) -> Result<(), SnapshotRepositoryError> {
        let name = Self::file_name(key);
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&self.root.join(&name), &error)),
        }
    }
}

fn io_error(path: &Path, error: &io::Error) -> SnapshotRepositoryError {
    SnapshotRepositoryError::io(format!("{}: {error}", path.display()))
}
