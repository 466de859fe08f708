//! Store registry: explicit construction, hydration and teardown of slices.
//!
//! Slices are registered with a [`StoreBuilder`] rather than discovered
//! through globals. Only slices named in the persistence allowlist are
//! written to or read from the [`SnapshotRepository`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::ports::{SliceKey, SnapshotRepository, SnapshotRepositoryError};

/// A slice the store can persist, restore and reset without knowing its
/// record type.
pub trait ManagedSlice: Send + Sync {
    /// Registry key of this slice.
    fn key(&self) -> SliceKey;

    /// Serialise the persisted part of the slice.
    fn export(&self) -> Result<Value, serde_json::Error>;

    /// Replace the persisted part of the slice with `snapshot`.
    fn hydrate(&self, snapshot: Value) -> Result<(), serde_json::Error>;

    /// Return the slice to its initial state.
    fn reset(&self);
}

/// Errors raised while building or tearing down a [`Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Two slices were registered under the same key.
    #[error("slice `{key}` is registered twice")]
    DuplicateSlice { key: SliceKey },
    /// The allowlist names a slice that was never registered.
    #[error("slice `{key}` is marked for persistence but not registered")]
    UnregisteredPersistedSlice { key: SliceKey },
    /// Slices are marked for persistence but there is nowhere to put them.
    #[error("persisted slices require a snapshot repository")]
    MissingSnapshotRepository,
    /// The repository failed to store a snapshot.
    #[error("failed to persist slice `{key}`: {source}")]
    Snapshot {
        key: SliceKey,
        #[source]
        source: SnapshotRepositoryError,
    },
    /// A slice could not be serialised.
    #[error("failed to encode slice `{key}`: {source}")]
    Encode {
        key: SliceKey,
        #[source]
        source: serde_json::Error,
    },
}

/// Builder for [`Store`].
#[derive(Default)]
pub struct StoreBuilder {
    slices: Vec<Arc<dyn ManagedSlice>>,
    persisted: BTreeSet<SliceKey>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
}

impl StoreBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `slice`.
    pub fn slice(mut self, slice: Arc<dyn ManagedSlice>) -> Self {
        self.slices.push(slice);
        self
    }

    /// Add `key` to the persistence allowlist.
    pub fn persist(mut self, key: SliceKey) -> Self {
        self.persisted.insert(key);
        self
    }

    /// Add every key in `keys` to the persistence allowlist.
    pub fn persist_all(mut self, keys: impl IntoIterator<Item = SliceKey>) -> Self {
        self.persisted.extend(keys);
        self
    }

    /// Repository snapshots are loaded from and saved to.
    pub fn snapshots(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.snapshots = Some(repository);
        self
    }

    /// Validate the registration and build the store.
    ///
    /// # Errors
    /// Returns [`StoreError`] when a key is registered twice, when the
    /// allowlist names an unregistered slice, or when slices are persisted
    /// without a repository.
    pub fn build(self) -> Result<Store, StoreError> {
        let mut seen = BTreeSet::new();
        for slice in &self.slices {
            let key = slice.key();
            if !seen.insert(key) {
                return Err(StoreError::DuplicateSlice { key });
            }
        }
        if let Some(&key) = self.persisted.iter().find(|key| !seen.contains(*key)) {
            return Err(StoreError::UnregisteredPersistedSlice { key });
        }
        if !self.persisted.is_empty() && self.snapshots.is_none() {
            return Err(StoreError::MissingSnapshotRepository);
        }
        Ok(Store {
            slices: self.slices,
            persisted: self.persisted,
            snapshots: self.snapshots,
        })
    }
}

/// Explicitly constructed set of slices plus their persistence policy.
pub struct Store {
    slices: Vec<Arc<dyn ManagedSlice>>,
    persisted: BTreeSet<SliceKey>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
}

impl Store {
    /// Start building a store.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<SliceKey> {
        self.slices.iter().map(|slice| slice.key()).collect()
    }

    /// Registered slice with `key`.
    pub fn slice(&self, key: SliceKey) -> Option<&Arc<dyn ManagedSlice>> {
        self.slices.iter().find(|slice| slice.key() == key)
    }

    /// Whether `key` is in the persistence allowlist.
    pub fn is_persisted(&self, key: SliceKey) -> bool {
        self.persisted.contains(&key)
    }

    fn persisted_slices(&self) -> impl Iterator<Item = &Arc<dyn ManagedSlice>> {
        self.slices
            .iter()
            .filter(|slice| self.persisted.contains(&slice.key()))
    }

    /// Restore allowlisted slices from their snapshots.
    ///
    /// A snapshot that cannot be loaded or decoded is skipped with a warning
    /// and the slice keeps its initial state. Returns the keys that were
    /// hydrated.
    pub fn init(&self) -> Vec<SliceKey> {
        let Some(snapshots) = self.snapshots.as_ref() else {
            return Vec::new();
        };
        let mut hydrated = Vec::new();
        for slice in self.persisted_slices() {
            let key = slice.key();
            match snapshots.load(key) {
                Ok(Some(snapshot)) => match slice.hydrate(snapshot) {
                    Ok(()) => hydrated.push(key),
                    Err(error) => warn!(slice = %key, %error, "discarded undecodable snapshot"),
                },
                Ok(None) => {}
                Err(error) => {
                    warn!(slice = %key, %error, reason = error.label(), "snapshot load failed");
                }
            }
        }
        info!(slices = ?hydrated, "store initialised");
        hydrated
    }

    /// Persist allowlisted slices, then reset every slice.
    ///
    /// Every slice is reset even when persisting one fails.
    ///
    /// # Errors
    /// Returns the first [`StoreError`] raised while encoding or saving.
    pub fn teardown(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        if let Some(snapshots) = self.snapshots.as_ref() {
            for slice in self.persisted_slices() {
                if let Err(error) = persist(snapshots.as_ref(), slice.as_ref()) {
                    warn!(%error, "slice not persisted");
                    first_error.get_or_insert(error);
                }
            }
        }
        for slice in &self.slices {
            slice.reset();
        }
        info!(slices = self.slices.len(), persisted = self.persisted.len(), "store torn down");
        first_error.map_or(Ok(()), Err)
    }
}

fn persist(snapshots: &dyn SnapshotRepository, slice: &dyn ManagedSlice) -> Result<(), StoreError> {
    let key = slice.key();
    let snapshot = slice
        .export()
        .map_err(|source| StoreError::Encode { key, source })?;
    snapshots
        .save(key, &snapshot)
        .map_err(|source| StoreError::Snapshot { key, source })
}
