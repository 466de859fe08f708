//! Port abstraction for persisting slice snapshots between sessions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::define_port_error;

/// Identifies one domain slice within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceKey {
    Goals,
    Weight,
    Nutrition,
    Workouts,
}

impl SliceKey {
    /// Every slice key, in registration order of the default store.
    pub const ALL: [Self; 4] = [Self::Goals, Self::Weight, Self::Nutrition, Self::Workouts];

    /// Stable name, also used as the snapshot file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Goals => "goals",
            Self::Weight => "weight",
            Self::Nutrition => "nutrition",
            Self::Workouts => "workouts",
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unknown slice name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown slice `{0}`; expected one of goals, weight, nutrition, workouts")]
pub struct UnknownSliceKey(pub String);

impl FromStr for SliceKey {
    type Err = UnknownSliceKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSliceKey(trimmed.to_owned()))
    }
}

define_port_error! {
    /// Errors raised by snapshot persistence adapters.
    pub enum SnapshotRepositoryError {
        /// The backing storage could not be read or written.
        Io { message: String } =>
            "snapshot storage failed: {message}",
        /// A stored snapshot is not valid JSON.
        Corrupt { message: String } =>
            "snapshot is corrupt: {message}",
    }
}

/// Port for loading and saving serialised slice state.
///
/// Snapshots are opaque JSON documents; each slice decides what goes in.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotRepository: Send + Sync {
    /// Load the snapshot stored for `key`, if any.
    fn load(&self, key: SliceKey) -> Result<Option<Value>, SnapshotRepositoryError>;

    /// Store `snapshot` for `key`, replacing any previous one.
    fn save(&self, key: SliceKey, snapshot: &Value) -> Result<(), SnapshotRepositoryError>;

    /// Forget the snapshot stored for `key`.
    fn remove(&self, key: SliceKey) -> Result<(), SnapshotRepositoryError>;
}
