//! Shared record primitives.
//!
//! Every domain record carries a gateway-assigned [`RecordId`] and two
//! server timestamps. The [`Record`] trait exposes those uniformly so the
//! slice machinery can reconcile any domain without knowing its fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors returned by [`RecordId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIdValidationError {
    Empty,
    SurroundingWhitespace,
}

impl fmt::Display for RecordIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "record id must not be empty"),
            Self::SurroundingWhitespace => {
                write!(f, "record id must not have surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for RecordIdValidationError {}

/// Opaque identifier assigned by the gateway when a record is created.
///
/// The identifier never changes after creation.
///
/// # Examples
/// ```
/// use client::domain::RecordId;
///
/// let id = RecordId::new("goal-42").expect("valid id");
/// assert_eq!(id.as_ref(), "goal-42");
/// assert!(RecordId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Validate and construct a [`RecordId`].
    pub fn new(id: impl Into<String>) -> Result<Self, RecordIdValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RecordIdValidationError::Empty);
        }
        if id.trim() != id {
            return Err(RecordIdValidationError::SurroundingWhitespace);
        }
        Ok(Self(id))
    }

    /// Generate a fresh random identifier, as a gateway would.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Uniform view over a persisted domain record.
pub trait Record: Clone + Send + Sync + 'static {
    /// Gateway-assigned identifier.
    fn id(&self) -> &RecordId;
    /// Server-assigned creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;
    /// Server-assigned last-update timestamp.
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Implements [`Record`] for structs with `id`, `created_at` and
/// `updated_at` fields.
macro_rules! impl_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::domain::Record for $ty {
                fn id(&self) -> &$crate::domain::RecordId {
                    &self.id
                }

                fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                    self.created_at
                }

                fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                    self.updated_at
                }
            }
        )+
    };
}

pub(crate) use impl_record;

/// Sort direction applied by the gateway to list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Query-string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Orient an ascending comparison according to this direction.
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// One field of a filter patch.
///
/// Filter updates are shallow merges: fields the caller leaves
/// [`FieldUpdate::Unchanged`] keep their value, [`FieldUpdate::Set`]
/// overrides it and [`FieldUpdate::Clear`] empties it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// Keep the current value.
    #[default]
    Unchanged,
    /// Replace the current value.
    Set(T),
    /// Remove the current value.
    Clear,
}

impl<T> FieldUpdate<T> {
    /// Merge this update into `slot`.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Set(value) => *slot = Some(value),
            Self::Clear => *slot = None,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        }
    }
}
