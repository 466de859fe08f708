//! Domain store slices and the store that owns them.
//!
//! Each slice keeps a cached, observable copy of one domain's records and
//! mediates every mutation through its gateway. The [`Store`] registry
//! groups slices, hydrates the allowlisted ones at start-up and persists
//! them again on teardown.

mod surface;
use surface::slice_surface;

mod goals;
mod nutrition;
mod registry;
mod sequencer;
mod slice;
mod weight;
mod workouts;

pub use goals::GoalsSlice;
pub use nutrition::{NutritionCaches, NutritionSlice};
pub use registry::{ManagedSlice, Store, StoreBuilder, StoreError};
pub use slice::{SliceSnapshot, SliceState};
pub use weight::{WeightCaches, WeightSlice};
pub use workouts::WorkoutsSlice;

use pagination::DEFAULT_LIMIT;

/// How a slice treats a response that arrives after a newer one for the
/// same scope has already been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleResponsePolicy {
    /// Drop the late response; only its in-flight mark is cleared.
    #[default]
    Discard,
    /// Apply responses in arrival order.
    LastWriteWins,
}

impl StaleResponsePolicy {
    /// Policy selected by a boolean settings flag.
    pub fn from_discard_flag(discard: bool) -> Self {
        if discard {
            Self::Discard
        } else {
            Self::LastWriteWins
        }
    }
}

/// Construction options shared by every slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceOptions {
    /// Page size used until a fetch reports otherwise.
    pub page_size: u32,
    /// Handling of late responses.
    pub stale_responses: StaleResponsePolicy,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_LIMIT,
            stale_responses: StaleResponsePolicy::default(),
        }
    }
}

impl SliceOptions {
    /// Options with `page_size` records per page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Options using `policy` for late responses.
    pub fn with_stale_responses(mut self, policy: StaleResponsePolicy) -> Self {
        self.stale_responses = policy;
        self
    }
}
