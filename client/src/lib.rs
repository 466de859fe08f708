//! Client-side domain state for the fitsync fitness tracker.
//!
//! Slices cache goals, weight entries, meals and workouts fetched through
//! gateway ports; selectors derive dashboard figures from the cached
//! records; the store registry hydrates and persists slices between
//! sessions.

pub mod domain;
pub mod outbound;
pub mod selectors;
pub mod settings;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
