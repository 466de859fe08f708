//! Pure derivations over slice state.
//!
//! Selectors borrow records from a slice (usually inside
//! [`GoalsSlice::read`](crate::store::GoalsSlice::read)) and never mutate
//! or fetch. Anything time dependent takes `now` explicitly; slices expose
//! their clock through `now()` for the default.
//!
//! ```
//! use chrono::Utc;
//! use client::selectors::goals::{completion_rate, overdue_goals};
//!
//! let goals: Vec<client::domain::Goal> = Vec::new();
//! assert!(overdue_goals(&goals, Utc::now()).is_empty());
//! assert_eq!(completion_rate(&goals), 0.0);
//! ```

pub mod goals;
pub mod nutrition;
pub mod weight;
pub mod workouts;

/// Days without a progress reading before an active goal needs an update.
pub const DEFAULT_PROGRESS_STALE_DAYS: i64 = 7;

/// Days ahead an upcoming deadline is reported.
pub const DEFAULT_DEADLINE_WINDOW_DAYS: i64 = 30;

/// `part / whole * 100` clamped to `0..=100`; `0` when `whole` is not
/// positive.
pub(crate) fn bounded_percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 || part.is_nan() {
        return 0.0;
    }
    (part / whole * 100.0).clamp(0.0, 100.0)
}
