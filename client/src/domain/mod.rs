//! Domain records and aggregates.
//!
//! Purpose: define one strongly typed record per tracked domain (goals,
//! weight entries, meals, workouts) together with the payloads, filters and
//! arithmetic the slices and selectors build on. Types here never perform
//! I/O; the gateway boundary lives in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode — failure payload stored under an operation kind.
//! - RecordId / Record — identity and timestamps shared by every record.
//! - OperationKind / OperationStatuses — in-flight and error bookkeeping.
//! - Goal, WeightEntry, Meal, Workout and their drafts, patches and filters.

pub mod error;
pub mod goal;
pub mod nutrition;
pub mod operation;
pub mod ports;
pub mod record;
pub mod weight;
pub mod workout;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::goal::{
    Goal, GoalCategory, GoalDraft, GoalFilters, GoalFiltersPatch, GoalPatch, GoalPriority,
    GoalProgress, GoalQuery, GoalSortKey, GoalStatus, GoalType, Milestone, ProgressDirection,
    ProgressMode, ProgressUpdate, StatusChange,
};
pub use self::nutrition::{
    DailyNutrition, FoodItem, Meal, MealDraft, MealFilters, MealFiltersPatch, MealPatch,
    MealQuery, MealSortKey, MealType, NutritionFacts, WaterIntake,
};
pub use self::operation::{OperationKind, OperationStatus, OperationStatuses};
pub use self::record::{FieldUpdate, Record, RecordId, RecordIdValidationError, SortOrder};
pub use self::weight::{
    BulkImportResult, TrendPeriod, TrendPoint, WeightComparison, WeightDraft, WeightEntry,
    WeightFilters, WeightFiltersPatch, WeightPatch, WeightQuery, WeightSortKey, WeightSummary,
    WeightTrends, WeightUnit,
};
pub use self::workout::{
    Exercise, Intensity, Workout, WorkoutDraft, WorkoutFilters, WorkoutFiltersPatch,
    WorkoutPatch, WorkoutQuery, WorkoutSortKey, WorkoutType,
};

/// Result alias for slice operations.
///
/// # Examples
/// ```
/// use client::domain::{Error, SliceResult};
///
/// fn lookup() -> SliceResult<u32> {
///     Err(Error::not_found("goal g-1"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type SliceResult<T> = Result<T, Error>;
