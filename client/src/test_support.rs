//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Goal, GoalCategory, GoalPriority, GoalStatus, GoalType, Intensity, Meal, MealType,
    NutritionFacts, RecordId, WeightEntry, WeightUnit, Workout, WorkoutType,
};

/// Timestamp every fixture record is created at: 2024-01-15 09:00 UTC.
pub fn fixture_timestamp() -> DateTime<Utc> {
    at(2024, 1, 15, 9)
}

/// UTC timestamp on the hour.
///
/// # Panics
/// Panics when the arguments do not name a valid instant.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("invalid fixture timestamp {year}-{month}-{day} {hour}:00"),
    }
}

/// Calendar date.
///
/// # Panics
/// Panics when the arguments do not name a valid date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid fixture date {year}-{month}-{day}"),
    }
}

/// Record id from a literal.
///
/// # Panics
/// Panics when `id` is not a valid record id.
pub fn record_id(id: &str) -> RecordId {
    match RecordId::new(id) {
        Ok(id) => id,
        Err(error) => panic!("invalid fixture id {id:?}: {error}"),
    }
}

/// Active goal of `goal_type` aiming at 100 from 0.
pub fn goal_fixture(id: &str, goal_type: GoalType) -> Goal {
    Goal {
        id: record_id(id),
        title: format!("Goal {id}"),
        description: None,
        category: GoalCategory::Fitness,
        goal_type,
        status: GoalStatus::Active,
        priority: GoalPriority::Medium,
        target_value: Some(100.0),
        current_value: 0.0,
        start_value: None,
        unit: None,
        start_date: None,
        target_date: None,
        last_progress_update: None,
        completed_at: None,
        milestones: Vec::new(),
        tags: Vec::new(),
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

/// Weight entry in kilograms on `date`.
pub fn weight_fixture(id: &str, date: NaiveDate, kg: f64) -> WeightEntry {
    WeightEntry {
        id: record_id(id),
        weight: kg,
        unit: WeightUnit::Kg,
        date,
        body_fat_percentage: None,
        muscle_mass: None,
        notes: None,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

/// Meal of `meal_type` eaten at `eaten_at` with `calories`.
pub fn meal_fixture(
    id: &str,
    meal_type: MealType,
    eaten_at: DateTime<Utc>,
    calories: f64,
) -> Meal {
    Meal {
        id: record_id(id),
        name: format!("Meal {id}"),
        meal_type,
        eaten_at,
        foods: Vec::new(),
        nutrition: NutritionFacts {
            calories,
            ..NutritionFacts::default()
        },
        notes: None,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

/// Workout of `workout_type` performed at `performed_at` lasting `minutes`.
pub fn workout_fixture(
    id: &str,
    workout_type: WorkoutType,
    performed_at: DateTime<Utc>,
    minutes: u32,
) -> Workout {
    Workout {
        id: record_id(id),
        name: format!("Workout {id}"),
        workout_type,
        intensity: Intensity::Moderate,
        performed_at,
        duration_minutes: minutes,
        calories_burned: None,
        exercises: Vec::new(),
        notes: None,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl Default for FixtureClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl FixtureClock {
    /// Clock reading `now` until moved.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += delta;
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// File-backed snapshot repository rooted in a fresh temporary directory.
///
/// Keep the returned [`tempfile::TempDir`] alive for as long as the
/// repository is used.
///
/// # Panics
/// Panics when the temporary directory cannot be created.
pub fn temp_snapshot_repository() -> (
    tempfile::TempDir,
    crate::outbound::snapshot::FileSnapshotRepository,
) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("create snapshot dir: {error}"),
    };
    let repository = match crate::outbound::snapshot::FileSnapshotRepository::open(dir.path()) {
        Ok(repository) => repository,
        Err(error) => panic!("open snapshot dir: {error}"),
    };
    (dir, repository)
}
