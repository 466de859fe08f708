//! Workout records.

use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};

use super::goal::contains_ignore_case;
use super::record::impl_record;
use super::{FieldUpdate, RecordId, SortOrder};

/// Kind of training session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Cardio,
    Strength,
    Flexibility,
    Sports,
    Hiit,
    Other,
}

impl WorkoutType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardio => "cardio",
            Self::Strength => "strength",
            Self::Flexibility => "flexibility",
            Self::Sports => "sports",
            Self::Hiit => "hiit",
            Self::Other => "other",
        }
    }
}

/// Perceived effort of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    #[default]
    Moderate,
    High,
}

impl Intensity {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// One exercise performed in a workout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// A persisted workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub intensity: Intensity,
    pub performed_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub calories_burned: Option<f64>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Workout);

impl Workout {
    /// Calendar day the workout was performed on (UTC).
    pub fn date(&self) -> NaiveDate {
        self.performed_at.date_naive()
    }
}

/// Payload for logging a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub intensity: Intensity,
    pub performed_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Exercise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial workout update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Intensity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutPatch {
    /// Apply the patch to a local copy, as the gateway would.
    pub fn apply_to(&self, workout: &mut Workout) {
        if let Some(name) = &self.name {
            workout.name.clone_from(name);
        }
        if let Some(workout_type) = self.workout_type {
            workout.workout_type = workout_type;
        }
        if let Some(intensity) = self.intensity {
            workout.intensity = intensity;
        }
        if let Some(performed_at) = self.performed_at {
            workout.performed_at = performed_at;
        }
        if let Some(duration) = self.duration_minutes {
            workout.duration_minutes = duration;
        }
        if let Some(calories) = self.calories_burned {
            workout.calories_burned = Some(calories);
        }
        if let Some(exercises) = &self.exercises {
            workout.exercises.clone_from(exercises);
        }
        if let Some(notes) = &self.notes {
            workout.notes = Some(notes.clone());
        }
    }
}

/// Field a workout list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutSortKey {
    #[default]
    PerformedAt,
    Duration,
    CaloriesBurned,
    Name,
}

impl WorkoutSortKey {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerformedAt => "performedAt",
            Self::Duration => "durationMinutes",
            Self::CaloriesBurned => "caloriesBurned",
            Self::Name => "name",
        }
    }
}

/// Active workout list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkoutFilters {
    pub workout_type: Option<WorkoutType>,
    pub intensity: Option<Intensity>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: WorkoutSortKey,
    pub sort_order: SortOrder,
}

impl WorkoutFilters {
    /// Whether `workout` satisfies every predicate.
    pub fn matches(&self, workout: &Workout) -> bool {
        let date = workout.date();
        self.workout_type
            .is_none_or(|workout_type| workout.workout_type == workout_type)
            && self.intensity.is_none_or(|intensity| workout.intensity == intensity)
            && self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
            && self.search.as_deref().is_none_or(|needle| {
                contains_ignore_case(&workout.name, needle)
                    || workout
                        .exercises
                        .iter()
                        .any(|exercise| contains_ignore_case(&exercise.name, needle))
            })
    }

    /// Ascending comparison on the configured sort key.
    pub fn compare(&self, left: &Workout, right: &Workout) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            WorkoutSortKey::PerformedAt => left.performed_at.cmp(&right.performed_at),
            WorkoutSortKey::Duration => left.duration_minutes.cmp(&right.duration_minutes),
            WorkoutSortKey::CaloriesBurned => left
                .calories_burned
                .unwrap_or(0.0)
                .total_cmp(&right.calories_burned.unwrap_or(0.0)),
            WorkoutSortKey::Name => left.name.to_lowercase().cmp(&right.name.to_lowercase()),
        };
        self.sort_order.apply(ordering)
    }
}

/// Shallow-merge update for [`WorkoutFilters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutFiltersPatch {
    pub workout_type: FieldUpdate<WorkoutType>,
    pub intensity: FieldUpdate<Intensity>,
    pub start_date: FieldUpdate<NaiveDate>,
    pub end_date: FieldUpdate<NaiveDate>,
    pub search: FieldUpdate<String>,
    pub sort_by: Option<WorkoutSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl WorkoutFiltersPatch {
    /// Merge into `filters`.
    pub fn apply_to(self, filters: &mut WorkoutFilters) {
        self.workout_type.apply_to(&mut filters.workout_type);
        self.intensity.apply_to(&mut filters.intensity);
        self.start_date.apply_to(&mut filters.start_date);
        self.end_date.apply_to(&mut filters.end_date);
        self.search.apply_to(&mut filters.search);
        if let Some(sort_by) = self.sort_by {
            filters.sort_by = sort_by;
        }
        if let Some(sort_order) = self.sort_order {
            filters.sort_order = sort_order;
        }
    }
}

/// Workout list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutQuery {
    pub filters: WorkoutFilters,
    pub page: PageRequest,
}

impl WorkoutQuery {
    /// Pair filters with a page position.
    pub fn new(filters: WorkoutFilters, page: PageRequest) -> Self {
        Self { filters, page }
    }
}
