//! Workout selectors: date ranges, the trailing week and the daily streak.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{Workout, WorkoutType};

/// Workouts performed within `start..=end`, earliest first.
pub fn workouts_between(
    workouts: &[Workout],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&Workout> {
    let mut selected: Vec<&Workout> = workouts
        .iter()
        .filter(|workout| (start..=end).contains(&workout.date()))
        .collect();
    selected.sort_by_key(|workout| workout.performed_at);
    selected
}

/// Totals over the seven days ending on `now`'s date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub count: usize,
    pub total_minutes: u32,
    /// Sum of the reported calories; sessions without a figure count as 0.
    pub total_calories: f64,
    pub by_type: BTreeMap<WorkoutType, usize>,
}

/// Summarise the last seven days, today included.
pub fn weekly_summary(workouts: &[Workout], now: DateTime<Utc>) -> WeeklySummary {
    let today = now.date_naive();
    let start = today.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
    workouts_between(workouts, start, today)
        .into_iter()
        .fold(WeeklySummary::default(), |mut summary, workout| {
            summary.count += 1;
            summary.total_minutes = summary.total_minutes.saturating_add(workout.duration_minutes);
            summary.total_calories += workout.calories_burned.unwrap_or(0.0);
            *summary.by_type.entry(workout.workout_type).or_default() += 1;
            summary
        })
}

/// Consecutive days with at least one workout, ending today.
///
/// A streak whose last workout was yesterday is still running: today only
/// breaks it once the day is over.
pub fn workout_streak(workouts: &[Workout], now: DateTime<Utc>) -> u32 {
    let days: BTreeSet<NaiveDate> = workouts.iter().map(Workout::date).collect();
    let today = now.date_naive();
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };
    let mut streak = 0;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}
