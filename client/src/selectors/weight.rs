//! Weight selectors: progress between the first and latest entry, ranges and
//! body-mass index.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::WeightEntry;
use crate::domain::weight::percent_change;

/// Change between the earliest and the most recent entry by date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightProgress {
    pub starting_kg: f64,
    pub current_kg: f64,
    /// `current - starting`; negative when weight was lost.
    pub change_kg: f64,
    pub change_percent: f64,
    pub days: i64,
}

/// Progress from the earliest to the latest entry; `None` for an empty log.
///
/// # Examples
/// ```
/// use client::selectors::weight::weight_progress;
///
/// assert!(weight_progress(&[]).is_none());
/// ```
pub fn weight_progress(entries: &[WeightEntry]) -> Option<WeightProgress> {
    let first = entries.iter().min_by_key(|entry| (entry.date, entry.created_at))?;
    let latest = latest_entry(entries)?;
    let change_kg = latest.weight_kg() - first.weight_kg();
    Some(WeightProgress {
        starting_kg: first.weight_kg(),
        current_kg: latest.weight_kg(),
        change_kg,
        change_percent: percent_change(first.weight_kg(), change_kg),
        days: (latest.date - first.date).num_days(),
    })
}

/// Most recent entry by date; ties go to the later creation.
pub fn latest_entry(entries: &[WeightEntry]) -> Option<&WeightEntry> {
    entries
        .iter()
        .max_by_key(|entry| (entry.date, entry.created_at))
}

/// Entries dated within `start..=end`, oldest first.
pub fn entries_between(
    entries: &[WeightEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&WeightEntry> {
    let mut selected: Vec<&WeightEntry> = entries
        .iter()
        .filter(|entry| (start..=end).contains(&entry.date))
        .collect();
    selected.sort_by_key(|entry| entry.date);
    selected
}

/// Mean weight in kilograms.
pub fn average_weight(entries: &[WeightEntry]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let total: f64 = entries.iter().map(WeightEntry::weight_kg).sum();
    Some(total / entries.len() as f64)
}

/// Body-mass index for `weight_kg` at `height_cm`.
///
/// Returns `None` unless both values are positive.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// WHO adult body-mass index bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Band `bmi` falls into.
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}
