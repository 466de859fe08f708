//! Weight entries and the derived payloads the weight gateway computes.

use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};

use super::record::impl_record;
use super::{FieldUpdate, RecordId, SortOrder};

const KG_PER_LB: f64 = 0.453_592_37;

/// Unit a weight reading was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    /// Convert `value` in this unit to kilograms.
    pub fn to_kg(self, value: f64) -> f64 {
        match self {
            Self::Kg => value,
            Self::Lbs => value * KG_PER_LB,
        }
    }
}

/// A persisted body-weight reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub id: RecordId,
    pub weight: f64,
    #[serde(default)]
    pub unit: WeightUnit,
    pub date: NaiveDate,
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
    #[serde(default)]
    pub muscle_mass: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(WeightEntry);

impl WeightEntry {
    /// Reading normalised to kilograms.
    pub fn weight_kg(&self) -> f64 {
        self.unit.to_kg(self.weight)
    }
}

/// Payload for recording a weight entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightDraft {
    pub weight: f64,
    #[serde(default)]
    pub unit: WeightUnit,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WeightDraft {
    /// Reading in kilograms on `date`.
    pub fn kg(weight: f64, date: NaiveDate) -> Self {
        Self {
            weight,
            unit: WeightUnit::Kg,
            date,
            body_fat_percentage: None,
            muscle_mass: None,
            notes: None,
        }
    }
}

/// Partial weight entry update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<WeightUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WeightPatch {
    /// Apply the patch to a local copy, as the gateway would.
    pub fn apply_to(&self, entry: &mut WeightEntry) {
        if let Some(weight) = self.weight {
            entry.weight = weight;
        }
        if let Some(unit) = self.unit {
            entry.unit = unit;
        }
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(body_fat) = self.body_fat_percentage {
            entry.body_fat_percentage = Some(body_fat);
        }
        if let Some(muscle_mass) = self.muscle_mass {
            entry.muscle_mass = Some(muscle_mass);
        }
        if let Some(notes) = &self.notes {
            entry.notes = Some(notes.clone());
        }
    }
}

/// Window the weight trend endpoint aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TrendPeriod {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Length of the window in days.
    pub fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }
}

/// One point of a weight trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

/// Weight trend over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTrends {
    pub period: TrendPeriod,
    pub points: Vec<TrendPoint>,
    /// Average change per week in kilograms; negative when losing weight.
    pub average_change_per_week: f64,
}

/// Aggregate statistics over every weight entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightSummary {
    pub current_kg: Option<f64>,
    pub starting_kg: Option<f64>,
    pub lowest_kg: Option<f64>,
    pub highest_kg: Option<f64>,
    pub average_kg: Option<f64>,
    pub total_entries: u64,
}

/// Difference between two weight entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightComparison {
    pub from: WeightEntry,
    pub to: WeightEntry,
    pub change_kg: f64,
    pub change_percent: f64,
    pub days_between: i64,
}

impl WeightComparison {
    /// Compare two entries; `from` is the earlier baseline.
    pub fn between(from: WeightEntry, to: WeightEntry) -> Self {
        let change_kg = to.weight_kg() - from.weight_kg();
        let change_percent = percent_change(from.weight_kg(), change_kg);
        let days_between = (to.date - from.date).num_days();
        Self {
            from,
            to,
            change_kg,
            change_percent,
            days_between,
        }
    }
}

/// `change / baseline * 100`, or `0` for a non-positive baseline.
pub(crate) fn percent_change(baseline: f64, change: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    change / baseline * 100.0
}

/// Outcome of importing many weight entries at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportResult {
    pub imported: Vec<WeightEntry>,
    /// Drafts the gateway rejected, e.g. duplicates of an existing date.
    #[serde(default)]
    pub skipped: u64,
}

/// Field a weight list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightSortKey {
    #[default]
    Date,
    Weight,
    CreatedAt,
}

impl WeightSortKey {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Weight => "weight",
            Self::CreatedAt => "createdAt",
        }
    }
}

/// Active weight list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: WeightSortKey,
    pub sort_order: SortOrder,
}

impl WeightFilters {
    /// Whether `entry` falls inside the date range.
    pub fn matches(&self, entry: &WeightEntry) -> bool {
        self.start_date.is_none_or(|start| entry.date >= start)
            && self.end_date.is_none_or(|end| entry.date <= end)
    }

    /// Ascending comparison on the configured sort key.
    pub fn compare(&self, left: &WeightEntry, right: &WeightEntry) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            WeightSortKey::Date => left.date.cmp(&right.date),
            WeightSortKey::Weight => left.weight_kg().total_cmp(&right.weight_kg()),
            WeightSortKey::CreatedAt => left.created_at.cmp(&right.created_at),
        };
        self.sort_order.apply(ordering)
    }
}

/// Shallow-merge update for [`WeightFilters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightFiltersPatch {
    pub start_date: FieldUpdate<NaiveDate>,
    pub end_date: FieldUpdate<NaiveDate>,
    pub sort_by: Option<WeightSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl WeightFiltersPatch {
    /// Merge into `filters`.
    pub fn apply_to(self, filters: &mut WeightFilters) {
        self.start_date.apply_to(&mut filters.start_date);
        self.end_date.apply_to(&mut filters.end_date);
        if let Some(sort_by) = self.sort_by {
            filters.sort_by = sort_by;
        }
        if let Some(sort_order) = self.sort_order {
            filters.sort_order = sort_order;
        }
    }
}

/// Weight list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightQuery {
    pub filters: WeightFilters,
    pub page: PageRequest,
}

impl WeightQuery {
    /// Pair filters with a page position.
    pub fn new(filters: WeightFilters, page: PageRequest) -> Self {
        Self { filters, page }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for weight conversions and comparisons.

    use super::*;
    use crate::test_support::{date, weight_fixture};
    use rstest::rstest;

    #[rstest]
    fn pounds_convert_to_kilograms() {
        let mut entry = weight_fixture("w-1", date(2024, 1, 1), 100.0);
        entry.unit = WeightUnit::Lbs;
        assert!((entry.weight_kg() - 45.359_237).abs() < 1e-9);
    }

    #[rstest]
    fn comparison_reports_change_and_days() {
        let from = weight_fixture("w-1", date(2024, 1, 1), 80.0);
        let to = weight_fixture("w-2", date(2024, 1, 8), 79.0);

        let comparison = WeightComparison::between(from, to);
        assert!((comparison.change_kg + 1.0).abs() < 1e-9);
        assert!((comparison.change_percent + 1.25).abs() < 1e-9);
        assert_eq!(comparison.days_between, 7);
    }

    #[rstest]
    fn filters_match_inclusive_date_range() {
        let filters = WeightFilters {
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 1, 8)),
            ..WeightFilters::default()
        };
        assert!(filters.matches(&weight_fixture("w-1", date(2024, 1, 8), 80.0)));
        assert!(!filters.matches(&weight_fixture("w-2", date(2024, 1, 9), 80.0)));
    }

    #[rstest]
    fn percent_change_guards_zero_baseline() {
        assert_eq!(percent_change(0.0, 5.0), 0.0);
    }
}
