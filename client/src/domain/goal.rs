//! Goal records, their payloads, filters and progress arithmetic.
//!
//! A goal tracks a numeric target (a weight, a distance, a habit count) and
//! the user's current reading towards it. Progress direction is not stored
//! on the record: it follows from [`GoalType::direction`].

use chrono::{DateTime, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};

use super::record::impl_record;
use super::{FieldUpdate, RecordId, SortOrder};

/// Lifecycle state of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Being worked on.
    Active,
    /// Temporarily on hold.
    Paused,
    /// Target reached.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl GoalStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// How urgent a goal is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    /// Nice to have.
    Low,
    /// Default urgency.
    Medium,
    /// Needs attention first.
    High,
}

impl GoalPriority {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Broad area a goal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Weight,
    Fitness,
    Nutrition,
    Health,
    Lifestyle,
    Other,
}

impl GoalCategory {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Fitness => "fitness",
            Self::Nutrition => "nutrition",
            Self::Health => "health",
            Self::Lifestyle => "lifestyle",
            Self::Other => "other",
        }
    }
}

/// Concrete kind of goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    WeightGain,
    MuscleGain,
    Endurance,
    Strength,
    Flexibility,
    Nutrition,
    Habit,
    Custom,
}

impl GoalType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightLoss => "weight_loss",
            Self::WeightGain => "weight_gain",
            Self::MuscleGain => "muscle_gain",
            Self::Endurance => "endurance",
            Self::Strength => "strength",
            Self::Flexibility => "flexibility",
            Self::Nutrition => "nutrition",
            Self::Habit => "habit",
            Self::Custom => "custom",
        }
    }

    /// Direction in which the current value has to move to reach the target.
    ///
    /// Only `weight_loss` counts downwards; gain goals and reach-a-value goals
    /// share the same upward arithmetic.
    ///
    /// # Examples
    /// ```
    /// use client::domain::{GoalType, ProgressDirection};
    ///
    /// assert_eq!(GoalType::WeightLoss.direction(), ProgressDirection::Decrease);
    /// assert_eq!(GoalType::Endurance.direction(), ProgressDirection::Increase);
    /// ```
    pub fn direction(&self) -> ProgressDirection {
        match self {
            Self::WeightLoss => ProgressDirection::Decrease,
            _ => ProgressDirection::Increase,
        }
    }
}

/// Which way a goal's current value moves towards its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressDirection {
    /// Current value grows towards the target.
    Increase,
    /// Current value shrinks towards the target.
    Decrease,
}

/// Intermediate checkpoint on the way to a goal's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub title: String,
    pub target_value: f64,
    #[serde(default)]
    pub achieved_at: Option<DateTime<Utc>>,
}

/// A persisted goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: GoalCategory,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub status: GoalStatus,
    pub priority: GoalPriority,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub current_value: f64,
    /// Reading when the goal was created; the baseline for decreasing goals.
    #[serde(default)]
    pub start_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_progress_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Goal);

/// Progress of a goal towards its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// Display percentage, always within `0..=100`.
    pub percent: f64,
    /// Whether the target has been reached, judged on the unclamped ratio.
    pub is_complete: bool,
}

impl GoalProgress {
    fn from_ratio(ratio: f64) -> Self {
        Self {
            percent: clamp_percent(ratio * 100.0),
            is_complete: ratio >= 1.0,
        }
    }

    fn binary(is_complete: bool) -> Self {
        Self {
            percent: if is_complete { 100.0 } else { 0.0 },
            is_complete,
        }
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

impl Goal {
    /// Direction derived from the goal type.
    pub fn direction(&self) -> ProgressDirection {
        self.goal_type.direction()
    }

    /// Progress towards the target, or `None` for goals without one.
    ///
    /// Increasing goals report `min(current / target * 100, 100)` and are
    /// complete once the unclamped ratio reaches 1. Decreasing goals measure
    /// the distance covered from `start_value` towards the target.
    ///
    /// # Examples
    /// ```
    /// # use client::domain::{Goal, GoalCategory, GoalPriority, GoalStatus, GoalType, RecordId};
    /// # use chrono::Utc;
    /// # let now = Utc::now();
    /// let goal = Goal {
    ///     id: RecordId::new("g-1").expect("valid id"),
    ///     title: "Run 70km".to_owned(),
    ///     description: None,
    ///     category: GoalCategory::Fitness,
    ///     goal_type: GoalType::Endurance,
    ///     status: GoalStatus::Active,
    ///     priority: GoalPriority::Medium,
    ///     target_value: Some(70.0),
    ///     current_value: 35.0,
    ///     start_value: None,
    ///     unit: Some("km".to_owned()),
    ///     start_date: None,
    ///     target_date: None,
    ///     last_progress_update: None,
    ///     completed_at: None,
    ///     milestones: Vec::new(),
    ///     tags: Vec::new(),
    ///     created_at: now,
    ///     updated_at: now,
    /// };
    /// let progress = goal.progress().expect("goal has a target");
    /// assert_eq!(progress.percent, 50.0);
    /// assert!(!progress.is_complete);
    /// ```
    pub fn progress(&self) -> Option<GoalProgress> {
        let target = self.target_value?;
        let current = self.current_value;
        let progress = match self.direction() {
            ProgressDirection::Increase => {
                if target <= 0.0 {
                    GoalProgress::binary(current >= target)
                } else {
                    GoalProgress::from_ratio(current / target)
                }
            }
            ProgressDirection::Decrease => {
                let is_complete = current <= target;
                match self.start_value {
                    Some(start) if start > target => {
                        let covered = (start - current) / (start - target);
                        GoalProgress {
                            percent: clamp_percent(covered * 100.0),
                            is_complete,
                        }
                    }
                    _ => GoalProgress::binary(is_complete),
                }
            }
        };
        Some(progress)
    }

    /// Whether the goal is active and its target date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == GoalStatus::Active && self.target_date.is_some_and(|date| date < now)
    }
}

/// Payload for creating a goal; the gateway assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: GoalCategory,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub status: GoalStatus,
    pub priority: GoalPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    pub current_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<Milestone>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl GoalDraft {
    /// Start a draft with the required fields; the rest take defaults.
    pub fn new(title: impl Into<String>, category: GoalCategory, goal_type: GoalType) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
            goal_type,
            status: GoalStatus::Active,
            priority: GoalPriority::Medium,
            target_value: None,
            current_value: 0.0,
            unit: None,
            target_date: None,
            milestones: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Set the numeric target and the starting reading.
    pub fn with_target(mut self, current_value: f64, target_value: f64) -> Self {
        self.current_value = current_value;
        self.target_value = Some(target_value);
        self
    }

    /// Set the deadline.
    pub fn with_target_date(mut self, target_date: DateTime<Utc>) -> Self {
        self.target_date = Some(target_date);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: GoalPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Partial goal update; absent fields are left unchanged by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<GoalPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<Milestone>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl GoalPatch {
    /// Apply the patch to a local copy, as the gateway would.
    pub fn apply_to(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            goal.description = Some(description.clone());
        }
        if let Some(category) = self.category {
            goal.category = category;
        }
        if let Some(priority) = self.priority {
            goal.priority = priority;
        }
        if let Some(target_value) = self.target_value {
            goal.target_value = Some(target_value);
        }
        if let Some(unit) = &self.unit {
            goal.unit = Some(unit.clone());
        }
        if let Some(target_date) = self.target_date {
            goal.target_date = Some(target_date);
        }
        if let Some(milestones) = &self.milestones {
            goal.milestones.clone_from(milestones);
        }
        if let Some(tags) = &self.tags {
            goal.tags.clone_from(tags);
        }
    }
}

/// How a progress reading relates to the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    /// The reading replaces the current value.
    #[default]
    Set,
    /// The reading is added to the current value.
    Increment,
}

/// Progress reading sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default)]
    pub mode: ProgressMode,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ProgressUpdate {
    /// Reading that replaces the current value.
    pub fn set(value: f64) -> Self {
        Self {
            mode: ProgressMode::Set,
            value,
            note: None,
        }
    }

    /// Reading added to the current value.
    pub fn increment(delta: f64) -> Self {
        Self {
            mode: ProgressMode::Increment,
            value: delta,
            note: None,
        }
    }

    /// Value the goal holds once this reading is applied.
    pub fn resolve(&self, current_value: f64) -> f64 {
        match self.mode {
            ProgressMode::Set => self.value,
            ProgressMode::Increment => current_value + self.value,
        }
    }
}

/// Status transition sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: GoalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusChange {
    /// Transition without a stated reason.
    pub fn to(status: GoalStatus) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    /// Attach the reason shown in the goal history.
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Field a goal list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    TargetDate,
    Priority,
    Title,
}

impl GoalSortKey {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::TargetDate => "targetDate",
            Self::Priority => "priority",
            Self::Title => "title",
        }
    }
}

/// Active goal list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalFilters {
    pub status: Option<GoalStatus>,
    pub category: Option<GoalCategory>,
    pub priority: Option<GoalPriority>,
    pub goal_type: Option<GoalType>,
    pub search: Option<String>,
    pub sort_by: GoalSortKey,
    pub sort_order: SortOrder,
}

impl GoalFilters {
    /// Whether `goal` satisfies every predicate.
    pub fn matches(&self, goal: &Goal) -> bool {
        self.status.is_none_or(|status| goal.status == status)
            && self.category.is_none_or(|category| goal.category == category)
            && self.priority.is_none_or(|priority| goal.priority == priority)
            && self.goal_type.is_none_or(|goal_type| goal.goal_type == goal_type)
            && self.search.as_deref().is_none_or(|needle| {
                contains_ignore_case(&goal.title, needle)
                    || goal
                        .description
                        .as_deref()
                        .is_some_and(|text| contains_ignore_case(text, needle))
            })
    }

    /// Ascending comparison on the configured sort key.
    pub fn compare(&self, left: &Goal, right: &Goal) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            GoalSortKey::CreatedAt => left.created_at.cmp(&right.created_at),
            GoalSortKey::UpdatedAt => left.updated_at.cmp(&right.updated_at),
            GoalSortKey::TargetDate => left.target_date.cmp(&right.target_date),
            GoalSortKey::Priority => left.priority.cmp(&right.priority),
            GoalSortKey::Title => left.title.to_lowercase().cmp(&right.title.to_lowercase()),
        };
        self.sort_order.apply(ordering)
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Shallow-merge update for [`GoalFilters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalFiltersPatch {
    pub status: FieldUpdate<GoalStatus>,
    pub category: FieldUpdate<GoalCategory>,
    pub priority: FieldUpdate<GoalPriority>,
    pub goal_type: FieldUpdate<GoalType>,
    pub search: FieldUpdate<String>,
    pub sort_by: Option<GoalSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl GoalFiltersPatch {
    /// Merge into `filters`.
    pub fn apply_to(self, filters: &mut GoalFilters) {
        self.status.apply_to(&mut filters.status);
        self.category.apply_to(&mut filters.category);
        self.priority.apply_to(&mut filters.priority);
        self.goal_type.apply_to(&mut filters.goal_type);
        self.search.apply_to(&mut filters.search);
        if let Some(sort_by) = self.sort_by {
            filters.sort_by = sort_by;
        }
        if let Some(sort_order) = self.sort_order {
            filters.sort_order = sort_order;
        }
    }
}

/// Goal list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalQuery {
    pub filters: GoalFilters,
    pub page: PageRequest,
}

impl GoalQuery {
    /// Pair filters with a page position.
    pub fn new(filters: GoalFilters, page: PageRequest) -> Self {
        Self { filters, page }
    }
}
