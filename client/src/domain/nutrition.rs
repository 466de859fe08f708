//! Meals, nutrition facts and daily nutrition aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};

use super::goal::contains_ignore_case;
use super::record::impl_record;
use super::{FieldUpdate, RecordId, SortOrder};

/// Slot of the day a meal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

/// Macro- and micro-nutrient totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub sugar: Option<f64>,
    #[serde(default)]
    pub sodium: Option<f64>,
}

impl NutritionFacts {
    /// Field-wise sum; optional nutrients stay `None` only if both are.
    pub fn combined_with(&self, other: &Self) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
            fiber: add_optional(self.fiber, other.fiber),
            sugar: add_optional(self.sugar, other.sugar),
            sodium: add_optional(self.sodium, other.sodium),
        }
    }
}

fn add_optional(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (None, None) => None,
        (left, right) => Some(left.unwrap_or(0.0) + right.unwrap_or(0.0)),
    }
}

/// One food within a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub nutrition: NutritionFacts,
}

/// A persisted meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: RecordId,
    pub name: String,
    pub meal_type: MealType,
    pub eaten_at: DateTime<Utc>,
    #[serde(default)]
    pub foods: Vec<FoodItem>,
    #[serde(default)]
    pub nutrition: NutritionFacts,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Meal);

impl Meal {
    /// Calendar day the meal was eaten on (UTC).
    pub fn date(&self) -> NaiveDate {
        self.eaten_at.date_naive()
    }
}

/// Payload for logging a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDraft {
    pub name: String,
    pub meal_type: MealType,
    pub eaten_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foods: Vec<FoodItem>,
    /// Totals; when absent the gateway sums the foods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MealDraft {
    /// Nutrition totals, summing the foods when none were given.
    pub fn resolved_nutrition(&self) -> NutritionFacts {
        self.nutrition.unwrap_or_else(|| {
            self.foods
                .iter()
                .fold(NutritionFacts::default(), |acc, food| acc.combined_with(&food.nutrition))
        })
    }
}

/// Partial meal update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eaten_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foods: Option<Vec<FoodItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MealPatch {
    /// Apply the patch to a local copy, as the gateway would.
    pub fn apply_to(&self, meal: &mut Meal) {
        if let Some(name) = &self.name {
            meal.name.clone_from(name);
        }
        if let Some(meal_type) = self.meal_type {
            meal.meal_type = meal_type;
        }
        if let Some(eaten_at) = self.eaten_at {
            meal.eaten_at = eaten_at;
        }
        if let Some(foods) = &self.foods {
            meal.foods.clone_from(foods);
        }
        if let Some(nutrition) = self.nutrition {
            meal.nutrition = nutrition;
        }
        if let Some(notes) = &self.notes {
            meal.notes = Some(notes.clone());
        }
    }
}

/// Water logged on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterIntake {
    pub date: NaiveDate,
    /// Running total for the day in millilitres.
    pub amount_ml: u32,
}

/// Nutrition aggregate for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyNutrition {
    pub date: NaiveDate,
    pub totals: NutritionFacts,
    pub meal_count: u32,
    #[serde(default)]
    pub water_ml: u32,
    #[serde(default)]
    pub calorie_goal: Option<f64>,
    #[serde(default)]
    pub water_goal_ml: Option<u32>,
}

/// Field a meal list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MealSortKey {
    #[default]
    EatenAt,
    Calories,
    Name,
}

impl MealSortKey {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EatenAt => "eatenAt",
            Self::Calories => "calories",
            Self::Name => "name",
        }
    }
}

/// Active meal list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealFilters {
    pub meal_type: Option<MealType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: MealSortKey,
    pub sort_order: SortOrder,
}

impl MealFilters {
    /// Whether `meal` satisfies every predicate.
    pub fn matches(&self, meal: &Meal) -> bool {
        let date = meal.date();
        self.meal_type.is_none_or(|meal_type| meal.meal_type == meal_type)
            && self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
            && self.search.as_deref().is_none_or(|needle| {
                contains_ignore_case(&meal.name, needle)
                    || meal
                        .foods
                        .iter()
                        .any(|food| contains_ignore_case(&food.name, needle))
            })
    }

    /// Ascending comparison on the configured sort key.
    pub fn compare(&self, left: &Meal, right: &Meal) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            MealSortKey::EatenAt => left.eaten_at.cmp(&right.eaten_at),
            MealSortKey::Calories => left.nutrition.calories.total_cmp(&right.nutrition.calories),
            MealSortKey::Name => left.name.to_lowercase().cmp(&right.name.to_lowercase()),
        };
        self.sort_order.apply(ordering)
    }
}

/// Shallow-merge update for [`MealFilters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealFiltersPatch {
    pub meal_type: FieldUpdate<MealType>,
    pub start_date: FieldUpdate<NaiveDate>,
    pub end_date: FieldUpdate<NaiveDate>,
    pub search: FieldUpdate<String>,
    pub sort_by: Option<MealSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl MealFiltersPatch {
    /// Merge into `filters`.
    pub fn apply_to(self, filters: &mut MealFilters) {
        self.meal_type.apply_to(&mut filters.meal_type);
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

/// Meal list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealQuery {
    pub filters: MealFilters,
    pub page: PageRequest,
}

impl MealQuery {
    /// Pair filters with a page position.
    pub fn new(filters: MealFilters, page: PageRequest) -> Self {
        Self { filters, page }
    }
}
