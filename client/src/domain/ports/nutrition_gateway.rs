//! Port for the remote meal log.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::Page;

use crate::domain::{DailyNutrition, Meal, MealDraft, MealPatch, MealQuery, RecordId, WaterIntake};

use super::GatewayError;

/// Remote CRUD surface for meals plus daily nutrition aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NutritionGateway: Send + Sync {
    /// Fetch one page of meals.
    async fn list(&self, query: &MealQuery) -> Result<Page<Meal>, GatewayError>;

    /// Fetch a single meal.
    async fn get(&self, id: &RecordId) -> Result<Meal, GatewayError>;

    /// Log a meal.
    async fn create(&self, draft: &MealDraft) -> Result<Meal, GatewayError>;

    /// Apply a partial update.
    async fn update(&self, id: &RecordId, patch: &MealPatch) -> Result<Meal, GatewayError>;

    /// Delete a meal.
    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError>;

    /// Add `amount_ml` of water to `date` and return the day's running total.
    async fn add_water_intake(
        &self,
        date: NaiveDate,
        amount_ml: u32,
    ) -> Result<WaterIntake, GatewayError>;

    /// Nutrition aggregate for `date`.
    async fn get_daily_nutrition(&self, date: NaiveDate) -> Result<DailyNutrition, GatewayError>;
}
