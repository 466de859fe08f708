//! Nutrition slice: meal cache plus today's water and daily totals.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{NutritionGateway, SliceKey};
use crate::domain::{
    DailyNutrition, Meal, MealDraft, MealFilters, MealFiltersPatch, MealPatch, MealQuery,
    OperationKind, RecordId, SliceResult, WaterIntake,
};

use super::SliceOptions;
use super::sequencer::Scope;
use super::slice::SliceCore;
use super::slice_surface;

/// Derived nutrition payloads computed by the gateway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutritionCaches {
    pub daily: Option<DailyNutrition>,
    /// Running water total returned by the last intake.
    pub water: Option<WaterIntake>,
}

impl NutritionCaches {
    fn record_water(&mut self, intake: WaterIntake) {
        if let Some(daily) = self.daily.as_mut().filter(|daily| daily.date == intake.date) {
            daily.water_ml = intake.amount_ml;
        }
        self.water = Some(intake);
    }
}

/// Client-side cache of the user's meals.
pub struct NutritionSlice<G> {
    gateway: Arc<G>,
    core: SliceCore<Meal, MealFilters, NutritionCaches>,
}

slice_surface!(
    NutritionSlice<NutritionGateway>,
    key: SliceKey::Nutrition,
    record: Meal,
    filters: MealFilters,
    patch: MealFiltersPatch,
    caches: NutritionCaches,
);

impl<G: NutritionGateway> NutritionSlice<G> {
    /// Create an empty slice backed by `gateway`.
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>, options: SliceOptions) -> Self {
        Self {
            gateway,
            core: SliceCore::new(clock, options),
        }
    }

    /// Replace the collection with the page matching `query`.
    pub async fn fetch_collection(&self, query: &MealQuery) -> SliceResult<Page<Meal>> {
        self.core.fetch_page(self.gateway.list(query)).await
    }

    /// Re-fetch the current page with the current filters.
    pub async fn refresh(&self) -> SliceResult<Page<Meal>> {
        let query =
            self.read(|state| MealQuery::new(state.filters().clone(), state.pagination().request()));
        self.fetch_collection(&query).await
    }

    /// Load one record into the focus slot.
    pub async fn fetch_one(&self, id: &RecordId) -> SliceResult<Meal> {
        self.core.fetch_one(id, self.gateway.get(id)).await
    }

    /// Create a record, prepend it and count it in the total.
    pub async fn create(&self, draft: &MealDraft) -> SliceResult<Meal> {
        self.core.create(self.gateway.create(draft)).await
    }

    /// Apply `patch`; the record keeps its position.
    pub async fn update(&self, id: &RecordId, patch: &MealPatch) -> SliceResult<Meal> {
        self.core
            .replace(OperationKind::Update, id, self.gateway.update(id, patch))
            .await
    }

    /// Delete a record; a failure leaves the cache untouched.
    pub async fn remove(&self, id: &RecordId) -> SliceResult<()> {
        self.core.remove(id, self.gateway.delete(id)).await
    }

    /// Log `amount_ml` of water against today's date.
    ///
    /// Intakes are additive on the gateway, so every response is applied.
    /// A cached daily aggregate for the same date picks up the new total.
    pub async fn add_water_intake(&self, amount_ml: u32) -> SliceResult<WaterIntake> {
        let today = self.now().date_naive();
        self.core
            .run(
                OperationKind::Water,
                None,
                self.gateway.add_water_intake(today, amount_ml),
                |state, intake| state.caches_mut().record_water(*intake),
            )
            .await
    }

    /// Fetch the aggregate for `date` into the daily cache.
    pub async fn fetch_daily_nutrition(&self, date: NaiveDate) -> SliceResult<DailyNutrition> {
        self.core
            .run(
                OperationKind::Daily,
                Some(Scope::Aggregate(OperationKind::Daily)),
                self.gateway.get_daily_nutrition(date),
                |state, daily| state.caches_mut().daily = Some(daily.clone()),
            )
            .await
    }
}
