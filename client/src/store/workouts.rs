//! Workouts slice.

use std::sync::Arc;

use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{SliceKey, WorkoutGateway};
use crate::domain::{
    OperationKind, RecordId, SliceResult, Workout, WorkoutDraft, WorkoutFilters,
    WorkoutFiltersPatch, WorkoutPatch, WorkoutQuery,
};

use super::SliceOptions;
use super::slice::SliceCore;
use super::slice_surface;

/// Client-side cache of the user's workouts.
pub struct WorkoutsSlice<G> {
    gateway: Arc<G>,
    core: SliceCore<Workout, WorkoutFilters>,
}

slice_surface!(
    WorkoutsSlice<WorkoutGateway>,
    key: SliceKey::Workouts,
    record: Workout,
    filters: WorkoutFilters,
    patch: WorkoutFiltersPatch,
    caches: (),
);

impl<G: WorkoutGateway> WorkoutsSlice<G> {
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>, options: SliceOptions) -> Self {
        Self {
            gateway,
            core: SliceCore::new(clock, options),
        }
    }

    /// Replace the collection with the page matching `query`.
    pub async fn fetch_collection(&self, query: &WorkoutQuery) -> SliceResult<Page<Workout>> {
        self.core.fetch_page(self.gateway.list(query)).await
    }

    /// Re-fetch the current page with the current filters.
    pub async fn refresh(&self) -> SliceResult<Page<Workout>> {
        let query = self.read(|state| {
            WorkoutQuery::new(state.filters().clone(), state.pagination().request())
        });
        self.fetch_collection(&query).await
    }

    /// Load one record into the focus slot.
    pub async fn fetch_one(&self, id: &RecordId) -> SliceResult<Workout> {
        self.core.fetch_one(id, self.gateway.get(id)).await
    }

    /// Create a record, prepend it and count it in the total.
    pub async fn create(&self, draft: &WorkoutDraft) -> SliceResult<Workout> {
        self.core.create(self.gateway.create(draft)).await
    }

    /// Apply `patch`; the record keeps its position.
    pub async fn update(&self, id: &RecordId, patch: &WorkoutPatch) -> SliceResult<Workout> {
        self.core
            .replace(OperationKind::Update, id, self.gateway.update(id, patch))
            .await
    }

    /// Delete a record; a failure leaves the cache untouched.
    pub async fn remove(&self, id: &RecordId) -> SliceResult<()> {
        self.core.remove(id, self.gateway.delete(id)).await
    }
}
