//! Goals slice: collection cache, progress and status transitions, and the
//! optimistic completion flow.

use std::sync::Arc;

use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{GoalGateway, SliceKey};
use crate::domain::{
    Goal, GoalDraft, GoalFilters, GoalFiltersPatch, GoalPatch, GoalQuery, GoalStatus,
    OperationKind, ProgressUpdate, RecordId, SliceResult, StatusChange,
};

use super::SliceOptions;
use super::slice::SliceCore;
use super::slice_surface;

/// Client-side cache of the user's goals.
pub struct GoalsSlice<G> {
    gateway: Arc<G>,
    core: SliceCore<Goal, GoalFilters>,
}

slice_surface!(
    GoalsSlice<GoalGateway>,
    key: SliceKey::Goals,
    record: Goal,
    filters: GoalFilters,
    patch: GoalFiltersPatch,
    caches: (),
);

impl<G: GoalGateway> GoalsSlice<G> {
    /// Create an empty slice backed by `gateway`.
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>, options: SliceOptions) -> Self {
        Self {
            gateway,
            core: SliceCore::new(clock, options),
        }
    }

    /// Replace the collection with the page matching `query`.
    ///
    /// The filter state is left alone; only the pagination is overwritten
    /// from the response.
    pub async fn fetch_collection(&self, query: &GoalQuery) -> SliceResult<Page<Goal>> {
        self.core.fetch_page(self.gateway.list(query)).await
    }

    /// Re-fetch the current page with the current filters.
    pub async fn refresh(&self) -> SliceResult<Page<Goal>> {
        let query = self.read(|state| {
            GoalQuery::new(state.filters().clone(), state.pagination().request())
        });
        self.fetch_collection(&query).await
    }

    /// Load one goal into the focus slot.
    pub async fn fetch_one(&self, id: &RecordId) -> SliceResult<Goal> {
        self.core.fetch_one(id, self.gateway.get(id)).await
    }

    /// Create a goal and put it at the front of the collection.
    pub async fn create(&self, draft: &GoalDraft) -> SliceResult<Goal> {
        self.core.create(self.gateway.create(draft)).await
    }

    /// Apply a partial update; the goal keeps its position.
    pub async fn update(&self, id: &RecordId, patch: &GoalPatch) -> SliceResult<Goal> {
        self.core
            .replace(OperationKind::Update, id, self.gateway.update(id, patch))
            .await
    }

    /// Delete a goal.
    pub async fn remove(&self, id: &RecordId) -> SliceResult<()> {
        self.core.remove(id, self.gateway.delete(id)).await
    }

    /// Record a progress reading, tracked under [`OperationKind::Progress`].
    pub async fn update_progress(
        &self,
        id: &RecordId,
        update: &ProgressUpdate,
    ) -> SliceResult<Goal> {
        self.core
            .replace(
                OperationKind::Progress,
                id,
                self.gateway.update_progress(id, update),
            )
            .await
    }

    /// Transition the status, tracked under [`OperationKind::Status`].
    pub async fn update_status(&self, id: &RecordId, change: &StatusChange) -> SliceResult<Goal> {
        self.core
            .replace(
                OperationKind::Status,
                id,
                self.gateway.update_status(id, change),
            )
            .await
    }

    /// Ask the gateway to recompute the goal from related records.
    pub async fn sync(&self, id: &RecordId) -> SliceResult<Goal> {
        self.core
            .replace(OperationKind::Sync, id, self.gateway.sync(id))
            .await
    }

    /// Apply `update` locally before the gateway confirms it.
    ///
    /// Returns `false` when the goal is not cached.
    pub fn apply_optimistic_progress(&self, id: &RecordId, update: &ProgressUpdate) -> bool {
        let now = self.now();
        self.core.mutate(|state| {
            state.stage_optimistic(id, |goal| apply_progress(goal, update, now))
        })
    }

    /// Mark the goal completed locally before the gateway confirms it.
    ///
    /// Returns `false` when the goal is not cached.
    pub fn apply_optimistic_completion(&self, id: &RecordId) -> bool {
        let now = self.now();
        self.core
            .mutate(|state| state.stage_optimistic(id, |goal| apply_completion(goal, now)))
    }

    /// Accept the pending optimistic change on `id` as it stands.
    pub fn confirm_optimistic(&self, id: &RecordId) -> bool {
        self.core.mutate(|state| state.confirm_optimistic(id))
    }

    /// Restore the last confirmed version of `id`.
    pub fn rollback_optimistic(&self, id: &RecordId) -> bool {
        self.core.mutate(|state| state.rollback_optimistic(id))
    }

    /// Complete a goal optimistically: the cache shows it completed at once,
    /// the server copy replaces it on success, and the previous version comes
    /// back on failure.
    pub async fn complete_optimistically(&self, id: &RecordId) -> SliceResult<Goal> {
        let now = self.now();
        let change = StatusChange::to(GoalStatus::Completed);
        self.core
            .replace_optimistically(
                OperationKind::Status,
                id,
                |goal| apply_completion(goal, now),
                self.gateway.update_status(id, &change),
            )
            .await
    }

    /// Record progress optimistically, with the same confirm-or-rollback
    /// contract as [`Self::complete_optimistically`].
    pub async fn update_progress_optimistically(
        &self,
        id: &RecordId,
        update: &ProgressUpdate,
    ) -> SliceResult<Goal> {
        let now = self.now();
        self.core
            .replace_optimistically(
                OperationKind::Progress,
                id,
                |goal| apply_progress(goal, update, now),
                self.gateway.update_progress(id, update),
            )
            .await
    }
}

fn apply_progress(goal: &mut Goal, update: &ProgressUpdate, now: chrono::DateTime<chrono::Utc>) {
    goal.current_value = update.resolve(goal.current_value);
    goal.last_progress_update = Some(now);
}

fn apply_completion(goal: &mut Goal, now: chrono::DateTime<chrono::Utc>) {
    goal.status = GoalStatus::Completed;
    goal.completed_at = Some(now);
    if let Some(target) = goal.target_value {
        goal.current_value = target;
    }
}

#[cfg(test)]
#[path = "goals_tests.rs"]
mod tests;
