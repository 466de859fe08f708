//! Port for the remote workout log.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{RecordId, Workout, WorkoutDraft, WorkoutPatch, WorkoutQuery};

use super::GatewayError;

/// Remote CRUD surface for workouts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkoutGateway: Send + Sync {
    /// Fetch one page of workouts.
    async fn list(&self, query: &WorkoutQuery) -> Result<Page<Workout>, GatewayError>;

    /// Fetch a single workout.
    async fn get(&self, id: &RecordId) -> Result<Workout, GatewayError>;

    /// Log a workout.
    async fn create(&self, draft: &WorkoutDraft) -> Result<Workout, GatewayError>;

    /// Apply a partial update.
    async fn update(&self, id: &RecordId, patch: &WorkoutPatch) -> Result<Workout, GatewayError>;

    /// Delete a workout.
    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError>;
}
