//! Port for the remote goal store.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{Goal, GoalDraft, GoalPatch, GoalQuery, ProgressUpdate, RecordId, StatusChange};

use super::GatewayError;

/// Remote CRUD surface for goals, scoped to the authenticated user.
///
/// The gateway is the source of truth: every mutating call answers with the
/// full post-mutation record carrying server-assigned timestamps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoalGateway: Send + Sync {
    /// Fetch one page of goals matching the query's filters.
    async fn list(&self, query: &GoalQuery) -> Result<Page<Goal>, GatewayError>;

    /// Fetch a single goal.
    async fn get(&self, id: &RecordId) -> Result<Goal, GatewayError>;

    /// Create a goal; the gateway assigns id and timestamps.
    async fn create(&self, draft: &GoalDraft) -> Result<Goal, GatewayError>;

    /// Apply a partial update.
    async fn update(&self, id: &RecordId, patch: &GoalPatch) -> Result<Goal, GatewayError>;

    /// Delete a goal.
    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError>;

    /// Record a progress reading.
    async fn update_progress(
        &self,
        id: &RecordId,
        update: &ProgressUpdate,
    ) -> Result<Goal, GatewayError>;

    /// Transition the goal's status.
    async fn update_status(
        &self,
        id: &RecordId,
        change: &StatusChange,
    ) -> Result<Goal, GatewayError>;

    /// Recompute the goal's current value from related records (for example
    /// the latest weight entry of a weight goal).
    async fn sync(&self, id: &RecordId) -> Result<Goal, GatewayError>;
}
