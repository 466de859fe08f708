//! Port for the remote weight log.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{
    BulkImportResult, RecordId, TrendPeriod, WeightComparison, WeightDraft, WeightEntry,
    WeightPatch, WeightQuery, WeightSummary, WeightTrends,
};

use super::GatewayError;

/// Remote CRUD and analytics surface for weight entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeightGateway: Send + Sync {
    /// Fetch one page of entries.
    async fn list(&self, query: &WeightQuery) -> Result<Page<WeightEntry>, GatewayError>;

    /// Fetch a single entry.
    async fn get(&self, id: &RecordId) -> Result<WeightEntry, GatewayError>;

    /// Record an entry.
    async fn create(&self, draft: &WeightDraft) -> Result<WeightEntry, GatewayError>;

    /// Apply a partial update.
    async fn update(&self, id: &RecordId, patch: &WeightPatch)
    -> Result<WeightEntry, GatewayError>;

    /// Delete an entry.
    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError>;

    /// Trend line over `period`.
    async fn get_trends(&self, period: TrendPeriod) -> Result<WeightTrends, GatewayError>;

    /// Aggregate statistics over every entry.
    async fn get_summary(&self) -> Result<WeightSummary, GatewayError>;

    /// Most recent entry by date, if any exist.
    async fn get_latest(&self) -> Result<Option<WeightEntry>, GatewayError>;

    /// Compare two entries; `from` is the baseline.
    async fn compare_entries(
        &self,
        from: &RecordId,
        to: &RecordId,
    ) -> Result<WeightComparison, GatewayError>;

    /// Import many entries at once.
    async fn bulk_import(&self, drafts: Vec<WeightDraft>)
    -> Result<BulkImportResult, GatewayError>;
}
