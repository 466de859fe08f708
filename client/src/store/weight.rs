//! Weight slice: entry cache plus the trend, summary and comparison caches.

use std::sync::Arc;

use mockable::Clock;
use pagination::Page;

use crate::domain::ports::{SliceKey, WeightGateway};
use crate::domain::{
    BulkImportResult, OperationKind, RecordId, SliceResult, TrendPeriod, WeightComparison,
    WeightDraft, WeightEntry, WeightFilters, WeightFiltersPatch, WeightPatch, WeightQuery,
    WeightSummary, WeightTrends,
};

use super::SliceOptions;
use super::sequencer::Scope;
use super::slice::SliceCore;
use super::slice_surface;

/// Derived weight payloads computed by the gateway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightCaches {
    pub trends: Option<WeightTrends>,
    pub summary: Option<WeightSummary>,
    /// Most recent entry by date; `Some(None)` once fetched from an empty log.
    pub latest: Option<Option<WeightEntry>>,
    pub comparison: Option<WeightComparison>,
    pub last_import: Option<BulkImportResult>,
}

/// Client-side cache of the user's weight log.
pub struct WeightSlice<G> {
    gateway: Arc<G>,
    core: SliceCore<WeightEntry, WeightFilters, WeightCaches>,
}

slice_surface!(
    WeightSlice<WeightGateway>,
    key: SliceKey::Weight,
    record: WeightEntry,
    filters: WeightFilters,
    patch: WeightFiltersPatch,
    caches: WeightCaches,
);

impl<G: WeightGateway> WeightSlice<G> {
    /// Create an empty slice backed by `gateway`.
    pub fn new(gateway: Arc<G>, clock: Arc<dyn Clock>, options: SliceOptions) -> Self {
        Self {
            gateway,
            core: SliceCore::new(clock, options),
        }
    }

    /// Replace the collection with the page matching `query`.
    pub async fn fetch_collection(&self, query: &WeightQuery) -> SliceResult<Page<WeightEntry>> {
        self.core.fetch_page(self.gateway.list(query)).await
    }

    /// Re-fetch the current page with the current filters.
    pub async fn refresh(&self) -> SliceResult<Page<WeightEntry>> {
        let query = self.read(|state| {
            WeightQuery::new(state.filters().clone(), state.pagination().request())
        });
        self.fetch_collection(&query).await
    }

    /// Load one entry into the focus slot.
    pub async fn fetch_one(&self, id: &RecordId) -> SliceResult<WeightEntry> {
        self.core.fetch_one(id, self.gateway.get(id)).await
    }

    /// Record an entry and put it at the front of the collection.
    pub async fn create(&self, draft: &WeightDraft) -> SliceResult<WeightEntry> {
        self.core.create(self.gateway.create(draft)).await
    }

    /// Apply a partial update; the entry keeps its position.
    pub async fn update(&self, id: &RecordId, patch: &WeightPatch) -> SliceResult<WeightEntry> {
        self.core
            .replace(OperationKind::Update, id, self.gateway.update(id, patch))
            .await
    }

    /// Delete an entry.
    pub async fn remove(&self, id: &RecordId) -> SliceResult<()> {
        self.core.remove(id, self.gateway.delete(id)).await
    }

    /// Fetch the trend line for `period` into the trends cache.
    pub async fn fetch_trends(&self, period: TrendPeriod) -> SliceResult<WeightTrends> {
        self.core
            .run(
                OperationKind::Trends,
                Some(Scope::Aggregate(OperationKind::Trends)),
                self.gateway.get_trends(period),
                |state, trends| state.caches_mut().trends = Some(trends.clone()),
            )
            .await
    }

    /// Fetch summary statistics into the summary cache.
    pub async fn fetch_summary(&self) -> SliceResult<WeightSummary> {
        self.core
            .run(
                OperationKind::Summary,
                Some(Scope::Aggregate(OperationKind::Summary)),
                self.gateway.get_summary(),
                |state, summary| state.caches_mut().summary = Some(summary.clone()),
            )
            .await
    }

    /// Fetch the most recent entry into the latest cache.
    pub async fn fetch_latest(&self) -> SliceResult<Option<WeightEntry>> {
        self.core
            .run(
                OperationKind::Latest,
                Some(Scope::Aggregate(OperationKind::Latest)),
                self.gateway.get_latest(),
                |state, latest| state.caches_mut().latest = Some(latest.clone()),
            )
            .await
    }

    /// Compare two entries; `from` is the baseline.
    pub async fn compare_entries(
        &self,
        from: &RecordId,
        to: &RecordId,
    ) -> SliceResult<WeightComparison> {
        self.core
            .run(
                OperationKind::Compare,
                Some(Scope::Aggregate(OperationKind::Compare)),
                self.gateway.compare_entries(from, to),
                |state, comparison| state.caches_mut().comparison = Some(comparison.clone()),
            )
            .await
    }

    /// Import many entries; the imported ones are prepended and counted.
    pub async fn bulk_import(&self, drafts: Vec<WeightDraft>) -> SliceResult<BulkImportResult> {
        self.core
            .run(
                OperationKind::Import,
                None,
                self.gateway.bulk_import(drafts),
                |state, result| {
                    state.prepend_all(&result.imported);
                    state.add_to_total(result.imported.len() as u64);
                    state.caches_mut().last_import = Some(result.clone());
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Tests for the weight slice.

    use std::sync::Arc;

    use pagination::Pagination;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{GatewayError, MockWeightGateway};
    use crate::test_support::{FixtureClock, date, record_id, weight_fixture};

    fn slice(gateway: MockWeightGateway) -> WeightSlice<MockWeightGateway> {
        WeightSlice::new(
            Arc::new(gateway),
            Arc::new(FixtureClock::default()),
            SliceOptions::default(),
        )
    }

    #[tokio::test]
    async fn bulk_import_prepends_and_counts() {
        let mut gateway = MockWeightGateway::new();
        gateway.expect_list().return_once(|_| {
            Ok(Page::new(
                vec![weight_fixture("w-1", date(2024, 1, 1), 80.0)],
                Pagination::from_response(1, 20, 1),
            ))
        });
        gateway.expect_bulk_import().return_once(|drafts| {
            assert_eq!(drafts.len(), 3);
            Ok(BulkImportResult {
                imported: vec![
                    weight_fixture("w-3", date(2024, 1, 15), 78.5),
                    weight_fixture("w-2", date(2024, 1, 8), 79.0),
                ],
                skipped: 1,
            })
        });
        let slice = slice(gateway);
        slice
            .fetch_collection(&WeightQuery::default())
            .await
            .expect("fetch succeeds");

        let drafts = vec![
            WeightDraft::kg(79.0, date(2024, 1, 8)),
            WeightDraft::kg(78.5, date(2024, 1, 15)),
            WeightDraft::kg(80.0, date(2024, 1, 1)),
        ];
        let result = slice.bulk_import(drafts).await.expect("import succeeds");

        assert_eq!(result.skipped, 1);
        slice.read(|state| {
            let ids: Vec<&str> = state.items().iter().map(|entry| entry.id.as_ref()).collect();
            assert_eq!(ids, vec!["w-3", "w-2", "w-1"]);
            assert_eq!(state.pagination().total(), 3);
            assert_eq!(state.caches().last_import.as_ref(), Some(&result));
        });
    }

    #[tokio::test]
    async fn latest_caches_empty_log_distinctly() {
        let mut gateway = MockWeightGateway::new();
        gateway.expect_get_latest().return_once(|| Ok(None));
        let slice = slice(gateway);

        assert!(slice.read(|state| state.caches().latest.is_none()));
        let latest = slice.fetch_latest().await.expect("latest succeeds");

        assert!(latest.is_none());
        assert_eq!(slice.read(|state| state.caches().latest.clone()), Some(None));
    }

    #[tokio::test]
    async fn comparison_is_cached() {
        let mut gateway = MockWeightGateway::new();
        gateway.expect_compare_entries().return_once(|_, _| {
            Ok(WeightComparison::between(
                weight_fixture("w-1", date(2024, 1, 1), 80.0),
                weight_fixture("w-2", date(2024, 1, 8), 79.0),
            ))
        });
        let slice = slice(gateway);

        let comparison = slice
            .compare_entries(&record_id("w-1"), &record_id("w-2"))
            .await
            .expect("compare succeeds");

        assert_eq!(comparison.days_between, 7);
        assert_eq!(
            slice.read(|state| state.caches().comparison.clone()),
            Some(comparison)
        );
    }

    #[rstest]
    #[case(TrendPeriod::Week)]
    #[case(TrendPeriod::Year)]
    #[tokio::test]
    async fn trends_failure_keeps_previous_cache(#[case] period: TrendPeriod) {
        let mut gateway = MockWeightGateway::new();
        let cached = WeightTrends {
            period: TrendPeriod::Month,
            points: Vec::new(),
            average_change_per_week: -0.5,
        };
        let returned = cached.clone();
        gateway
            .expect_get_trends()
            .withf(|period| *period == TrendPeriod::Month)
            .return_once(move |_| Ok(returned));
        gateway
            .expect_get_trends()
            .withf(|period| *period != TrendPeriod::Month)
            .return_once(|_| Err(GatewayError::connection("trend service down")));
        let slice = slice(gateway);

        slice
            .fetch_trends(TrendPeriod::Month)
            .await
            .expect("month trends succeed");
        slice.fetch_trends(period).await.expect_err("trends fail");

        slice.read(|state| {
            assert_eq!(state.caches().trends.as_ref(), Some(&cached));
            assert_eq!(
                state.operations().error(OperationKind::Trends),
                Some("trend service down")
            );
        });
    }

    #[tokio::test]
    async fn summary_success_clears_previous_error() {
        let mut gateway = MockWeightGateway::new();
        let mut calls = 0;
        gateway.expect_get_summary().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(GatewayError::connection("offline"))
            } else {
                Ok(WeightSummary {
                    current_kg: Some(79.0),
                    starting_kg: Some(80.0),
                    lowest_kg: Some(79.0),
                    highest_kg: Some(80.0),
                    average_kg: Some(79.5),
                    total_entries: 2,
                })
            }
        });
        let slice = slice(gateway);

        slice.fetch_summary().await.expect_err("first attempt fails");
        assert_eq!(
            slice.read(|state| state.operations().error(OperationKind::Summary).map(str::to_owned)),
            Some("offline".to_owned())
        );

        slice.fetch_summary().await.expect("second attempt succeeds");
        slice.read(|state| {
            assert_eq!(state.operations().error(OperationKind::Summary), None);
            assert_eq!(
                state.caches().summary.as_ref().map(|summary| summary.total_entries),
                Some(2)
            );
        });
    }
}
