//! Tests for the goals slice.

use std::sync::Arc;

use pagination::{Page, Pagination, PaginationPatch, PageRequest};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{GatewayError, MockGoalGateway};
use crate::domain::{
    ErrorCode, FieldUpdate, GoalCategory, GoalType, OperationKind, ProgressUpdate, Record,
};
use crate::store::StaleResponsePolicy;
use crate::store::sequencer::Scope;
use crate::test_support::{FixtureClock, fixture_timestamp, goal_fixture, record_id};

fn slice_with(gateway: MockGoalGateway, options: SliceOptions) -> GoalsSlice<MockGoalGateway> {
    GoalsSlice::new(
        Arc::new(gateway),
        Arc::new(FixtureClock::default()),
        options,
    )
}

fn page_of(goals: Vec<Goal>, total: u64) -> Page<Goal> {
    Page::new(goals, Pagination::from_response(1, 20, total))
}

fn seeded_slice() -> GoalsSlice<MockGoalGateway> {
    let mut gateway = MockGoalGateway::new();
    gateway.expect_list().return_once(|_| {
        Ok(page_of(
            vec![
                goal_fixture("g-1", GoalType::Endurance),
                goal_fixture("g-2", GoalType::Strength),
                goal_fixture("g-3", GoalType::WeightLoss),
            ],
            3,
        ))
    });
    slice_with(gateway, SliceOptions::default())
}

#[fixture]
fn seeded() -> GoalsSlice<MockGoalGateway> {
    seeded_slice()
}

async fn loaded(slice: GoalsSlice<MockGoalGateway>) -> GoalsSlice<MockGoalGateway> {
    slice
        .fetch_collection(&GoalQuery::default())
        .await
        .expect("seed fetch succeeds");
    slice
}

fn ids(slice: &GoalsSlice<MockGoalGateway>) -> Vec<String> {
    slice.read(|state| {
        state
            .items()
            .iter()
            .map(|goal| goal.id.to_string())
            .collect()
    })
}

#[tokio::test]
async fn fetch_replaces_collection_and_pagination() {
    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_list()
        .withf(|query| query.filters.status == Some(GoalStatus::Active))
        .times(1)
        .return_once(|_| {
            Ok(Page::new(
                vec![goal_fixture("g-1", GoalType::Habit)],
                Pagination::from_response(1, 20, 45),
            ))
        });
    let slice = slice_with(gateway, SliceOptions::default());
    let query = GoalQuery::new(
        GoalFilters {
            status: Some(GoalStatus::Active),
            ..GoalFilters::default()
        },
        PageRequest::first(20),
    );

    slice.fetch_collection(&query).await.expect("fetch succeeds");

    slice.read(|state| {
        assert_eq!(state.pagination().pages(), 3);
        assert_eq!(state.pagination().total(), 45);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.filters(), &GoalFilters::default());
        assert_eq!(state.last_synced_at(), Some(fixture_timestamp()));
        assert!(!state.operations().in_flight(OperationKind::Fetch));
    });
}

#[tokio::test]
async fn fetch_drops_duplicate_ids() {
    let mut gateway = MockGoalGateway::new();
    gateway.expect_list().return_once(|_| {
        Ok(page_of(
            vec![
                goal_fixture("g-1", GoalType::Habit),
                goal_fixture("g-1", GoalType::Habit),
                goal_fixture("g-2", GoalType::Habit),
            ],
            3,
        ))
    });
    let slice = slice_with(gateway, SliceOptions::default());

    slice
        .fetch_collection(&GoalQuery::default())
        .await
        .expect("fetch succeeds");

    assert_eq!(ids(&slice), vec!["g-1", "g-2"]);
}

#[tokio::test]
async fn failed_fetch_keeps_cache_and_records_error() {
    let slice = loaded(seeded_slice()).await;
    let before = ids(&slice);

    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_list()
        .return_once(|_| Err(GatewayError::connection("offline")));
    let failing = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };

    let error = failing
        .refresh()
        .await
        .expect_err("fetch fails");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(ids(&failing), before);
    failing.read(|state| {
        assert_eq!(state.operations().error(OperationKind::Fetch), Some("offline"));
        assert!(!state.operations().in_flight(OperationKind::Fetch));
    });
}

#[tokio::test]
async fn create_prepends_focuses_and_counts() {
    let mut gateway = MockGoalGateway::new();
    let created = goal_fixture("g-new", GoalType::WeightLoss);
    let returned = created.clone();
    gateway
        .expect_create()
        .times(1)
        .return_once(move |_| Ok(returned));
    let slice = slice_with(gateway, SliceOptions::default());

    let draft = GoalDraft::new("Lose 5kg", GoalCategory::Weight, GoalType::WeightLoss)
        .with_target(75.0, 70.0);
    let goal = slice.create(&draft).await.expect("create succeeds");

    assert_eq!(goal, created);
    slice.read(|state| {
        assert_eq!(state.items().first(), Some(&created));
        assert_eq!(state.current(), Some(&created));
        assert_eq!(state.pagination().total(), 1);
    });
}

#[tokio::test]
async fn failed_create_leaves_cache_untouched() {
    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_create()
        .return_once(|_| Err(GatewayError::rejected("title is required")));
    let slice = slice_with(gateway, SliceOptions::default());

    let draft = GoalDraft::new("", GoalCategory::Other, GoalType::Custom);
    let error = slice.create(&draft).await.expect_err("create fails");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    slice.read(|state| {
        assert!(state.items().is_empty());
        assert_eq!(state.pagination().total(), 0);
        assert_eq!(
            state.operations().error(OperationKind::Create),
            Some("title is required")
        );
    });
}

#[tokio::test]
async fn update_replaces_in_place() {
    let slice = loaded(seeded_slice()).await;
    let id = record_id("g-2");
    let mut updated = goal_fixture("g-2", GoalType::Strength);
    updated.title = "Deadlift 150kg".to_owned();
    updated.updated_at = fixture_timestamp() + chrono::TimeDelta::minutes(5);

    let mut gateway = MockGoalGateway::new();
    let returned = updated.clone();
    gateway
        .expect_update()
        .withf(|id, patch| *id == record_id("g-2") && patch.title.as_deref() == Some("Deadlift 150kg"))
        .return_once(move |_, _| Ok(returned));
    let slice = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };

    let before = slice.read(|state| state.position(&id));
    slice
        .update(
            &id,
            &GoalPatch {
                title: Some("Deadlift 150kg".to_owned()),
                ..GoalPatch::default()
            },
        )
        .await
        .expect("update succeeds");

    slice.read(|state| {
        assert_eq!(state.position(&id), before);
        assert_eq!(state.get(&id).map(|goal| goal.title.as_str()), Some("Deadlift 150kg"));
        assert_eq!(state.get(&id).map(Record::id), Some(&id));
    });
}

#[tokio::test]
async fn update_never_moves_updated_at_backwards() {
    let slice = loaded(seeded_slice()).await;
    let id = record_id("g-1");
    let mut older = goal_fixture("g-1", GoalType::Endurance);
    older.title = "stale".to_owned();
    older.updated_at = fixture_timestamp() - chrono::TimeDelta::hours(1);

    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_update()
        .return_once(move |_, _| Ok(older));
    let slice = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };

    slice
        .update(&id, &GoalPatch::default())
        .await
        .expect("update succeeds");

    slice.read(|state| {
        let goal = state.get(&id).expect("goal cached");
        assert_eq!(goal.title, "Goal g-1");
        assert_eq!(goal.updated_at, fixture_timestamp());
    });
}

#[tokio::test]
async fn failed_delete_keeps_record_and_stores_gateway_message() {
    let slice = loaded(seeded_slice()).await;
    let id = record_id("g-2");
    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_delete()
        .return_once(|_| Err(GatewayError::rejected("goal is locked")));
    let slice = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };

    slice.remove(&id).await.expect_err("delete fails");

    slice.read(|state| {
        assert!(state.get(&id).is_some());
        assert_eq!(state.pagination().total(), 3);
        assert_eq!(
            state.operations().error(OperationKind::Delete),
            Some("goal is locked")
        );
    });
}

#[tokio::test]
async fn remove_of_uncached_id_only_adjusts_total() {
    let mut gateway = MockGoalGateway::new();
    gateway.expect_delete().times(2).returning(|_| Ok(()));
    let slice = slice_with(gateway, SliceOptions::default());

    slice.remove(&record_id("ghost")).await.expect("delete succeeds");
    slice.remove(&record_id("ghost")).await.expect("delete succeeds");

    slice.read(|state| {
        assert!(state.items().is_empty());
        assert_eq!(state.pagination().total(), 0);
    });
}

#[tokio::test]
async fn remove_clears_matching_focus() {
    let slice = loaded(seeded_slice()).await;
    let id = record_id("g-1");
    let mut gateway = MockGoalGateway::new();
    let focused = goal_fixture("g-1", GoalType::Endurance);
    gateway.expect_get().return_once(move |_| Ok(focused));
    gateway.expect_delete().return_once(|_| Ok(()));
    let slice = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };

    slice.fetch_one(&id).await.expect("lookup succeeds");
    slice.remove(&id).await.expect("delete succeeds");

    slice.read(|state| {
        assert!(state.current().is_none());
        assert_eq!(ids_of(state.items()), vec!["g-2", "g-3"]);
        assert_eq!(state.pagination().total(), 2);
    });
}

fn ids_of(goals: &[Goal]) -> Vec<&str> {
    goals.iter().map(|goal| goal.id.as_ref()).collect()
}

#[tokio::test]
async fn failed_lookup_keeps_previous_focus() {
    let mut gateway = MockGoalGateway::new();
    let focused = goal_fixture("g-1", GoalType::Habit);
    let expected = focused.clone();
    gateway
        .expect_get()
        .withf(|id| *id == record_id("g-1"))
        .return_once(move |_| Ok(focused));
    gateway
        .expect_get()
        .withf(|id| *id == record_id("g-404"))
        .return_once(|_| Err(GatewayError::not_found("goal g-404 not found")));
    let slice = slice_with(gateway, SliceOptions::default());

    slice.fetch_one(&record_id("g-1")).await.expect("lookup succeeds");
    let error = slice
        .fetch_one(&record_id("g-404"))
        .await
        .expect_err("lookup fails");

    assert_eq!(error.code(), ErrorCode::NotFound);
    slice.read(|state| {
        assert_eq!(state.current(), Some(&expected));
        assert!(state.items().is_empty());
        assert_eq!(
            state.operations().error(OperationKind::Lookup),
            Some("goal g-404 not found")
        );
    });
}

#[tokio::test]
async fn progress_failure_is_tracked_separately_from_update() {
    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_update_progress()
        .return_once(|_, _| Err(GatewayError::rejected("value must be positive")));
    let slice = slice_with(gateway, SliceOptions::default());

    slice
        .update_progress(&record_id("g-1"), &ProgressUpdate::set(-1.0))
        .await
        .expect_err("progress fails");

    slice.read(|state| {
        assert_eq!(
            state.operations().error(OperationKind::Progress),
            Some("value must be positive")
        );
        assert_eq!(state.operations().error(OperationKind::Update), None);
    });
}

#[rstest]
#[tokio::test]
async fn filter_update_returns_to_first_page(seeded: GoalsSlice<MockGoalGateway>) {
    seeded.set_pagination(PaginationPatch {
        page: Some(3),
        limit: Some(20),
        total: Some(60),
    });
    assert_eq!(seeded.read(|state| state.pagination().page()), 3);

    seeded.update_filters(GoalFiltersPatch {
        category: FieldUpdate::Set(GoalCategory::Nutrition),
        ..GoalFiltersPatch::default()
    });

    seeded.read(|state| {
        assert_eq!(state.pagination().page(), 1);
        assert_eq!(state.filters().category, Some(GoalCategory::Nutrition));
    });

    seeded.set_pagination(PaginationPatch::page(2));
    seeded.update_filters(GoalFiltersPatch::default());
    assert_eq!(seeded.read(|state| state.pagination().page()), 1);
}

#[rstest]
#[tokio::test]
async fn reset_filters_restores_defaults(seeded: GoalsSlice<MockGoalGateway>) {
    seeded.update_filters(GoalFiltersPatch {
        search: FieldUpdate::Set("run".to_owned()),
        ..GoalFiltersPatch::default()
    });
    seeded.reset_filters();

    assert_eq!(seeded.read(|state| state.filters().clone()), GoalFilters::default());
}

#[tokio::test]
async fn optimistic_completion_rolls_back_on_failure() {
    let slice = loaded(seeded_slice()).await;
    let id = record_id("g-1");
    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_update_status()
        .return_once(|_, _| Err(GatewayError::connection("timed out")));
    let slice = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };
    let original = slice.read(|state| state.get(&id).cloned());

    slice
        .complete_optimistically(&id)
        .await
        .expect_err("status change fails");

    slice.read(|state| {
        assert_eq!(state.get(&id).cloned(), original);
        assert!(!state.is_optimistic(&id));
        assert_eq!(
            state.operations().error(OperationKind::Status),
            Some("timed out")
        );
    });
}

#[tokio::test]
async fn optimistic_completion_confirms_with_server_copy() {
    let slice = loaded(seeded_slice()).await;
    let id = record_id("g-1");
    let mut confirmed = goal_fixture("g-1", GoalType::Endurance);
    confirmed.status = GoalStatus::Completed;
    confirmed.current_value = 100.0;
    confirmed.updated_at = fixture_timestamp() + chrono::TimeDelta::minutes(1);
    let returned = confirmed.clone();

    let mut gateway = MockGoalGateway::new();
    gateway
        .expect_update_status()
        .withf(|_, change| change.status == GoalStatus::Completed)
        .return_once(move |_, _| Ok(returned));
    let slice = GoalsSlice {
        gateway: Arc::new(gateway),
        core: slice.core,
    };

    slice
        .complete_optimistically(&id)
        .await
        .expect("status change succeeds");

    slice.read(|state| {
        assert_eq!(state.get(&id), Some(&confirmed));
        assert!(!state.is_optimistic(&id));
    });
}

#[rstest]
#[tokio::test]
async fn staged_changes_are_distinguishable_until_settled(seeded: GoalsSlice<MockGoalGateway>) {
    let slice = loaded(seeded).await;
    let id = record_id("g-1");

    assert!(slice.apply_optimistic_progress(&id, &ProgressUpdate::increment(40.0)));
    slice.read(|state| {
        assert!(state.is_optimistic(&id));
        assert_eq!(state.get(&id).map(|goal| goal.current_value), Some(40.0));
        assert_eq!(state.confirmed(&id).map(|goal| goal.current_value), Some(0.0));
    });

    assert!(slice.rollback_optimistic(&id));
    assert_eq!(
        slice.read(|state| state.get(&id).map(|goal| goal.current_value)),
        Some(0.0)
    );

    assert!(slice.apply_optimistic_completion(&id));
    assert!(slice.confirm_optimistic(&id));
    slice.read(|state| {
        assert!(!state.is_optimistic(&id));
        assert_eq!(state.get(&id).map(|goal| goal.status), Some(GoalStatus::Completed));
    });

    assert!(!slice.apply_optimistic_completion(&record_id("g-missing")));
}

#[rstest]
#[case(StaleResponsePolicy::Discard, vec!["g-new"])]
#[case(StaleResponsePolicy::LastWriteWins, vec!["g-old"])]
fn late_collection_response_follows_policy(
    #[case] policy: StaleResponsePolicy,
    #[case] expected: Vec<&str>,
) {
    let slice = slice_with(
        MockGoalGateway::new(),
        SliceOptions::default().with_stale_responses(policy),
    );

    let earlier = slice.core.begin(OperationKind::Fetch, Some(Scope::Collection));
    let later = slice.core.begin(OperationKind::Fetch, Some(Scope::Collection));
    let now = fixture_timestamp();

    slice
        .core
        .settle(
            later,
            Ok(page_of(vec![goal_fixture("g-new", GoalType::Habit)], 1)),
            |state, page| state.replace_page(page, now),
        )
        .expect("later response applies");
    slice
        .core
        .settle(
            earlier,
            Ok(page_of(vec![goal_fixture("g-old", GoalType::Habit)], 1)),
            |state, page| state.replace_page(page, now),
        )
        .expect("earlier response settles");

    slice.read(|state| {
        assert_eq!(ids_of(state.items()), expected);
        assert!(!state.operations().in_flight(OperationKind::Fetch));
    });
}

#[rstest]
fn late_failure_does_not_overwrite_newer_success() {
    let slice = slice_with(MockGoalGateway::new(), SliceOptions::default());
    let id = record_id("g-1");

    let earlier = slice
        .core
        .begin(OperationKind::Lookup, Some(Scope::Record(id.clone())));
    let later = slice
        .core
        .begin(OperationKind::Lookup, Some(Scope::Record(id.clone())));
    assert!(slice.read(|state| state.operations().in_flight(OperationKind::Lookup)));

    slice
        .core
        .settle(later, Ok(goal_fixture("g-1", GoalType::Habit)), |state, goal| {
            state.focus(goal);
        })
        .expect("later lookup applies");
    let outcome: Result<Goal, _> = slice.core.settle(
        earlier,
        Err(GatewayError::connection("late failure")),
        |state, goal| state.focus(goal),
    );

    assert!(outcome.is_err());
    slice.read(|state| {
        assert_eq!(state.operations().error(OperationKind::Lookup), None);
        assert!(!state.operations().in_flight(OperationKind::Lookup));
        assert!(state.current().is_some());
    });
}
