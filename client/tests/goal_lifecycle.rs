//! End-to-end goal flows driven through the in-memory gateway.

use std::sync::Arc;

use chrono::TimeDelta;
use client::domain::ports::{GatewayError, SliceKey};
use client::domain::{
    FieldUpdate, GoalCategory, GoalDraft, GoalFilters, GoalFiltersPatch, GoalPatch, GoalQuery,
    GoalStatus, GoalType, OperationKind, ProgressUpdate,
};
use client::outbound::memory::InMemoryGateway;
use client::selectors::goals::{completion_rate, goal_progress};
use client::store::{GoalsSlice, SliceOptions};
use client::test_support::{FixtureClock, date, goal_fixture, record_id, weight_fixture};
use mockable::Clock;
use pagination::{PageRequest, PaginationPatch};
use rstest::rstest;

struct Harness {
    clock: Arc<FixtureClock>,
    gateway: Arc<InMemoryGateway>,
    goals: GoalsSlice<InMemoryGateway>,
}

fn harness() -> Harness {
    let clock = Arc::new(FixtureClock::default());
    let gateway = Arc::new(InMemoryGateway::new(clock.clone()));
    let goals = GoalsSlice::new(gateway.clone(), clock.clone(), SliceOptions::default());
    Harness {
        clock,
        gateway,
        goals,
    }
}

fn seeded(count: usize) -> Harness {
    let harness = harness();
    harness.gateway.seed_goals(
        (1..=count).map(|n| goal_fixture(&format!("g-{n}"), GoalType::Endurance)),
    );
    harness
}

#[tokio::test]
async fn created_weight_loss_goal_leads_the_cache_at_zero_percent() {
    let Harness { clock, goals, .. } = seeded(2);
    goals.refresh().await.expect("initial fetch");
    let draft = GoalDraft::new("Lose 5kg", GoalCategory::Weight, GoalType::WeightLoss)
        .with_target(75.0, 70.0)
        .with_target_date(clock.utc() + TimeDelta::days(30));

    let created = goals.create(&draft).await.expect("create succeeds");

    goals.read(|state| {
        assert_eq!(state.items().first().map(|goal| &goal.id), Some(&created.id));
        assert_eq!(state.pagination().total(), 3);
        assert_eq!(state.current().map(|goal| &goal.id), Some(&created.id));
        let progress = goal_progress(state.items(), &created.id).expect("goal has a target");
        assert_eq!(progress.percent, 0.0);
        assert!(!progress.is_complete);
    });
}

#[tokio::test]
async fn reach_value_goal_halfway_reports_fifty_percent() {
    let Harness { goals, .. } = harness();
    let draft = GoalDraft::new("Run 70km", GoalCategory::Fitness, GoalType::Endurance)
        .with_target(35.0, 70.0);

    let created = goals.create(&draft).await.expect("create succeeds");

    let progress = goals.read(|state| goal_progress(state.items(), &created.id));
    assert_eq!(progress.map(|progress| progress.percent), Some(50.0));
}

#[tokio::test]
async fn progress_reaching_the_target_completes_the_goal() {
    let Harness { clock, goals, .. } = harness();
    let draft = GoalDraft::new("Lose 5kg", GoalCategory::Weight, GoalType::WeightLoss)
        .with_target(75.0, 70.0);
    let created = goals.create(&draft).await.expect("create succeeds");
    clock.advance(TimeDelta::hours(1));

    let updated = goals
        .update_progress(&created.id, &ProgressUpdate::set(70.0))
        .await
        .expect("progress update succeeds");

    assert_eq!(updated.status, GoalStatus::Completed);
    goals.read(|state| {
        let progress = goal_progress(state.items(), &created.id).expect("goal has a target");
        assert_eq!(progress.percent, 100.0);
        assert!(progress.is_complete);
        assert_eq!(completion_rate(state.items()), 100.0);
    });
}

#[tokio::test]
async fn filtered_fetch_reports_page_count_from_the_server_total() {
    let Harness { gateway, goals, .. } = harness();
    gateway.seed_goals((1..=45).map(|n| goal_fixture(&format!("g-{n}"), GoalType::Habit)));
    let mut paused = goal_fixture("g-paused", GoalType::Habit);
    paused.status = GoalStatus::Paused;
    gateway.seed_goals([paused]);
    let query = GoalQuery::new(
        GoalFilters {
            status: Some(GoalStatus::Active),
            ..GoalFilters::default()
        },
        PageRequest::first(20),
    );

    let page = goals.fetch_collection(&query).await.expect("fetch succeeds");

    assert_eq!(page.pagination.total(), 45);
    goals.read(|state| {
        assert_eq!(state.pagination().pages(), 3);
        assert_eq!(state.items().len(), 20);
        assert!(state.pagination().has_next());
    });
}

#[rstest]
#[case(1, 20)]
#[case(2, 20)]
#[case(3, 5)]
#[tokio::test]
async fn fetched_pages_hold_the_expected_number_of_unique_records(
    #[case] page: u32,
    #[case] expected: usize,
) {
    let Harness { goals, .. } = seeded(45);
    let request = PageRequest::new(page, 20).expect("valid page");

    goals
        .fetch_collection(&GoalQuery::new(GoalFilters::default(), request))
        .await
        .expect("fetch succeeds");

    goals.read(|state| {
        let mut ids: Vec<_> = state.items().iter().map(|goal| goal.id.clone()).collect();
        assert_eq!(ids.len(), expected);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), expected, "ids must be unique");
        assert_eq!(
            u64::try_from(expected).expect("small count"),
            state.pagination().expected_len()
        );
    });
}

#[tokio::test]
async fn filter_change_resets_the_page() {
    let Harness { goals, .. } = seeded(3);
    goals.set_pagination(PaginationPatch::page(3));

    goals.update_filters(GoalFiltersPatch {
        category: FieldUpdate::Set(GoalCategory::Nutrition),
        ..GoalFiltersPatch::default()
    });

    goals.read(|state| {
        assert_eq!(state.pagination().page(), 1);
        assert_eq!(state.filters().category, Some(GoalCategory::Nutrition));
    });
}

#[tokio::test]
async fn no_op_filter_change_still_resets_the_page() {
    let Harness { goals, .. } = seeded(3);
    goals.set_pagination(PaginationPatch::page(2));

    goals.update_filters(GoalFiltersPatch::default());

    assert_eq!(goals.read(|state| state.pagination().page()), 1);
}

#[tokio::test]
async fn failed_delete_keeps_the_record_and_records_the_message() {
    let Harness { gateway, goals, .. } = seeded(2);
    goals.refresh().await.expect("initial fetch");
    gateway.fail_next(
        SliceKey::Goals,
        OperationKind::Delete,
        GatewayError::connection("backend unreachable"),
    );
    let id = record_id("g-1");

    let error = goals.remove(&id).await.expect_err("delete fails");

    assert_eq!(error.message(), "backend unreachable");
    goals.read(|state| {
        assert!(state.get(&id).is_some());
        assert_eq!(state.pagination().total(), 2);
        assert_eq!(
            state.operations().error(OperationKind::Delete),
            Some("backend unreachable")
        );
        assert!(!state.operations().in_flight(OperationKind::Delete));
    });
}

#[tokio::test]
async fn create_then_remove_restores_the_total() {
    let Harness { goals, .. } = seeded(4);
    goals.refresh().await.expect("initial fetch");
    let before = goals.read(|state| state.pagination().total());

    let created = goals
        .create(&GoalDraft::new("Stretch daily", GoalCategory::Health, GoalType::Habit))
        .await
        .expect("create succeeds");
    goals.remove(&created.id).await.expect("remove succeeds");

    goals.read(|state| {
        assert_eq!(state.pagination().total(), before);
        assert!(state.get(&created.id).is_none());
        assert!(state.current().is_none());
    });
}

#[tokio::test]
async fn removing_an_uncached_record_floors_the_total_at_zero() {
    let Harness { gateway, goals, .. } = harness();
    gateway.seed_goals([goal_fixture("g-remote", GoalType::Custom)]);

    goals
        .remove(&record_id("g-remote"))
        .await
        .expect("gateway delete succeeds");

    goals.read(|state| {
        assert!(state.items().is_empty());
        assert_eq!(state.pagination().total(), 0);
    });
}

#[tokio::test]
async fn update_keeps_identity_position_and_advances_updated_at() {
    let Harness { clock, goals, .. } = seeded(3);
    goals.refresh().await.expect("initial fetch");
    let id = record_id("g-2");
    let (position, stamped) = goals.read(|state| {
        (
            state.position(&id),
            state.get(&id).map(|goal| goal.updated_at),
        )
    });
    clock.advance(TimeDelta::minutes(5));

    let updated = goals
        .update(
            &id,
            &GoalPatch {
                title: Some("Run further".to_owned()),
                ..GoalPatch::default()
            },
        )
        .await
        .expect("update succeeds");

    assert_eq!(updated.id, id);
    assert!(Some(updated.updated_at) > stamped);
    goals.read(|state| {
        assert_eq!(state.position(&id), position);
        assert_eq!(
            state.get(&id).map(|goal| goal.title.as_str()),
            Some("Run further")
        );
    });
}

#[tokio::test]
async fn optimistic_completion_rolls_back_when_the_gateway_refuses() {
    let Harness { gateway, goals, .. } = seeded(1);
    goals.refresh().await.expect("initial fetch");
    gateway.fail_next(
        SliceKey::Goals,
        OperationKind::Status,
        GatewayError::rejected("goal is archived"),
    );
    let id = record_id("g-1");

    let error = goals
        .complete_optimistically(&id)
        .await
        .expect_err("status change fails");

    assert_eq!(error.message(), "goal is archived");
    goals.read(|state| {
        let goal = state.get(&id).expect("goal still cached");
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.current_value, 0.0);
        assert!(!state.is_optimistic(&id));
        assert_eq!(
            state.operations().error(OperationKind::Status),
            Some("goal is archived")
        );
    });
}

#[tokio::test]
async fn optimistic_progress_stays_distinguishable_until_settled() {
    let Harness { goals, .. } = seeded(1);
    goals.refresh().await.expect("initial fetch");
    let id = record_id("g-1");

    assert!(goals.apply_optimistic_progress(&id, &ProgressUpdate::increment(40.0)));
    goals.read(|state| {
        assert!(state.is_optimistic(&id));
        assert_eq!(state.get(&id).map(|goal| goal.current_value), Some(40.0));
        assert_eq!(state.confirmed(&id).map(|goal| goal.current_value), Some(0.0));
    });
    assert!(goals.rollback_optimistic(&id));
    assert_eq!(goals.read(|state| state.get(&id).map(|goal| goal.current_value)), Some(0.0));

    let confirmed = goals
        .update_progress_optimistically(&id, &ProgressUpdate::increment(40.0))
        .await
        .expect("server accepts progress");

    assert_eq!(confirmed.current_value, 40.0);
    goals.read(|state| {
        assert!(!state.is_optimistic(&id));
        assert_eq!(state.get(&id).map(|goal| goal.current_value), Some(40.0));
    });
}

#[tokio::test]
async fn sync_copies_the_latest_weight_into_weight_goals() {
    let Harness { gateway, goals, .. } = harness();
    let mut goal = goal_fixture("g-weight", GoalType::WeightLoss);
    goal.start_value = Some(80.0);
    goal.current_value = 80.0;
    goal.target_value = Some(75.0);
    gateway.seed_goals([goal]);
    gateway.seed_weight_entries([weight_fixture("w-1", date(2024, 1, 14), 78.0)]);
    goals.refresh().await.expect("initial fetch");

    let synced = goals.sync(&record_id("g-weight")).await.expect("sync succeeds");

    assert_eq!(synced.current_value, 78.0);
    let progress = goals.read(|state| goal_progress(state.items(), &synced.id));
    assert_eq!(progress.map(|progress| progress.percent), Some(40.0));
}
