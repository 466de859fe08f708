//! Goal selectors.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::domain::{Goal, GoalCategory, GoalPriority, GoalProgress, GoalStatus, RecordId};

use super::bounded_percent;

/// Goals with status `active`.
pub fn active_goals(goals: &[Goal]) -> Vec<&Goal> {
    goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Active)
        .collect()
}

/// Active goals whose target date is before `now`.
pub fn overdue_goals(goals: &[Goal], now: DateTime<Utc>) -> Vec<&Goal> {
    goals.iter().filter(|goal| goal.is_overdue(now)).collect()
}

/// Active goals with high priority.
pub fn high_priority_goals(goals: &[Goal]) -> Vec<&Goal> {
    goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Active && goal.priority == GoalPriority::High)
        .collect()
}

/// Active goals with no progress reading in the last `stale_days` days.
///
/// A goal that never had a reading always needs one.
pub fn goals_needing_update(goals: &[Goal], now: DateTime<Utc>, stale_days: i64) -> Vec<&Goal> {
    let cutoff = now - TimeDelta::days(stale_days);
    goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Active)
        .filter(|goal| goal.last_progress_update.is_none_or(|last| last < cutoff))
        .collect()
}

/// Active goals due within `window_days` of `now`, earliest first.
///
/// Both ends of the window are inclusive.
pub fn upcoming_deadlines(goals: &[Goal], now: DateTime<Utc>, window_days: i64) -> Vec<&Goal> {
    let horizon = now + TimeDelta::days(window_days);
    let mut upcoming: Vec<&Goal> = goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Active)
        .filter(|goal| {
            goal.target_date
                .is_some_and(|date| now <= date && date <= horizon)
        })
        .collect();
    upcoming.sort_by_key(|goal| goal.target_date);
    upcoming
}

/// Share of completed goals as a percentage; `0` when there are none.
pub fn completion_rate(goals: &[Goal]) -> f64 {
    let completed = goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Completed)
        .count();
    bounded_percent(completed as f64, goals.len() as f64)
}

/// Progress of the goal with `id`; `None` when it is not cached or has no
/// target.
pub fn goal_progress(goals: &[Goal], id: &RecordId) -> Option<GoalProgress> {
    goals.iter().find(|goal| &goal.id == id)?.progress()
}

/// Goal counts for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStats {
    pub total: usize,
    pub by_status: BTreeMap<GoalStatus, usize>,
    pub by_category: BTreeMap<GoalCategory, usize>,
    pub completion_rate: f64,
}

/// Count goals by status and category.
pub fn goal_stats(goals: &[Goal]) -> GoalStats {
    let mut stats = GoalStats {
        total: goals.len(),
        completion_rate: completion_rate(goals),
        ..GoalStats::default()
    };
    for goal in goals {
        *stats.by_status.entry(goal.status).or_default() += 1;
        *stats.by_category.entry(goal.category).or_default() += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::GoalType;
    use crate::test_support::{fixture_timestamp, goal_fixture, record_id};

    fn now() -> DateTime<Utc> {
        fixture_timestamp()
    }

    fn due_in(id: &str, days: i64) -> Goal {
        let mut goal = goal_fixture(id, GoalType::Endurance);
        goal.target_date = Some(now() + TimeDelta::days(days));
        goal
    }

    fn with_status(id: &str, status: GoalStatus) -> Goal {
        let mut goal = goal_fixture(id, GoalType::Habit);
        goal.status = status;
        goal
    }

    fn ids<'a>(goals: impl IntoIterator<Item = &'a Goal>) -> Vec<&'a str> {
        goals.into_iter().map(|goal| goal.id.as_ref()).collect()
    }

    #[fixture]
    fn mixed() -> Vec<Goal> {
        let mut high = goal_fixture("g-high", GoalType::Strength);
        high.priority = GoalPriority::High;
        let mut paused_high = with_status("g-paused", GoalStatus::Paused);
        paused_high.priority = GoalPriority::High;
        vec![
            high,
            paused_high,
            with_status("g-done", GoalStatus::Completed),
            due_in("g-late", -2),
            due_in("g-soon", 5),
        ]
    }

    #[rstest]
    fn active_and_priority_filters(mixed: Vec<Goal>) {
        assert_eq!(ids(active_goals(&mixed)), vec!["g-high", "g-late", "g-soon"]);
        assert_eq!(ids(high_priority_goals(&mixed)), vec!["g-high"]);
    }

    #[rstest]
    fn overdue_requires_active_and_past_date(mixed: Vec<Goal>) {
        let mut cancelled = due_in("g-cancelled", -10);
        cancelled.status = GoalStatus::Cancelled;
        let mut goals = mixed;
        goals.push(cancelled);

        assert_eq!(ids(overdue_goals(&goals, now())), vec!["g-late"]);
    }

    #[rstest]
    fn needing_update_uses_staleness_window() {
        let mut fresh = goal_fixture("g-fresh", GoalType::Habit);
        fresh.last_progress_update = Some(now() - TimeDelta::days(2));
        let mut stale = goal_fixture("g-stale", GoalType::Habit);
        stale.last_progress_update = Some(now() - TimeDelta::days(8));
        let never = goal_fixture("g-never", GoalType::Habit);
        let mut done = with_status("g-done", GoalStatus::Completed);
        done.last_progress_update = None;
        let goals = vec![fresh, stale, never, done];

        assert_eq!(
            ids(goals_needing_update(&goals, now(), 7)),
            vec!["g-stale", "g-never"]
        );
    }

    #[rstest]
    fn upcoming_deadlines_sorted_ascending_within_window() {
        let goals = vec![
            due_in("g-20", 20),
            due_in("g-40", 40),
            due_in("g-3", 3),
            due_in("g-past", -1),
            due_in("g-30", 30),
        ];

        assert_eq!(
            ids(upcoming_deadlines(&goals, now(), 30)),
            vec!["g-3", "g-20", "g-30"]
        );
    }

    #[rstest]
    #[case(Vec::new(), 0.0)]
    #[case(vec![GoalStatus::Active], 0.0)]
    #[case(vec![GoalStatus::Completed, GoalStatus::Active], 50.0)]
    #[case(vec![GoalStatus::Completed, GoalStatus::Completed], 100.0)]
    #[case(
        vec![GoalStatus::Completed, GoalStatus::Cancelled, GoalStatus::Paused, GoalStatus::Active],
        25.0
    )]
    fn completion_rate_is_bounded(#[case] statuses: Vec<GoalStatus>, #[case] expected: f64) {
        let goals: Vec<Goal> = statuses
            .into_iter()
            .enumerate()
            .map(|(index, status)| with_status(&format!("g-{index}"), status))
            .collect();

        let rate = completion_rate(&goals);

        assert_eq!(rate, expected);
        assert!((0.0..=100.0).contains(&rate));
    }

    #[rstest]
    #[case(35.0, 70.0, 50.0, false)]
    #[case(70.0, 70.0, 100.0, true)]
    #[case(140.0, 70.0, 100.0, true)]
    fn progress_of_reach_value_goal(
        #[case] current: f64,
        #[case] target: f64,
        #[case] percent: f64,
        #[case] complete: bool,
    ) {
        let mut goal = goal_fixture("g-1", GoalType::Endurance);
        goal.current_value = current;
        goal.target_value = Some(target);

        let progress = goal_progress(&[goal], &record_id("g-1")).expect("goal has a target");

        assert_eq!(progress.percent, percent);
        assert_eq!(progress.is_complete, complete);
    }

    #[rstest]
    fn progress_of_unknown_or_targetless_goal_is_none() {
        let mut goal = goal_fixture("g-1", GoalType::Habit);
        goal.target_value = None;
        let goals = vec![goal];

        assert_eq!(goal_progress(&goals, &record_id("g-1")), None);
        assert_eq!(goal_progress(&goals, &record_id("g-2")), None);
    }

    #[rstest]
    fn stats_count_by_status_and_category(mixed: Vec<Goal>) {
        let stats = goal_stats(&mixed);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.by_status.get(&GoalStatus::Active), Some(&3));
        assert_eq!(stats.by_status.get(&GoalStatus::Completed), Some(&1));
        assert_eq!(stats.by_category.get(&GoalCategory::Fitness), Some(&5));
        assert_eq!(stats.completion_rate, 20.0);
    }
}
