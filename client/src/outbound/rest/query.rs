//! Query-string encoding for list requests.

use chrono::NaiveDate;
use pagination::PageRequest;

use crate::domain::{GoalQuery, MealQuery, SortOrder, WeightQuery, WorkoutQuery};

/// Ordered `key=value` pairs appended to a list endpoint.
pub(super) type QueryPairs = Vec<(&'static str, String)>;

/// List queries that know how to express themselves as URL parameters.
///
/// Unset filters are omitted; pagination and sorting are always sent.
pub(super) trait ListQuery {
    fn query_pairs(&self) -> QueryPairs;
}

fn paging(page: PageRequest, sort_by: &str, sort_order: SortOrder) -> QueryPairs {
    vec![
        ("page", page.page().to_string()),
        ("limit", page.limit().to_string()),
        ("sortBy", sort_by.to_owned()),
        ("sortOrder", sort_order.as_str().to_owned()),
    ]
}

fn push(pairs: &mut QueryPairs, key: &'static str, value: Option<String>) {
    if let Some(value) = value {
        pairs.push((key, value));
    }
}

fn date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|date| date.format("%Y-%m-%d").to_string())
}

fn search(value: Option<&String>) -> Option<String> {
    value
        .map(|needle| needle.trim().to_owned())
        .filter(|needle| !needle.is_empty())
}

impl ListQuery for GoalQuery {
    fn query_pairs(&self) -> QueryPairs {
        let filters = &self.filters;
        let mut pairs = paging(self.page, filters.sort_by.as_str(), filters.sort_order);
        push(&mut pairs, "status", filters.status.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "category", filters.category.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "priority", filters.priority.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "type", filters.goal_type.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "search", search(filters.search.as_ref()));
        pairs
    }
}

impl ListQuery for WeightQuery {
    fn query_pairs(&self) -> QueryPairs {
        let filters = &self.filters;
        let mut pairs = paging(self.page, filters.sort_by.as_str(), filters.sort_order);
        push(&mut pairs, "startDate", date(filters.start_date));
        push(&mut pairs, "endDate", date(filters.end_date));
        pairs
    }
}

impl ListQuery for MealQuery {
    fn query_pairs(&self) -> QueryPairs {
        let filters = &self.filters;
        let mut pairs = paging(self.page, filters.sort_by.as_str(), filters.sort_order);
        push(&mut pairs, "mealType", filters.meal_type.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "startDate", date(filters.start_date));
        push(&mut pairs, "endDate", date(filters.end_date));
        push(&mut pairs, "search", search(filters.search.as_ref()));
        pairs
    }
}

impl ListQuery for WorkoutQuery {
    fn query_pairs(&self) -> QueryPairs {
        let filters = &self.filters;
        let mut pairs = paging(self.page, filters.sort_by.as_str(), filters.sort_order);
        push(&mut pairs, "type", filters.workout_type.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "intensity", filters.intensity.map(|v| v.as_str().to_owned()));
        push(&mut pairs, "startDate", date(filters.start_date));
        push(&mut pairs, "endDate", date(filters.end_date));
        push(&mut pairs, "search", search(filters.search.as_ref()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GoalFilters, GoalStatus, MealFilters, WorkoutFilters, WorkoutType};
    use rstest::rstest;

    fn value<'a>(pairs: &'a QueryPairs, key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    #[rstest]
    fn default_goal_query_sends_paging_and_sort_only() {
        let query = GoalQuery::new(GoalFilters::default(), PageRequest::first(20));

        let pairs = query.query_pairs();

        assert_eq!(
            pairs,
            vec![
                ("page", "1".to_owned()),
                ("limit", "20".to_owned()),
                ("sortBy", "createdAt".to_owned()),
                ("sortOrder", "desc".to_owned()),
            ]
        );
    }

    #[rstest]
    fn goal_filters_become_parameters() {
        let filters = GoalFilters {
            status: Some(GoalStatus::Active),
            search: Some("  run ".to_owned()),
            ..GoalFilters::default()
        };

        let pairs = GoalQuery::new(filters, PageRequest::first(5)).query_pairs();

        assert_eq!(value(&pairs, "status"), Some("active"));
        assert_eq!(value(&pairs, "search"), Some("run"));
        assert_eq!(value(&pairs, "category"), None);
    }

    #[rstest]
    fn blank_search_is_omitted() {
        let filters = MealFilters {
            search: Some("   ".to_owned()),
            ..MealFilters::default()
        };

        let pairs = MealQuery::new(filters, PageRequest::first(5)).query_pairs();

        assert_eq!(value(&pairs, "search"), None);
    }

    #[rstest]
    fn workout_dates_use_iso_format() {
        let filters = WorkoutFilters {
            workout_type: Some(WorkoutType::Cardio),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 8),
            ..WorkoutFilters::default()
        };

        let pairs = WorkoutQuery::new(filters, PageRequest::first(5)).query_pairs();

        assert_eq!(value(&pairs, "type"), Some("cardio"));
        assert_eq!(value(&pairs, "startDate"), Some("2024-01-08"));
        assert_eq!(value(&pairs, "endDate"), None);
    }
}
