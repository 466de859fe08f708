//! Nutrition selectors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Meal, MealType, NutritionFacts};

use super::bounded_percent;

/// Meals eaten on `date`, earliest first.
pub fn meals_on(meals: &[Meal], date: NaiveDate) -> Vec<&Meal> {
    let mut selected: Vec<&Meal> = meals.iter().filter(|meal| meal.date() == date).collect();
    selected.sort_by_key(|meal| meal.eaten_at);
    selected
}

/// Summed nutrition of the meals eaten on `date`.
pub fn daily_totals(meals: &[Meal], date: NaiveDate) -> NutritionFacts {
    meals_on(meals, date)
        .into_iter()
        .fold(NutritionFacts::default(), |acc, meal| {
            acc.combined_with(&meal.nutrition)
        })
}

/// Meals grouped by type, each group in cache order.
pub fn meals_by_type(meals: &[Meal]) -> BTreeMap<MealType, Vec<&Meal>> {
    let mut groups: BTreeMap<MealType, Vec<&Meal>> = BTreeMap::new();
    for meal in meals {
        groups.entry(meal.meal_type).or_default().push(meal);
    }
    groups
}

/// Intake measured against a daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeProgress {
    pub consumed: f64,
    pub goal: f64,
    /// Share of the goal reached, clamped to `0..=100`.
    pub percent: f64,
    /// `goal - consumed`; negative once the goal is exceeded.
    pub remaining: f64,
}

impl IntakeProgress {
    fn measure(consumed: f64, goal: f64) -> Option<Self> {
        (goal > 0.0).then(|| Self {
            consumed,
            goal,
            percent: bounded_percent(consumed, goal),
            remaining: goal - consumed,
        })
    }
}

/// Calories eaten on `date` against `goal_calories`; `None` without a
/// positive goal.
pub fn calorie_progress(
    meals: &[Meal],
    date: NaiveDate,
    goal_calories: f64,
) -> Option<IntakeProgress> {
    IntakeProgress::measure(daily_totals(meals, date).calories, goal_calories)
}

/// Water drunk against `goal_ml`; `None` without a positive goal.
pub fn water_progress(water_ml: u32, goal_ml: u32) -> Option<IntakeProgress> {
    IntakeProgress::measure(f64::from(water_ml), f64::from(goal_ml))
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::test_support::{at, date, meal_fixture};

    #[fixture]
    fn meals() -> Vec<Meal> {
        vec![
            meal_fixture("m-dinner", MealType::Dinner, at(2024, 1, 15, 19), 700.0),
            meal_fixture("m-breakfast", MealType::Breakfast, at(2024, 1, 15, 7), 450.0),
            meal_fixture("m-yesterday", MealType::Dinner, at(2024, 1, 14, 20), 900.0),
            meal_fixture("m-snack", MealType::Snack, at(2024, 1, 15, 15), 150.0),
        ]
    }

    #[rstest]
    fn meals_on_filters_by_day_and_orders_by_time(meals: Vec<Meal>) {
        let ids: Vec<&str> = meals_on(&meals, date(2024, 1, 15))
            .into_iter()
            .map(|meal| meal.id.as_ref())
            .collect();

        assert_eq!(ids, vec!["m-breakfast", "m-snack", "m-dinner"]);
    }

    #[rstest]
    fn daily_totals_sum_only_that_day(meals: Vec<Meal>) {
        assert_eq!(daily_totals(&meals, date(2024, 1, 15)).calories, 1_300.0);
        assert_eq!(daily_totals(&meals, date(2024, 1, 13)), NutritionFacts::default());
    }

    #[rstest]
    fn meals_grouped_by_type(meals: Vec<Meal>) {
        let groups = meals_by_type(&meals);

        assert_eq!(groups.get(&MealType::Dinner).map(Vec::len), Some(2));
        assert_eq!(groups.get(&MealType::Lunch), None);
    }

    #[rstest]
    #[case(2_000.0, Some(65.0))]
    #[case(1_000.0, Some(100.0))]
    #[case(0.0, None)]
    fn calorie_progress_against_goal(
        meals: Vec<Meal>,
        #[case] goal: f64,
        #[case] expected_percent: Option<f64>,
    ) {
        let progress = calorie_progress(&meals, date(2024, 1, 15), goal);

        assert_eq!(progress.map(|progress| progress.percent), expected_percent);
    }

    #[rstest]
    fn exceeded_goal_reports_negative_remaining(meals: Vec<Meal>) {
        let progress = calorie_progress(&meals, date(2024, 1, 15), 1_000.0).expect("goal is set");

        assert_eq!(progress.remaining, -300.0);
    }

    #[rstest]
    #[case(1_250, 2_500, Some(50.0))]
    #[case(3_000, 2_500, Some(100.0))]
    #[case(500, 0, None)]
    fn water_progress_against_goal(
        #[case] water_ml: u32,
        #[case] goal_ml: u32,
        #[case] expected_percent: Option<f64>,
    ) {
        assert_eq!(
            water_progress(water_ml, goal_ml).map(|progress| progress.percent),
            expected_percent
        );
    }
}
