//! In-process gateway backing every port with plain collections.
//!
//! Behaves like the REST API: it assigns ids and timestamps, filters, sorts
//! and paginates lists, and computes the weight and nutrition aggregates.
//! Tests and demos can queue failures for, or hold back, the next call of a
//! given operation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use mockable::{Clock, DefaultClock};
use pagination::{Page, PageRequest, Pagination};
use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::ports::{
    GatewayError, GoalGateway, NutritionGateway, SliceKey, WeightGateway, WorkoutGateway,
};
use crate::domain::{
    BulkImportResult, DailyNutrition, Goal, GoalDraft, GoalPatch, GoalQuery, GoalStatus,
    GoalType, Meal, MealDraft, MealPatch, MealQuery, NutritionFacts, OperationKind,
    ProgressUpdate, Record, RecordId, StatusChange, TrendPeriod, TrendPoint, WaterIntake,
    WeightComparison, WeightDraft, WeightEntry, WeightPatch, WeightQuery, WeightSummary,
    WeightTrends, Workout, WorkoutDraft, WorkoutPatch, WorkoutQuery,
};

type CallKey = (SliceKey, OperationKind);

#[derive(Default)]
struct Backend {
    goals: Vec<Goal>,
    weights: Vec<WeightEntry>,
    meals: Vec<Meal>,
    workouts: Vec<Workout>,
    water: BTreeMap<NaiveDate, u32>,
    failures: HashMap<CallKey, VecDeque<GatewayError>>,
    holds: HashMap<CallKey, VecDeque<oneshot::Receiver<()>>>,
}

/// Handle releasing a call held by [`InMemoryGateway::hold_next`].
///
/// Dropping the handle releases the call as well.
#[derive(Debug)]
pub struct HeldCall(oneshot::Sender<()>);

impl HeldCall {
    /// Let the held call answer.
    pub fn release(self) {
        if self.0.send(()).is_err() {
            debug!("held gateway call was abandoned before release");
        }
    }
}

/// Gateway keeping every record in memory.
///
/// One instance implements all four gateway ports, so the same value can be
/// shared by every slice of a store.
pub struct InMemoryGateway {
    clock: Arc<dyn Clock>,
    backend: Mutex<Backend>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryGateway {
    /// Empty backend stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            backend: Mutex::new(Backend::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `kind` on `slice` fail with `error`.
    ///
    /// Failures queue up: two calls to this method fail the next two calls.
    pub fn fail_next(&self, slice: SliceKey, kind: OperationKind, error: GatewayError) {
        self.lock()
            .failures
            .entry((slice, kind))
            .or_default()
            .push_back(error);
    }

    /// Hold the next call of `kind` on `slice` until the returned handle is
    /// released.
    pub fn hold_next(&self, slice: SliceKey, kind: OperationKind) -> HeldCall {
        let (sender, receiver) = oneshot::channel();
        self.lock()
            .holds
            .entry((slice, kind))
            .or_default()
            .push_back(receiver);
        HeldCall(sender)
    }

    /// Store goals as if they had been created earlier.
    pub fn seed_goals(&self, goals: impl IntoIterator<Item = Goal>) {
        self.lock().goals.extend(goals);
    }

    /// Store weight entries as if they had been recorded earlier.
    pub fn seed_weight_entries(&self, entries: impl IntoIterator<Item = WeightEntry>) {
        self.lock().weights.extend(entries);
    }

    /// Store meals as if they had been logged earlier.
    pub fn seed_meals(&self, meals: impl IntoIterator<Item = Meal>) {
        self.lock().meals.extend(meals);
    }

    /// Store workouts as if they had been logged earlier.
    pub fn seed_workouts(&self, workouts: impl IntoIterator<Item = Workout>) {
        self.lock().workouts.extend(workouts);
    }

    pub fn goals(&self) -> Vec<Goal> {
        self.lock().goals.clone()
    }

    pub fn weight_entries(&self) -> Vec<WeightEntry> {
        self.lock().weights.clone()
    }

    pub fn meals(&self) -> Vec<Meal> {
        self.lock().meals.clone()
    }

    pub fn workouts(&self) -> Vec<Workout> {
        self.lock().workouts.clone()
    }

    /// Apply any hold or queued failure registered for this call.
    async fn intercept(&self, slice: SliceKey, kind: OperationKind) -> Result<(), GatewayError> {
        let hold = self
            .lock()
            .holds
            .get_mut(&(slice, kind))
            .and_then(VecDeque::pop_front);
        if let Some(hold) = hold {
            // A dropped handle counts as a release.
            hold.await.ok();
        }
        let failure = self
            .lock()
            .failures
            .get_mut(&(slice, kind))
            .and_then(VecDeque::pop_front);
        match failure {
            Some(error) => {
                debug!(%slice, %kind, error = %error, "injected gateway failure");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

fn paginate<R: Clone>(
    records: &[R],
    keep: impl Fn(&R) -> bool,
    order: impl Fn(&R, &R) -> Ordering,
    page: PageRequest,
) -> Page<R> {
    let mut matching: Vec<R> = records.iter().filter(|record| keep(*record)).cloned().collect();
    matching.sort_by(order);
    let total = matching.len() as u64;
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let data = matching.into_iter().skip(skip).take(take).collect();
    Page::new(
        data,
        Pagination::from_response(page.page(), page.limit(), total),
    )
}

fn find<'a, R: Record>(
    records: &'a [R],
    id: &RecordId,
    noun: &str,
) -> Result<&'a R, GatewayError> {
    records
        .iter()
        .find(|record| record.id() == id)
        .ok_or_else(|| GatewayError::not_found(format!("{noun} {id} not found")))
}

fn find_mut<'a, R: Record>(
    records: &'a mut [R],
    id: &RecordId,
    noun: &str,
) -> Result<&'a mut R, GatewayError> {
    records
        .iter_mut()
        .find(|record| record.id() == id)
        .ok_or_else(|| GatewayError::not_found(format!("{noun} {id} not found")))
}

fn remove<R: Record>(
    records: &mut Vec<R>,
    id: &RecordId,
    noun: &str,
) -> Result<(), GatewayError> {
    let before = records.len();
    records.retain(|record| record.id() != id);
    if records.len() == before {
        return Err(GatewayError::not_found(format!("{noun} {id} not found")));
    }
    Ok(())
}

fn require(condition: bool, message: &str) -> Result<(), GatewayError> {
    if condition {
        Ok(())
    } else {
        Err(GatewayError::rejected(message))
    }
}

fn latest_weight(entries: &[WeightEntry]) -> Option<&WeightEntry> {
    entries
        .iter()
        .max_by_key(|entry| (entry.date, entry.created_at))
}

fn earliest_weight(entries: &[WeightEntry]) -> Option<&WeightEntry> {
    entries
        .iter()
        .min_by_key(|entry| (entry.date, entry.created_at))
}

/// Mark an active goal completed once its progress reaches the target.
fn complete_if_reached(goal: &mut Goal, now: DateTime<Utc>) {
    let reached = goal.progress().is_some_and(|progress| progress.is_complete);
    if reached && goal.status == GoalStatus::Active {
        goal.status = GoalStatus::Completed;
        goal.completed_at = Some(now);
    }
}

#[async_trait]
impl GoalGateway for InMemoryGateway {
    async fn list(&self, query: &GoalQuery) -> Result<Page<Goal>, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Fetch).await?;
        let filters = &query.filters;
        Ok(paginate(
            &self.lock().goals,
            |goal| filters.matches(goal),
            |left, right| filters.compare(left, right),
            query.page,
        ))
    }

    async fn get(&self, id: &RecordId) -> Result<Goal, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Lookup).await?;
        find(&self.lock().goals, id, "goal").cloned()
    }

    async fn create(&self, draft: &GoalDraft) -> Result<Goal, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Create).await?;
        require(!draft.title.trim().is_empty(), "goal title is required")?;
        let now = self.clock.utc();
        let goal = Goal {
            id: RecordId::random(),
            title: draft.title.trim().to_owned(),
            description: draft.description.clone(),
            category: draft.category,
            goal_type: draft.goal_type,
            status: draft.status,
            priority: draft.priority,
            target_value: draft.target_value,
            current_value: draft.current_value,
            start_value: Some(draft.current_value),
            unit: draft.unit.clone(),
            start_date: Some(now),
            target_date: draft.target_date,
            last_progress_update: None,
            completed_at: (draft.status == GoalStatus::Completed).then_some(now),
            milestones: draft.milestones.clone(),
            tags: draft.tags.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().goals.push(goal.clone());
        Ok(goal)
    }

    async fn update(&self, id: &RecordId, patch: &GoalPatch) -> Result<Goal, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Update).await?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let goal = find_mut(&mut backend.goals, id, "goal")?;
        patch.apply_to(goal);
        goal.updated_at = now;
        Ok(goal.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Delete).await?;
        remove(&mut self.lock().goals, id, "goal")
    }

    async fn update_progress(
        &self,
        id: &RecordId,
        update: &ProgressUpdate,
    ) -> Result<Goal, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Progress).await?;
        require(update.value.is_finite(), "progress value must be a number")?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let goal = find_mut(&mut backend.goals, id, "goal")?;
        goal.current_value = update.resolve(goal.current_value);
        goal.last_progress_update = Some(now);
        goal.updated_at = now;
        complete_if_reached(goal, now);
        Ok(goal.clone())
    }

    async fn update_status(
        &self,
        id: &RecordId,
        change: &StatusChange,
    ) -> Result<Goal, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Status).await?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let goal = find_mut(&mut backend.goals, id, "goal")?;
        goal.status = change.status;
        goal.completed_at = (change.status == GoalStatus::Completed).then_some(now);
        goal.updated_at = now;
        Ok(goal.clone())
    }

    async fn sync(&self, id: &RecordId) -> Result<Goal, GatewayError> {
        self.intercept(SliceKey::Goals, OperationKind::Sync).await?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let latest = latest_weight(&backend.weights).map(WeightEntry::weight_kg);
        let goal = find_mut(&mut backend.goals, id, "goal")?;
        let tracks_weight = matches!(goal.goal_type, GoalType::WeightLoss | GoalType::WeightGain);
        if let Some(kg) = latest.filter(|_| tracks_weight) {
            goal.current_value = kg;
            goal.last_progress_update = Some(now);
            complete_if_reached(goal, now);
        }
        goal.updated_at = now;
        Ok(goal.clone())
    }
}

#[async_trait]
impl WeightGateway for InMemoryGateway {
    async fn list(&self, query: &WeightQuery) -> Result<Page<WeightEntry>, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Fetch).await?;
        let filters = &query.filters;
        Ok(paginate(
            &self.lock().weights,
            |entry| filters.matches(entry),
            |left, right| filters.compare(left, right),
            query.page,
        ))
    }

    async fn get(&self, id: &RecordId) -> Result<WeightEntry, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Lookup).await?;
        find(&self.lock().weights, id, "weight entry").cloned()
    }

    async fn create(&self, draft: &WeightDraft) -> Result<WeightEntry, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Create).await?;
        let entry = self.record_weight(draft)?;
        self.lock().weights.push(entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &WeightPatch,
    ) -> Result<WeightEntry, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Update).await?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let entry = find_mut(&mut backend.weights, id, "weight entry")?;
        patch.apply_to(entry);
        entry.updated_at = now;
        Ok(entry.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Delete).await?;
        remove(&mut self.lock().weights, id, "weight entry")
    }

    async fn get_trends(&self, period: TrendPeriod) -> Result<WeightTrends, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Trends).await?;
        let today = self.clock.utc().date_naive();
        let start = u64::try_from(period.days())
            .ok()
            .and_then(|days| today.checked_sub_days(Days::new(days)))
            .unwrap_or(NaiveDate::MIN);
        let mut window: Vec<WeightEntry> = self
            .lock()
            .weights
            .iter()
            .filter(|entry| (start..=today).contains(&entry.date))
            .cloned()
            .collect();
        window.sort_by_key(|entry| (entry.date, entry.created_at));
        let average_change_per_week = match (window.first(), window.last()) {
            (Some(first), Some(last)) if last.date > first.date => {
                let days = (last.date - first.date).num_days() as f64;
                (last.weight_kg() - first.weight_kg()) / days * 7.0
            }
            _ => 0.0,
        };
        Ok(WeightTrends {
            period,
            points: window
                .iter()
                .map(|entry| TrendPoint {
                    date: entry.date,
                    weight_kg: entry.weight_kg(),
                })
                .collect(),
            average_change_per_week,
        })
    }

    async fn get_summary(&self) -> Result<WeightSummary, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Summary).await?;
        let backend = self.lock();
        let entries = &backend.weights;
        let kgs: Vec<f64> = entries.iter().map(WeightEntry::weight_kg).collect();
        let average_kg = (!kgs.is_empty()).then(|| kgs.iter().sum::<f64>() / kgs.len() as f64);
        Ok(WeightSummary {
            current_kg: latest_weight(entries).map(WeightEntry::weight_kg),
            starting_kg: earliest_weight(entries).map(WeightEntry::weight_kg),
            lowest_kg: kgs.iter().copied().reduce(f64::min),
            highest_kg: kgs.iter().copied().reduce(f64::max),
            average_kg,
            total_entries: entries.len() as u64,
        })
    }

    async fn get_latest(&self) -> Result<Option<WeightEntry>, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Latest).await?;
        Ok(latest_weight(&self.lock().weights).cloned())
    }

    async fn compare_entries(
        &self,
        from: &RecordId,
        to: &RecordId,
    ) -> Result<WeightComparison, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Compare).await?;
        let backend = self.lock();
        let from = find(&backend.weights, from, "weight entry")?.clone();
        let to = find(&backend.weights, to, "weight entry")?.clone();
        Ok(WeightComparison::between(from, to))
    }

    async fn bulk_import(
        &self,
        drafts: Vec<WeightDraft>,
    ) -> Result<BulkImportResult, GatewayError> {
        self.intercept(SliceKey::Weight, OperationKind::Import).await?;
        let mut imported: Vec<WeightEntry> = Vec::with_capacity(drafts.len());
        let mut skipped = 0;
        for draft in &drafts {
            let taken = self.lock().weights.iter().any(|entry| entry.date == draft.date)
                || imported.iter().any(|entry| entry.date == draft.date);
            match self.record_weight(draft) {
                Ok(entry) if !taken => imported.push(entry),
                _ => skipped += 1,
            }
        }
        self.lock().weights.extend(imported.iter().cloned());
        Ok(BulkImportResult { imported, skipped })
    }
}

impl InMemoryGateway {
    fn record_weight(&self, draft: &WeightDraft) -> Result<WeightEntry, GatewayError> {
        require(
            draft.weight.is_finite() && draft.weight > 0.0,
            "weight must be positive",
        )?;
        let now = self.clock.utc();
        Ok(WeightEntry {
            id: RecordId::random(),
            weight: draft.weight,
            unit: draft.unit,
            date: draft.date,
            body_fat_percentage: draft.body_fat_percentage,
            muscle_mass: draft.muscle_mass,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[async_trait]
impl NutritionGateway for InMemoryGateway {
    async fn list(&self, query: &MealQuery) -> Result<Page<Meal>, GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Fetch).await?;
        let filters = &query.filters;
        Ok(paginate(
            &self.lock().meals,
            |meal| filters.matches(meal),
            |left, right| filters.compare(left, right),
            query.page,
        ))
    }

    async fn get(&self, id: &RecordId) -> Result<Meal, GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Lookup).await?;
        find(&self.lock().meals, id, "meal").cloned()
    }

    async fn create(&self, draft: &MealDraft) -> Result<Meal, GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Create).await?;
        require(!draft.name.trim().is_empty(), "meal name is required")?;
        let now = self.clock.utc();
        let meal = Meal {
            id: RecordId::random(),
            name: draft.name.trim().to_owned(),
            meal_type: draft.meal_type,
            eaten_at: draft.eaten_at,
            foods: draft.foods.clone(),
            nutrition: draft.resolved_nutrition(),
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().meals.push(meal.clone());
        Ok(meal)
    }

    async fn update(&self, id: &RecordId, patch: &MealPatch) -> Result<Meal, GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Update).await?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let meal = find_mut(&mut backend.meals, id, "meal")?;
        patch.apply_to(meal);
        meal.updated_at = now;
        Ok(meal.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Delete).await?;
        remove(&mut self.lock().meals, id, "meal")
    }

    async fn add_water_intake(
        &self,
        date: NaiveDate,
        amount_ml: u32,
    ) -> Result<WaterIntake, GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Water).await?;
        require(amount_ml > 0, "water amount must be positive")?;
        let mut backend = self.lock();
        let total = backend.water.entry(date).or_default();
        *total = total.saturating_add(amount_ml);
        Ok(WaterIntake {
            date,
            amount_ml: *total,
        })
    }

    async fn get_daily_nutrition(&self, date: NaiveDate) -> Result<DailyNutrition, GatewayError> {
        self.intercept(SliceKey::Nutrition, OperationKind::Daily).await?;
        let backend = self.lock();
        let (totals, meal_count) = backend
            .meals
            .iter()
            .filter(|meal| meal.date() == date)
            .fold((NutritionFacts::default(), 0_u32), |(acc, count), meal| {
                (acc.combined_with(&meal.nutrition), count.saturating_add(1))
            });
        Ok(DailyNutrition {
            date,
            totals,
            meal_count,
            water_ml: backend.water.get(&date).copied().unwrap_or_default(),
            calorie_goal: None,
            water_goal_ml: None,
        })
    }
}

#[async_trait]
impl WorkoutGateway for InMemoryGateway {
    async fn list(&self, query: &WorkoutQuery) -> Result<Page<Workout>, GatewayError> {
        self.intercept(SliceKey::Workouts, OperationKind::Fetch).await?;
        let filters = &query.filters;
        Ok(paginate(
            &self.lock().workouts,
            |workout| filters.matches(workout),
            |left, right| filters.compare(left, right),
            query.page,
        ))
    }

    async fn get(&self, id: &RecordId) -> Result<Workout, GatewayError> {
        self.intercept(SliceKey::Workouts, OperationKind::Lookup).await?;
        find(&self.lock().workouts, id, "workout").cloned()
    }

    async fn create(&self, draft: &WorkoutDraft) -> Result<Workout, GatewayError> {
        self.intercept(SliceKey::Workouts, OperationKind::Create).await?;
        require(!draft.name.trim().is_empty(), "workout name is required")?;
        require(draft.duration_minutes > 0, "workout duration must be positive")?;
        let now = self.clock.utc();
        let workout = Workout {
            id: RecordId::random(),
            name: draft.name.trim().to_owned(),
            workout_type: draft.workout_type,
            intensity: draft.intensity,
            performed_at: draft.performed_at,
            duration_minutes: draft.duration_minutes,
            calories_burned: draft.calories_burned,
            exercises: draft.exercises.clone(),
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lock().workouts.push(workout.clone());
        Ok(workout)
    }

    async fn update(&self, id: &RecordId, patch: &WorkoutPatch) -> Result<Workout, GatewayError> {
        self.intercept(SliceKey::Workouts, OperationKind::Update).await?;
        let now = self.clock.utc();
        let mut backend = self.lock();
        let workout = find_mut(&mut backend.workouts, id, "workout")?;
        patch.apply_to(workout);
        workout.updated_at = now;
        Ok(workout.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.intercept(SliceKey::Workouts, OperationKind::Delete).await?;
        remove(&mut self.lock().workouts, id, "workout")
    }
}
