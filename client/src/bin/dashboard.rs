//! Dashboard summary for the fitsync tracker.
//!
//! Loads store settings, refreshes every slice through the REST gateway and
//! emits the selector figures as structured `tracing` events. Allowlisted
//! slices are restored from and saved to the snapshot directory when one is
//! configured.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use client::domain::ports::{CredentialSource, StaticCredentials};
use client::domain::SliceResult;
use client::outbound::rest::RestGateway;
use client::outbound::snapshot::FileSnapshotRepository;
use client::selectors::{goals, nutrition, weight, workouts};
use client::settings::StoreSettings;
use client::store::{GoalsSlice, NutritionSlice, Store, WeightSlice, WorkoutsSlice};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `fitsync-dashboard` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fitsync-dashboard",
    about = "Summarise goals, weight, nutrition and workouts from the fitsync API",
    version
)]
struct CliArgs {
    /// Bearer token attached to API requests; anonymous when omitted.
    #[arg(long, value_name = "token")]
    token: Option<String>,
    /// Daily calorie goal used for intake progress.
    #[arg(long = "calorie-goal", value_name = "kcal", default_value_t = 2_000.0)]
    calorie_goal: f64,
    /// Daily water goal used for hydration progress.
    #[arg(long = "water-goal-ml", value_name = "ml", default_value_t = 2_500)]
    water_goal_ml: u32,
    /// Height used for the body-mass index.
    #[arg(long = "height-cm", value_name = "cm")]
    height_cm: Option<f64>,
}

struct Slices {
    goals: Arc<GoalsSlice<RestGateway>>,
    weight: Arc<WeightSlice<RestGateway>>,
    nutrition: Arc<NutritionSlice<RestGateway>>,
    workouts: Arc<WorkoutsSlice<RestGateway>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = StoreSettings::load_from_iter([OsString::from("fitsync-dashboard")])
        .map_err(|error| eyre!("failed to load store settings: {error}"))?;

    let slices = build_slices(&settings, args.token.clone())?;
    let store = build_store(&settings, &slices)?;
    store.init();

    refresh(&slices).await;
    summarise(&settings, &args, &slices);

    store.teardown().wrap_err("failed to persist slices")?;
    Ok(())
}

fn build_slices(settings: &StoreSettings, token: Option<String>) -> Result<Slices> {
    let credentials: Arc<dyn CredentialSource> = Arc::new(match token {
        Some(token) => StaticCredentials::new(token),
        None => StaticCredentials::anonymous(),
    });
    let gateway = Arc::new(
        RestGateway::new(
            settings.api_base_url()?,
            settings.request_timeout(),
            credentials,
        )
        .wrap_err("failed to build http client")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let options = settings.slice_options();
    Ok(Slices {
        goals: Arc::new(GoalsSlice::new(gateway.clone(), clock.clone(), options)),
        weight: Arc::new(WeightSlice::new(gateway.clone(), clock.clone(), options)),
        nutrition: Arc::new(NutritionSlice::new(gateway.clone(), clock.clone(), options)),
        workouts: Arc::new(WorkoutsSlice::new(gateway, clock, options)),
    })
}

fn build_store(settings: &StoreSettings, slices: &Slices) -> Result<Store> {
    let mut builder = Store::builder()
        .slice(slices.goals.clone())
        .slice(slices.weight.clone())
        .slice(slices.nutrition.clone())
        .slice(slices.workouts.clone())
        .persist_all(settings.persisted_slices()?);
    if let Some(dir) = settings.snapshot_dir() {
        let repository = FileSnapshotRepository::open(dir)
            .wrap_err_with(|| format!("failed to open snapshot dir {}", dir.display()))?;
        builder = builder.snapshots(Arc::new(repository));
    }
    Ok(builder.build()?)
}

/// Refresh every slice concurrently; failures stay recorded on the slice.
async fn refresh(slices: &Slices) {
    let today = slices.nutrition.now().date_naive();
    let (goals, weight, latest, meals, daily, workouts) = tokio::join!(
        slices.goals.refresh(),
        slices.weight.refresh(),
        slices.weight.fetch_latest(),
        slices.nutrition.refresh(),
        slices.nutrition.fetch_daily_nutrition(today),
        slices.workouts.refresh(),
    );
    report("goals", goals);
    report("weight", weight);
    report("latest weight", latest);
    report("meals", meals);
    report("daily nutrition", daily);
    report("workouts", workouts);
}

fn report<T>(what: &str, result: SliceResult<T>) {
    if let Err(error) = result {
        warn!(what, code = ?error.code(), error = %error, "refresh failed");
    }
}

fn summarise(settings: &StoreSettings, args: &CliArgs, slices: &Slices) {
    let now = slices.goals.now();
    summarise_goals(settings, slices, now);
    summarise_weight(args, slices);
    summarise_nutrition(args, slices, now);
    summarise_workouts(slices, now);
}

fn summarise_goals(settings: &StoreSettings, slices: &Slices, now: DateTime<Utc>) {
    slices.goals.read(|state| {
        let items = state.items();
        let stats = goals::goal_stats(items);
        let upcoming: Vec<&str> =
            goals::upcoming_deadlines(items, now, settings.deadline_window_days())
                .into_iter()
                .map(|goal| goal.title.as_str())
                .collect();
        info!(
            total = stats.total,
            completion_rate = stats.completion_rate,
            active = goals::active_goals(items).len(),
            high_priority = goals::high_priority_goals(items).len(),
            overdue = goals::overdue_goals(items, now).len(),
            needing_update =
                goals::goals_needing_update(items, now, settings.progress_stale_days()).len(),
            upcoming = ?upcoming,
            "goals"
        );
    });
}

fn summarise_weight(args: &CliArgs, slices: &Slices) {
    slices.weight.read(|state| {
        let items = state.items();
        let progress = weight::weight_progress(items);
        let current_kg = weight::latest_entry(items).map(|entry| entry.weight_kg());
        let bmi = current_kg
            .zip(args.height_cm)
            .and_then(|(kg, cm)| weight::bmi(kg, cm));
        info!(
            entries = items.len(),
            current_kg = ?current_kg,
            change_kg = ?progress.map(|progress| progress.change_kg),
            change_percent = ?progress.map(|progress| progress.change_percent),
            average_kg = ?weight::average_weight(items),
            bmi = ?bmi,
            bmi_category = ?bmi.map(weight::bmi_category),
            "weight"
        );
    });
}

fn summarise_nutrition(args: &CliArgs, slices: &Slices, now: DateTime<Utc>) {
    let today = now.date_naive();
    slices.nutrition.read(|state| {
        let items = state.items();
        let totals = nutrition::daily_totals(items, today);
        let calorie_goal = state
            .caches()
            .daily
            .as_ref()
            .and_then(|daily| daily.calorie_goal)
            .unwrap_or(args.calorie_goal);
        let water_ml = state
            .caches()
            .daily
            .as_ref()
            .map(|daily| daily.water_ml)
            .unwrap_or_default();
        let calories = nutrition::calorie_progress(items, today, calorie_goal);
        let water = nutrition::water_progress(water_ml, args.water_goal_ml);
        info!(
            meals = nutrition::meals_on(items, today).len(),
            calories = totals.calories,
            protein = totals.protein,
            calorie_percent = ?calories.map(|progress| progress.percent),
            water_ml,
            water_percent = ?water.map(|progress| progress.percent),
            "nutrition"
        );
    });
}

fn summarise_workouts(slices: &Slices, now: DateTime<Utc>) {
    slices.workouts.read(|state| {
        let items = state.items();
        let week = workouts::weekly_summary(items, now);
        info!(
            sessions_this_week = week.count,
            minutes_this_week = week.total_minutes,
            calories_this_week = week.total_calories,
            streak_days = workouts::workout_streak(items, now),
            "workouts"
        );
    });
}
