use crate::errors::AppError;
use crate::models::{
    AppData, CreateHabitRequest, Habit, HabitCard, HabitListQuery, ProgressEntry, ProgressRequest,
    StatsQuery, StatsResponse, StepResponse, TodayResponse, UpdateHabitRequest,
};
use crate::state::AppState;
use crate::stats::{self, build_stats, completion_rate, daily_stats, filter_and_sort, habit_cards};
use crate::storage::persist_data;
use crate::store;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    let today = today_response(stats::today(), &data.habits, &data.progress);
    Html(render_index(&today))
}

pub async fn list_habits(
    State(state): State<AppState>,
    Query(query): Query<HabitListQuery>,
) -> Result<Json<Vec<HabitCard>>, AppError> {
    let date = stats::today();
    let data = state.data.lock().await;
    let selected = filter_and_sort(
        &data.habits,
        &data.progress,
        query.filter,
        query.sort_by,
        date,
        &query.search,
    );
    Ok(Json(habit_cards(&selected, &data.progress, date)))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(payload): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = commit(&state, |data| store::create_habit(data, payload, Utc::now())).await?;

    info!(habit_id = %habit.id, name = %habit.name, "habit created");
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHabitRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = commit(&state, |data| store::update_habit(data, id, payload)).await?;

    info!(habit_id = %id, "habit updated");
    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    commit(&state, |data| store::delete_habit(data, id)).await?;

    info!(habit_id = %id, "habit deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_progress(State(state): State<AppState>) -> Json<Vec<ProgressEntry>> {
    let data = state.data.lock().await;
    Json(store::progress_by_date(&data))
}

pub async fn upsert_progress(
    State(state): State<AppState>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<ProgressEntry>, AppError> {
    let entry = commit(&state, |data| store::upsert_progress(data, payload)).await?;

    info!(habit_id = %entry.habit_id, date = %entry.date, "progress upserted");
    Ok(Json(entry))
}

pub async fn increment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    apply_step(&state, id, 1).await.map(Json)
}

pub async fn decrement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    apply_step(&state, id, -1).await.map(Json)
}

pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodayResponse>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(today_response(stats::today(), &data.habits, &data.progress)))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(build_stats(&data.habits, &data.progress, query.range)))
}

async fn apply_step(state: &AppState, habit_id: Uuid, delta: i64) -> Result<StepResponse, AppError> {
    let date = stats::today();
    let (entry, just_completed) =
        commit(state, |data| store::step_progress(data, habit_id, date, delta)).await?;

    if just_completed {
        info!(habit_id = %habit_id, %date, "daily target reached");
    }
    Ok(StepResponse {
        entry,
        just_completed,
    })
}

/// Applies `mutate` to a copy of the snapshot and only swaps it in once the
/// copy has been written, so a failed write leaves memory untouched.
async fn commit<T>(
    state: &AppState,
    mutate: impl FnOnce(&mut AppData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let value = mutate(&mut next)?;
    persist_data(&state.data_path, &next).await?;
    *data = next;
    Ok(value)
}

fn today_response(date: NaiveDate, habits: &[Habit], progress: &[ProgressEntry]) -> TodayResponse {
    let stats = daily_stats(habits, progress, date);
    TodayResponse {
        date,
        completion_rate: completion_rate(&stats),
        stats,
    }
}
