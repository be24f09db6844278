//! Write paths for habits and progress over the in-memory snapshot.
//!
//! Validation lives here so the stats functions can assume well-formed input:
//! names are non-empty after trimming, targets are at least 1 and there is at
//! most one progress entry per `(habit_id, date)`.

use crate::errors::AppError;
use crate::models::{
    AppData, CreateHabitRequest, DEFAULT_COLOR, Habit, ProgressEntry, ProgressRequest,
    UpdateHabitRequest,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub fn create_habit(
    data: &mut AppData,
    request: CreateHabitRequest,
    now: DateTime<Utc>,
) -> Result<Habit, AppError> {
    let name = validate_name(&request.name)?;
    let target_count = validate_target(request.target_count.unwrap_or(1))?;
    let color = non_empty(request.color)
        .map(validate_color)
        .transpose()?
        .unwrap_or_else(|| DEFAULT_COLOR.to_string());

    let habit = Habit {
        id: Uuid::new_v4(),
        name,
        description: non_empty(request.description),
        frequency: request.frequency,
        target_count,
        color,
        created_at: now,
    };
    data.habits.insert(0, habit.clone());
    Ok(habit)
}

pub fn update_habit(
    data: &mut AppData,
    id: Uuid,
    patch: UpdateHabitRequest,
) -> Result<Habit, AppError> {
    let name = patch.name.as_deref().map(validate_name).transpose()?;
    let target_count = patch.target_count.map(validate_target).transpose()?;
    let color = non_empty(patch.color).map(validate_color).transpose()?;

    let habit = data
        .habits
        .iter_mut()
        .find(|habit| habit.id == id)
        .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))?;

    if let Some(name) = name {
        habit.name = name;
    }
    if let Some(description) = patch.description {
        habit.description = non_empty(Some(description));
    }
    if let Some(frequency) = patch.frequency {
        habit.frequency = frequency;
    }
    if let Some(target_count) = target_count {
        habit.target_count = target_count;
    }
    if let Some(color) = color {
        habit.color = color;
    }
    Ok(habit.clone())
}

/// Removes the habit together with all of its progress entries.
pub fn delete_habit(data: &mut AppData, id: Uuid) -> Result<(), AppError> {
    let before = data.habits.len();
    data.habits.retain(|habit| habit.id != id);
    if data.habits.len() == before {
        return Err(AppError::not_found(format!("habit {id} not found")));
    }
    data.progress.retain(|entry| entry.habit_id != id);
    Ok(())
}

/// Inserts or overwrites the entry for `(habit_id, date)`.
pub fn upsert_progress(
    data: &mut AppData,
    request: ProgressRequest,
) -> Result<ProgressEntry, AppError> {
    ensure_habit(data, request.habit_id)?;

    let entry = ProgressEntry {
        habit_id: request.habit_id,
        date: request.date,
        completed_count: request.completed_count,
        notes: non_empty(request.notes),
    };

    match data
        .progress
        .iter_mut()
        .find(|existing| existing.habit_id == entry.habit_id && existing.date == entry.date)
    {
        Some(existing) => *existing = entry.clone(),
        None => data.progress.push(entry.clone()),
    }
    Ok(entry)
}

/// Moves the count for `(habit_id, date)` by `delta`, never below zero.
///
/// Returns the stored entry and whether this step crossed the target.
pub fn step_progress(
    data: &mut AppData,
    habit_id: Uuid,
    date: NaiveDate,
    delta: i64,
) -> Result<(ProgressEntry, bool), AppError> {
    let target = ensure_habit(data, habit_id)?.target_count;
    let existing = data
        .progress
        .iter()
        .find(|entry| entry.habit_id == habit_id && entry.date == date);
    let current = existing.map(|entry| entry.completed_count).unwrap_or(0);
    let notes = existing.and_then(|entry| entry.notes.clone());

    let next = (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32;
    let entry = upsert_progress(
        data,
        ProgressRequest {
            habit_id,
            date,
            completed_count: next,
            notes,
        },
    )?;
    Ok((entry, next >= target && current < target))
}

/// Progress entries ordered newest date first.
pub fn progress_by_date(data: &AppData) -> Vec<ProgressEntry> {
    let mut entries = data.progress.clone();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

fn ensure_habit(data: &AppData, id: Uuid) -> Result<&Habit, AppError> {
    data.habits
        .iter()
        .find(|habit| habit.id == id)
        .ok_or_else(|| AppError::not_found(format!("habit {id} not found")))
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("habit name is required"));
    }
    Ok(trimmed.to_string())
}

fn validate_target(target: u32) -> Result<u32, AppError> {
    if target < 1 {
        return Err(AppError::bad_request("target count must be at least 1"));
    }
    Ok(target)
}

/// Colors are `#RRGGBB` so they can be dropped into markup as-is.
fn validate_color(color: String) -> Result<String, AppError> {
    let hex = color.strip_prefix('#').unwrap_or_default();
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(AppError::bad_request("color must be a #RRGGBB hex value"));
    }
    Ok(color)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
