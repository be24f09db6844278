use crate::models::{
    DailyStats, DayMark, Habit, HabitCard, HabitFilter, ProgressEntry, RollupPoint, SortBy,
    StatsRange, StatsResponse, TodayBreakdown, WeekdayPoint, WeeklyOverview,
};
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::HashMap;
use uuid::Uuid;

/// Upper bound on how far back a streak is walked.
pub const MAX_STREAK_DAYS: u32 = 365;

const RECENT_DAYS: i64 = 7;

/// Lookup of progress entries by `(habit_id, date)`.
///
/// Built once per computation so that per-day scans stay O(1) per habit.
/// Duplicate keys resolve to the first entry, matching `is_completed`.
pub struct ProgressIndex<'a> {
    entries: HashMap<(Uuid, NaiveDate), &'a ProgressEntry>,
}

impl<'a> ProgressIndex<'a> {
    pub fn new(progress: &'a [ProgressEntry]) -> Self {
        let mut entries = HashMap::with_capacity(progress.len());
        for entry in progress {
            entries.entry((entry.habit_id, entry.date)).or_insert(entry);
        }
        Self { entries }
    }

    pub fn get(&self, habit_id: Uuid, date: NaiveDate) -> Option<&'a ProgressEntry> {
        self.entries.get(&(habit_id, date)).copied()
    }

    pub fn count(&self, habit_id: Uuid, date: NaiveDate) -> u32 {
        self.get(habit_id, date)
            .map(|entry| entry.completed_count)
            .unwrap_or(0)
    }

    pub fn is_completed(&self, habit: &Habit, date: NaiveDate) -> bool {
        self.get(habit.id, date)
            .is_some_and(|entry| entry.completed_count >= habit.target_count)
    }

    fn completed_on(&self, habits: &[Habit], date: NaiveDate) -> usize {
        habits
            .iter()
            .filter(|habit| self.is_completed(habit, date))
            .count()
    }
}

pub fn is_completed(habit: &Habit, progress: &[ProgressEntry], date: NaiveDate) -> bool {
    progress
        .iter()
        .find(|entry| entry.habit_id == habit.id && entry.date == date)
        .is_some_and(|entry| entry.completed_count >= habit.target_count)
}

pub fn daily_stats(habits: &[Habit], progress: &[ProgressEntry], date: NaiveDate) -> DailyStats {
    let index = ProgressIndex::new(progress);
    habits.iter().fold(DailyStats::default(), |mut stats, habit| {
        stats.total += 1;
        match index.get(habit.id, date) {
            Some(entry) if entry.completed_count >= habit.target_count => stats.completed += 1,
            Some(entry) if entry.completed_count > 0 => stats.in_progress += 1,
            _ => {}
        }
        stats
    })
}

pub fn completion_rate(stats: &DailyStats) -> u32 {
    percentage(stats.completed, stats.total)
}

/// Per-day completion for the `window_days` days ending at `date`, oldest first.
pub fn windowed_rollup(
    habits: &[Habit],
    progress: &[ProgressEntry],
    date: NaiveDate,
    window_days: u32,
) -> Vec<RollupPoint> {
    let index = ProgressIndex::new(progress);
    let label_format = if window_days <= 7 { "%a" } else { "%b %-d" };
    let total = habits.len();

    (0..i64::from(window_days))
        .rev()
        .map(|offset| {
            let day = date - Duration::days(offset);
            let completed = index.completed_on(habits, day);
            RollupPoint {
                date: day,
                label: day.format(label_format).to_string(),
                completed,
                total,
                percentage: percentage(completed, total),
            }
        })
        .collect()
}

/// Consecutive days ending at `date` on which every habit was completed.
pub fn current_streak(habits: &[Habit], progress: &[ProgressEntry], date: NaiveDate) -> u32 {
    if habits.is_empty() {
        return 0;
    }

    let index = ProgressIndex::new(progress);
    let mut streak = 0;
    let mut day = date;
    while streak < MAX_STREAK_DAYS {
        if !habits.iter().all(|habit| index.is_completed(habit, day)) {
            break;
        }
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// All-time count of completed entries whose habit still exists.
pub fn total_completions(habits: &[Habit], progress: &[ProgressEntry]) -> usize {
    let targets: HashMap<Uuid, u32> = habits
        .iter()
        .map(|habit| (habit.id, habit.target_count))
        .collect();

    progress
        .iter()
        .filter(|entry| {
            targets
                .get(&entry.habit_id)
                .is_some_and(|target| entry.completed_count >= *target)
        })
        .count()
}

/// Filters by name and completion on `date`, then stable-sorts by `sort_by`.
pub fn filter_and_sort<'a>(
    habits: &'a [Habit],
    progress: &[ProgressEntry],
    filter: HabitFilter,
    sort_by: SortBy,
    date: NaiveDate,
    search: &str,
) -> Vec<&'a Habit> {
    let index = ProgressIndex::new(progress);
    let needle = search.to_lowercase();

    let mut selected: Vec<&Habit> = habits
        .iter()
        .filter(|habit| habit.name.to_lowercase().contains(&needle))
        .filter(|habit| match filter {
            HabitFilter::All => true,
            HabitFilter::Completed => index.is_completed(habit, date),
            HabitFilter::Pending => !index.is_completed(habit, date),
        })
        .collect();

    match sort_by {
        SortBy::Name => selected.sort_by_cached_key(|habit| habit.name.to_lowercase()),
        SortBy::Date => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::Progress => selected.sort_by(|a, b| {
            let a_pct = completion_percentage(a, index.count(a.id, date));
            let b_pct = completion_percentage(b, index.count(b.id, date));
            b_pct.total_cmp(&a_pct)
        }),
    }

    selected
}

/// Share of the daily target reached, not capped at 100.
pub fn completion_percentage(habit: &Habit, count: u32) -> f64 {
    if habit.target_count == 0 {
        return 0.0;
    }
    f64::from(count) / f64::from(habit.target_count) * 100.0
}

pub fn today_breakdown(
    habits: &[Habit],
    progress: &[ProgressEntry],
    date: NaiveDate,
) -> TodayBreakdown {
    let completed = ProgressIndex::new(progress).completed_on(habits, date);
    TodayBreakdown {
        completed,
        pending: habits.len() - completed,
    }
}

/// The Sunday-based calendar week containing `date`.
pub fn weekly_overview(
    habits: &[Habit],
    progress: &[ProgressEntry],
    date: NaiveDate,
) -> WeeklyOverview {
    let index = ProgressIndex::new(progress);
    let start = week_start(date);
    let total = habits.len();

    let days: Vec<WeekdayPoint> = (0..7)
        .map(|offset| {
            let day = start + Duration::days(offset);
            WeekdayPoint {
                day: day.format("%A").to_string(),
                date: day,
                completed: index.completed_on(habits, day),
                total,
                is_today: day == date,
            }
        })
        .collect();

    let completed: usize = days.iter().map(|day| day.completed).sum();
    let possible = days.len() * total;

    WeeklyOverview {
        start_date: start,
        end_date: start + Duration::days(6),
        days,
        completed,
        possible,
        percentage: percentage(completed, possible),
    }
}

pub fn habit_card(habit: &Habit, progress: &[ProgressEntry], date: NaiveDate) -> HabitCard {
    let index = ProgressIndex::new(progress);
    habit_card_indexed(habit, &index, date)
}

fn habit_card_indexed(habit: &Habit, index: &ProgressIndex<'_>, date: NaiveDate) -> HabitCard {
    let today_count = index.count(habit.id, date);
    let recent = (0..RECENT_DAYS)
        .rev()
        .map(|offset| {
            let day = date - Duration::days(offset);
            DayMark {
                date: day,
                completed: index.is_completed(habit, day),
                is_today: offset == 0,
            }
        })
        .collect();

    HabitCard {
        habit: habit.clone(),
        today_count,
        progress_percentage: completion_percentage(habit, today_count).min(100.0),
        completed: today_count >= habit.target_count,
        recent,
    }
}

pub fn habit_cards(
    habits: &[&Habit],
    progress: &[ProgressEntry],
    date: NaiveDate,
) -> Vec<HabitCard> {
    let index = ProgressIndex::new(progress);
    habits
        .iter()
        .map(|habit| habit_card_indexed(habit, &index, date))
        .collect()
}

pub fn build_stats(habits: &[Habit], progress: &[ProgressEntry], range: StatsRange) -> StatsResponse {
    build_stats_at(today(), habits, progress, range)
}

pub fn build_stats_at(
    date: NaiveDate,
    habits: &[Habit],
    progress: &[ProgressEntry],
    range: StatsRange,
) -> StatsResponse {
    let today = daily_stats(habits, progress, date);

    StatsResponse {
        date,
        completion_rate: completion_rate(&today),
        today,
        current_streak: current_streak(habits, progress, date),
        total_completions: total_completions(habits, progress),
        rollup: windowed_rollup(habits, progress, date, range.days()),
        weekly_overview: weekly_overview(habits, progress, date),
        breakdown: today_breakdown(habits, progress, date),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}
