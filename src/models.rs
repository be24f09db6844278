use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    pub target_count: u32,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub completed_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Persisted snapshot. Habits are kept newest first.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub progress: Vec<ProgressEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HabitFilter {
    #[default]
    All,
    Completed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Date,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsRange {
    #[default]
    Week,
    Month,
}

impl StatsRange {
    pub fn days(self) -> u32 {
        match self {
            StatsRange::Week => 7,
            StatsRange::Month => 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HabitListQuery {
    #[serde(default)]
    pub filter: HabitFilter,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub range: StatsRange,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    pub target_count: Option<u32>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub target_count: Option<u32>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub completed_count: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    pub entry: ProgressEntry,
    pub just_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DailyStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub stats: DailyStats,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupPoint {
    pub date: NaiveDate,
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayPoint {
    pub day: String,
    pub date: NaiveDate,
    pub completed: usize,
    pub total: usize,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyOverview {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<WeekdayPoint>,
    pub completed: usize,
    pub possible: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayBreakdown {
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub date: NaiveDate,
    pub today: DailyStats,
    pub completion_rate: u32,
    pub current_streak: u32,
    pub total_completions: usize,
    pub rollup: Vec<RollupPoint>,
    pub weekly_overview: WeeklyOverview,
    pub breakdown: TodayBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMark {
    pub date: NaiveDate,
    pub completed: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitCard {
    #[serde(flatten)]
    pub habit: Habit,
    pub today_count: u32,
    pub progress_percentage: f64,
    pub completed: bool,
    pub recent: Vec<DayMark>,
}
