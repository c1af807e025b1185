use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How hard a task feels. The weight feeds the priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.25,
            Difficulty::Hard => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// User-assigned importance. The weight feeds the priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn weight(self) -> f64 {
        match self {
            Priority::Low => 0.5,
            Priority::Normal => 1.0,
            Priority::High => 2.0,
            Priority::Urgent => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A single actionable item. All instants are Unix epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub name: String,
    pub deadline: Option<i64>,
    pub difficulty: Difficulty,
    pub priority: Priority,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub started: bool,
    pub quick: bool, // short task, earns a scoring bonus
    pub time_worked_ms: i64,
    pub created_at: i64,
    pub last_modified: i64,
    pub remote_id: Option<String>,
}

impl Task {
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: None,
            name,
            deadline: None,
            difficulty: Difficulty::Easy,
            priority: Priority::Normal,
            completed: false,
            completed_at: None,
            started: false,
            quick: false,
            time_worked_ms: 0,
            created_at: now,
            last_modified: now,
            remote_id: None,
        }
    }

    /// True when the deadline has passed and the task is still open.
    pub fn is_overdue(&self, now: i64) -> bool {
        !self.completed && self.deadline.is_some_and(|d| d < now)
    }
}

/// A checklist item belonging to one task. Deleted with its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Option<i64>,
    pub task_id: i64,
    pub name: String,
    pub completed: bool,
    pub sort_order: i64,
}

impl Subtask {
    pub fn new(task_id: i64, name: String, sort_order: i64) -> Self {
        Self {
            id: None,
            task_id,
            name,
            completed: false,
            sort_order,
        }
    }
}

/// A recurring daily practice. Archived instead of deleted so its
/// history survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Option<i64>,
    pub name: String,
    pub emoji: String,
    pub created_at: i64,
    pub archived: bool,
    pub last_modified: i64,
}

impl Habit {
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: None,
            name,
            emoji: "✅".to_string(),
            created_at: now,
            archived: false,
            last_modified: now,
        }
    }
}

/// One checked-off day for a habit. At most one log per (habit, day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: Option<i64>,
    pub habit_id: i64,
    pub day: i64, // epoch-day, see streaks::epoch_day
    pub completed_at: i64,
}

impl HabitLog {
    pub fn new(habit_id: i64, day: i64, completed_at: i64) -> Self {
        Self {
            id: None,
            habit_id,
            day,
            completed_at,
        }
    }
}

/// Trim user input destined for a name field. Blank input yields None;
/// the calling operation silently no-ops in that case.
pub fn normalized_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
