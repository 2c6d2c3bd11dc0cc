//! Core record definitions.
//!
//! Defines [`MemoryEntry`] (a keyed value in the memory table),
//! [`LearningEvent`] (one logged interaction), [`Task`] with its
//! [`TaskStatus`], and the category tags used across components.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Category tags written alongside memory entries.
pub mod category {
    pub const GENERAL: &str = "general";
    pub const REPORTS: &str = "reports";
    pub const ERRORS: &str = "errors";
    pub const CREDENTIALS: &str = "credentials";
    pub const ANALYSIS: &str = "analysis";
    pub const MAINTENANCE: &str = "maintenance";
    pub const SELF_IMPROVEMENT: &str = "self_improvement";
    pub const HANDOFFS: &str = "handoffs";
    pub const SPACES: &str = "spaces";
    pub const USER_INPUT: &str = "user_input";
}

/// A keyed value in the memory table. Keys are unique; a save with an
/// existing key replaces the value, category, and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    /// Any JSON value: plain strings, numbers, or structured objects.
    pub value: serde_json::Value,
    pub category: String,
    /// Time of the last write.
    pub timestamp: DateTime<Utc>,
}

/// One logged interaction and how well it went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEvent {
    pub input: String,
    pub output: String,
    /// Nominally in `[0.0, 1.0]`; not validated.
    pub success_score: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("unknown task status: {s}")),
        }
    }
}

/// A row of the task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned, strictly increasing.
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Higher is more urgent. Any value is accepted.
    pub priority: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Render a timestamp for storage. Fixed width and always UTC, so text
/// comparison in SQL matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp inside a row mapper.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format_round_trips_and_sorts() {
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::microseconds(1);

        let (a, b) = (format_timestamp(early), format_timestamp(late));
        assert!(a < b);
        assert_eq!(parse_timestamp(0, &a).unwrap(), early);
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn task_status_parses() {
        assert_eq!("pending".parse::<TaskStatus>().unwrap(), TaskStatus::Pending);
        assert_eq!("completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert!("done".parse::<TaskStatus>().is_err());
    }
}
