//! Learning event log. Append-only.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::types::{format_timestamp, parse_timestamp, LearningEvent};

/// Append one event. Returns the row id.
pub fn insert_event(conn: &Connection, event: &LearningEvent) -> Result<i64> {
    conn.execute(
        "INSERT INTO learning (input_data, output_data, success_score, timestamp) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            event.input,
            event.output,
            event.success_score,
            format_timestamp(event.timestamp)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Load the whole log in insertion order.
pub fn load_events(conn: &Connection) -> Result<Vec<LearningEvent>> {
    let mut stmt = conn.prepare(
        "SELECT input_data, output_data, success_score, timestamp FROM learning ORDER BY id",
    )?;
    let events = stmt
        .query_map([], |row| {
            let raw_ts: String = row.get(3)?;
            Ok(LearningEvent {
                input: row.get(0)?,
                output: row.get(1)?,
                success_score: row.get(2)?,
                timestamp: parse_timestamp(3, &raw_ts)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Mean success score, or `None` for an empty slice.
pub fn average_score(events: &[LearningEvent]) -> Option<f64> {
    if events.is_empty() {
        return None;
    }
    let total: f64 = events.iter().map(|e| e.success_score).sum();
    Some(total / events.len() as f64)
}

/// Events strictly newer than `since`.
pub fn events_since(events: &[LearningEvent], since: DateTime<Utc>) -> Vec<LearningEvent> {
    events
        .iter()
        .filter(|e| e.timestamp > since)
        .cloned()
        .collect()
}
