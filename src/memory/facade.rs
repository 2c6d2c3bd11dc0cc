//! The single owner of the store connection.
//!
//! [`Facade`] mediates every read and write: memory entries go through the
//! in-process [`Mirror`], learning events through an in-process list, tasks
//! straight to the store. Other components receive an `Arc<Facade>` at
//! construction.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock};

use super::integrations::{self, IntegrationRow};
use super::mirror::Mirror;
use super::types::{LearningEvent, MemoryEntry, Task};
use super::{learning, store, tasks};
use crate::config::UserProfile;
use crate::db::{self, HealthReport};

pub struct Facade {
    conn: Mutex<Connection>,
    mirror: RwLock<Mirror>,
    learning: RwLock<Vec<LearningEvent>>,
    profile: UserProfile,
}

/// Snapshot returned by [`Facade::status`].
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub memory_items: usize,
    pub learning_items: usize,
    pub pending_tasks: usize,
    pub last_update: DateTime<Utc>,
    pub profile: UserProfile,
}

impl Facade {
    /// Open the store file, creating it if needed. Failure here is fatal to startup.
    pub fn open(path: impl AsRef<Path>, profile: UserProfile) -> Result<Self> {
        let conn = db::open_database(path)?;
        Self::from_connection(conn, profile)
    }

    /// A throwaway in-memory store.
    pub fn in_memory(profile: UserProfile) -> Result<Self> {
        Self::from_connection(db::open_memory_database()?, profile)
    }

    /// Wrap an initialized connection and load the memory table and learning log.
    pub fn from_connection(conn: Connection, profile: UserProfile) -> Result<Self> {
        let entries = store::load_entries(&conn)?;
        let events = learning::load_events(&conn)?;
        tracing::debug!(
            memory_items = entries.len(),
            learning_items = events.len(),
            "facade loaded"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            mirror: RwLock::new(Mirror::from_entries(entries)),
            learning: RwLock::new(events),
            profile,
        })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("store connection lock poisoned"))
    }

    // ── Memory ───────────────────────────────────────────────────────────────

    /// Write `value` under `key`, replacing any previous entry, then update the mirror.
    pub fn save(&self, key: &str, value: impl Serialize, category: &str) -> Result<()> {
        let entry = MemoryEntry {
            key: key.to_string(),
            value: serde_json::to_value(value)?,
            category: category.to_string(),
            timestamp: Utc::now(),
        };

        store::upsert_entry(&*self.conn()?, &entry)?;
        self.mirror
            .write()
            .map_err(|_| anyhow!("memory mirror lock poisoned"))?
            .put(entry);
        Ok(())
    }

    /// Read from the mirror only.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entry(key).map(|e| e.value)
    }

    pub fn get_or(&self, key: &str, default: serde_json::Value) -> serde_json::Value {
        self.get(key).unwrap_or(default)
    }

    pub fn entry(&self, key: &str) -> Option<MemoryEntry> {
        self.mirror.read().ok()?.get(key).cloned()
    }

    pub fn memory_len(&self) -> usize {
        self.mirror.read().map(|m| m.len()).unwrap_or(0)
    }

    /// The `n` most recently written entries, oldest of them first.
    pub fn recent_entries(&self, n: usize) -> Vec<MemoryEntry> {
        self.mirror.read().map(|m| m.recent(n)).unwrap_or_default()
    }

    pub fn recent_keys(&self, n: usize) -> Vec<String> {
        self.recent_entries(n).into_iter().map(|e| e.key).collect()
    }

    /// Entry counts per category, read from the store.
    pub fn category_counts(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn()?;
        store::count_by_category(&conn)
    }

    // ── Tasks ────────────────────────────────────────────────────────────────

    /// Insert a pending task and return its store-assigned id.
    pub fn create_task(
        &self,
        title: &str,
        description: &str,
        priority: i64,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        let id = tasks::insert_task(
            &conn,
            title,
            description,
            priority,
            due_date,
            Utc::now(),
        )?;
        tracing::debug!(task_id = id, title, priority, "task created");
        Ok(id)
    }

    pub fn pending_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        tasks::pending_tasks(&conn)
    }

    pub fn task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.conn()?;
        tasks::get_task(&conn, id)
    }

    // ── Learning ─────────────────────────────────────────────────────────────

    /// Append to the log and the in-process list. No dedup, no range check.
    pub fn record_learning_event(&self, input: &str, output: &str, score: f64) -> Result<()> {
        let event = LearningEvent {
            input: input.to_string(),
            output: output.to_string(),
            success_score: score,
            timestamp: Utc::now(),
        };
        learning::insert_event(&*self.conn()?, &event)?;
        self.learning
            .write()
            .map_err(|_| anyhow!("learning list lock poisoned"))?
            .push(event);
        Ok(())
    }

    pub fn learning_len(&self) -> usize {
        self.learning.read().map(|l| l.len()).unwrap_or(0)
    }

    /// The `n` most recent events, oldest of them first.
    pub fn recent_learning(&self, n: usize) -> Vec<LearningEvent> {
        self.learning
            .read()
            .map(|l| l[l.len().saturating_sub(n)..].to_vec())
            .unwrap_or_default()
    }

    /// Events within the trailing `window` before `now`.
    pub fn learning_within(&self, window: Duration, now: DateTime<Utc>) -> Vec<LearningEvent> {
        self.learning
            .read()
            .map(|l| learning::events_since(&l, now - window))
            .unwrap_or_default()
    }

    // ── Integrations & health ────────────────────────────────────────────────

    pub fn record_integration(
        &self,
        service_name: &str,
        endpoint: &str,
        status: &str,
        last_check: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.conn()?;
        integrations::upsert_integration(&conn, service_name, endpoint, status, last_check)
    }

    pub fn integrations(&self) -> Result<Vec<IntegrationRow>> {
        let conn = self.conn()?;
        integrations::list_integrations(&conn)
    }

    pub fn health(&self) -> Result<HealthReport> {
        let conn = self.conn()?;
        db::check_database_health(&conn)
    }

    pub fn status(&self) -> Result<StatusReport> {
        Ok(StatusReport {
            memory_items: self.memory_len(),
            learning_items: self.learning_len(),
            pending_tasks: self.pending_tasks()?.len(),
            last_update: Utc::now(),
            profile: self.profile.clone(),
        })
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    /// Plain-text summary of the task queue, recent learning, and memory size.
    pub fn daily_report(&self, now: DateTime<Utc>) -> Result<String> {
        let pending = self.pending_tasks()?;
        let new_learning = self.learning_within(Duration::days(1), now).len();

        let mut report = format!("Daily Update - {}\n", now.format("%Y-%m-%d"));
        report.push_str(&"=".repeat(40));
        report.push_str("\n\n");
        report.push_str(&format!("Pending Tasks: {}\n", pending.len()));
        report.push_str(&format!("New Learning Items: {new_learning}\n"));
        report.push_str(&format!("Memory Items: {}\n\n", self.memory_len()));

        let high_priority: Vec<&Task> = pending.iter().filter(|t| t.priority >= 8).take(3).collect();
        if !high_priority.is_empty() {
            report.push_str("High Priority Tasks:\n");
            for task in high_priority {
                report.push_str(&format!("- {}\n", task.title));
            }
            report.push('\n');
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facade() -> Facade {
        Facade::in_memory(UserProfile::default()).unwrap()
    }

    #[test]
    fn save_then_get_plain_and_structured() {
        let f = facade();
        f.save("plain", "text value", "test").unwrap();
        f.save("structured", json!({"list": [1, 2, 3], "dict": {"nested": true}}), "test")
            .unwrap();

        assert_eq!(f.get("plain"), Some(json!("text value")));
        assert_eq!(
            f.get("structured"),
            Some(json!({"list": [1, 2, 3], "dict": {"nested": true}}))
        );
    }

    #[test]
    fn get_or_returns_default_when_absent() {
        let f = facade();
        assert_eq!(f.get_or("missing", json!("Not found")), json!("Not found"));
        assert_eq!(f.get("missing"), None);
    }

    #[test]
    fn overwrite_does_not_grow_mirror() {
        let f = facade();
        f.save("k", 1, "general").unwrap();
        f.save("k", 2, "general").unwrap();
        assert_eq!(f.memory_len(), 1);
        assert_eq!(f.get("k"), Some(json!(2)));
    }

    #[test]
    fn mirror_is_not_refreshed_from_store() {
        let f = facade();
        f.save("k", "cached", "general").unwrap();
        f.conn()
            .unwrap()
            .execute("UPDATE memory SET value = '\"changed\"' WHERE key = 'k'", [])
            .unwrap();
        assert_eq!(f.get("k"), Some(json!("cached")));
    }

    #[test]
    fn learning_list_tracks_appends() {
        let f = facade();
        f.record_learning_event("q", "a", 0.85).unwrap();
        f.record_learning_event("q", "a", 0.85).unwrap();

        assert_eq!(f.learning_len(), 2);
        let latest = f.recent_learning(1);
        assert_eq!(latest[0].input, "q");
        assert_eq!(latest[0].success_score, 0.85);
        assert_eq!(f.recent_learning(10).len(), 2);
    }

    #[test]
    fn daily_report_lists_high_priority_tasks() {
        let f = facade();
        f.create_task("Ship release", "", 9, None).unwrap();
        f.create_task("Water plants", "", 2, None).unwrap();
        f.record_learning_event("in", "out", 0.9).unwrap();
        f.save("note", "x", "general").unwrap();

        let report = f.daily_report(Utc::now()).unwrap();
        assert!(report.starts_with("Daily Update - "));
        assert!(report.contains("Pending Tasks: 2"));
        assert!(report.contains("New Learning Items: 1"));
        assert!(report.contains("Memory Items: 1"));
        assert!(report.contains("- Ship release"));
        assert!(!report.contains("Water plants"));
    }

    #[test]
    fn status_counts_everything() {
        let f = facade();
        f.save("a", 1, "general").unwrap();
        f.create_task("t", "", 5, None).unwrap();
        let status = f.status().unwrap();
        assert_eq!(status.memory_items, 1);
        assert_eq!(status.learning_items, 0);
        assert_eq!(status.pending_tasks, 1);
        assert_eq!(status.profile.name, "Owner");
    }
}
