//! Memory table read/write path.
//!
//! [`upsert_entry`] is the single write: one statement that inserts a key or
//! rewrites it in place. [`load_entries`] reads the whole table, oldest write
//! first, for the facade's in-process mirror.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::types::{format_timestamp, parse_timestamp, MemoryEntry};

/// Insert or replace the entry for `entry.key`.
pub fn upsert_entry(conn: &Connection, entry: &MemoryEntry) -> Result<()> {
    let value_json = serde_json::to_string(&entry.value)?;
    conn.execute(
        "INSERT INTO memory (key, value, category, timestamp) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
         category = excluded.category, timestamp = excluded.timestamp",
        params![
            entry.key,
            value_json,
            entry.category,
            format_timestamp(entry.timestamp)
        ],
    )
    .with_context(|| format!("failed to save memory key {}", entry.key))?;
    Ok(())
}

/// Load every memory entry, ordered by last write (oldest first).
///
/// Values that are not valid JSON (e.g. rows written by hand) load as plain
/// strings.
pub fn load_entries(conn: &Connection) -> Result<Vec<MemoryEntry>> {
    let mut stmt =
        conn.prepare("SELECT key, value, category, timestamp FROM memory ORDER BY timestamp, id")?;

    let entries = stmt
        .query_map([], |row| {
            let raw_value: String = row.get(1)?;
            let raw_ts: String = row.get(3)?;
            Ok(MemoryEntry {
                key: row.get(0)?,
                value: serde_json::from_str(&raw_value)
                    .unwrap_or(serde_json::Value::String(raw_value)),
                category: row.get(2)?,
                timestamp: parse_timestamp(3, &raw_ts)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Count entries per category.
pub fn count_by_category(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut stmt =
        conn.prepare("SELECT category, COUNT(*) FROM memory GROUP BY category ORDER BY category")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn test_db() -> Connection {
        crate::db::open_memory_database().unwrap()
    }

    fn entry(key: &str, value: serde_json::Value, category: &str) -> MemoryEntry {
        MemoryEntry {
            key: key.into(),
            value,
            category: category.into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn upsert_inserts_then_replaces() {
        let conn = test_db();
        upsert_entry(&conn, &entry("k", json!("first"), "general")).unwrap();
        upsert_entry(&conn, &entry("k", json!({"second": 2}), "reports")).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM memory", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let loaded = load_entries(&conn).unwrap();
        assert_eq!(loaded[0].value, json!({"second": 2}));
        assert_eq!(loaded[0].category, "reports");
    }

    #[test]
    fn load_orders_by_last_write() {
        let conn = test_db();
        let now = Utc::now();
        let mut a = entry("a", json!(1), "general");
        a.timestamp = now - Duration::seconds(10);
        let mut b = entry("b", json!(2), "general");
        b.timestamp = now - Duration::seconds(5);
        upsert_entry(&conn, &a).unwrap();
        upsert_entry(&conn, &b).unwrap();

        // rewriting `a` moves it to the end
        a.timestamp = now;
        upsert_entry(&conn, &a).unwrap();

        let keys: Vec<String> = load_entries(&conn).unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn non_json_value_loads_as_string() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO memory (key, value, category, timestamp) \
             VALUES ('legacy', 'not json', 'general', '2026-01-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();

        let loaded = load_entries(&conn).unwrap();
        assert_eq!(loaded[0].value, json!("not json"));
    }

    #[test]
    fn counts_by_category() {
        let conn = test_db();
        upsert_entry(&conn, &entry("a", json!(1), "errors")).unwrap();
        upsert_entry(&conn, &entry("b", json!(2), "errors")).unwrap();
        upsert_entry(&conn, &entry("c", json!(3), "reports")).unwrap();

        let counts = count_by_category(&conn).unwrap();
        assert_eq!(counts, vec![("errors".into(), 2), ("reports".into(), 1)]);
    }
}
