//! Task queue persistence.
//!
//! Pending tasks are listed by priority (highest first), then due date
//! (earliest first, tasks without a due date after all dated ones), then
//! creation order. The last two keys make the order total.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{format_timestamp, parse_timestamp, Task, TaskStatus};

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, created_at";

/// Insert a pending task and return its id. No validation on any field.
pub fn insert_task(
    conn: &Connection,
    title: &str,
    description: &str,
    priority: i64,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO tasks (title, description, status, priority, due_date, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            title,
            description,
            TaskStatus::Pending.as_str(),
            priority,
            due_date.map(format_timestamp),
            format_timestamp(created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All pending tasks in listing order.
pub fn pending_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE status = 'pending' \
         ORDER BY priority DESC, due_date IS NULL, due_date ASC, id ASC"
    ))?;
    let tasks = stmt
        .query_map([], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status_str: String = row.get(3)?;
    let due_raw: Option<String> = row.get(5)?;
    let created_raw: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: status_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
        })?,
        priority: row.get(4)?,
        due_date: due_raw.map(|raw| parse_timestamp(5, &raw)).transpose()?,
        created_at: parse_timestamp(6, &created_raw)?,
    })
}
