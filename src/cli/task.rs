//! CLI `task` subcommands.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use steward::app::Steward;

pub fn list(app: &Steward) -> Result<()> {
    let tasks = app.facade.pending_tasks()?;
    if tasks.is_empty() {
        println!("No pending tasks.");
        return Ok(());
    }

    println!("{:<6} {:<4} {:<17} TITLE", "ID", "PRI", "DUE");
    for task in &tasks {
        let due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!("{:<6} {:<4} {:<17} {}", task.id, task.priority, due, task.title);
        if !task.description.is_empty() {
            println!("{:<29}{}", "", task.description);
        }
    }
    Ok(())
}

pub fn add(
    app: &Steward,
    title: &str,
    description: &str,
    priority: i64,
    due_hours: Option<i64>,
) -> Result<()> {
    let due = due_hours.map(|h| due_in(Utc::now(), h)).transpose()?;
    let id = app.facade.create_task(title, description, priority, due)?;
    println!("Created task {id}");
    Ok(())
}

/// `now` plus `hours`, rejecting offsets past the calendar's range.
fn due_in(now: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| anyhow!("--due-hours {hours} is out of range"))
}
