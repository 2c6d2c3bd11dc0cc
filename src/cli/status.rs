//! CLI `status` command: store health, assistant state, platforms and schedule.

use anyhow::{Context, Result};
use steward::app::Steward;

pub fn status(app: &Steward) -> Result<()> {
    let health = app.facade.health().context("failed to run health check")?;
    let s = app.facade.status()?;

    println!("Steward Status");
    println!("{}", "=".repeat(40));
    println!("Owner:             {}", s.profile.name);
    println!("Database:          {}", app.config.resolved_db_path().display());
    println!("Schema version:    {}", health.schema_version);
    if health.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", health.integrity_details);
    }
    println!();
    println!("Memory items:      {}", s.memory_items);
    println!("Learning items:    {}", s.learning_items);
    println!("Pending tasks:     {}", s.pending_tasks);
    println!("Tasks (all):       {}", health.task_count);
    println!();

    let categories = app.facade.category_counts()?;
    if !categories.is_empty() {
        println!("Memory by category:");
        for (category, count) in &categories {
            println!("  {category:<18} {count}");
        }
        println!();
    }

    println!("Platforms:");
    let recorded = app.facade.integrations()?;
    for (platform, st) in app.integrator.status() {
        let row = recorded.iter().find(|r| r.service_name == platform.as_str());
        let last_check = row
            .and_then(|r| r.last_check)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".into());
        println!(
            "  {:<12} {:<14} {:<8} last check: {}",
            platform.display_name(),
            if st.configured { "configured" } else { "not configured" },
            if st.active { "active" } else { "inactive" },
            last_check
        );
    }
    println!();

    app.scheduler.register_defaults()?;
    let schedule = app.scheduler.status()?;
    println!("Schedule ({} jobs):", schedule.scheduled_jobs);
    for job in &schedule.jobs {
        println!(
            "  {:<18} {:<24} next: {}",
            job.name,
            job.trigger,
            job.next_run.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
