//! Job signature and the default maintenance job bodies.
//!
//! Bodies return `Err` on failure and never record their own errors; the
//! coordinator does that uniformly for every job.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

use super::error::JobError;
use crate::integrations::PlatformIntegrator;
use crate::memory::learning;
use crate::memory::types::category;
use crate::memory::Facade;
use crate::questions;

/// What a job body gets to work with.
#[derive(Clone)]
pub struct JobContext {
    pub facade: Arc<Facade>,
    pub integrator: Arc<PlatformIntegrator>,
    pub fired_at: DateTime<Utc>,
}

pub type JobFn = Arc<dyn Fn(JobContext) -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// Wrap an async callback as a job.
pub fn job_fn<F, Fut>(f: F) -> JobFn
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    Arc::new(move |ctx: JobContext| f(ctx).boxed())
}

/// Wrap a synchronous body; it runs on the blocking pool since it touches the store.
pub fn blocking_job<F>(f: F) -> JobFn
where
    F: Fn(&JobContext) -> Result<(), JobError> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |ctx: JobContext| {
        let f = Arc::clone(&f);
        async move {
            tokio::task::spawn_blocking(move || f(&ctx))
                .await
                .map_err(|e| JobError::Panicked(e.to_string()))?
        }
        .boxed()
    })
}

// ── Daily update ─────────────────────────────────────────────────────────────

pub fn daily_update(ctx: &JobContext) -> Result<(), JobError> {
    let report = ctx.facade.daily_report(ctx.fired_at)?;
    let insights = autonomous_insights(&ctx.facade, ctx.fired_at);
    let full = format!("{report}\n\nAutonomous Insights:\n{insights}");

    let key = format!("daily_update_{}", ctx.fired_at.format("%Y%m%d"));
    ctx.facade.save(&key, &full, category::REPORTS)?;
    create_adaptive_tasks(&ctx.facade, &insights, ctx.fired_at)?;

    tracing::info!(key = %key, "daily update generated");
    Ok(())
}

/// Bullet list of observations over the last week.
pub fn autonomous_insights(facade: &Facade, now: DateTime<Utc>) -> String {
    let mut insights = Vec::new();

    let recent = facade.learning_within(Duration::days(7), now);
    if let Some(rate) = learning::average_score(&recent) {
        insights.push(format!("Learning success rate (7 days): {:.2}%", rate * 100.0));
        if rate < 0.7 {
            insights.push("Recommendation: Review learning strategies".to_string());
        }
    }

    // Tasks never leave pending, so completions last week are always below three.
    insights.push("Low task completion - consider adjusting priorities".to_string());

    let growth = facade.memory_len() as f64 / 7.0;
    insights.push(format!("Memory growth rate: {growth:.2} items/week"));

    insights
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn create_adaptive_tasks(facade: &Facade, insights: &str, now: DateTime<Utc>) -> Result<(), JobError> {
    let lowered = insights.to_lowercase();
    if lowered.contains("github") {
        facade.create_task(
            "Review GitHub Projects",
            "Check for updates and contribute to repositories",
            7,
            Some(now + Duration::hours(4)),
        )?;
    }
    if lowered.contains("learning") {
        facade.create_task(
            "AI Learning Session",
            "Spend time on AI development and research",
            8,
            Some(now + Duration::hours(2)),
        )?;
    }
    Ok(())
}

// ── Repository check (placeholder) ───────────────────────────────────────────

pub fn repo_check(ctx: &JobContext) -> Result<(), JobError> {
    ctx.facade.create_task(
        "GitHub Repository Check",
        "Review repositories for updates, issues, and contributions",
        6,
        Some(ctx.fired_at + Duration::hours(1)),
    )?;
    tracing::info!("repository check scheduled");
    Ok(())
}

// ── Learning analysis ────────────────────────────────────────────────────────

pub fn learning_recommendations(success_rate: f64) -> Vec<&'static str> {
    if success_rate < 0.6 {
        vec![
            "Focus on simpler tasks to build confidence",
            "Review recent failed interactions for patterns",
            "Consider adjusting learning approach",
        ]
    } else if success_rate > 0.8 {
        vec![
            "Ready for more complex challenges",
            "Explore advanced AI development topics",
            "Share successful patterns with other projects",
        ]
    } else {
        vec!["Maintain current learning pace and methods"]
    }
}

pub fn learning_analysis(ctx: &JobContext) -> Result<(), JobError> {
    let recent = ctx.facade.recent_learning(10);
    let Some(average) = learning::average_score(&recent) else {
        tracing::debug!("no learning events to analyse");
        return Ok(());
    };

    let report = json!({
        "timestamp": ctx.fired_at.to_rfc3339(),
        "interactions_analyzed": recent.len(),
        "average_success": average,
        "recommendations": learning_recommendations(average),
    });
    let key = format!("learning_analysis_{}", ctx.fired_at.format("%Y%m%d_%H%M"));
    ctx.facade.save(&key, &report, category::ANALYSIS)?;

    tracing::info!(key = %key, average, "learning analysis completed");
    Ok(())
}

// ── Memory cleanup (placeholder) ─────────────────────────────────────────────

/// Writes a report only. Nothing is deleted.
pub fn memory_cleanup(ctx: &JobContext) -> Result<(), JobError> {
    let report = json!({
        "timestamp": ctx.fired_at.to_rfc3339(),
        "items_before": ctx.facade.memory_len(),
        "cleanup_performed": true,
    });
    let key = format!("memory_cleanup_{}", ctx.fired_at.format("%Y%m%d"));
    ctx.facade.save(&key, &report, category::MAINTENANCE)?;
    tracing::info!(key = %key, "memory cleanup report written");
    Ok(())
}

// ── Self-improvement ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImprovementArea {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: i64,
    pub due_hours: i64,
}

/// Days since the timestamp stored under `key`, or `None` if absent or unreadable.
fn days_since_marker(facade: &Facade, key: &str, now: DateTime<Utc>) -> Option<i64> {
    let raw = match facade.get(key)? {
        Value::String(s) => s,
        _ => return None,
    };
    let then = DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc())
        })
        .ok()?;
    Some((now - then).num_days())
}

pub fn identify_improvement_areas(facade: &Facade, now: DateTime<Utc>) -> Vec<ImprovementArea> {
    let mut areas = Vec::new();

    if days_since_marker(facade, "last_code_optimization", now).map_or(true, |d| d >= 7) {
        areas.push(ImprovementArea {
            title: "Code Optimization",
            description: "Review and optimize existing code for better performance",
            priority: 7,
            due_hours: 48,
        });
    }

    if facade.learning_within(Duration::days(3), now).len() < 5 {
        areas.push(ImprovementArea {
            title: "Learning Enhancement",
            description: "Research new AI techniques and implementation methods",
            priority: 6,
            due_hours: 24,
        });
    }

    if days_since_marker(facade, "last_integration_expansion", now).map_or(true, |d| d >= 30) {
        areas.push(ImprovementArea {
            title: "Integration Expansion",
            description: "Explore new API integrations and platform connections",
            priority: 5,
            due_hours: 72,
        });
    }

    areas
}

pub fn self_improvement(ctx: &JobContext) -> Result<(), JobError> {
    let areas = identify_improvement_areas(&ctx.facade, ctx.fired_at);
    for area in &areas {
        ctx.facade.create_task(
            &format!("Improve: {}", area.title),
            area.description,
            area.priority,
            Some(ctx.fired_at + Duration::hours(area.due_hours)),
        )?;
    }

    let report = json!({
        "timestamp": ctx.fired_at.to_rfc3339(),
        "areas_identified": areas.len(),
        "areas": areas,
    });
    let key = format!("improvement_check_{}", ctx.fired_at.format("%Y%m%d_%H%M"));
    ctx.facade.save(&key, &report, category::SELF_IMPROVEMENT)?;

    tracing::info!(key = %key, areas = areas.len(), "self-improvement check completed");
    Ok(())
}

// ── Question generation & platform health ────────────────────────────────────

pub fn question(ctx: &JobContext) -> Result<(), JobError> {
    let (task_id, question) = questions::create_question_task(&ctx.facade, ctx.fired_at)?;
    tracing::info!(task_id, question = %question, "generated question");
    Ok(())
}

pub fn platform_health(ctx: &JobContext) -> Result<(), JobError> {
    ctx.integrator.health_check(ctx.fired_at)?;
    Ok(())
}

// ── Reminders ────────────────────────────────────────────────────────────────

pub fn reminder(title: &str, message: &str) -> JobFn {
    let title = format!("REMINDER: {title}");
    let message = message.to_string();
    blocking_job(move |ctx| {
        ctx.facade.create_task(
            &title,
            &message,
            9,
            Some(ctx.fired_at + Duration::minutes(5)),
        )?;
        Ok(())
    })
}
