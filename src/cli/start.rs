//! CLI `start` command: run the scheduler until Ctrl-C.

use anyhow::Result;
use steward::app::Steward;

pub async fn start(app: &Steward) -> Result<()> {
    let s = app.facade.status()?;
    println!("Steward autonomous mode for {}", s.profile.name);
    println!("  Memory items:    {}", s.memory_items);
    println!("  Learning items:  {}", s.learning_items);
    println!("  Pending tasks:   {}", s.pending_tasks);
    println!("Press Ctrl-C to stop.");

    app.run_autonomous(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
        tracing::info!("shutdown requested");
    })
    .await
}
