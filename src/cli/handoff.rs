//! CLI `handoff` command: export project context for an external tool.

use anyhow::{Context, Result};
use std::path::Path;
use steward::app::Steward;
use steward::integrations::HandoffProject;

pub async fn handoff(app: &Steward, project_file: &Path, instructions: &str) -> Result<()> {
    let raw = std::fs::read_to_string(project_file)
        .with_context(|| format!("failed to read {}", project_file.display()))?;
    let project: HandoffProject = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid project file", project_file.display()))?;

    match app.integrator.handoff(&project, instructions).await {
        Ok(receipt) => {
            println!("Handoff written to {}", receipt.path.display());
            println!("Package size: {} bytes", receipt.package_size);
        }
        Err(e) => println!("Handoff failed: {e}"),
    }
    Ok(())
}
