//! CLI `update` command: force a daily report.

use anyhow::Result;
use steward::app::Steward;

pub fn update(app: &Steward) -> Result<()> {
    let (key, report) = app.manual_update()?;
    println!("{report}");
    println!("Saved as {key}");
    Ok(())
}
