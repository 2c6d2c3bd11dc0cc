//! CLI `configure` and `space` commands.

use anyhow::Result;
use steward::app::Steward;

/// Store a platform credential. An unknown platform is reported, not fatal.
pub fn configure(app: &Steward, platform: &str, credential: &str) -> Result<()> {
    match app.integrator.configure(platform, credential) {
        Ok(p) => println!("{} configured.", p.display_name()),
        Err(e) => {
            println!("Configuration failed: {e}");
            println!("Known platforms: perplexity, abacus, deepagent");
        }
    }
    Ok(())
}

pub fn space(app: &Steward, name: &str, personality: &str, purpose: &str) -> Result<()> {
    let config = app.integrator.space_config(name, personality, purpose)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
