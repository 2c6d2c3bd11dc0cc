//! CLI `ask` command: fan a prompt out to several platforms.

use anyhow::Result;
use steward::app::Steward;
use steward::integrations::Platform;

pub async fn ask(app: &Steward, prompt: &str, platforms: &[String], json: bool) -> Result<()> {
    let targets: Vec<Platform> = if platforms.is_empty() {
        app.default_platforms()
    } else {
        platforms
            .iter()
            .map(|p| p.parse::<Platform>())
            .collect::<Result<_, _>>()?
    };

    let answer = app.integrator.ask(prompt, &targets).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer.fan_out.to_json())?);
        return Ok(());
    }

    if answer.fan_out.success_count() > 0 {
        println!("{}", answer.text.trim_end());
    }
    for (platform, result) in &answer.fan_out.results {
        if let Err(e) = result {
            println!("{platform}: {e}");
        }
    }
    Ok(())
}
