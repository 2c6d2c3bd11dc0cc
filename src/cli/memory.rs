//! CLI `memory` subcommands.

use anyhow::Result;
use steward::app::Steward;

pub fn get(app: &Steward, key: &str) -> Result<()> {
    match app.facade.entry(key) {
        Some(entry) => {
            println!("Key:        {}", entry.key);
            println!("Category:   {}", entry.category);
            println!("Updated:    {}", entry.timestamp.to_rfc3339());
            println!("Value:");
            println!("{}", serde_json::to_string_pretty(&entry.value)?);
        }
        None => println!("Not found"),
    }
    Ok(())
}

/// `value` is stored as JSON when it parses as JSON, otherwise as a string.
pub fn set(app: &Steward, key: &str, value: &str, category: &str) -> Result<()> {
    let parsed = serde_json::from_str::<serde_json::Value>(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    app.facade.save(key, &parsed, category)?;
    println!("Saved {key}");
    Ok(())
}

pub fn list(app: &Steward, limit: usize) -> Result<()> {
    let entries = app.facade.recent_entries(limit);
    if entries.is_empty() {
        println!("Memory is empty.");
        return Ok(());
    }
    for entry in entries.iter().rev() {
        let mut preview = entry.value.to_string();
        if preview.len() > 60 {
            let cut = (0..=57).rev().find(|i| preview.is_char_boundary(*i)).unwrap_or(0);
            preview.truncate(cut);
            preview.push_str("...");
        }
        println!(
            "{:<32} {:<16} {}",
            entry.key, entry.category, preview
        );
    }
    Ok(())
}
