//! Configuration display.

use citadelle_history::HistoryConfig;
use std::path::PathBuf;

pub fn show_config(config: &HistoryConfig, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in sources {
            println!("  {}", source.display());
        }
    }
    println!();

    match config.history_dir() {
        Some(dir) => println!("History directory: {}", dir.display()),
        None => println!("History directory: (unknown)"),
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);

    Ok(())
}
