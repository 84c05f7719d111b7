//! `rendersession status` — show where configuration comes from and what it says.

use anyhow::Result;
use colored::Colorize;

use rendersession_core::config::{get_config_path, load_config, ReadFailurePolicy};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Rendersession Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".dimmed().to_string()
        }
    );

    // Sweep
    let sweep = &config.sweep;
    println!(
        "  {:<18} {}",
        "Age sweep:".bold(),
        if sweep.enabled {
            format!(
                "{} every {}s, max age {}s",
                "✓".green(),
                sweep.interval_secs,
                sweep.max_age_secs
            )
        } else {
            format!("{}", "· disabled".dimmed())
        }
    );

    // Read failures
    let read_failure = match config.extension.read_failure {
        ReadFailurePolicy::Placeholder => format!(
            "placeholder {}",
            format!("(\"{} ...\")", config.extension.placeholder_prefix).dimmed()
        ),
        ReadFailurePolicy::Propagate => "propagate".to_string(),
    };
    println!("  {:<18} {}", "Read failures:".bold(), read_failure);
    println!();

    Ok(())
}
