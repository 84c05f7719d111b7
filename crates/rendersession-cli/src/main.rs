//! Rendersession CLI — entry point.
//!
//! # Commands
//!
//! - `rendersession run SCRIPT [--logs] [--keep]` — run a JSON render script in one session
//! - `rendersession date D.M.YYYY` — reformat a date as `YYYY-MM-DD`
//! - `rendersession substring TEXT START END` — 1-based inclusive substring
//! - `rendersession property NAME` — look up an environment property
//! - `rendersession status` — show configuration

mod script;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rendersession_core::utils;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Render session symbol tables for document templates
#[derive(Parser)]
#[command(name = "rendersession", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON render script against a fresh session
    Run {
        /// Path to the script file
        script: PathBuf,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,

        /// Keep the session registered and report it instead of cleaning up
        #[arg(long, default_value_t = false)]
        keep: bool,
    },

    /// Reformat a D.M.YYYY date as YYYY-MM-DD
    Date {
        /// Date such as 20.10.2016
        date: String,
    },

    /// Print characters START..=END (1-based) of TEXT
    Substring {
        text: String,
        #[arg(allow_negative_numbers = true)]
        start: i64,
        #[arg(allow_negative_numbers = true)]
        end: i64,
    },

    /// Print an environment property
    Property {
        /// Property name
        name: String,
    },

    /// Show configuration
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(log_filter(&cli.command));

    match cli.command {
        Commands::Run { script, keep, .. } => script::run(&script, keep).await,
        Commands::Date { date } => {
            let formatted = utils::reformat_date(&date).context("cannot reformat date")?;
            println!("{formatted}");
            Ok(())
        }
        Commands::Substring { text, start, end } => {
            let part = utils::substring(&text, start, end).context("cannot take substring")?;
            println!("{part}");
            Ok(())
        }
        Commands::Property { name } => {
            match utils::environment_property(&name) {
                Some(value) => println!("{value}"),
                None => anyhow::bail!("property {name} is not set"),
            }
            Ok(())
        }
        Commands::Status => status::run(),
    }
}

/// Log filter for a command: debug output for `run --logs`, warnings otherwise.
fn log_filter(command: &Commands) -> &'static str {
    match command {
        Commands::Run { logs: true, .. } => "rendersession=debug,rendersession_core=debug,info",
        _ => "warn",
    }
}

/// Initialize tracing/logging.
fn init_logging(filter: &str) {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["rendersession", "run", "script.json", "--logs"]).unwrap();
        match cli.command {
            Commands::Run { script, logs, keep } => {
                assert_eq!(script, PathBuf::from("script.json"));
                assert!(logs);
                assert!(!keep);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_run_keep() {
        let cli = Cli::try_parse_from(["rendersession", "run", "script.json", "--keep"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run { keep: true, logs: false, .. }
        ));
    }

    #[test]
    fn test_log_filter_per_command() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command;

        assert_eq!(
            log_filter(&parse(&["rendersession", "run", "s.json", "--logs"])),
            "rendersession=debug,rendersession_core=debug,info"
        );
        assert_eq!(log_filter(&parse(&["rendersession", "run", "s.json"])), "warn");
        assert_eq!(log_filter(&parse(&["rendersession", "status"])), "warn");
        assert_eq!(log_filter(&parse(&["rendersession", "date", "1.1.2020"])), "warn");
    }

    #[test]
    fn test_parse_substring_negative_bound() {
        let cli = Cli::try_parse_from(["rendersession", "substring", "Hello", "-1", "3"]).unwrap();
        match cli.command {
            Commands::Substring { text, start, end } => {
                assert_eq!(text, "Hello");
                assert_eq!((start, end), (-1, 3));
            }
            _ => panic!("expected substring command"),
        }
    }
}
