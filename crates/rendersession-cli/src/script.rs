//! `rendersession run` — drive one render session from a JSON script.
//!
//! A script is the sequence of extension calls a template would make:
//!
//! ```json
//! { "steps": [
//!     { "op": "createList", "name": "rows" },
//!     { "op": "appendListValue", "name": "rows", "value": "first" },
//!     { "op": "getListValueAt", "name": "rows", "index": 1 }
//! ] }
//! ```
//!
//! The session is created before the first step and cleaned up after the last.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Deserialize;
use tracing::info;

use rendersession_core::config::load_config;
use rendersession_core::{RenderExtension, RenderSessionRegistry, SessionSweeper, Value};

// ─────────────────────────────────────────────
// Script format
// ─────────────────────────────────────────────

/// A parsed render script.
#[derive(Debug, Deserialize)]
pub struct RenderScript {
    pub steps: Vec<Step>,
}

/// One extension call. Indices are 1-based, as in templates.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    CreateList { name: String },
    AppendListValue { name: String, value: Value },
    AppendList { source: String, target: String },
    GetListValueAt { name: String, index: i64 },
    SetListValueAt { name: String, index: i64, value: Value },
    GetListLength { name: String },
    CreateScalar { name: String, value: Value },
    DeclareScalar { name: String },
    SetScalar { name: String, value: Value },
    GetScalar { name: String },
    GetXmlSequence,
    IncrementXmlSequence,
    PrintLogStatement { message: String },
    ReformatDate { date: String },
    Substring { text: String, start: i64, end: i64 },
    GetEnvironmentProperty { name: String },
    TestConfiguration,
}

impl RenderScript {
    /// Parse a script from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid render script")
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script: {}", path.display()))?;
        Self::parse(&content)
    }
}

// ─────────────────────────────────────────────
// Execution
// ─────────────────────────────────────────────

/// Execute one step against session `id`.
///
/// Returns the text a template would receive, if the call yields a value.
pub fn execute(ext: &RenderExtension, id: &str, step: &Step) -> rendersession_core::Result<Option<String>> {
    let output = match step {
        Step::CreateList { name } => ext.create_list(id, name).map(|_| None)?,
        Step::AppendListValue { name, value } => {
            ext.append_list_value(id, name, value.clone()).map(|_| None)?
        }
        Step::AppendList { source, target } => ext.append_list(id, source, target).map(|_| None)?,
        Step::GetListValueAt { name, index } => {
            Some(ext.get_list_value_at(id, name, *index)?.to_string())
        }
        Step::SetListValueAt { name, index, value } => {
            Some(ext.set_list_value_at(id, name, *index, value.clone())?.to_string())
        }
        Step::GetListLength { name } => Some(ext.get_list_length(id, name)?.to_string()),
        Step::CreateScalar { name, value } => {
            ext.create_scalar(id, name, value.clone()).map(|_| None)?
        }
        Step::DeclareScalar { name } => ext.declare_scalar(id, name).map(|_| None)?,
        Step::SetScalar { name, value } => ext.set_scalar(id, name, value.clone()).map(|_| None)?,
        Step::GetScalar { name } => Some(ext.get_scalar(id, name)?.to_string()),
        Step::GetXmlSequence => Some(ext.get_xml_sequence(id)?.to_string()),
        Step::IncrementXmlSequence => ext.increment_xml_sequence(id).map(|_| None)?,
        Step::PrintLogStatement { message } => {
            ext.print_log_statement(id, message);
            None
        }
        Step::ReformatDate { date } => Some(ext.reformat_date(date)?),
        Step::Substring { text, start, end } => Some(ext.substring(text, *start, *end)?),
        Step::GetEnvironmentProperty { name } => {
            Some(ext.get_environment_property(name).unwrap_or_default())
        }
        Step::TestConfiguration => Some(ext.test_configuration().to_string()),
    };
    Ok(output)
}

/// Run every step of `script` in a fresh session, printing each result.
///
/// Failing steps are reported and skipped, like a template that keeps
/// rendering. Returns the number of failed steps. With `keep`, the session
/// stays registered and its state is reported instead of being cleaned up.
pub fn run_script(ext: &RenderExtension, script: &RenderScript, keep: bool) -> usize {
    let id = ext.create_session();
    println!("{} {}", "Session:".bold(), id.dimmed());

    let mut failures = 0;
    for (n, step) in script.steps.iter().enumerate() {
        let label = format!("{:>3}. {:?}", n + 1, step);
        match execute(ext, &id, step) {
            Ok(Some(output)) => println!("{}  {} {}", label.dimmed(), "→".cyan(), output),
            Ok(None) => println!("{}  {}", label.dimmed(), "✓".green()),
            Err(e) => {
                failures += 1;
                println!("{}  {} {}", label.dimmed(), "✗".red(), e.to_string().red());
            }
        }
    }

    if keep {
        report_kept_session(ext, &id);
    } else {
        ext.cleanup_session(&id);
    }
    failures
}

/// Print the state of a session left registered by `--keep`.
fn report_kept_session(ext: &RenderExtension, id: &str) {
    match ext.registry().session(id) {
        Ok(session) => println!(
            "{} {} {}",
            "Kept session:".bold(),
            id,
            format!(
                "(xml sequence {}, age {}s)",
                session.xml_sequence(),
                session.age_in_seconds()
            )
            .dimmed()
        ),
        Err(e) => println!("{} {}", "Kept session:".bold(), e.to_string().red()),
    }
}

/// Entry point of `rendersession run`.
pub async fn run(path: &Path, keep: bool) -> Result<()> {
    let config = load_config(None);
    let script = RenderScript::load(path)?;

    let registry = Arc::new(RenderSessionRegistry::new());
    let sweeper = Arc::new(SessionSweeper::new(registry.clone(), config.sweep.clone()));
    let sweep_task = {
        let sweeper = sweeper.clone();
        tokio::spawn(async move { sweeper.start().await })
    };

    let ext = RenderExtension::new(registry, config.extension.clone());
    info!(steps = script.steps.len(), "running render script");
    let failures = run_script(&ext, &script, keep);

    sweeper.stop();
    sweep_task.await.context("session sweeper task failed")?;

    if failures > 0 {
        bail!("{} of {} steps failed", failures, script.steps.len());
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
