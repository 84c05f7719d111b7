//! Configuration schema.
//!
//! Hierarchy: `Config` → `SweepConfig`, `ExtensionConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.rendersession/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub sweep: SweepConfig,
    pub extension: ExtensionConfig,
}

// ─────────────────────────────────────────────
// Sweep
// ─────────────────────────────────────────────

/// Age-based cleanup of sessions the host forgot to release.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SweepConfig {
    /// Whether the background sweeper runs at all.
    pub enabled: bool,
    /// Seconds between sweeps.
    pub interval_secs: u64,
    /// Sessions older than this many seconds are removed.
    pub max_age_secs: u64,
}

impl SweepConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn max_age(&self) -> chrono::Duration {
        i64::try_from(self.max_age_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
            max_age_secs: 20,
        }
    }
}

// ─────────────────────────────────────────────
// Extension boundary
// ─────────────────────────────────────────────

/// What a read of an undefined symbol or out-of-range index returns.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadFailurePolicy {
    /// Return a visible placeholder text so the render continues.
    #[default]
    Placeholder,
    /// Return the error to the caller.
    Propagate,
}

impl std::str::FromStr for ReadFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "placeholder" => Ok(ReadFailurePolicy::Placeholder),
            "propagate" => Ok(ReadFailurePolicy::Propagate),
            other => Err(format!("unknown read failure policy: {other}")),
        }
    }
}

/// Settings of the extension-function surface.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionConfig {
    pub read_failure: ReadFailurePolicy,
    /// Prefix of placeholder texts, e.g. `renderext:ERROR:`.
    pub placeholder_prefix: String,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            read_failure: ReadFailurePolicy::Placeholder,
            placeholder_prefix: "renderext:ERROR:".to_string(),
        }
    }
}
