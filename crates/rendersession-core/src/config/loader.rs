//! Config loader — reads `~/.rendersession/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.rendersession/config.json`
//! 3. Environment variables `RENDERSESSION_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ReadFailurePolicy};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `RENDERSESSION_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `RENDERSESSION_SWEEP__ENABLED` → `sweep.enabled`
/// - `RENDERSESSION_SWEEP__INTERVAL_SECS` → `sweep.interval_secs`
/// - `RENDERSESSION_SWEEP__MAX_AGE_SECS` → `sweep.max_age_secs`
/// - `RENDERSESSION_EXTENSION__READ_FAILURE` → `extension.read_failure`
/// - `RENDERSESSION_EXTENSION__PLACEHOLDER_PREFIX` → `extension.placeholder_prefix`
fn apply_env_overrides(mut config: Config) -> Config {
    // Sweep
    if let Ok(val) = std::env::var("RENDERSESSION_SWEEP__ENABLED") {
        config.sweep.enabled = val == "true" || val == "1";
    }
    if let Ok(val) = std::env::var("RENDERSESSION_SWEEP__INTERVAL_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.sweep.interval_secs = n;
        }
    }
    if let Ok(val) = std::env::var("RENDERSESSION_SWEEP__MAX_AGE_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.sweep.max_age_secs = n;
        }
    }

    // Extension
    if let Ok(val) = std::env::var("RENDERSESSION_EXTENSION__READ_FAILURE") {
        match val.parse::<ReadFailurePolicy>() {
            Ok(policy) => config.extension.read_failure = policy,
            Err(e) => warn!("Ignoring RENDERSESSION_EXTENSION__READ_FAILURE: {}", e),
        }
    }
    if let Ok(val) = std::env::var("RENDERSESSION_EXTENSION__PLACEHOLDER_PREFIX") {
        config.extension.placeholder_prefix = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
