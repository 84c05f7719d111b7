//! The process-wide registry of active render sessions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Duration;
use tracing::{debug, info, warn};

use super::context::RenderSession;
use crate::error::{RenderSessionError, Result};
use crate::value::Value;

// ─────────────────────────────────────────────
// RenderSessionRegistry
// ─────────────────────────────────────────────

/// Owns every active [`RenderSession`], keyed by session id.
///
/// Construct one per process and share it behind an `Arc`. Sessions are only
/// added by [`create`](Self::create) and only removed by
/// [`cleanup`](Self::cleanup) or an age sweep; looking up an unknown id never
/// creates a session.
///
/// Thread-safe via `RwLock`: lookups share the read lock, create/cleanup/sweep
/// take the write lock.
#[derive(Debug, Default)]
pub struct RenderSessionRegistry {
    sessions: RwLock<HashMap<String, Arc<RenderSession>>>,
}

impl RenderSessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<RenderSession>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<RenderSession>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new session and return its id.
    pub fn create(&self) -> String {
        let session = RenderSession::new();
        let id = session.id().to_string();
        self.write().insert(id.clone(), Arc::new(session));
        info!(session = %id, "created render session");
        id
    }

    /// Drop the session for `id`.
    ///
    /// Unknown ids are only logged, so calling this twice is harmless.
    /// Returns whether a session was removed.
    pub fn cleanup(&self, id: &str) -> bool {
        info!(session = %id, "cleaning up render session");
        let removed = self.write().remove(id).is_some();
        if !removed {
            warn!(session = %id, "no render session found for cleanup");
        }
        removed
    }

    /// Look up the session for `id`.
    ///
    /// The returned handle keeps the session out of reach of the age sweep
    /// until it is dropped.
    pub fn session(&self, id: &str) -> Result<Arc<RenderSession>> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| RenderSessionError::SessionNotFound(id.to_string()))
    }

    /// Whether a session with `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Ids of all registered sessions, sorted for determinism.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove every session older than `max_age`.
    ///
    /// Runs under the write lock, so no new handles can be handed out while it
    /// decides; a session whose handle is still held by a caller is skipped.
    /// Returns the number of sessions removed.
    pub fn sweep_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|id, session| {
            if session.age() <= max_age {
                return true;
            }
            if Arc::strong_count(session) > 1 {
                debug!(session = %id, "skipping expired render session still in use");
                return true;
            }
            warn!(
                session = %id,
                age_s = session.age_in_seconds(),
                "removing expired render session"
            );
            false
        });
        before - sessions.len()
    }

    // ─────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────

    pub fn add_list(&self, id: &str, name: &str) -> Result<()> {
        self.session(id)?.add_list(name);
        Ok(())
    }

    pub fn append_value(&self, id: &str, list: &str, value: Value) -> Result<()> {
        self.session(id)?.append_value(list, value);
        Ok(())
    }

    pub fn set_value_at(&self, id: &str, list: &str, index: usize, value: Value) -> Result<Value> {
        self.session(id)?.set_value_at(list, index, value)
    }

    pub fn value_at(&self, id: &str, list: &str, index: usize) -> Result<Value> {
        self.session(id)?.value_at(list, index)
    }

    pub fn list_len(&self, id: &str, list: &str) -> Result<usize> {
        self.session(id)?.list_len(list)
    }

    pub fn append_list(&self, id: &str, source: &str, target: &str) -> Result<()> {
        self.session(id)?.append_list(source, target)
    }

    pub fn declare_scalar(&self, id: &str, name: &str) -> Result<()> {
        self.session(id)?.declare_scalar(name);
        Ok(())
    }

    pub fn set_scalar(&self, id: &str, name: &str, value: Value) -> Result<()> {
        self.session(id)?.set_scalar(name, value)
    }

    pub fn scalar(&self, id: &str, name: &str) -> Result<Value> {
        self.session(id)?.scalar(name)
    }

    pub fn xml_sequence(&self, id: &str) -> Result<u64> {
        Ok(self.session(id)?.xml_sequence())
    }

    pub fn increment_xml_sequence(&self, id: &str) -> Result<(u64, u64)> {
        Ok(self.session(id)?.increment_xml_sequence())
    }

    pub fn age_in_seconds(&self, id: &str) -> Result<i64> {
        Ok(self.session(id)?.age_in_seconds())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
