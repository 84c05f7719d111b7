//! A single render session's symbol table.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::error::{RenderSessionError, Result};
use crate::value::Value;

/// Initial value of the XML sequence cursor.
pub const INITIAL_XML_SEQUENCE: u64 = 1;

/// List and scalar variables of one session.
#[derive(Debug, Default)]
struct SymbolTable {
    lists: HashMap<String, Vec<Value>>,
    scalars: HashMap<String, Value>,
}

/// Variable storage for one document render.
///
/// All list indices are 0-based here; the extension boundary owns the
/// translation from the 1-based indices templates use.
///
/// Lists and scalars sit behind a per-session mutex, so concurrent callers on
/// the same id cannot corrupt them, although the intended usage is one render
/// flow per session. The XML cursor is a lock-free atomic.
#[derive(Debug)]
pub struct RenderSession {
    id: String,
    created_at: DateTime<Utc>,
    symbols: Mutex<SymbolTable>,
    xml_sequence: AtomicU64,
    /// Value returned by the most recent boundary query, 0 before the first.
    last_queried_xml_sequence: AtomicU64,
}

impl RenderSession {
    /// Create an empty session with a fresh UUID.
    pub fn new() -> Self {
        RenderSession {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            symbols: Mutex::new(SymbolTable::default()),
            xml_sequence: AtomicU64::new(INITIAL_XML_SEQUENCE),
            last_queried_xml_sequence: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time elapsed since creation.
    pub fn age(&self) -> Duration {
        Utc::now() - self.created_at
    }

    /// Whole seconds elapsed since creation.
    pub fn age_in_seconds(&self) -> i64 {
        self.age().num_seconds()
    }

    fn symbols(&self) -> MutexGuard<'_, SymbolTable> {
        self.symbols.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────
    // Lists
    // ─────────────────────────────────────────

    /// Create `name` as an empty list, replacing any list of the same name.
    pub fn add_list(&self, name: &str) {
        self.symbols().lists.insert(name.to_string(), Vec::new());
    }

    /// Append `value` to the end of `list`, creating the list if needed.
    pub fn append_value(&self, list: &str, value: Value) {
        self.symbols()
            .lists
            .entry(list.to_string())
            .or_default()
            .push(value);
    }

    /// Replace the element at `index` and return the previous one.
    ///
    /// Unlike [`append_value`](Self::append_value), the list must exist.
    pub fn set_value_at(&self, list: &str, index: usize, value: Value) -> Result<Value> {
        let mut symbols = self.symbols();
        let items = symbols
            .lists
            .get_mut(list)
            .ok_or_else(|| RenderSessionError::undefined_list(list))?;
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or_else(|| out_of_range(list, index, len))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Element at `index` of `list`.
    pub fn value_at(&self, list: &str, index: usize) -> Result<Value> {
        let symbols = self.symbols();
        let items = symbols
            .lists
            .get(list)
            .ok_or_else(|| RenderSessionError::undefined_list(list))?;
        items
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(list, index, items.len()))
    }

    /// Number of elements in `list`.
    pub fn list_len(&self, list: &str) -> Result<usize> {
        self.symbols()
            .lists
            .get(list)
            .map(Vec::len)
            .ok_or_else(|| RenderSessionError::undefined_list(list))
    }

    /// Append every element of `source`, in order, to the end of `target`.
    pub fn append_list(&self, source: &str, target: &str) -> Result<()> {
        let mut symbols = self.symbols();
        let items = symbols
            .lists
            .get(source)
            .cloned()
            .ok_or_else(|| RenderSessionError::undefined_list(source))?;
        symbols
            .lists
            .get_mut(target)
            .ok_or_else(|| RenderSessionError::undefined_list(target))?
            .extend(items);
        Ok(())
    }

    // ─────────────────────────────────────────
    // Scalars
    // ─────────────────────────────────────────

    /// Declare `name` with an empty text value.
    pub fn declare_scalar(&self, name: &str) {
        self.symbols()
            .scalars
            .insert(name.to_string(), Value::text(""));
    }

    /// Set `name` to `value`.
    ///
    /// An empty sequence usually means the template bound a missing row, so it
    /// is rejected instead of being stored.
    pub fn set_scalar(&self, name: &str, value: Value) -> Result<()> {
        if value.is_empty_sequence() {
            return Err(RenderSessionError::InvalidArgument(format!(
                "cannot assign an empty sequence to scalar {name}"
            )));
        }
        self.symbols().scalars.insert(name.to_string(), value);
        Ok(())
    }

    /// Current value of `name`.
    pub fn scalar(&self, name: &str) -> Result<Value> {
        self.symbols()
            .scalars
            .get(name)
            .cloned()
            .ok_or_else(|| RenderSessionError::undefined_scalar(name))
    }

    // ─────────────────────────────────────────
    // XML sequence
    // ─────────────────────────────────────────

    pub fn xml_sequence(&self) -> u64 {
        self.xml_sequence.load(Ordering::SeqCst)
    }

    /// Advance the cursor by one, returning `(old, new)`.
    pub fn increment_xml_sequence(&self) -> (u64, u64) {
        let old = self.xml_sequence.fetch_add(1, Ordering::SeqCst);
        (old, old + 1)
    }

    /// Read the cursor and remember it as the last queried value.
    ///
    /// The second element is `true` when the value differs from the previous
    /// query.
    pub fn query_xml_sequence(&self) -> (u64, bool) {
        let current = self.xml_sequence();
        let previous = self
            .last_queried_xml_sequence
            .swap(current, Ordering::SeqCst);
        (current, previous != current)
    }

    pub fn last_queried_xml_sequence(&self) -> u64 {
        self.last_queried_xml_sequence.load(Ordering::SeqCst)
    }
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RenderSession{{id={}, created_at={}}}",
            self.id,
            self.created_at.to_rfc3339()
        )
    }
}

fn out_of_range(list: &str, index: usize, len: usize) -> RenderSessionError {
    RenderSessionError::IndexOutOfRange {
        list: list.to_string(),
        index: i64::try_from(index).unwrap_or(i64::MAX),
        len,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
