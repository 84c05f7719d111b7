//! Extension-function surface called by the template renderer.
//!
//! Templates address lists with 1-based indices and may hand over document
//! nodes where a scalar value is expected. [`RenderExtension`] translates
//! both before delegating to the [`RenderSessionRegistry`], and decides
//! whether failed reads surface as errors or as placeholder text.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::{ExtensionConfig, ReadFailurePolicy};
use crate::error::{RenderSessionError, Result, SymbolKind};
use crate::session::RenderSessionRegistry;
use crate::utils;
use crate::value::Value;

/// Text returned by [`RenderExtension::test_configuration`].
pub const TEST_CONFIGURATION_REPLY: &str = "Hello, World!";

// ─────────────────────────────────────────────
// RenderExtension
// ─────────────────────────────────────────────

/// The boundary between the template renderer and the session registry.
#[derive(Clone)]
pub struct RenderExtension {
    registry: Arc<RenderSessionRegistry>,
    config: ExtensionConfig,
}

impl RenderExtension {
    /// Create an extension surface over `registry`.
    pub fn new(registry: Arc<RenderSessionRegistry>, config: ExtensionConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<RenderSessionRegistry> {
        &self.registry
    }

    /// Lets a template author check that the extension is wired up.
    pub fn test_configuration(&self) -> &'static str {
        info!("running test_configuration");
        TEST_CONFIGURATION_REPLY
    }

    // ─────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────

    pub fn create_session(&self) -> String {
        self.registry.create()
    }

    /// Release a session; unknown ids are only logged.
    pub fn cleanup_session(&self, id: &str) {
        self.registry.cleanup(id);
    }

    // ─────────────────────────────────────────
    // Lists
    // ─────────────────────────────────────────

    pub fn create_list(&self, id: &str, name: &str) -> Result<()> {
        debug!(session = %id, list = name, "create list");
        self.registry.add_list(id, name)
    }

    pub fn append_list_value(&self, id: &str, name: &str, value: Value) -> Result<()> {
        debug!(session = %id, list = name, %value, "append list value");
        self.registry.append_value(id, name, value)
    }

    pub fn append_list(&self, id: &str, source: &str, target: &str) -> Result<()> {
        debug!(session = %id, source, target, "append list");
        self.registry.append_list(id, source, target)
    }

    /// Element `index` (1-based) of list `name`.
    pub fn get_list_value_at(&self, id: &str, name: &str, index: i64) -> Result<Value> {
        let session = self.registry.session(id)?;
        let result = match to_storage_index(index) {
            Some(i) => session.value_at(name, i).map_err(to_caller_index),
            None => session
                .list_len(name)
                .and_then(|len| Err(out_of_range(name, index, len))),
        };
        let result = self.degrade_read(result);
        if let Ok(value) = &result {
            debug!(session = %id, list = name, index, %value, "get list value");
        }
        result
    }

    /// Replace element `index` (1-based) of list `name`, returning the old one.
    pub fn set_list_value_at(
        &self,
        id: &str,
        name: &str,
        index: i64,
        value: Value,
    ) -> Result<Value> {
        let session = self.registry.session(id)?;
        let Some(i) = to_storage_index(index) else {
            let len = session.list_len(name)?;
            return Err(out_of_range(name, index, len));
        };
        debug!(session = %id, list = name, index, %value, "set list value");
        session.set_value_at(name, i, value).map_err(to_caller_index)
    }

    pub fn get_list_length(&self, id: &str, name: &str) -> Result<usize> {
        self.registry.list_len(id, name)
    }

    // ─────────────────────────────────────────
    // Scalars
    // ─────────────────────────────────────────

    /// Same as [`set_scalar`](Self::set_scalar); templates call it on first assignment.
    pub fn create_scalar(&self, id: &str, name: &str, value: Value) -> Result<()> {
        self.set_scalar(id, name, value)
    }

    pub fn declare_scalar(&self, id: &str, name: &str) -> Result<()> {
        self.registry.declare_scalar(id, name)
    }

    /// Store `value` under `name` after reducing document nodes to their
    /// atomic value.
    pub fn set_scalar(&self, id: &str, name: &str, value: Value) -> Result<()> {
        let value = atomize_scalar(value);
        debug!(session = %id, scalar = name, %value, "set scalar");
        self.registry.set_scalar(id, name, value)
    }

    pub fn get_scalar(&self, id: &str, name: &str) -> Result<Value> {
        let session = self.registry.session(id)?;
        self.degrade_read(session.scalar(name))
    }

    // ─────────────────────────────────────────
    // XML sequence
    // ─────────────────────────────────────────

    /// Current XML sequence. The renderer polls this constantly, so only
    /// changes are logged.
    pub fn get_xml_sequence(&self, id: &str) -> Result<u64> {
        let (sequence, changed) = self.registry.session(id)?.query_xml_sequence();
        if changed {
            debug!(session = %id, sequence, "xml sequence");
        }
        Ok(sequence)
    }

    pub fn increment_xml_sequence(&self, id: &str) -> Result<()> {
        let (old, new) = self.registry.increment_xml_sequence(id)?;
        debug!(session = %id, old, new, "increment xml sequence");
        Ok(())
    }

    // ─────────────────────────────────────────
    // Stateless helpers
    // ─────────────────────────────────────────

    /// Write a message from the template into the log.
    pub fn print_log_statement(&self, id: &str, message: &str) {
        info!(session = %id, "{}", message);
    }

    pub fn reformat_date(&self, date: &str) -> Result<String> {
        utils::reformat_date(date)
    }

    pub fn substring(&self, s: &str, start: i64, end: i64) -> Result<String> {
        utils::substring(s, start, end)
    }

    pub fn get_environment_property(&self, name: &str) -> Option<String> {
        let value = utils::environment_property(name);
        debug!(property = name, found = value.is_some(), "environment property");
        value
    }

    // ─────────────────────────────────────────
    // Read failures
    // ─────────────────────────────────────────

    /// Apply the configured read-failure policy to a read result.
    fn degrade_read(&self, result: Result<Value>) -> Result<Value> {
        match result {
            Err(
                e @ (RenderSessionError::UndefinedSymbol { .. }
                | RenderSessionError::IndexOutOfRange { .. }),
            ) if self.config.read_failure == ReadFailurePolicy::Placeholder => {
                error!(error = %e, "read failed, substituting placeholder");
                Ok(Value::Text(self.placeholder(&e)))
            }
            other => other,
        }
    }

    fn placeholder(&self, err: &RenderSessionError) -> String {
        let prefix = &self.config.placeholder_prefix;
        match err {
            RenderSessionError::UndefinedSymbol {
                kind: SymbolKind::List,
                name,
            } => format!("{prefix} no list with name {name}"),
            RenderSessionError::UndefinedSymbol {
                kind: SymbolKind::Scalar,
                name,
            } => format!("{prefix} No variable exists for variableName {name}"),
            RenderSessionError::IndexOutOfRange { .. } => format!("{prefix} IndexOutOfBounds"),
            other => format!("{prefix} {other}"),
        }
    }
}

/// Reduce a document node, or a sequence led by one, to its atomic value.
fn atomize_scalar(value: Value) -> Value {
    match value {
        Value::Node(node) => {
            debug!(node = %node.name, "atomizing node for scalar");
            node.atomize()
        }
        Value::Sequence(items) => match items.first() {
            Some(Value::Node(node)) => {
                debug!(node = %node.name, "atomizing first node of sequence for scalar");
                node.atomize()
            }
            _ => Value::Sequence(items),
        },
        other => other,
    }
}

/// 1-based caller index to 0-based storage index.
fn to_storage_index(index: i64) -> Option<usize> {
    index
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
}

/// Report out-of-range errors with the index the caller passed.
fn to_caller_index(err: RenderSessionError) -> RenderSessionError {
    match err {
        RenderSessionError::IndexOutOfRange { list, index, len } => {
            RenderSessionError::IndexOutOfRange {
                list,
                index: index.saturating_add(1),
                len,
            }
        }
        other => other,
    }
}

fn out_of_range(list: &str, index: i64, len: usize) -> RenderSessionError {
    RenderSessionError::IndexOutOfRange {
        list: list.to_string(),
        index,
        len,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NodeRef;

    fn extension(policy: ReadFailurePolicy) -> RenderExtension {
        let config = ExtensionConfig {
            read_failure: policy,
            placeholder_prefix: "ERR:".to_string(),
        };
        RenderExtension::new(Arc::new(RenderSessionRegistry::new()), config)
    }

    #[test]
    fn test_configuration_reply() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        assert_eq!(ext.test_configuration(), "Hello, World!");
    }

    #[test]
    fn test_list_indices_are_one_based() {
        let ext = extension(ReadFailurePolicy::Propagate);
        let id = ext.create_session();
        ext.create_list(&id, "rows").unwrap();
        ext.append_list_value(&id, "rows", Value::text("first")).unwrap();
        ext.append_list_value(&id, "rows", Value::text("second")).unwrap();

        assert_eq!(ext.get_list_value_at(&id, "rows", 1).unwrap(), Value::text("first"));
        assert_eq!(ext.get_list_value_at(&id, "rows", 2).unwrap(), Value::text("second"));

        let previous = ext
            .set_list_value_at(&id, "rows", 2, Value::text("changed"))
            .unwrap();
        assert_eq!(previous, Value::text("second"));
        assert_eq!(
            ext.registry().value_at(&id, "rows", 1).unwrap(),
            Value::text("changed")
        );
        assert_eq!(ext.get_list_length(&id, "rows").unwrap(), 2);
    }

    #[test]
    fn test_set_list_value_at_bounds() {
        let ext = extension(ReadFailurePolicy::Propagate);
        let id = ext.create_session();
        ext.append_list_value(&id, "rows", Value::Integer(1)).unwrap();

        for index in [0, -1, 2] {
            let err = ext
                .set_list_value_at(&id, "rows", index, Value::Integer(9))
                .unwrap_err();
            assert_eq!(
                err,
                RenderSessionError::IndexOutOfRange {
                    list: "rows".into(),
                    index,
                    len: 1
                }
            );
        }
        assert!(matches!(
            ext.set_list_value_at(&id, "missing", 1, Value::Integer(9)),
            Err(RenderSessionError::UndefinedSymbol { .. })
        ));
    }

    #[test]
    fn test_read_failures_propagate() {
        let ext = extension(ReadFailurePolicy::Propagate);
        let id = ext.create_session();
        ext.create_list(&id, "rows").unwrap();

        assert!(matches!(
            ext.get_list_value_at(&id, "missing", 1),
            Err(RenderSessionError::UndefinedSymbol { kind: SymbolKind::List, .. })
        ));
        assert!(matches!(
            ext.get_list_value_at(&id, "rows", 1),
            Err(RenderSessionError::IndexOutOfRange { index: 1, len: 0, .. })
        ));
        assert!(matches!(
            ext.get_list_value_at(&id, "rows", 0),
            Err(RenderSessionError::IndexOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            ext.get_scalar(&id, "missing"),
            Err(RenderSessionError::UndefinedSymbol { kind: SymbolKind::Scalar, .. })
        ));
    }

    #[test]
    fn test_read_failures_become_placeholders() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        let id = ext.create_session();
        ext.create_list(&id, "rows").unwrap();

        assert_eq!(
            ext.get_list_value_at(&id, "missing", 1).unwrap(),
            Value::text("ERR: no list with name missing")
        );
        assert_eq!(
            ext.get_list_value_at(&id, "rows", 3).unwrap(),
            Value::text("ERR: IndexOutOfBounds")
        );
        assert_eq!(
            ext.get_scalar(&id, "total").unwrap(),
            Value::text("ERR: No variable exists for variableName total")
        );
    }

    #[test]
    fn test_unknown_session_always_errors() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        assert_eq!(
            ext.get_list_value_at("ghost", "rows", 1).unwrap_err(),
            RenderSessionError::SessionNotFound("ghost".into())
        );
        assert!(ext.get_scalar("ghost", "x").is_err());
        assert!(ext.get_xml_sequence("ghost").is_err());
        assert!(ext.increment_xml_sequence("ghost").is_err());
        assert!(ext.create_list("ghost", "rows").is_err());
    }

    #[test]
    fn test_set_scalar_atomizes_nodes() {
        let ext = extension(ReadFailurePolicy::Propagate);
        let id = ext.create_session();

        ext.set_scalar(&id, "city", Value::from(NodeRef::new("city", "Graz")))
            .unwrap();
        assert_eq!(ext.get_scalar(&id, "city").unwrap(), Value::text("Graz"));

        let nodes = Value::Sequence(vec![
            Value::from(NodeRef::new("name", "Ada")),
            Value::from(NodeRef::new("name", "Grace")),
        ]);
        ext.create_scalar(&id, "name", nodes).unwrap();
        assert_eq!(ext.get_scalar(&id, "name").unwrap(), Value::text("Ada"));

        let plain = Value::Sequence(vec![Value::Integer(1), Value::Integer(2)]);
        ext.set_scalar(&id, "pair", plain.clone()).unwrap();
        assert_eq!(ext.get_scalar(&id, "pair").unwrap(), plain);
    }

    #[test]
    fn test_set_scalar_rejects_empty_sequence() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        let id = ext.create_session();
        assert!(matches!(
            ext.set_scalar(&id, "row", Value::Sequence(vec![])),
            Err(RenderSessionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_declare_scalar() {
        let ext = extension(ReadFailurePolicy::Propagate);
        let id = ext.create_session();
        ext.declare_scalar(&id, "note").unwrap();
        assert_eq!(ext.get_scalar(&id, "note").unwrap(), Value::text(""));
    }

    #[test]
    fn test_xml_sequence() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        let id = ext.create_session();
        for expected in 1..=5 {
            assert_eq!(ext.get_xml_sequence(&id).unwrap(), expected);
            assert_eq!(ext.get_xml_sequence(&id).unwrap(), expected);
            ext.increment_xml_sequence(&id).unwrap();
        }
        assert_eq!(ext.get_xml_sequence(&id).unwrap(), 6);
    }

    #[test]
    fn test_cleanup_session_twice() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        let id = ext.create_session();
        ext.cleanup_session(&id);
        ext.cleanup_session(&id);
        ext.cleanup_session("never-created");
        assert!(ext.registry().is_empty());
    }

    #[test]
    fn test_stateless_helpers() {
        let ext = extension(ReadFailurePolicy::Placeholder);
        assert_eq!(ext.reformat_date("20.10.2016").unwrap(), "2016-10-20");
        assert_eq!(ext.substring("Hello, World!", 8, 13).unwrap(), "World!");
        assert!(ext.get_environment_property("RENDERSESSION_SURELY_UNSET_VAR").is_none());
        ext.print_log_statement("any", "rendering footer");
    }

    #[test]
    fn test_to_storage_index() {
        assert_eq!(to_storage_index(1), Some(0));
        assert_eq!(to_storage_index(10), Some(9));
        assert_eq!(to_storage_index(0), None);
        assert_eq!(to_storage_index(-5), None);
        assert_eq!(to_storage_index(i64::MIN), None);
    }
}
