//! Values stored in render session symbol tables.
//!
//! The template engine hands over strings, numbers, booleans, sequences, and
//! references to nodes of the document being rendered. Instead of carrying
//! an open-ended dynamic type through the registry, every value is one of
//! the variants of [`Value`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Document nodes
// ─────────────────────────────────────────────

/// A reference to a node of the document being rendered.
///
/// Only the node name and its string value survive the trip into the
/// registry; that is all atomization needs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NodeRef {
    /// Element or attribute name.
    #[serde(rename = "node")]
    pub name: String,
    /// Concatenated string value of the node.
    pub text: String,
}

impl NodeRef {
    /// Create a node reference.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        NodeRef {
            name: name.into(),
            text: text.into(),
        }
    }

    /// The node's atomic value.
    pub fn atomize(&self) -> Value {
        Value::Text(self.text.clone())
    }
}

// ─────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────

/// A value held by a list element or scalar variable.
///
/// Serialized untagged: JSON strings, integers, floats, booleans, and arrays
/// map onto the matching variant; `{"node": ..., "text": ...}` is a node.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Sequence(Vec<Value>),
    Node(NodeRef),
}

impl Value {
    /// Create a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Whether this is a sequence with no elements.
    pub fn is_empty_sequence(&self) -> bool {
        matches!(self, Value::Sequence(items) if items.is_empty())
    }

    /// Borrow the text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Node(node) => f.write_str(&node.text),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<NodeRef> for Value {
    fn from(node: NodeRef) -> Self {
        Value::Node(node)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
