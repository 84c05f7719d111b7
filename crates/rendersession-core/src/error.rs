//! Error types for rendersession-core.

use std::fmt;

use thiserror::Error;

/// The kind of symbol a lookup failed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    List,
    Scalar,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::List => f.write_str("list"),
            SymbolKind::Scalar => f.write_str("scalar"),
        }
    }
}

/// Caller errors signalled by the registry, its sessions, and the utilities.
///
/// None of these are transient: every operation is an in-memory lookup, so
/// nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderSessionError {
    #[error("Render session not found: {0}")]
    SessionNotFound(String),

    #[error("Undefined {kind}: {name}")]
    UndefinedSymbol { kind: SymbolKind, name: String },

    #[error("Index {index} out of range for list {list} (length {len})")]
    IndexOutOfRange { list: String, index: i64, len: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RenderSessionError {
    pub(crate) fn undefined_list(name: &str) -> Self {
        RenderSessionError::UndefinedSymbol {
            kind: SymbolKind::List,
            name: name.to_string(),
        }
    }

    pub(crate) fn undefined_scalar(name: &str) -> Self {
        RenderSessionError::UndefinedSymbol {
            kind: SymbolKind::Scalar,
            name: name.to_string(),
        }
    }
}

/// Result type alias for rendersession-core.
pub type Result<T> = std::result::Result<T, RenderSessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RenderSessionError::undefined_list("rows").to_string(),
            "Undefined list: rows"
        );
        assert_eq!(
            RenderSessionError::undefined_scalar("total").to_string(),
            "Undefined scalar: total"
        );
        let err = RenderSessionError::IndexOutOfRange {
            list: "rows".into(),
            index: 3,
            len: 2,
        };
        assert_eq!(err.to_string(), "Index 3 out of range for list rows (length 2)");
    }
}
