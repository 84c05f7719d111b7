//! Per-render-session symbol tables for a document-template rendering engine.
//!
//! A [`RenderSessionRegistry`] owns every active [`RenderSession`]. The host
//! renderer talks to it through [`RenderExtension`], which speaks 1-based
//! list indices and normalizes document-node values before they are stored.

pub mod config;
pub mod error;
pub mod extension;
pub mod session;
pub mod sweeper;
pub mod utils;
pub mod value;

pub use error::{RenderSessionError, Result, SymbolKind};
pub use extension::RenderExtension;
pub use session::{RenderSession, RenderSessionRegistry};
pub use sweeper::SessionSweeper;
pub use value::{NodeRef, Value};
