//! Render sessions and the registry that owns them.
//!
//! A [`RenderSession`] is the symbol table of one document render: named
//! lists, named scalars, and the XML sequence cursor. The
//! [`RenderSessionRegistry`] routes every call to the session addressed by
//! its id and manages session lifecycle.

pub mod context;
pub mod manager;

pub use context::RenderSession;
pub use manager::RenderSessionRegistry;
