//! Symbol indexing for Python source files.
//!
//! `indexer` turns one script's text into a flat name → line index;
//! `store` is the session-wide registry of those indexes, split into a
//! user-declared table and a runtime-autoloaded table.

pub mod indexer;
pub mod store;

pub use indexer::{index_source, SymbolIndex};
pub use store::{ClearScope, SymbolStore, MODULE_BODY};
