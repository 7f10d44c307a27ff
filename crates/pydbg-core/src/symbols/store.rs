//! Session-wide symbol index registry.
//!
//! Two tables keyed by source pathname: one for files the user declared
//! explicitly (`symbol add`), one for files discovered at runtime as the
//! interpreter imports modules. A user entry takes priority on lookup.
//! Unknown files yield an empty index; an unresolved symbol is a normal
//! state, never an error.

use std::collections::HashMap;

use tracing::debug;

use crate::symbols::indexer::SymbolIndex;

/// Sentinel definition name sent by the in-process agent when a module body
/// finishes compiling; it flushes the accumulated definitions into the
/// autoloaded table.
pub const MODULE_BODY: &str = "<module>";

/// What to remove from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope<'a> {
    /// Empty both tables.
    All,
    /// Empty only the autoloaded table (used when re-running the target).
    AutoloadedOnly,
    /// Remove one file's user-table entry.
    File(&'a str),
}

/// Registry of per-file symbol indexes.
#[derive(Debug, Default)]
pub struct SymbolStore {
    /// Files indexed on explicit user request.
    user: HashMap<String, SymbolIndex>,
    /// Files indexed from runtime module-import events.
    autoloaded: HashMap<String, SymbolIndex>,
    /// Definitions streamed for a module still being compiled, keyed by
    /// pathname; flushed into `autoloaded` on the module-body sentinel.
    accumulating: HashMap<String, SymbolIndex>,
    /// Shared empty index returned for unknown files.
    empty: SymbolIndex,
}

impl SymbolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an index for `file` into the user or autoloaded table.
    pub fn put(&mut self, file: &str, index: SymbolIndex, autoloaded: bool) {
        debug!(file, autoloaded, symbols = index.len(), "symbol table added");
        if autoloaded {
            self.autoloaded.insert(file.to_string(), index);
        } else {
            self.user.insert(file.to_string(), index);
        }
    }

    /// Look up the index for `file`; user table wins over autoloaded, and an
    /// unknown file yields an empty index.
    pub fn get(&self, file: &str) -> &SymbolIndex {
        self.user
            .get(file)
            .or_else(|| self.autoloaded.get(file))
            .unwrap_or(&self.empty)
    }

    /// Look up one definition's line in `file`'s index.
    pub fn lookup(&self, file: &str, name: &str) -> Option<u32> {
        self.get(file).get(name).copied()
    }

    /// Clear per `scope`. For [`ClearScope::File`] the return value says
    /// whether an entry was actually removed.
    pub fn clear(&mut self, scope: ClearScope<'_>) -> bool {
        match scope {
            ClearScope::All => {
                self.user.clear();
                self.autoloaded.clear();
                true
            }
            ClearScope::AutoloadedOnly => {
                self.autoloaded.clear();
                true
            }
            ClearScope::File(file) => self.user.remove(file).is_some(),
        }
    }

    /// Record one streamed definition for a module being compiled.
    ///
    /// Returns `true` when `name` is the module-body sentinel, meaning the
    /// accumulated definitions were flushed into the autoloaded table and
    /// pending breakpoints for `file` should be re-resolved.
    pub fn accumulate(&mut self, file: &str, name: &str, line: u32) -> bool {
        if name == MODULE_BODY {
            let index = self.accumulating.remove(file).unwrap_or_default();
            self.put(file, index, true);
            true
        } else {
            self.accumulating
                .entry(file.to_string())
                .or_default()
                .insert(name.to_string(), line);
            false
        }
    }

    /// Files present in the user table.
    pub fn user_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.user.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    /// Files present in the autoloaded table.
    pub fn autoloaded_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.autoloaded.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }
}
