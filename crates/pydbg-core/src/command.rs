//! Command-verb resolution.
//!
//! Front-ends hand this crate bare words ("cl", "en", "exc"); each verb set
//! is a closed enum resolved by exact or unambiguous-prefix match against a
//! static table. An ambiguous prefix is rejected explicitly rather than
//! falling through to a default.

use crate::error::{DebugError, DebugResult};

/// Resolve `input` against a verb table by exact or unambiguous-prefix match.
///
/// An exact match always wins, so a verb that is a prefix of another
/// ("info" vs "includes") stays reachable.
pub fn match_keyword<T: Copy>(input: &str, table: &[(&'static str, T)]) -> DebugResult<T> {
    if input.is_empty() {
        return Err(DebugError::UnknownCommand(String::new()));
    }
    if let Some((_, verb)) = table.iter().find(|(word, _)| *word == input) {
        return Ok(*verb);
    }
    let matches: Vec<&(&'static str, T)> = table
        .iter()
        .filter(|(word, _)| word.starts_with(input))
        .collect();
    match matches.as_slice() {
        [] => Err(DebugError::UnknownCommand(input.to_string())),
        [(_, verb)] => Ok(*verb),
        many => Err(DebugError::AmbiguousCommand {
            input: input.to_string(),
            candidates: many.iter().map(|(word, _)| *word).collect(),
        }),
    }
}

// ── SymbolVerb ───────────────────────────────────────────────────────────────

/// Subcommands of the symbol-table surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolVerb {
    /// Parse a file and add its definitions to the user table.
    Add,
    /// Clear symbol tables (all, autoloaded, or one file).
    Clear,
    /// Add an include/exclude rule to the import filter.
    Filter,
    /// Show filter rules and indexed files.
    Info,
    /// Turn autoload of imported modules on.
    Enable,
    /// Turn autoload of imported modules off.
    Disable,
}

impl SymbolVerb {
    const TABLE: &'static [(&'static str, SymbolVerb)] = &[
        ("add", SymbolVerb::Add),
        ("clear", SymbolVerb::Clear),
        ("filter", SymbolVerb::Filter),
        ("info", SymbolVerb::Info),
        ("enable", SymbolVerb::Enable),
        ("disable", SymbolVerb::Disable),
    ];

    /// Resolve a verb word.
    pub fn parse(input: &str) -> DebugResult<Self> {
        match_keyword(input, Self::TABLE)
    }
}

// ── EnableVerb ───────────────────────────────────────────────────────────────

/// Modes of the breakpoint `enable` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableVerb {
    /// Armed indefinitely.
    Plain,
    /// Armed, auto-disables after the next hit.
    Once,
    /// Armed, disables after N hits (count follows the verb).
    Count,
    /// Deleted rather than disabled after the next hit.
    Delete,
}

impl EnableVerb {
    const TABLE: &'static [(&'static str, EnableVerb)] = &[
        ("once", EnableVerb::Once),
        ("count", EnableVerb::Count),
        ("delete", EnableVerb::Delete),
    ];

    /// Resolve a mode word. An id list starts with a digit, which is the
    /// plain mode.
    pub fn parse(input: &str) -> DebugResult<Self> {
        if input.is_empty() || input.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(EnableVerb::Plain);
        }
        match_keyword(input, Self::TABLE)
    }
}
