//! Breakpoint location specs and their resolution.
//!
//! A location spec is a small `:`-separated grammar:
//!
//! | tokens | form                  | meaning                                   |
//! |--------|-----------------------|-------------------------------------------|
//! | 0      | ``                    | current file, current line                |
//! | 1      | `12` / `+3` / `-3`    | absolute / relative line in current file  |
//! | 1      | `name`                | definition in current file                |
//! | 2      | `file.py:12`          | absolute line in file                     |
//! | 2      | `file.py:name`        | definition in file                        |
//! | 2      | `exception:Name`      | exception catchpoint                      |
//! | 2      | `call:name`           | call catchpoint                           |
//! | 2      | `name:3`              | definition in current file plus offset    |
//! | 3      | `file.py:name:3`      | definition in file plus offset            |
//!
//! A name that misses the symbol index is *not* an error: the location comes
//! back [`Location::Unresolved`] and the breakpoint stays pending until the
//! file's symbols load. Only malformed syntax is a hard failure.

use serde::{Deserialize, Serialize};

use crate::error::{DebugError, DebugResult};
use crate::symbols::SymbolStore;

/// Python source suffix, matched case-insensitively.
const SOURCE_SUFFIX: &str = ".py";

// ── CatchKind ────────────────────────────────────────────────────────────────

/// The two catchpoint channels the in-process agent exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatchKind {
    /// Stop when a named exception is raised.
    Exception,
    /// Stop when a named function is called.
    Call,
}

impl CatchKind {
    /// The spec keyword for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            CatchKind::Exception => "exception",
            CatchKind::Call => "call",
        }
    }
}

// ── Location ─────────────────────────────────────────────────────────────────

/// A breakpoint target, possibly not yet mapped to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// A name that could not yet be mapped; `filename` is the file whose
    /// symbols would resolve it, when known.
    Unresolved { filename: Option<String> },
    /// A concrete (file, line) pair.
    Resolved { filename: String, line: u32 },
    /// A catchpoint target; never resolves to a line.
    Special { kind: CatchKind, name: String },
}

impl Location {
    /// Whether this location carries a concrete (file, line).
    pub fn is_resolved(&self) -> bool {
        matches!(self, Location::Resolved { .. })
    }

    /// Whether this location is still pending on `file`'s symbols.
    ///
    /// An `Unresolved` with no filename is pending on *any* file.
    pub fn is_pending_on(&self, file: &str) -> bool {
        match self {
            Location::Unresolved { filename: Some(f) } => f == file,
            Location::Unresolved { filename: None } => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Unresolved { filename: Some(file) } => write!(f, "<pending {file}>"),
            Location::Unresolved { filename: None } => write!(f, "<pending>"),
            Location::Resolved { filename, line } => write!(f, "{filename}:{line}"),
            Location::Special { kind, name } => write!(f, "{}:{}", kind.as_str(), name),
        }
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Frame context a spec may be relative to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    /// File of the selected frame, if the target is stopped.
    pub current_file: Option<&'a str>,
    /// Line of the selected frame.
    pub current_line: Option<u32>,
}

/// Resolve a location spec against the symbol store and frame context.
pub fn resolve(spec: &str, ctx: ResolveContext<'_>, store: &SymbolStore) -> DebugResult<Location> {
    let spec = spec.trim();
    if spec.is_empty() {
        let (file, line) = require_context(spec, ctx)?;
        return checked_line(spec, file, line as i64);
    }

    let tokens: Vec<&str> = spec.split(':').collect();
    match tokens.as_slice() {
        [single] => resolve_single(spec, single, ctx, store),
        [a, b] => resolve_pair(spec, a, b, ctx, store),
        [file, name, offset] => {
            let offset: i64 = offset
                .parse()
                .map_err(|_| DebugError::InvalidLocation(spec.to_string()))?;
            resolve_name_with_offset(spec, file, name, offset, store)
        }
        _ => Err(DebugError::InvalidLocation(spec.to_string())),
    }
}

fn resolve_single(
    spec: &str,
    token: &str,
    ctx: ResolveContext<'_>,
    store: &SymbolStore,
) -> DebugResult<Location> {
    if let Ok(number) = token.parse::<i64>() {
        let (file, line) = require_context(spec, ctx)?;
        // A signed token is relative to the current line; unsigned is
        // absolute.
        let target = if token.starts_with(['+', '-']) {
            line as i64 + number
        } else {
            number
        };
        return checked_line(spec, file, target);
    }
    let (file, _) = require_context(spec, ctx)?;
    Ok(lookup_name(file, token, store))
}

fn resolve_pair(
    spec: &str,
    a: &str,
    b: &str,
    ctx: ResolveContext<'_>,
    store: &SymbolStore,
) -> DebugResult<Location> {
    if a.to_lowercase().ends_with(SOURCE_SUFFIX) {
        if let Ok(line) = b.parse::<i64>() {
            return checked_line(spec, a, line);
        }
        return Ok(lookup_name(a, b, store));
    }
    if a == "exception" || a == "call" {
        if b.is_empty() {
            return Err(DebugError::InvalidLocation(spec.to_string()));
        }
        let kind = if a == "exception" {
            CatchKind::Exception
        } else {
            CatchKind::Call
        };
        return Ok(Location::Special {
            kind,
            name: b.to_string(),
        });
    }
    if let Ok(offset) = b.parse::<i64>() {
        let (file, _) = require_context(spec, ctx)?;
        return resolve_name_with_offset(spec, file, a, offset, store);
    }
    Err(DebugError::InvalidLocation(spec.to_string()))
}

fn resolve_name_with_offset(
    spec: &str,
    file: &str,
    name: &str,
    offset: i64,
    store: &SymbolStore,
) -> DebugResult<Location> {
    match lookup_name(file, name, store) {
        Location::Resolved { filename, line } => checked_line(spec, &filename, line as i64 + offset),
        pending => Ok(pending),
    }
}

/// Look up `name` in `file`'s index; a miss yields a pending location.
fn lookup_name(file: &str, name: &str, store: &SymbolStore) -> Location {
    match store.lookup(file, name) {
        Some(line) => Location::Resolved {
            filename: file.to_string(),
            line,
        },
        None => Location::Unresolved {
            filename: Some(file.to_string()),
        },
    }
}

fn require_context<'a>(spec: &str, ctx: ResolveContext<'a>) -> DebugResult<(&'a str, u32)> {
    match (ctx.current_file, ctx.current_line) {
        (Some(file), line) => Ok((file, line.unwrap_or(1))),
        (None, _) => Err(DebugError::InvalidLocation(spec.to_string())),
    }
}

fn checked_line(spec: &str, file: &str, line: i64) -> DebugResult<Location> {
    if line <= 0 {
        return Err(DebugError::InvalidLocation(spec.to_string()));
    }
    Ok(Location::Resolved {
        filename: file.to_string(),
        line: line as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn store_with(file: &str, entries: &[(&str, u32)]) -> SymbolStore {
        let mut store = SymbolStore::new();
        let index = entries
            .iter()
            .map(|(name, line)| (name.to_string(), *line))
            .collect();
        store.put(file, index, false);
        store
    }

    fn at(file: &'static str, line: u32) -> ResolveContext<'static> {
        ResolveContext {
            current_file: Some(file),
            current_line: Some(line),
        }
    }

    fn resolved(file: &str, line: u32) -> Location {
        Location::Resolved {
            filename: file.to_string(),
            line,
        }
    }

    #[test]
    fn test_empty_spec_is_current_position() {
        let store = SymbolStore::new();
        assert_eq!(resolve("", at("a.py", 10), &store).unwrap(), resolved("a.py", 10));
        assert!(resolve("", ResolveContext::default(), &store).is_err());
    }

    #[rstest]
    #[case("+3", 13)]
    #[case("-3", 7)]
    #[case("7", 7)]
    fn test_numeric_single_token(#[case] spec: &str, #[case] expect: u32) {
        let store = SymbolStore::new();
        assert_eq!(
            resolve(spec, at("a.py", 10), &store).unwrap(),
            resolved("a.py", expect)
        );
    }

    #[test]
    fn test_absolute_line_without_script_fails() {
        let store = SymbolStore::new();
        assert!(matches!(
            resolve("7", ResolveContext::default(), &store),
            Err(DebugError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_relative_line_below_one_fails() {
        let store = SymbolStore::new();
        assert!(resolve("-10", at("a.py", 5), &store).is_err());
        assert!(resolve("0", at("a.py", 5), &store).is_err());
    }

    #[test]
    fn test_bare_name_in_current_file() {
        let store = store_with("a.py", &[("main", 4)]);
        assert_eq!(
            resolve("main", at("a.py", 1), &store).unwrap(),
            resolved("a.py", 4)
        );
    }

    #[test]
    fn test_bare_name_miss_is_pending() {
        let store = SymbolStore::new();
        assert_eq!(
            resolve("main", at("a.py", 1), &store).unwrap(),
            Location::Unresolved {
                filename: Some("a.py".to_string())
            }
        );
    }

    #[test]
    fn test_file_and_line() {
        let store = SymbolStore::new();
        let ctx = ResolveContext::default();
        assert_eq!(resolve("b.py:12", ctx, &store).unwrap(), resolved("b.py", 12));
        // Case-insensitive suffix.
        assert_eq!(resolve("B.PY:12", ctx, &store).unwrap(), resolved("B.PY", 12));
    }

    #[test]
    fn test_file_and_name() {
        let store = store_with("b.py", &[("go", 8)]);
        let ctx = ResolveContext::default();
        assert_eq!(resolve("b.py:go", ctx, &store).unwrap(), resolved("b.py", 8));
        assert_eq!(
            resolve("b.py:missing", ctx, &store).unwrap(),
            Location::Unresolved {
                filename: Some("b.py".to_string())
            }
        );
    }

    #[rstest]
    #[case("exception:ValueError", CatchKind::Exception, "ValueError")]
    #[case("call:connect", CatchKind::Call, "connect")]
    fn test_catch_specs(#[case] spec: &str, #[case] kind: CatchKind, #[case] name: &str) {
        let store = SymbolStore::new();
        assert_eq!(
            resolve(spec, ResolveContext::default(), &store).unwrap(),
            Location::Special {
                kind,
                name: name.to_string()
            }
        );
    }

    #[test]
    fn test_name_with_offset_in_current_file() {
        let store = store_with("a.py", &[("main", 4)]);
        assert_eq!(
            resolve("main:3", at("a.py", 1), &store).unwrap(),
            resolved("a.py", 7)
        );
    }

    #[test]
    fn test_three_token_form() {
        let store = store_with("b.py", &[("go", 8)]);
        let ctx = ResolveContext::default();
        assert_eq!(resolve("b.py:go:2", ctx, &store).unwrap(), resolved("b.py", 10));
        assert_eq!(resolve("b.py:go:-2", ctx, &store).unwrap(), resolved("b.py", 6));
        // Pending when the name is unknown; the offset applies on retry.
        assert_eq!(
            resolve("b.py:later:2", ctx, &store).unwrap(),
            Location::Unresolved {
                filename: Some("b.py".to_string())
            }
        );
    }

    #[rstest]
    #[case("a:b:c:d")]
    #[case("b.py:go:x")]
    #[case("exception:")]
    #[case("notafile:notanumber")]
    fn test_invalid_specs(#[case] spec: &str) {
        let store = SymbolStore::new();
        assert!(matches!(
            resolve(spec, at("a.py", 1), &store),
            Err(DebugError::InvalidLocation(_))
        ));
    }
}
