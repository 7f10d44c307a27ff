//! Source symbol indexing.
//!
//! Scans Python source text and records the starting line of every
//! `def`/`class` statement, however deeply nested. The resulting index is
//! flat: a nested name shadows any earlier entry with the same name, which
//! mirrors how breakpoint specs address definitions (one namespace, last
//! definition wins).
//!
//! The scanner is line-oriented but tracks enough lexical state to stay
//! honest across lines: triple-quoted strings, short strings continued with
//! a trailing backslash, comments, bracket nesting, and explicit line
//! continuations. Gross syntax damage (unterminated strings, unbalanced
//! brackets, a `def` with no name) is a [`DebugError::ParseError`]; anything
//! subtler is the interpreter's problem, not ours.

use std::collections::HashMap;

use crate::error::{DebugError, DebugResult};

/// Flat mapping from definition name to the 1-based line where the
/// definition starts. Duplicates keep the last occurrence.
pub type SymbolIndex = HashMap<String, u32>;

/// Lexical state carried across lines.
struct Scanner {
    /// Open triple-quoted string: delimiter char and the line it opened on.
    triple: Option<(char, u32)>,
    /// Open short string continued by a trailing backslash.
    short: Option<(char, u32)>,
    /// Open brackets: the opening character and the line it opened on.
    brackets: Vec<(u8, u32)>,
    /// Previous line ended with a `\` continuation.
    continuation: bool,
}

/// Parse `source` and return its symbol index.
///
/// `file` is only used to label parse errors.
pub fn index_source(file: &str, source: &str) -> DebugResult<SymbolIndex> {
    let mut index = SymbolIndex::new();
    let mut scan = Scanner {
        triple: None,
        short: None,
        brackets: Vec::new(),
        continuation: false,
    };

    for (i, line) in source.lines().enumerate() {
        let lineno = (i + 1) as u32;
        scan_line(file, line, lineno, &mut scan, &mut index)?;
    }

    if let Some((_, start)) = scan.triple {
        return Err(parse_error(file, start, "unterminated triple-quoted string"));
    }
    if let Some((_, start)) = scan.short {
        return Err(parse_error(file, start, "unterminated string literal"));
    }
    if let Some((_, line)) = scan.brackets.first() {
        return Err(parse_error(file, *line, "unclosed bracket"));
    }
    Ok(index)
}

fn parse_error(file: &str, line: u32, message: &str) -> DebugError {
    DebugError::ParseError {
        file: file.to_string(),
        line,
        message: message.to_string(),
    }
}

fn scan_line(
    file: &str,
    line: &str,
    lineno: u32,
    scan: &mut Scanner,
    index: &mut SymbolIndex,
) -> DebugResult<()> {
    let bytes = line.as_bytes();
    let mut pos = 0usize;

    // Re-enter a string left open on the previous line.
    if let Some((quote, _)) = scan.triple {
        match find_triple_close(bytes, 0, quote) {
            Some(end) => {
                scan.triple = None;
                pos = end;
            }
            None => return Ok(()),
        }
    } else if let Some((quote, start)) = scan.short {
        match scan_short_string(bytes, 0, quote) {
            ShortScan::Closed(end) => {
                scan.short = None;
                pos = end;
            }
            ShortScan::Continued => return Ok(()),
            ShortScan::Unterminated => {
                return Err(parse_error(file, start, "unterminated string literal"))
            }
        }
    } else if scan.brackets.is_empty() && !scan.continuation {
        // At a logical statement start: the only place a definition header
        // can begin.
        match definition_name(line) {
            Some(Ok(name)) => {
                index.insert(name, lineno);
            }
            Some(Err(message)) => return Err(parse_error(file, lineno, &message)),
            None => {}
        }
    }

    scan.continuation = false;
    let mut ends_with_backslash = false;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        ends_with_backslash = false;
        match c {
            '#' => break,
            '\'' | '"' => {
                if bytes[pos..].len() >= 3 && bytes[pos + 1] as char == c && bytes[pos + 2] as char == c
                {
                    match find_triple_close(bytes, pos + 3, c) {
                        Some(end) => pos = end,
                        None => {
                            scan.triple = Some((c, lineno));
                            return Ok(());
                        }
                    }
                } else {
                    match scan_short_string(bytes, pos + 1, c) {
                        ShortScan::Closed(end) => pos = end,
                        ShortScan::Continued => {
                            scan.short = Some((c, lineno));
                            return Ok(());
                        }
                        ShortScan::Unterminated => {
                            return Err(parse_error(file, lineno, "unterminated string literal"))
                        }
                    }
                }
            }
            '(' | '[' | '{' => {
                scan.brackets.push((bytes[pos], lineno));
                pos += 1;
            }
            ')' | ']' | '}' => {
                match scan.brackets.pop() {
                    Some((open, _)) if closes(open, bytes[pos]) => {}
                    Some(_) => {
                        return Err(parse_error(file, lineno, "mismatched closing bracket"))
                    }
                    None => return Err(parse_error(file, lineno, "unmatched closing bracket")),
                }
                pos += 1;
            }
            '\\' => {
                ends_with_backslash = pos + 1 == bytes.len();
                pos += if ends_with_backslash { 1 } else { 2 };
            }
            _ => pos += 1,
        }
    }

    scan.continuation = ends_with_backslash;
    Ok(())
}

/// If `line` opens a definition, return its name; a malformed header is an
/// error message for the caller to wrap.
fn definition_name(line: &str) -> Option<Result<String, String>> {
    let trimmed = line.trim_start();
    let rest = if let Some(rest) = keyword(trimmed, "def") {
        rest
    } else if let Some(rest) = keyword(trimmed, "class") {
        rest
    } else if let Some(after_async) = keyword(trimmed, "async") {
        keyword(after_async.trim_start(), "def")?
    } else {
        return None;
    };

    let rest = rest.trim_start();
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(Err(format!(
            "expected a name in definition: {}",
            trimmed.trim_end()
        )));
    }
    Some(Ok(name))
}

/// Whether `close` is the right closer for `open`.
fn closes(open: u8, close: u8) -> bool {
    matches!(
        (open, close),
        (b'(', b')') | (b'[', b']') | (b'{', b'}')
    )
}

/// Match `word` at the start of `s` followed by a boundary.
fn keyword<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => Some(rest),
        _ => None,
    }
}

/// Find the end of a triple-quoted string opened with `quote`, starting the
/// search at `from`. Returns the index just past the closing delimiter.
fn find_triple_close(bytes: &[u8], from: usize, quote: char) -> Option<usize> {
    let q = quote as u8;
    let mut pos = from;
    while pos < bytes.len() {
        if bytes[pos] == b'\\' {
            pos += 2;
            continue;
        }
        if bytes[pos] == q && bytes.get(pos + 1) == Some(&q) && bytes.get(pos + 2) == Some(&q) {
            return Some(pos + 3);
        }
        pos += 1;
    }
    None
}

enum ShortScan {
    /// Closed on this line; index just past the closing quote.
    Closed(usize),
    /// Line ended with a backslash: the string continues on the next line.
    Continued,
    /// Line ended mid-string with no continuation.
    Unterminated,
}

/// Scan a short (single-line) string body opened with `quote`.
fn scan_short_string(bytes: &[u8], from: usize, quote: char) -> ShortScan {
    let q = quote as u8;
    let mut pos = from;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                if pos + 1 == bytes.len() {
                    return ShortScan::Continued;
                }
                pos += 2;
            }
            b if b == q => return ShortScan::Closed(pos + 1),
            _ => pos += 1,
        }
    }
    ShortScan::Unterminated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_definitions() {
        let src = "def alpha():\n    pass\n\nclass Beta:\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["alpha"], 1);
        assert_eq!(index["Beta"], 4);
    }

    #[test]
    fn test_nested_definitions_are_flat() {
        let src = "class Outer:\n    def method(self):\n        def inner():\n            pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index["Outer"], 1);
        assert_eq!(index["method"], 2);
        assert_eq!(index["inner"], 3);
    }

    #[test]
    fn test_duplicate_name_keeps_last() {
        let src = "def f():\n    pass\n\ndef f():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index["f"], 4);
    }

    #[test]
    fn test_async_def() {
        let src = "async def fetch():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index["fetch"], 1);
    }

    #[test]
    fn test_def_inside_string_is_ignored() {
        let src = "text = '''\ndef ghost():\n    pass\n'''\ndef real():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index["real"], 5);
    }

    #[test]
    fn test_def_inside_comment_is_ignored() {
        // A comment cannot start a statement, but the keyword scan only
        // runs at statement starts; this guards the bracket bookkeeping.
        let src = "x = 1  # def ghost(:\ndef real():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_def_inside_brackets_is_ignored() {
        let src = "table = [\n    'def notdef',\n]\ndef real():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index["real"], 4);
    }

    #[test]
    fn test_define_is_not_def() {
        let src = "define = 1\nclassify = 2\n";
        let index = index_source("a.py", src).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_unterminated_triple_string() {
        let src = "def f():\n    s = '''open\n";
        let err = index_source("a.py", src).unwrap_err();
        assert!(matches!(err, DebugError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_short_string() {
        let err = index_source("a.py", "s = 'open\n").unwrap_err();
        assert!(matches!(err, DebugError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_backslash_continued_short_string() {
        let src = "s = 'one \\\ntwo'\ndef f():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index["f"], 3);
    }

    #[test]
    fn test_unbalanced_brackets() {
        let err = index_source("a.py", "items = [1, 2\n").unwrap_err();
        assert!(matches!(err, DebugError::ParseError { line: 1, .. }));
        let err = index_source("a.py", "items = 1)\n").unwrap_err();
        assert!(matches!(err, DebugError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_mismatched_bracket_kinds() {
        let err = index_source("a.py", "x = (1]\n").unwrap_err();
        assert!(matches!(err, DebugError::ParseError { line: 1, .. }));
        let err = index_source("a.py", "x = {\n    'k': [1,\n}\n").unwrap_err();
        assert!(matches!(err, DebugError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_def_without_name() {
        let err = index_source("a.py", "def ():\n    pass\n").unwrap_err();
        assert!(matches!(err, DebugError::ParseError { .. }));
    }

    #[test]
    fn test_continuation_line_is_not_statement_start() {
        let src = "x = 1 + \\\ndef_like\ndef f():\n    pass\n";
        let index = index_source("a.py", src).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index["f"], 3);
    }
}
