//! Error taxonomy for the debugger core.
//!
//! Every failure here is scoped to the single command or event being
//! processed; nothing in this crate terminates the host. Resolution misses
//! are deliberately *not* errors: a breakpoint whose symbol is not yet
//! known stays pending and is retried when the owning file's symbols load.

use std::io;

use thiserror::Error;

use crate::breakpoints::BpNum;

/// Result alias used throughout the crate.
pub type DebugResult<T> = Result<T, DebugError>;

/// Errors reported by the debugger core.
#[derive(Debug, Error)]
pub enum DebugError {
    /// Malformed source text during symbol indexing. Indexing for that file
    /// aborts; any previously stored index for it is left untouched.
    #[error("parse error in {file} at line {line}: {message}")]
    ParseError {
        file: String,
        line: u32,
        message: String,
    },

    /// Malformed breakpoint/catchpoint location spec. No breakpoint is
    /// created.
    #[error("invalid breakpoint location \"{0}\"")]
    InvalidLocation(String),

    /// A source listing range with `last < first` or a nonpositive bound.
    #[error("invalid line range {first},{last}")]
    InvalidLineRange { first: i64, last: i64 },

    /// A frame's native handle became invalid mid-inspection.
    #[error("frame #{index} is no longer valid")]
    StaleFrame { index: usize },

    /// A frame index past the end of the call chain.
    #[error("no frame #{index}")]
    NoSuchFrame { index: usize },

    /// Frame navigation attempted after teardown or before setup.
    #[error("no frame context: the target is not stopped")]
    InvalidFrameContext,

    /// A source file could not be read for listing.
    #[error("cannot read source file {file}: {source}")]
    SourceUnavailable {
        file: String,
        #[source]
        source: io::Error,
    },

    /// A malformed import-filter glob.
    #[error("invalid filter pattern \"{pattern}\": {message}")]
    InvalidFilterPattern { pattern: String, message: String },

    /// A verb that matches no entry in the command table.
    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),

    /// A verb prefix that matches more than one command-table entry.
    #[error("ambiguous command \"{input}\": matches {candidates:?}")]
    AmbiguousCommand {
        input: String,
        candidates: Vec<&'static str>,
    },

    /// A command argument that should have been a number or id list.
    #[error("invalid argument \"{0}\"")]
    InvalidArgument(String),

    /// Enable/disable/delete referenced a breakpoint id not in the registry.
    #[error("no breakpoint #{0}")]
    NoBreakpoint(BpNum),
}
