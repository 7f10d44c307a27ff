//! pydbg-core - Source-level Python debugging logic
//!
//! This library holds the logical half of a Python debugger front-end that
//! rides on a native debugger:
//! - Symbol indexing of Python sources and per-file symbol tables
//! - Breakpoint location resolution and the pending/resolved/loaded
//!   breakpoint lifecycle
//! - Catchpoints for exceptions and calls
//! - Frame-stack reconstruction, navigation, and source listing
//! - Import filtering for symbol autoload
//!
//! The native side (process control, the in-process agent) stays behind the
//! [`DebugAgent`] and [`FrameInspector`] traits; this crate never talks to a
//! process itself.

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod agent;
pub mod breakpoints;
pub mod command;
pub mod config;
pub mod error;
pub mod frames;
pub mod import_filter;
pub mod location;
pub mod session;
pub mod symbols;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use agent::{
    BreakpointSync, CodeObjectEvent, DebugAgent, FrameHandle, FrameInspector, ModuleImportEvent,
    NativeIndex, StopEvent, StopTrigger,
};
pub use breakpoints::{
    Arming, BpNum, BreakpointRegistry, BreakpointState, EnableMode, HitOutcome, LogicalBreakpoint,
};
pub use command::{EnableVerb, SymbolVerb};
pub use config::CoreConfig;
pub use error::{DebugError, DebugResult};
pub use frames::{FrameStack, SelectOutcome};
pub use import_filter::ImportFilter;
pub use location::{resolve, CatchKind, Location, ResolveContext};
pub use session::DebuggerCore;
pub use symbols::{index_source, ClearScope, SymbolIndex, SymbolStore, MODULE_BODY};
