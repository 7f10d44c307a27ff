//! Boundary to the native debugger and its in-process agent.
//!
//! The agent lives inside the debugged interpreter and physically owns the
//! runtime breakpoint table; the native debugger delivers its notifications
//! to us. This module defines only the protocol: the calls the core makes
//! ([`DebugAgent`], [`FrameInspector`]) and the payloads it receives
//! ([`StopEvent`], [`ModuleImportEvent`], [`CodeObjectEvent`]). Payload
//! types are serializable because the boundary is a transport seam.
//!
//! The agent's table is volatile: it exists only while the inferior runs,
//! and every slot index it hands out dies with the process.

use serde::{Deserialize, Serialize};

use crate::error::DebugResult;
use crate::location::CatchKind;

/// Slot index in the agent's runtime breakpoint table.
pub type NativeIndex = u32;

/// Opaque handle to one native interpreter frame.
pub type FrameHandle = u64;

// ── BreakpointSync ───────────────────────────────────────────────────────────

/// The full mutable-field tuple pushed to the agent on insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointSync {
    /// Logical breakpoint number (registry identity).
    pub bpnum: u32,
    /// Location slot; always 0, one location per breakpoint.
    pub slot: u32,
    /// Thread id the breakpoint applies to; 0 means any.
    pub thread: u64,
    /// Opaque condition expression forwarded verbatim.
    pub condition: Option<String>,
    /// Hits the agent should swallow before stopping.
    pub ignore_count: u32,
    /// Whether the agent should stop on this slot at all.
    pub enabled: bool,
    /// Resolved line.
    pub line: u32,
    /// Resolved source pathname.
    pub filename: String,
}

// ── DebugAgent ───────────────────────────────────────────────────────────────

/// Calls the core makes against the native debugger / in-process agent.
///
/// Only addressable while the target runs; the registry guards every call
/// with [`DebugAgent::is_target_running`].
pub trait DebugAgent {
    /// Whether the inferior process is currently executing.
    fn is_target_running(&self) -> bool;

    /// Insert a breakpoint into the runtime table, returning its slot.
    fn insert_breakpoint(&mut self, sync: &BreakpointSync) -> NativeIndex;

    /// Re-send the field tuple for an existing slot.
    fn update_breakpoint(&mut self, index: NativeIndex, sync: &BreakpointSync);

    /// Forget a slot.
    fn remove_breakpoint(&mut self, index: NativeIndex);

    /// Replace the full pattern set for one catchpoint channel. Patterns are
    /// space-joined names; the empty string clears the channel.
    fn set_catch_patterns(&mut self, kind: CatchKind, patterns: &str);
}

// ── FrameInspector ───────────────────────────────────────────────────────────

/// Per-frame introspection calls against the native debugger.
///
/// Every accessor can fail with [`crate::DebugError::StaleFrame`]-worthy
/// conditions once the handle outlives the stop event; the frame stack maps
/// those failures without aborting sibling frames.
pub trait FrameInspector {
    /// The next older frame in the call chain, if any.
    fn older(&self, frame: FrameHandle) -> Option<FrameHandle>;

    /// Source pathname of the frame's code object.
    fn filename(&self, frame: FrameHandle) -> DebugResult<String>;

    /// Line currently executing in the frame.
    fn line(&self, frame: FrameHandle) -> DebugResult<u32>;

    /// Routine (function or module body) name.
    fn routine_name(&self, frame: FrameHandle) -> DebugResult<String>;

    /// Ordered `(name, display value)` pairs for the frame's arguments.
    fn arguments(&self, frame: FrameHandle) -> DebugResult<Vec<(String, String)>>;

    /// `(name, display value)` pairs for the frame's locals.
    fn locals(&self, frame: FrameHandle) -> DebugResult<Vec<(String, String)>>;

    /// `(name, display value)` pairs for the frame's globals.
    fn globals(&self, frame: FrameHandle) -> DebugResult<Vec<(String, String)>>;
}

// ── Events ───────────────────────────────────────────────────────────────────

/// What made the target stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopTrigger {
    /// A runtime-table breakpoint slot fired.
    Breakpoint { native_index: NativeIndex },
    /// A catchpoint channel fired for `name`.
    Catchpoint { kind: CatchKind, name: String },
}

/// A native stop notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEvent {
    /// Why the target stopped.
    pub trigger: StopTrigger,
    /// Authoritative per-slot hit counters from the agent's table.
    pub hit_counts: Vec<(NativeIndex, u64)>,
    /// Handle to the newest interpreter frame.
    pub top_frame: FrameHandle,
}

/// A module-import stop notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImportEvent {
    /// Source pathname of the imported module.
    pub pathname: String,
    /// Declared module name.
    pub name: String,
}

/// One definition streamed while a module compiles.
///
/// A `name` equal to [`crate::symbols::MODULE_BODY`] terminates the stream
/// for `pathname` and flushes the accumulated definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeObjectEvent {
    /// Source pathname the definition belongs to.
    pub pathname: String,
    /// Definition name, or the module-body sentinel.
    pub name: String,
    /// Starting line of the definition.
    pub line: u32,
}
