//! Shared mocks for unit tests.

use std::collections::HashMap;

use crate::agent::{BreakpointSync, DebugAgent, FrameHandle, FrameInspector, NativeIndex};
use crate::error::{DebugError, DebugResult};
use crate::location::CatchKind;

// ── MockAgent ────────────────────────────────────────────────────────────────

/// Recording agent: every call is appended to a public log.
pub struct MockAgent {
    pub running: bool,
    next_index: NativeIndex,
    pub inserted: Vec<(NativeIndex, BreakpointSync)>,
    pub updated: Vec<(NativeIndex, BreakpointSync)>,
    pub removed: Vec<NativeIndex>,
    pub catch_patterns: Vec<(CatchKind, String)>,
}

impl MockAgent {
    pub fn new(running: bool) -> Self {
        Self {
            running,
            next_index: 100,
            inserted: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            catch_patterns: Vec::new(),
        }
    }

    /// The last pattern string sent on `kind`'s channel.
    pub fn last_patterns(&self, kind: CatchKind) -> Option<&str> {
        self.catch_patterns
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p.as_str())
    }
}

impl DebugAgent for MockAgent {
    fn is_target_running(&self) -> bool {
        self.running
    }

    fn insert_breakpoint(&mut self, sync: &BreakpointSync) -> NativeIndex {
        let index = self.next_index;
        self.next_index += 1;
        self.inserted.push((index, sync.clone()));
        index
    }

    fn update_breakpoint(&mut self, index: NativeIndex, sync: &BreakpointSync) {
        self.updated.push((index, sync.clone()));
    }

    fn remove_breakpoint(&mut self, index: NativeIndex) {
        self.removed.push(index);
    }

    fn set_catch_patterns(&mut self, kind: CatchKind, patterns: &str) {
        self.catch_patterns.push((kind, patterns.to_string()));
    }
}

// ── ScriptedInspector ────────────────────────────────────────────────────────

/// One scripted frame for [`ScriptedInspector`].
#[derive(Clone, Default)]
pub struct FrameScript {
    pub name: String,
    pub file: String,
    pub line: u32,
    pub args: Vec<(String, String)>,
    pub locals: Vec<(String, String)>,
    pub globals: Vec<(String, String)>,
    /// Every accessor fails for this frame.
    pub stale: bool,
}

impl FrameScript {
    pub fn new(name: &str, file: &str, line: u32) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
            line,
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: &[(&str, &str)]) -> Self {
        self.args = pairs(args);
        self
    }

    pub fn with_locals(mut self, locals: &[(&str, &str)]) -> Self {
        self.locals = pairs(locals);
        self
    }

    pub fn with_globals(mut self, globals: &[(&str, &str)]) -> Self {
        self.globals = pairs(globals);
        self
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }
}

fn pairs(kv: &[(&str, &str)]) -> Vec<(String, String)> {
    kv.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Inspector backed by a fixed frame chain; handle `n` is the frame at
/// index `n`, newest first.
pub struct ScriptedInspector {
    frames: Vec<FrameScript>,
}

impl ScriptedInspector {
    pub fn new(frames: Vec<FrameScript>) -> Self {
        Self { frames }
    }

    fn get(&self, frame: FrameHandle) -> DebugResult<&FrameScript> {
        let script = self
            .frames
            .get(frame as usize)
            .filter(|s| !s.stale)
            .ok_or(DebugError::StaleFrame {
                index: frame as usize,
            })?;
        Ok(script)
    }
}

impl FrameInspector for ScriptedInspector {
    fn older(&self, frame: FrameHandle) -> Option<FrameHandle> {
        let next = frame + 1;
        ((next as usize) < self.frames.len()).then_some(next)
    }

    fn filename(&self, frame: FrameHandle) -> DebugResult<String> {
        Ok(self.get(frame)?.file.clone())
    }

    fn line(&self, frame: FrameHandle) -> DebugResult<u32> {
        Ok(self.get(frame)?.line)
    }

    fn routine_name(&self, frame: FrameHandle) -> DebugResult<String> {
        Ok(self.get(frame)?.name.clone())
    }

    fn arguments(&self, frame: FrameHandle) -> DebugResult<Vec<(String, String)>> {
        Ok(self.get(frame)?.args.clone())
    }

    fn locals(&self, frame: FrameHandle) -> DebugResult<Vec<(String, String)>> {
        Ok(self.get(frame)?.locals.clone())
    }

    fn globals(&self, frame: FrameHandle) -> DebugResult<Vec<(String, String)>> {
        Ok(self.get(frame)?.globals.clone())
    }
}

// ── Symbol helpers ───────────────────────────────────────────────────────────

/// Build a symbol index from `(name, line)` pairs.
pub fn symbol_index(entries: &[(&str, u32)]) -> HashMap<String, u32> {
    entries
        .iter()
        .map(|(name, line)| (name.to_string(), *line))
        .collect()
}
