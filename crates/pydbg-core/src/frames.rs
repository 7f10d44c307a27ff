//! Interpreter frame reconstruction and navigation.
//!
//! A native stop event carries only the newest frame's handle. The stack is
//! materialized lazily from there: an index-addressed growable sequence
//! where index `n + 1` is the older neighbour of index `n`, extended one
//! native hop at a time as navigation requires and cached so repeated
//! navigation within one stop event costs nothing. The whole sequence is
//! torn down and rebuilt on every stop; frames never outlive one event.

use tracing::warn;

use crate::agent::{FrameHandle, FrameInspector};
use crate::config::CoreConfig;
use crate::error::{DebugError, DebugResult};
use crate::symbols::SymbolStore;

// ── Frame ────────────────────────────────────────────────────────────────────

/// Per-frame source-window cursor for `list` style output.
#[derive(Debug, Clone, Copy)]
struct SourceWindow {
    center: u32,
    size: usize,
}

/// One interpreter frame, with introspection cached on first access.
#[derive(Debug)]
pub struct Frame {
    handle: FrameHandle,
    filename: Option<String>,
    line: Option<u32>,
    name: Option<String>,
    args: Option<Vec<(String, String)>>,
    locals: Option<Vec<(String, String)>>,
    globals: Option<Vec<(String, String)>>,
    window: Option<SourceWindow>,
}

impl Frame {
    fn new(handle: FrameHandle) -> Self {
        Self {
            handle,
            filename: None,
            line: None,
            name: None,
            args: None,
            locals: None,
            globals: None,
            window: None,
        }
    }

    /// Source pathname, cached.
    pub fn filename(&mut self, inspector: &dyn FrameInspector) -> DebugResult<String> {
        if self.filename.is_none() {
            self.filename = Some(inspector.filename(self.handle)?);
        }
        Ok(self.filename.clone().unwrap_or_default())
    }

    /// Current line, cached.
    pub fn line(&mut self, inspector: &dyn FrameInspector) -> DebugResult<u32> {
        if self.line.is_none() {
            self.line = Some(inspector.line(self.handle)?);
        }
        Ok(self.line.unwrap_or(0))
    }

    /// Routine name, cached.
    pub fn name(&mut self, inspector: &dyn FrameInspector) -> DebugResult<String> {
        if self.name.is_none() {
            self.name = Some(inspector.routine_name(self.handle)?);
        }
        Ok(self.name.clone().unwrap_or_default())
    }

    /// Ordered argument pairs, cached.
    pub fn args(&mut self, inspector: &dyn FrameInspector) -> DebugResult<&[(String, String)]> {
        if self.args.is_none() {
            self.args = Some(inspector.arguments(self.handle)?);
        }
        Ok(self.args.as_deref().unwrap_or_default())
    }

    /// Locals pairs, cached.
    pub fn locals(&mut self, inspector: &dyn FrameInspector) -> DebugResult<&[(String, String)]> {
        if self.locals.is_none() {
            self.locals = Some(inspector.locals(self.handle)?);
        }
        Ok(self.locals.as_deref().unwrap_or_default())
    }

    /// Globals pairs, cached.
    pub fn globals(&mut self, inspector: &dyn FrameInspector) -> DebugResult<&[(String, String)]> {
        if self.globals.is_none() {
            self.globals = Some(inspector.globals(self.handle)?);
        }
        Ok(self.globals.as_deref().unwrap_or_default())
    }
}

// ── SelectOutcome ────────────────────────────────────────────────────────────

/// Result of a frame selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Cursor landed exactly where asked.
    Moved { index: usize },
    /// Cursor clamped at a boundary, `shortfall` frames short of the ask.
    Clamped { index: usize, shortfall: usize },
    /// Name scan exhausted the chain without a match; cursor unchanged.
    NoMatch,
}

// ── FrameStack ───────────────────────────────────────────────────────────────

/// The navigable stack of interpreter frames for one stop event.
#[derive(Debug, Default)]
pub struct FrameStack {
    /// Materialized frames, newest first.
    frames: Vec<Frame>,
    /// Selected frame, `None` between stop events.
    cursor: Option<usize>,
    /// The older chain is fully materialized.
    oldest_reached: bool,
}

impl FrameStack {
    /// Create an empty, torn-down stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild for a new stop event rooted at `top`.
    pub fn setup(&mut self, top: FrameHandle) {
        self.frames = vec![Frame::new(top)];
        self.cursor = Some(0);
        self.oldest_reached = false;
    }

    /// Invalidate all navigation until the next [`FrameStack::setup`].
    pub fn teardown(&mut self) {
        self.frames.clear();
        self.cursor = None;
        self.oldest_reached = false;
    }

    /// Whether a stop event is active.
    pub fn is_valid(&self) -> bool {
        self.cursor.is_some()
    }

    /// Index of the selected frame.
    pub fn current_index(&self) -> DebugResult<usize> {
        self.cursor.ok_or(DebugError::InvalidFrameContext)
    }

    /// File of the selected frame, if introspectable. Used as resolver
    /// context, so failures collapse to `None`.
    pub fn current_filename(&mut self, inspector: &dyn FrameInspector) -> Option<String> {
        let index = self.cursor?;
        self.frames[index].filename(inspector).ok()
    }

    /// Line of the selected frame, if introspectable.
    pub fn current_line(&mut self, inspector: &dyn FrameInspector) -> Option<u32> {
        let index = self.cursor?;
        self.frames[index].line(inspector).ok()
    }

    /// Extend materialization until index `n` exists or the chain ends.
    /// Returns the highest index available (≤ `n`).
    pub fn materialize_up_to(
        &mut self,
        n: usize,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<usize> {
        if self.cursor.is_none() {
            return Err(DebugError::InvalidFrameContext);
        }
        while self.frames.len() <= n && !self.oldest_reached {
            match self.frames.last().and_then(|last| inspector.older(last.handle)) {
                Some(older) => self.frames.push(Frame::new(older)),
                None => self.oldest_reached = true,
            }
        }
        Ok(self.frames.len() - 1)
    }

    /// Move the cursor per `spec`: `+n` toward older frames, `-n` toward
    /// newer, a bare integer as an absolute index, or a routine name.
    pub fn select(&mut self, spec: &str, inspector: &dyn FrameInspector) -> DebugResult<SelectOutcome> {
        let current = self.current_index()?;
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(SelectOutcome::Moved { index: current });
        }

        if let Some(rest) = spec.strip_prefix('+') {
            let n = parse_count(spec, rest)?;
            return self.move_to(current + n, inspector);
        }
        if let Some(rest) = spec.strip_prefix('-') {
            let n = parse_count(spec, rest)?;
            let index = current.saturating_sub(n);
            self.cursor = Some(index);
            return Ok(if n > current {
                SelectOutcome::Clamped {
                    index,
                    shortfall: n - current,
                }
            } else {
                SelectOutcome::Moved { index }
            });
        }
        if spec.chars().all(|c| c.is_ascii_digit()) {
            let n = parse_count(spec, spec)?;
            return self.move_to(n, inspector);
        }
        self.select_by_name(spec, inspector)
    }

    fn move_to(&mut self, target: usize, inspector: &dyn FrameInspector) -> DebugResult<SelectOutcome> {
        let highest = self.materialize_up_to(target, inspector)?;
        if highest < target {
            self.cursor = Some(highest);
            Ok(SelectOutcome::Clamped {
                index: highest,
                shortfall: target - highest,
            })
        } else {
            self.cursor = Some(target);
            Ok(SelectOutcome::Moved { index: target })
        }
    }

    /// Scan materialized frames for a routine name, then keep materializing
    /// older frames until a match or the chain ends.
    fn select_by_name(
        &mut self,
        name: &str,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<SelectOutcome> {
        let mut index = 0;
        loop {
            if index >= self.frames.len() {
                let highest = self.materialize_up_to(index, inspector)?;
                if highest < index {
                    return Ok(SelectOutcome::NoMatch);
                }
            }
            match self.frames[index].name(inspector) {
                Ok(frame_name) if frame_name == name => {
                    self.cursor = Some(index);
                    return Ok(SelectOutcome::Moved { index });
                }
                Ok(_) => {}
                Err(e) => warn!(index, error = %e, "skipping frame during name scan"),
            }
            index += 1;
        }
    }

    // ── Display ──────────────────────────────────────────────────────────────

    /// One-line frame description:
    /// `#<level> <name> (<arg>=<value>, ...) at <file>:<line>`.
    ///
    /// Verbose mode appends one indented line per local not already shown
    /// as an argument.
    pub fn describe_frame(
        &mut self,
        index: usize,
        verbose: bool,
        inspector: &dyn FrameInspector,
        config: &CoreConfig,
    ) -> DebugResult<String> {
        if self.cursor.is_none() {
            return Err(DebugError::InvalidFrameContext);
        }
        if index >= self.frames.len() {
            return Err(DebugError::NoSuchFrame { index });
        }
        let width = config.value_display_width;
        let frame = &mut self.frames[index];
        let name = frame.name(inspector)?;
        let args = frame.args(inspector)?.to_vec();
        let rendered: Vec<String> = args
            .iter()
            .map(|(k, v)| format!("{k}={}", truncate(v, width)))
            .collect();
        let file = frame.filename(inspector)?;
        let line = frame.line(inspector)?;
        let mut out = format!("#{index} {name} ({}) at {file}:{line}", rendered.join(", "));
        if verbose {
            let arg_names: Vec<String> = args.iter().map(|(k, _)| k.clone()).collect();
            let locals = self.frames[index].locals(inspector)?.to_vec();
            for (k, v) in locals {
                if !arg_names.contains(&k) {
                    out.push_str(&format!("\n  {k}={v}"));
                }
            }
        }
        Ok(out)
    }

    /// Describe the selected frame.
    pub fn print_current(
        &mut self,
        verbose: bool,
        inspector: &dyn FrameInspector,
        config: &CoreConfig,
    ) -> DebugResult<String> {
        let index = self.current_index()?;
        self.describe_frame(index, verbose, inspector, config)
    }

    /// Frame descriptions from the cursor toward older frames.
    ///
    /// `count` ≤ 0 or absent means all remaining frames. A frame whose
    /// handle has gone stale is reported in place without aborting its
    /// siblings.
    pub fn backtrace(
        &mut self,
        count: Option<i64>,
        full: bool,
        inspector: &dyn FrameInspector,
        config: &CoreConfig,
    ) -> DebugResult<Vec<String>> {
        let start = self.current_index()?;
        let mut remaining = match count {
            Some(n) if n > 0 => n as usize,
            _ => usize::MAX,
        };
        let mut lines = Vec::new();
        let mut index = start;
        while remaining > 0 {
            let highest = self.materialize_up_to(index, inspector)?;
            if highest < index {
                break;
            }
            match self.describe_frame(index, full, inspector, config) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    warn!(index, error = %e, "frame not printable");
                    lines.push(format!("#{index} <unavailable: {e}>"));
                }
            }
            index += 1;
            remaining -= 1;
        }
        Ok(lines)
    }

    /// Indented `name=value` lines for the selected frame's locals that are
    /// not already arguments.
    pub fn current_locals(&mut self, inspector: &dyn FrameInspector) -> DebugResult<Vec<String>> {
        let index = self.current_index()?;
        let frame = &mut self.frames[index];
        let arg_names: Vec<String> = frame
            .args(inspector)?
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        Ok(frame
            .locals(inspector)?
            .iter()
            .filter(|(k, _)| !arg_names.contains(k))
            .map(|(k, v)| format!("  {k}={v}"))
            .collect())
    }

    /// Indented `name=value` lines for the selected frame's globals.
    pub fn current_globals(&mut self, inspector: &dyn FrameInspector) -> DebugResult<Vec<String>> {
        let index = self.current_index()?;
        let frame = &mut self.frames[index];
        Ok(frame
            .globals(inspector)?
            .iter()
            .map(|(k, v)| format!("  {k}={v}"))
            .collect())
    }

    // ── Source listing ───────────────────────────────────────────────────────

    /// Echo a window of the selected frame's source file.
    ///
    /// Specs: empty or `+` pages forward from the last window, `-` pages
    /// backward, `first,last` is an explicit range (either side defaulting
    /// to the window center), a number centers on that line, and a name
    /// centers on that definition in the frame's file. The frame's current
    /// line is marked with `>`.
    pub fn list_source(
        &mut self,
        spec: &str,
        inspector: &dyn FrameInspector,
        symbols: &SymbolStore,
        config: &CoreConfig,
    ) -> DebugResult<Vec<String>> {
        let index = self.current_index()?;
        let current_line = self.frames[index].line(inspector)?;
        let file = self.frames[index].filename(inspector)?;
        let window = self.frames[index].window.unwrap_or(SourceWindow {
            center: current_line,
            size: config.list_size,
        });

        let spec = spec.trim();
        let page = (config.list_size / 2 + window.size / 2) as i64;
        let (first, last, next) = if spec.is_empty() || spec == "+" {
            windowed(window.center as i64 + page, config.list_size)
        } else if spec == "-" {
            windowed((window.center as i64 - page).max(1), config.list_size)
        } else if let Some((a, b)) = spec.split_once(',') {
            let first = parse_bound(a, window.center)?;
            let last = parse_bound(b, window.center)?;
            if last < first || first < 1 {
                return Err(DebugError::InvalidLineRange { first, last });
            }
            let size = (last - first + 1) as usize;
            (
                first,
                last,
                SourceWindow {
                    center: ((first + last) / 2) as u32,
                    size,
                },
            )
        } else if let Some(center) = numeric_center(spec) {
            if center < 1 {
                return Err(DebugError::InvalidLineRange {
                    first: center,
                    last: center,
                });
            }
            windowed(center, config.list_size)
        } else {
            let line = symbols
                .lookup(&file, spec)
                .ok_or_else(|| DebugError::InvalidLocation(spec.to_string()))?;
            windowed(line as i64, config.list_size)
        };

        self.frames[index].window = Some(next);
        render_source(&file, first, last, current_line)
    }
}

/// Center a window of `size` lines on `center`, clamping the start at 1.
fn windowed(center: i64, size: usize) -> (i64, i64, SourceWindow) {
    let center = center.max(1);
    let half = (size / 2) as i64;
    let first = (center - half).max(1);
    let last = center + half;
    (
        first,
        last,
        SourceWindow {
            center: center as u32,
            size,
        },
    )
}

/// A bare line number, optionally signed. A sign with no digits is paging
/// syntax and is handled before this is consulted.
fn numeric_center(spec: &str) -> Option<i64> {
    let digits = spec.strip_prefix(['+', '-']).unwrap_or(spec);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    spec.parse().ok()
}

fn parse_bound(token: &str, default: u32) -> DebugResult<i64> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(default as i64);
    }
    token
        .parse()
        .map_err(|_| DebugError::InvalidLocation(token.to_string()))
}

/// Read `file` and echo lines `first..=last`, marking `current_line`.
fn render_source(file: &str, first: i64, last: i64, current_line: u32) -> DebugResult<Vec<String>> {
    let text = std::fs::read_to_string(file).map_err(|source| DebugError::SourceUnavailable {
        file: file.to_string(),
        source,
    })?;
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let lineno = (i + 1) as i64;
        if lineno < first {
            continue;
        }
        if lineno > last {
            break;
        }
        let tag = if lineno == current_line as i64 {
            format!(">{lineno}")
        } else {
            lineno.to_string()
        };
        out.push(format!("{tag:>5}  {line}"));
    }
    Ok(out)
}

fn parse_count(spec: &str, digits: &str) -> DebugResult<usize> {
    digits
        .parse()
        .map_err(|_| DebugError::InvalidLocation(spec.to_string()))
}

/// Clip a display value to `width` characters.
fn truncate(value: &str, width: usize) -> &str {
    match value.char_indices().nth(width) {
        Some((at, _)) => &value[..at],
        None => value,
    }
}
