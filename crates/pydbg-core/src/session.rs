//! The debugger session aggregate.
//!
//! [`DebuggerCore`] owns every piece of per-session state (symbol tables,
//! breakpoint registry, frame stack, import filter, configuration) and is
//! the single entry point for the two things a front-end does: deliver
//! native events and run user commands. The native debugger and its agent
//! stay behind the [`DebugAgent`] and [`FrameInspector`] seams so the core
//! never touches a process directly.
//!
//! All user-facing output is returned as lines; the host decides where they
//! go.

use std::fs;

use tracing::{debug, info, warn};

use crate::agent::{
    CodeObjectEvent, DebugAgent, FrameInspector, ModuleImportEvent, StopEvent, StopTrigger,
};
use crate::breakpoints::{BpNum, BreakpointRegistry, EnableMode, HitOutcome};
use crate::command::{EnableVerb, SymbolVerb};
use crate::config::CoreConfig;
use crate::error::{DebugError, DebugResult};
use crate::frames::{FrameStack, SelectOutcome};
use crate::import_filter::ImportFilter;
use crate::location::{resolve, CatchKind, Location, ResolveContext};
use crate::symbols::{index_source, ClearScope, SymbolStore};

// ── DebuggerCore ─────────────────────────────────────────────────────────────

/// All logical state of one debugging session.
pub struct DebuggerCore {
    config: CoreConfig,
    symbols: SymbolStore,
    breakpoints: BreakpointRegistry,
    frames: FrameStack,
    filter: ImportFilter,
    /// Whether imported modules are auto-indexed at all.
    autoload_enabled: bool,
}

impl Default for DebuggerCore {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

impl DebuggerCore {
    /// Create a session with the given configuration.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            symbols: SymbolStore::new(),
            breakpoints: BreakpointRegistry::new(),
            frames: FrameStack::new(),
            filter: ImportFilter::new(),
            autoload_enabled: true,
        }
    }

    /// The breakpoint registry, read-only.
    pub fn breakpoints(&self) -> &BreakpointRegistry {
        &self.breakpoints
    }

    /// The symbol store, read-only.
    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    /// Whether a stop event is active.
    pub fn is_stopped(&self) -> bool {
        self.frames.is_valid()
    }

    // ── Native events ────────────────────────────────────────────────────────

    /// The target was launched or relaunched. Every slot index from the
    /// previous run is dead; push the whole breakpoint set afresh.
    pub fn on_run_started(&mut self, agent: &mut dyn DebugAgent) {
        info!("target started");
        self.frames.teardown();
        self.breakpoints.on_run_started(agent);
    }

    /// The target stopped. Rebuilds the frame stack and dispatches the
    /// trigger, returning the report lines for the user.
    pub fn on_stop(
        &mut self,
        event: &StopEvent,
        agent: &mut dyn DebugAgent,
        inspector: &dyn FrameInspector,
    ) -> Vec<String> {
        self.frames.setup(event.top_frame);
        let mut lines = Vec::new();

        match &event.trigger {
            StopTrigger::Breakpoint { native_index } => {
                match self
                    .breakpoints
                    .record_hit(*native_index, &event.hit_counts, agent)
                {
                    HitOutcome::Hit {
                        bpnum,
                        report,
                        removed,
                    } => {
                        lines.push(report);
                        if removed {
                            lines.push(format!("Temporary breakpoint #{bpnum} deleted"));
                        }
                    }
                    HitOutcome::Unmatched { native_index } => {
                        lines.push(format!("Stopped at unknown breakpoint slot {native_index}"));
                    }
                }
            }
            StopTrigger::Catchpoint { kind, name } => {
                lines.push(format!("Catchpoint: {} {}", kind.as_str(), name));
                for bpnum in self.breakpoints.on_catch_hit(*kind, name, agent) {
                    lines.push(format!("Temporary catchpoint #{bpnum} deleted"));
                }
            }
        }

        match self.frames.print_current(false, inspector, &self.config) {
            Ok(frame) => lines.push(frame),
            Err(e) => warn!(error = %e, "stop frame not printable"),
        }
        if let Some(line) = self.frames.current_line(inspector) {
            // Echo just the stopped-at line; listing continues from here.
            match self
                .frames
                .list_source(&format!("{line},{line}"), inspector, &self.symbols, &self.config)
            {
                Ok(mut source) => lines.append(&mut source),
                Err(e) => debug!(error = %e, "source echo unavailable"),
            }
        }
        lines
    }

    /// The target exited. Frames die, loaded breakpoints revert to resolved,
    /// autoloaded symbols are dropped (they describe the dead process).
    pub fn on_target_exit(&mut self) {
        info!("target exited");
        self.frames.teardown();
        self.breakpoints.on_target_exit();
        self.symbols.clear(ClearScope::AutoloadedOnly);
    }

    /// A module import was announced. Returns whether its definitions
    /// should be streamed to [`DebuggerCore::on_code_object`].
    pub fn on_module_import(&mut self, event: &ModuleImportEvent) -> bool {
        let admit = self.autoload_enabled && self.filter.admit(&event.pathname);
        debug!(pathname = %event.pathname, module = %event.name, admit, "module import");
        admit
    }

    /// One streamed definition for a compiling module. On the module-body
    /// sentinel the accumulated index is flushed and pending breakpoints on
    /// that file are retried; returns the ids that resolved.
    pub fn on_code_object(
        &mut self,
        event: &CodeObjectEvent,
        agent: &mut dyn DebugAgent,
    ) -> Vec<BpNum> {
        let flushed = self
            .symbols
            .accumulate(&event.pathname, &event.name, event.line);
        if !flushed {
            return Vec::new();
        }
        self.breakpoints
            .resolve_pending(&event.pathname, &self.symbols, agent)
    }

    // ── Symbol commands ──────────────────────────────────────────────────────

    /// Dispatch one symbol-surface command line: `add FILE`, `clear [FILE]`,
    /// `filter [RULE]`, `info`, `enable`, `disable`.
    pub fn symbol_command(&mut self, input: &str) -> DebugResult<Vec<String>> {
        let input = input.trim();
        let (verb, rest) = split_word(input);
        match SymbolVerb::parse(verb)? {
            SymbolVerb::Add => {
                let count = self.add_symbol_file(rest)?;
                Ok(vec![format!("{count} definitions indexed from {rest}")])
            }
            SymbolVerb::Clear => {
                let scope = if rest.is_empty() {
                    ClearScope::All
                } else {
                    ClearScope::File(rest)
                };
                let cleared = self.symbols.clear(scope);
                Ok(if cleared {
                    vec!["symbol tables cleared".to_string()]
                } else {
                    vec![format!("no symbols for {rest}")]
                })
            }
            SymbolVerb::Filter => {
                if rest.is_empty() {
                    Ok(self.filter_info())
                } else {
                    self.filter.add_rule(rest)?;
                    Ok(Vec::new())
                }
            }
            SymbolVerb::Info => Ok(self.symbol_info()),
            SymbolVerb::Enable => {
                self.autoload_enabled = true;
                Ok(vec!["module autoload enabled".to_string()])
            }
            SymbolVerb::Disable => {
                self.autoload_enabled = false;
                Ok(vec!["module autoload disabled".to_string()])
            }
        }
    }

    /// Parse `path` and install its definitions in the user table.
    /// Returns the number of definitions indexed.
    pub fn add_symbol_file(&mut self, path: &str) -> DebugResult<usize> {
        let source = fs::read_to_string(path).map_err(|source| DebugError::SourceUnavailable {
            file: path.to_string(),
            source,
        })?;
        let index = index_source(path, &source)?;
        let count = index.len();
        self.symbols.put(path, index, false);
        Ok(count)
    }

    /// Add an include (`pat`) or exclude (`!pat`) autoload filter rule.
    pub fn filter_rule(&mut self, rule: &str) -> DebugResult<()> {
        self.filter.add_rule(rule)
    }

    /// Drop all filter rules.
    pub fn filter_clear(&mut self) {
        self.filter.clear();
    }

    /// Turn module autoload on or off.
    pub fn set_autoload(&mut self, enabled: bool) {
        self.autoload_enabled = enabled;
    }

    fn filter_info(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!(
            "include: {}",
            self.filter.include_patterns().join(" ")
        ));
        lines.push(format!(
            "exclude: {}",
            self.filter.exclude_patterns().join(" ")
        ));
        lines
    }

    /// Summary of autoload state, filter rules, and indexed files.
    pub fn symbol_info(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "module autoload: {}",
            if self.autoload_enabled { "on" } else { "off" }
        )];
        lines.extend(self.filter_info());
        for file in self.symbols.user_files() {
            lines.push(format!("symbols (user): {file}"));
        }
        for file in self.symbols.autoloaded_files() {
            lines.push(format!("symbols (autoloaded): {file}"));
        }
        lines
    }

    // ── Breakpoint commands ──────────────────────────────────────────────────

    /// Create a breakpoint (or, for a `exception:`/`call:` spec, a
    /// catchpoint) and report it.
    pub fn create_breakpoint(
        &mut self,
        spec: &str,
        temporary: bool,
        condition: Option<String>,
        agent: &mut dyn DebugAgent,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<(BpNum, String)> {
        let location = self.resolve_spec(spec, inspector)?;
        if let Location::Special { kind, name } = &location {
            let bpnum = self.breakpoints.add_catchpoint(*kind, name, temporary);
            self.breakpoints.sync_catch_patterns(agent);
            let report = self
                .breakpoints
                .catchpoints()
                .iter()
                .find(|cp| cp.bpnum == bpnum)
                .map(|cp| cp.describe_catchpoint())
                .unwrap_or_default();
            return Ok((bpnum, report));
        }

        let bpnum = self
            .breakpoints
            .add_breakpoint(spec, location, temporary, condition, agent);
        let report = self
            .breakpoints
            .find(bpnum)
            .map(|bp| {
                if bp.location.is_resolved() {
                    bp.describe()
                } else {
                    format!("breakpoint #{bpnum} pending on \"{spec}\"")
                }
            })
            .unwrap_or_default();
        Ok((bpnum, report))
    }

    /// Create one catchpoint per name and push the batched patterns once.
    pub fn create_catchpoints(
        &mut self,
        kind: CatchKind,
        names: &[&str],
        temporary: bool,
        agent: &mut dyn DebugAgent,
    ) -> Vec<BpNum> {
        let ids: Vec<BpNum> = names
            .iter()
            .map(|name| self.breakpoints.add_catchpoint(kind, name, temporary))
            .collect();
        self.breakpoints.sync_catch_patterns(agent);
        ids
    }

    /// Delete breakpoints and catchpoints from an id list, or all of them.
    pub fn delete_command(
        &mut self,
        input: &str,
        agent: &mut dyn DebugAgent,
    ) -> DebugResult<Vec<BpNum>> {
        let ids = parse_ids(input)?;
        let ids = ids.as_deref();
        let mut removed = self.breakpoints.delete(ids, agent);
        removed.extend(self.breakpoints.delete_catchpoints(ids, agent));
        Ok(removed)
    }

    /// Enable breakpoints: `[once|count N|delete] [ID...]`, defaulting to
    /// every breakpoint when the id list is empty.
    pub fn enable_command(
        &mut self,
        input: &str,
        agent: &mut dyn DebugAgent,
    ) -> DebugResult<Vec<BpNum>> {
        let input = input.trim();
        let (first, rest) = split_word(input);
        let (mode, ids_text) = match EnableVerb::parse(first)? {
            EnableVerb::Plain => (EnableMode::Plain, input),
            EnableVerb::Once => (EnableMode::Once, rest),
            EnableVerb::Delete => (EnableMode::Delete, rest),
            EnableVerb::Count => {
                let (count, rest) = split_word(rest);
                let n: u32 = count
                    .parse()
                    .map_err(|_| DebugError::InvalidArgument(count.to_string()))?;
                (EnableMode::Count(n), rest)
            }
        };
        let ids = match parse_ids(ids_text)? {
            Some(ids) => ids,
            None => self
                .breakpoints
                .breakpoints()
                .iter()
                .map(|bp| bp.bpnum)
                .collect(),
        };
        self.breakpoints.enable(&ids, mode, agent)?;
        Ok(ids)
    }

    /// Disable breakpoints by id list, or all of them.
    pub fn disable_command(
        &mut self,
        input: &str,
        agent: &mut dyn DebugAgent,
    ) -> DebugResult<()> {
        let ids = parse_ids(input)?;
        self.breakpoints.disable(ids.as_deref(), agent)
    }

    /// Delete whatever is set at a location spec: breakpoints at the
    /// resolved (file, line), or catchpoints on the named target.
    pub fn clear_command(
        &mut self,
        spec: &str,
        agent: &mut dyn DebugAgent,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<Vec<BpNum>> {
        let location = self.resolve_spec(spec, inspector)?;
        Ok(match &location {
            Location::Special { name, .. } => {
                self.breakpoints.clear_catchpoints_named(name, agent)
            }
            _ => self.breakpoints.clear_at(&location, agent),
        })
    }

    /// One description line per breakpoint.
    pub fn breakpoint_info(&self) -> Vec<String> {
        if self.breakpoints.breakpoints().is_empty() {
            return vec!["No breakpoints".to_string()];
        }
        self.breakpoints
            .breakpoints()
            .iter()
            .map(|bp| {
                let mut line = bp.describe();
                if let Some(condition) = &bp.condition {
                    line.push_str(&format!(", condition={condition}"));
                }
                if !bp.arming.is_armed() {
                    line.push_str(" (disabled)");
                }
                line
            })
            .collect()
    }

    /// One description line per catchpoint.
    pub fn catchpoint_info(&self) -> Vec<String> {
        if self.breakpoints.catchpoints().is_empty() {
            return vec!["No catchpoints".to_string()];
        }
        self.breakpoints
            .catchpoints()
            .iter()
            .map(|cp| cp.describe_catchpoint())
            .collect()
    }

    /// Resolve a location spec against the selected frame's context.
    pub fn resolve_spec(
        &mut self,
        spec: &str,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<Location> {
        let file = self.frames.current_filename(inspector);
        let line = self.frames.current_line(inspector);
        let ctx = ResolveContext {
            current_file: file.as_deref(),
            current_line: line,
        };
        resolve(spec, ctx, &self.symbols)
    }

    // ── Frame commands ───────────────────────────────────────────────────────

    /// Move the frame cursor and describe where it landed.
    pub fn select_frame(
        &mut self,
        spec: &str,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<Vec<String>> {
        let mut lines = Vec::new();
        match self.frames.select(spec, inspector)? {
            SelectOutcome::Moved { .. } => {}
            SelectOutcome::Clamped { shortfall, .. } => {
                lines.push(format!("Only {shortfall} fewer frames available"));
            }
            SelectOutcome::NoMatch => {
                lines.push(format!("No frame named {spec}"));
                return Ok(lines);
            }
        }
        lines.push(self.frames.print_current(false, inspector, &self.config)?);
        Ok(lines)
    }

    /// Describe the selected frame, optionally with its locals.
    pub fn print_frame(
        &mut self,
        verbose: bool,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<String> {
        self.frames.print_current(verbose, inspector, &self.config)
    }

    /// Backtrace from the selected frame.
    pub fn backtrace(
        &mut self,
        count: Option<i64>,
        full: bool,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<Vec<String>> {
        self.frames.backtrace(count, full, inspector, &self.config)
    }

    /// Locals of the selected frame, arguments excluded.
    pub fn print_locals(&mut self, inspector: &dyn FrameInspector) -> DebugResult<Vec<String>> {
        self.frames.current_locals(inspector)
    }

    /// Globals of the selected frame.
    pub fn print_globals(&mut self, inspector: &dyn FrameInspector) -> DebugResult<Vec<String>> {
        self.frames.current_globals(inspector)
    }

    /// List source around the selected frame.
    pub fn list_source(
        &mut self,
        spec: &str,
        inspector: &dyn FrameInspector,
    ) -> DebugResult<Vec<String>> {
        self.frames
            .list_source(spec, inspector, &self.symbols, &self.config)
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Parse a whitespace-separated id list; empty means "all" (`None`).
fn parse_ids(input: &str) -> DebugResult<Option<Vec<BpNum>>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| DebugError::InvalidArgument(token.to_string()))
        })
        .collect::<DebugResult<Vec<BpNum>>>()
        .map(Some)
}
