//! Logical breakpoints, catchpoints, and their native-side synchronization.
//!
//! A logical breakpoint lives in one of three states:
//!
//! - **pending**: its location names a symbol whose file has no index yet;
//! - **resolved**: it has a concrete (file, line) but no runtime slot;
//! - **loaded**: the in-process agent holds it under a `native_index`.
//!
//! Pending → resolved happens when the owning file's symbols arrive
//! ([`BreakpointRegistry::resolve_pending`]). Resolved → loaded happens on
//! load while the target runs; the agent is unreachable otherwise and the
//! load is a no-op. Loaded → resolved happens on target exit: the agent's
//! table dies with the process, so every slot index is invalidated and the
//! whole set is pushed afresh on the next run.
//!
//! Catchpoints share the registry mechanics but live in their own ordered
//! collection, and their native synchronization batches all enabled targets
//! of a kind into one space-joined pattern string per channel.

use tracing::{debug, warn};

use crate::agent::{BreakpointSync, DebugAgent, NativeIndex};
use crate::error::{DebugError, DebugResult};
use crate::location::{resolve, CatchKind, Location, ResolveContext};
use crate::symbols::SymbolStore;

/// Logical breakpoint number, assigned at creation, never reused within a
/// session.
pub type BpNum = u32;

// ── Arming ───────────────────────────────────────────────────────────────────

/// Whether a breakpoint stops the target, and for how much longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arming {
    /// Never stops.
    Disabled,
    /// Stops indefinitely.
    Enabled,
    /// Stops for N more reported hits, then auto-disables. `Countdown(1)`
    /// is the "once" mode.
    Countdown(u32),
}

impl Arming {
    /// Whether the agent should currently stop on this breakpoint.
    pub fn is_armed(self) -> bool {
        !matches!(self, Arming::Disabled)
    }
}

/// Mode argument of the enable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableMode {
    /// Armed indefinitely.
    Plain,
    /// Armed, auto-disables after the next hit.
    Once,
    /// Armed, disables after N hits.
    Count(u32),
    /// Marks the breakpoint temporary: removed rather than disabled on the
    /// next hit.
    Delete,
}

/// Registry-level lifecycle state, derived from location and native index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointState {
    Pending,
    Resolved,
    Loaded,
}

// ── LogicalBreakpoint ────────────────────────────────────────────────────────

/// A source-level breakpoint or catchpoint managed by this core.
#[derive(Debug, Clone)]
pub struct LogicalBreakpoint {
    /// Session-unique identity.
    pub bpnum: BpNum,
    /// The location spec as the user wrote it; re-resolution re-runs the
    /// resolver over this text.
    pub spec: String,
    /// Current resolution of `spec`.
    pub location: Location,
    /// Arming state, including countdown modes.
    pub arming: Arming,
    /// Delete after the first reported hit.
    pub temporary: bool,
    /// Hits the agent swallows before stopping; forwarded opaquely.
    pub ignore_count: u32,
    /// Authoritative hit counter, refreshed from the agent on every stop.
    pub hit_count: u64,
    /// Opaque condition expression; never evaluated in-core.
    pub condition: Option<String>,
    /// Thread the breakpoint applies to; 0 means any.
    pub thread: u64,
    /// Agent-side slot, present only while loaded.
    pub native_index: Option<NativeIndex>,
}

impl LogicalBreakpoint {
    fn new(bpnum: BpNum, spec: &str, location: Location, temporary: bool) -> Self {
        Self {
            bpnum,
            spec: spec.to_string(),
            location,
            arming: Arming::Enabled,
            temporary,
            ignore_count: 0,
            hit_count: 0,
            condition: None,
            thread: 0,
            native_index: None,
        }
    }

    /// Lifecycle state. Loaded implies resolved by invariant.
    pub fn state(&self) -> BreakpointState {
        if self.native_index.is_some() {
            BreakpointState::Loaded
        } else if self.location.is_resolved() {
            BreakpointState::Resolved
        } else {
            BreakpointState::Pending
        }
    }

    /// The field tuple the agent receives, if the location is concrete.
    fn sync_tuple(&self) -> Option<BreakpointSync> {
        match &self.location {
            Location::Resolved { filename, line } => Some(BreakpointSync {
                bpnum: self.bpnum,
                slot: 0,
                thread: self.thread,
                condition: self.condition.clone(),
                ignore_count: self.ignore_count,
                enabled: self.arming.is_armed(),
                line: *line,
                filename: filename.clone(),
            }),
            _ => None,
        }
    }

    /// One-line human description.
    pub fn describe(&self) -> String {
        format!(
            "bpnum={}, location={}, hit_count={}",
            self.bpnum, self.location, self.hit_count
        )
    }

    /// One-line description in catchpoint form.
    pub fn describe_catchpoint(&self) -> String {
        let kind = if self.temporary {
            "Temporary catchpoint"
        } else {
            "Catchpoint"
        };
        format!("{} #{}, catch {}", kind, self.bpnum, self.location)
    }
}

// ── HitOutcome ───────────────────────────────────────────────────────────────

/// Result of dispatching a breakpoint stop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitOutcome {
    /// The slot matched no registry entry; logged, not fatal.
    Unmatched { native_index: NativeIndex },
    /// A logical breakpoint was hit.
    Hit {
        bpnum: BpNum,
        /// Description of the breakpoint as reported to the user.
        report: String,
        /// Whether the breakpoint was temporary and has been removed.
        removed: bool,
    },
}

// ── BreakpointRegistry ───────────────────────────────────────────────────────

/// Owner of the ordered logical breakpoint and catchpoint collections.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    breakpoints: Vec<LogicalBreakpoint>,
    catchpoints: Vec<LogicalBreakpoint>,
    /// Seeded at zero per session, never reset mid-session.
    last_bpnum: BpNum,
}

impl BreakpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_bpnum(&mut self) -> BpNum {
        self.last_bpnum += 1;
        self.last_bpnum
    }

    /// All breakpoints, creation order.
    pub fn breakpoints(&self) -> &[LogicalBreakpoint] {
        &self.breakpoints
    }

    /// All catchpoints, creation order.
    pub fn catchpoints(&self) -> &[LogicalBreakpoint] {
        &self.catchpoints
    }

    /// Find a breakpoint by id.
    pub fn find(&self, bpnum: BpNum) -> Option<&LogicalBreakpoint> {
        self.breakpoints.iter().find(|bp| bp.bpnum == bpnum)
    }

    // ── Creation ─────────────────────────────────────────────────────────────

    /// Register a breakpoint at an already-resolved (or pending) location
    /// and push it to the agent if possible.
    pub fn add_breakpoint(
        &mut self,
        spec: &str,
        location: Location,
        temporary: bool,
        condition: Option<String>,
        agent: &mut dyn DebugAgent,
    ) -> BpNum {
        let bpnum = self.next_bpnum();
        let mut bp = LogicalBreakpoint::new(bpnum, spec, location, temporary);
        bp.condition = condition;
        load_entry(&mut bp, agent);
        debug!(bpnum, state = ?bp.state(), "breakpoint created");
        self.breakpoints.push(bp);
        bpnum
    }

    /// Register a catchpoint. The caller batches the native update with
    /// [`BreakpointRegistry::sync_catch_patterns`] once per command.
    pub fn add_catchpoint(&mut self, kind: CatchKind, name: &str, temporary: bool) -> BpNum {
        let bpnum = self.next_bpnum();
        let spec = format!("{}:{}", kind.as_str(), name);
        let location = Location::Special {
            kind,
            name: name.to_string(),
        };
        self.catchpoints
            .push(LogicalBreakpoint::new(bpnum, &spec, location, temporary));
        bpnum
    }

    // ── Native synchronization ───────────────────────────────────────────────

    /// Push one breakpoint's state to the agent.
    pub fn load(&mut self, bpnum: BpNum, agent: &mut dyn DebugAgent) -> DebugResult<()> {
        let bp = self.find_mut(bpnum)?;
        load_entry(bp, agent);
        Ok(())
    }

    /// Drop one breakpoint's runtime slot.
    pub fn unload(&mut self, bpnum: BpNum, agent: &mut dyn DebugAgent) -> DebugResult<()> {
        let bp = self.find_mut(bpnum)?;
        unload_entry(bp, agent);
        Ok(())
    }

    /// Space-joined targets of every armed catchpoint of `kind`.
    pub fn catch_patterns(&self, kind: CatchKind) -> String {
        let names: Vec<&str> = self
            .catchpoints
            .iter()
            .filter(|cp| cp.arming.is_armed())
            .filter_map(|cp| match &cp.location {
                Location::Special { kind: k, name } if *k == kind => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.join(" ")
    }

    /// Re-send both catchpoint channels; one call per kind, not per entry.
    pub fn sync_catch_patterns(&self, agent: &mut dyn DebugAgent) {
        if !agent.is_target_running() {
            return;
        }
        for kind in [CatchKind::Exception, CatchKind::Call] {
            agent.set_catch_patterns(kind, &self.catch_patterns(kind));
        }
    }

    /// The target was (re)launched: every old slot index is dead. Reset them
    /// and push all resolved breakpoints and catch patterns afresh.
    pub fn on_run_started(&mut self, agent: &mut dyn DebugAgent) {
        for bp in &mut self.breakpoints {
            bp.native_index = None;
            load_entry(bp, agent);
        }
        self.sync_catch_patterns(agent);
    }

    /// The target exited: revert every loaded breakpoint to resolved.
    pub fn on_target_exit(&mut self) {
        for bp in &mut self.breakpoints {
            if bp.native_index.take().is_some() {
                debug!(bpnum = bp.bpnum, "breakpoint reverted to resolved");
            }
        }
    }

    // ── Re-resolution ────────────────────────────────────────────────────────

    /// Symbols for `file` just arrived: retry every breakpoint pending on it
    /// (or on no particular file) and load the ones that now resolve.
    pub fn resolve_pending(
        &mut self,
        file: &str,
        store: &SymbolStore,
        agent: &mut dyn DebugAgent,
    ) -> Vec<BpNum> {
        let ctx = ResolveContext {
            current_file: Some(file),
            current_line: None,
        };
        let mut resolved = Vec::new();
        for bp in &mut self.breakpoints {
            if !bp.location.is_pending_on(file) {
                continue;
            }
            match resolve(&bp.spec, ctx, store) {
                Ok(location @ Location::Resolved { .. }) => {
                    bp.location = location;
                    load_entry(bp, agent);
                    debug!(bpnum = bp.bpnum, location = %bp.location, "pending breakpoint resolved");
                    resolved.push(bp.bpnum);
                }
                Ok(_) => {}
                // A spec that re-resolves to a syntax error stays pending;
                // it was accepted once and deleting it here would be rude.
                Err(_) => {}
            }
        }
        resolved
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Delete breakpoints by id, or all of them. Returns the removed ids.
    pub fn delete(&mut self, ids: Option<&[BpNum]>, agent: &mut dyn DebugAgent) -> Vec<BpNum> {
        let mut removed = Vec::new();
        self.breakpoints.retain_mut(|bp| {
            let matches = ids.map_or(true, |ids| ids.contains(&bp.bpnum));
            if matches {
                unload_entry(bp, agent);
                removed.push(bp.bpnum);
            }
            !matches
        });
        removed
    }

    /// Delete catchpoints by id, or all of them, and re-send the patterns.
    pub fn delete_catchpoints(
        &mut self,
        ids: Option<&[BpNum]>,
        agent: &mut dyn DebugAgent,
    ) -> Vec<BpNum> {
        let mut removed = Vec::new();
        self.catchpoints.retain(|cp| {
            let matches = ids.map_or(true, |ids| ids.contains(&cp.bpnum));
            if matches {
                removed.push(cp.bpnum);
            }
            !matches
        });
        if !removed.is_empty() {
            self.sync_catch_patterns(agent);
        }
        removed
    }

    /// Delete every breakpoint whose resolved location equals `location`.
    pub fn clear_at(&mut self, location: &Location, agent: &mut dyn DebugAgent) -> Vec<BpNum> {
        let mut removed = Vec::new();
        self.breakpoints.retain_mut(|bp| {
            let matches = bp.location == *location;
            if matches {
                unload_entry(bp, agent);
                removed.push(bp.bpnum);
            }
            !matches
        });
        removed
    }

    /// Delete every catchpoint whose target name equals `name`.
    pub fn clear_catchpoints_named(
        &mut self,
        name: &str,
        agent: &mut dyn DebugAgent,
    ) -> Vec<BpNum> {
        let mut removed = Vec::new();
        self.catchpoints.retain(|cp| {
            let matches = matches!(&cp.location, Location::Special { name: n, .. } if n == name);
            if matches {
                removed.push(cp.bpnum);
            }
            !matches
        });
        if !removed.is_empty() {
            self.sync_catch_patterns(agent);
        }
        removed
    }

    /// Arm breakpoints per `mode` and push the change.
    pub fn enable(
        &mut self,
        ids: &[BpNum],
        mode: EnableMode,
        agent: &mut dyn DebugAgent,
    ) -> DebugResult<()> {
        for &id in ids {
            let bp = self.find_mut(id)?;
            match mode {
                EnableMode::Plain => bp.arming = Arming::Enabled,
                EnableMode::Once => bp.arming = Arming::Countdown(1),
                EnableMode::Count(n) => bp.arming = Arming::Countdown(n),
                EnableMode::Delete => bp.temporary = true,
            }
            load_entry(bp, agent);
        }
        Ok(())
    }

    /// Disarm breakpoints by id, or all of them, and push the change.
    pub fn disable(
        &mut self,
        ids: Option<&[BpNum]>,
        agent: &mut dyn DebugAgent,
    ) -> DebugResult<()> {
        if let Some(ids) = ids {
            for &id in ids {
                let bp = self.find_mut(id)?;
                bp.arming = Arming::Disabled;
                load_entry(bp, agent);
            }
        } else {
            for bp in &mut self.breakpoints {
                bp.arming = Arming::Disabled;
                load_entry(bp, agent);
            }
        }
        Ok(())
    }

    // ── Hit dispatch ─────────────────────────────────────────────────────────

    /// Dispatch a breakpoint stop notification.
    ///
    /// Refreshes every loaded breakpoint's hit counter from the agent's
    /// authoritative table, then applies countdown and temporary semantics
    /// to the hit entry.
    pub fn record_hit(
        &mut self,
        native_index: NativeIndex,
        hit_counts: &[(NativeIndex, u64)],
        agent: &mut dyn DebugAgent,
    ) -> HitOutcome {
        for bp in &mut self.breakpoints {
            if let Some(index) = bp.native_index {
                if let Some((_, count)) = hit_counts.iter().find(|(i, _)| *i == index) {
                    bp.hit_count = *count;
                }
            }
        }

        let Some(pos) = self
            .breakpoints
            .iter()
            .position(|bp| bp.native_index == Some(native_index))
        else {
            warn!(native_index, "stop event for unknown breakpoint slot");
            return HitOutcome::Unmatched { native_index };
        };

        let bp = &mut self.breakpoints[pos];
        let report = bp.describe();
        let bpnum = bp.bpnum;

        if let Arming::Countdown(n) = bp.arming {
            bp.arming = if n <= 1 {
                Arming::Disabled
            } else {
                Arming::Countdown(n - 1)
            };
            load_entry(bp, agent);
        }

        let removed = bp.temporary;
        if removed {
            unload_entry(bp, agent);
            self.breakpoints.remove(pos);
            debug!(bpnum, "temporary breakpoint removed after hit");
        }

        HitOutcome::Hit {
            bpnum,
            report,
            removed,
        }
    }

    /// Dispatch a catchpoint stop: remove every temporary catchpoint of
    /// `kind` targeting `name`, re-sending the patterns once if any went.
    pub fn on_catch_hit(
        &mut self,
        kind: CatchKind,
        name: &str,
        agent: &mut dyn DebugAgent,
    ) -> Vec<BpNum> {
        let mut removed = Vec::new();
        self.catchpoints.retain(|cp| {
            let matches = cp.temporary
                && matches!(
                    &cp.location,
                    Location::Special { kind: k, name: n } if *k == kind && n == name
                );
            if matches {
                removed.push(cp.bpnum);
            }
            !matches
        });
        if !removed.is_empty() {
            self.sync_catch_patterns(agent);
        }
        removed
    }

    fn find_mut(&mut self, bpnum: BpNum) -> DebugResult<&mut LogicalBreakpoint> {
        self.breakpoints
            .iter_mut()
            .find(|bp| bp.bpnum == bpnum)
            .ok_or(DebugError::NoBreakpoint(bpnum))
    }
}

/// Push `bp` to the agent if it is resolved and the target runs.
///
/// Idempotent: inserts on first load, re-sends the same slot on update.
fn load_entry(bp: &mut LogicalBreakpoint, agent: &mut dyn DebugAgent) {
    let Some(sync) = bp.sync_tuple() else {
        return;
    };
    if !agent.is_target_running() {
        return;
    }
    match bp.native_index {
        Some(index) => agent.update_breakpoint(index, &sync),
        None => {
            let index = agent.insert_breakpoint(&sync);
            bp.native_index = Some(index);
            debug!(bpnum = bp.bpnum, index, "breakpoint loaded");
        }
    }
}

/// Tell the agent to forget `bp`'s slot, if it has one.
fn unload_entry(bp: &mut LogicalBreakpoint, agent: &mut dyn DebugAgent) {
    if let Some(index) = bp.native_index.take() {
        if agent.is_target_running() {
            agent.remove_breakpoint(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{symbol_index, MockAgent};

    fn resolved(file: &str, line: u32) -> Location {
        Location::Resolved {
            filename: file.to_string(),
            line,
        }
    }

    fn pending(file: Option<&str>) -> Location {
        Location::Unresolved {
            filename: file.map(str::to_string),
        }
    }

    #[test]
    fn test_bpnums_are_sequential_and_never_reused() {
        let mut agent = MockAgent::new(false);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:1", resolved("x.py", 1), false, None, &mut agent);
        let b = reg.add_breakpoint("x.py:2", resolved("x.py", 2), false, None, &mut agent);
        assert_eq!((a, b), (1, 2));
        reg.delete(Some(&[b]), &mut agent);
        let c = reg.add_breakpoint("x.py:3", resolved("x.py", 3), false, None, &mut agent);
        assert_eq!(c, 3);
    }

    #[test]
    fn test_resolved_breakpoint_loads_only_while_running() {
        let mut agent = MockAgent::new(false);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:5", resolved("x.py", 5), false, None, &mut agent);
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Resolved);
        assert!(agent.inserted.is_empty());

        agent.running = true;
        reg.on_run_started(&mut agent);
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Loaded);
        assert_eq!(agent.inserted.len(), 1);
        assert_eq!(agent.inserted[0].1.filename, "x.py");
        assert_eq!(agent.inserted[0].1.line, 5);
    }

    #[test]
    fn test_target_exit_reverts_loaded_to_resolved() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:5", resolved("x.py", 5), false, None, &mut agent);
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Loaded);

        agent.running = false;
        reg.on_target_exit();
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Resolved);

        // Relaunch pushes the whole set afresh under new slots.
        agent.running = true;
        reg.on_run_started(&mut agent);
        assert_eq!(agent.inserted.len(), 2);
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Loaded);
    }

    #[test]
    fn test_pending_breakpoint_resolves_when_symbols_arrive() {
        let mut agent = MockAgent::new(true);
        let mut store = SymbolStore::new();
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("main", pending(None), false, None, &mut agent);
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Pending);

        store.put("app.py", symbol_index(&[("main", 12)]), false);
        let resolved_ids = reg.resolve_pending("app.py", &store, &mut agent);
        assert_eq!(resolved_ids, vec![a]);
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Loaded);
        assert_eq!(agent.inserted[0].1.line, 12);
    }

    #[test]
    fn test_pending_on_other_file_is_not_retried() {
        let mut agent = MockAgent::new(true);
        let mut store = SymbolStore::new();
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint(
            "lib.py:helper",
            pending(Some("lib.py")),
            false,
            None,
            &mut agent,
        );

        store.put("app.py", symbol_index(&[("helper", 3)]), false);
        assert!(reg.resolve_pending("app.py", &store, &mut agent).is_empty());
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Pending);
    }

    #[test]
    fn test_disable_updates_loaded_slot_in_place() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:5", resolved("x.py", 5), false, None, &mut agent);
        reg.disable(Some(&[a]), &mut agent).unwrap();

        assert_eq!(agent.updated.len(), 1);
        assert!(!agent.updated[0].1.enabled);
        // Disabling keeps the slot, it does not remove it.
        assert!(agent.removed.is_empty());
        assert_eq!(reg.find(a).unwrap().state(), BreakpointState::Loaded);
    }

    #[test]
    fn test_countdown_disables_after_n_hits() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:5", resolved("x.py", 5), false, None, &mut agent);
        let slot = reg.find(a).unwrap().native_index.unwrap();
        reg.enable(&[a], EnableMode::Count(2), &mut agent).unwrap();

        reg.record_hit(slot, &[(slot, 1)], &mut agent);
        assert_eq!(reg.find(a).unwrap().arming, Arming::Countdown(1));
        reg.record_hit(slot, &[(slot, 2)], &mut agent);
        assert_eq!(reg.find(a).unwrap().arming, Arming::Disabled);
        assert_eq!(reg.find(a).unwrap().hit_count, 2);
    }

    #[test]
    fn test_temporary_breakpoint_removed_on_hit() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:5", resolved("x.py", 5), true, None, &mut agent);
        let slot = reg.find(a).unwrap().native_index.unwrap();

        match reg.record_hit(slot, &[(slot, 1)], &mut agent) {
            HitOutcome::Hit { bpnum, removed, .. } => {
                assert_eq!(bpnum, a);
                assert!(removed);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(reg.find(a).is_none());
        assert_eq!(agent.removed, vec![slot]);
    }

    #[test]
    fn test_unknown_slot_is_reported_not_fatal() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let outcome = reg.record_hit(7, &[], &mut agent);
        assert_eq!(outcome, HitOutcome::Unmatched { native_index: 7 });
    }

    #[test]
    fn test_catch_patterns_batch_per_kind() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        reg.add_catchpoint(CatchKind::Exception, "ValueError", false);
        reg.add_catchpoint(CatchKind::Exception, "KeyError", false);
        reg.add_catchpoint(CatchKind::Call, "connect", false);
        reg.sync_catch_patterns(&mut agent);

        assert_eq!(
            agent.last_patterns(CatchKind::Exception),
            Some("ValueError KeyError")
        );
        assert_eq!(agent.last_patterns(CatchKind::Call), Some("connect"));
        // One call per channel, not per catchpoint.
        assert_eq!(agent.catch_patterns.len(), 2);
    }

    #[test]
    fn test_temporary_catchpoint_cleared_on_hit() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let t = reg.add_catchpoint(CatchKind::Exception, "ValueError", true);
        reg.add_catchpoint(CatchKind::Exception, "KeyError", false);

        let removed = reg.on_catch_hit(CatchKind::Exception, "ValueError", &mut agent);
        assert_eq!(removed, vec![t]);
        assert_eq!(agent.last_patterns(CatchKind::Exception), Some("KeyError"));
        assert_eq!(reg.catchpoints().len(), 1);
    }

    #[test]
    fn test_clear_at_deletes_by_location() {
        let mut agent = MockAgent::new(true);
        let mut reg = BreakpointRegistry::new();
        let a = reg.add_breakpoint("x.py:5", resolved("x.py", 5), false, None, &mut agent);
        let b = reg.add_breakpoint("x.py:9", resolved("x.py", 9), false, None, &mut agent);

        let removed = reg.clear_at(&resolved("x.py", 5), &mut agent);
        assert_eq!(removed, vec![a]);
        assert!(reg.find(a).is_none());
        assert!(reg.find(b).is_some());
    }
}
