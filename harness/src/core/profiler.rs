//! Diagnostic profiler handle and its one-shot auto-start lifecycle.

use std::rc::Rc;

use tracing::{debug, info};

use crate::core::memory::{Lenient, PersistedState, ProfilerMemory};

/// Build-time switch for the auto-start subsystem (`profiler` cargo feature).
pub const PROFILER_ENABLED: bool = cfg!(feature = "profiler");

/// Console-facing profiler controls.
///
/// Each operation returns the message shown to whoever invoked it. Handles are
/// shared: one instance is published for interactive use and also retained by
/// the lifecycle manager.
pub trait ProfilerHandle {
    fn start(&self, memory: &mut PersistedState, now: u64) -> String;
    fn stop(&self, memory: &mut PersistedState, now: u64) -> String;
    fn status(&self, memory: &PersistedState) -> String;
    fn output(&self, memory: &PersistedState) -> String;
    fn clear(&self, memory: &mut PersistedState, now: u64) -> String;
    fn describe(&self) -> String;
}

/// Profiler that keeps all of its data in the persisted profiler record.
#[derive(Debug, Default)]
pub struct MemoryProfiler;

impl ProfilerHandle for MemoryProfiler {
    fn start(&self, memory: &mut PersistedState, now: u64) -> String {
        let record = memory.profiler_or_init();
        if record.is_running() {
            return "Profiler already running".to_string();
        }
        record.set_start(Some(now));
        "Profiler started".to_string()
    }

    fn stop(&self, memory: &mut PersistedState, now: u64) -> String {
        let Some(record) = memory.profiler_mut() else {
            return "Profiler not running".to_string();
        };
        match record.start.take() {
            Some(Lenient::Parsed(start)) => {
                record.add_total(now.saturating_sub(start) as f64);
                "Profiler stopped".to_string()
            }
            // Marker is not a tick number, so the session length is unknown.
            Some(Lenient::Raw(_)) => "Profiler stopped".to_string(),
            None => "Profiler not running".to_string(),
        }
    }

    fn status(&self, memory: &PersistedState) -> String {
        match memory.profiler().and_then(ProfilerMemory::start_label) {
            Some(start) => format!("Profiler is running since tick {start}"),
            None => "Profiler is stopped".to_string(),
        }
    }

    fn output(&self, memory: &PersistedState) -> String {
        match memory.profiler() {
            Some(record) if record.has_data() => render_output(record),
            _ => "Profiler has no data".to_string(),
        }
    }

    fn clear(&self, memory: &mut PersistedState, now: u64) -> String {
        let record = memory.profiler_or_init();
        record.reset_data();
        if record.is_running() {
            record.set_start(Some(now));
        }
        "Profiler data cleared".to_string()
    }

    fn describe(&self) -> String {
        "Profiler: start() stop() status() output() clear()".to_string()
    }
}

fn render_output(record: &ProfilerMemory) -> String {
    let mut rows: Vec<_> = record.instruments().collect();
    rows.sort_by(|(left_name, left), (right_name, right)| {
        right
            .time
            .total_cmp(&left.time)
            .then_with(|| left_name.cmp(right_name))
    });
    let mut out = format!(
        "{:<32} {:>8} {:>12} {:>10}\n",
        "name", "calls", "cpu", "avg"
    );
    for (name, data) in rows {
        let avg = if data.calls == 0 {
            0.0
        } else {
            data.time / data.calls as f64
        };
        out.push_str(&format!(
            "{:<32} {:>8} {:>12.3} {:>10.3}\n",
            name, data.calls, data.time, avg
        ));
    }
    out.push_str(&format!("ticks profiled: {}", record.total()));
    out
}

/// Process-lifetime auto-start state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStartState {
    NotChecked,
    /// `start()` was invoked by the manager.
    AutoStarted,
    /// A session was already running when the process came up.
    Skipped,
}

impl AutoStartState {
    pub fn is_decided(self) -> bool {
        !matches!(self, AutoStartState::NotChecked)
    }
}

/// Decides once per process whether to auto-start the profiler.
pub struct ProfilerLifecycleManager {
    enabled: bool,
    handle: Rc<dyn ProfilerHandle>,
    state: AutoStartState,
}

impl ProfilerLifecycleManager {
    pub fn new(enabled: bool, handle: Rc<dyn ProfilerHandle>) -> Self {
        Self {
            enabled,
            handle,
            state: AutoStartState::NotChecked,
        }
    }

    pub fn state(&self) -> AutoStartState {
        self.state
    }

    /// Per-tick check. Returns the transition taken on the deciding tick and
    /// `None` on every other tick (including every tick when disabled).
    pub fn check(&mut self, memory: &mut PersistedState, now: u64) -> Option<AutoStartState> {
        if !self.enabled || self.state.is_decided() {
            return None;
        }
        let marker = memory.profiler().and_then(ProfilerMemory::start_label);
        self.state = match marker {
            None => {
                memory.profiler_or_init();
                self.handle.start(memory, now);
                info!(tick = now, "profiler auto-started");
                AutoStartState::AutoStarted
            }
            Some(start) => {
                debug!(%start, "profiler already running; auto-start skipped");
                AutoStartState::Skipped
            }
        };
        Some(self.state)
    }
}
