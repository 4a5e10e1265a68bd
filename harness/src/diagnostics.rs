//! Console diagnostics utility published next to the profiler.

use crate::core::memory::PersistedState;
use crate::core::world::{Capability, RawWorldView, validate_world};

/// Read-only summaries for interactive inspection.
#[derive(Debug, Default, Clone, Copy)]
pub struct Diagnostics;

impl Diagnostics {
    /// One line per persisted substructure the harness knows about.
    pub fn memory_report(&self, memory: &PersistedState) -> String {
        let profiler = match memory.profiler() {
            None => "absent".to_string(),
            Some(record) => format!(
                "{} instruments, {}",
                record.instruments().count(),
                match record.start_label() {
                    Some(start) => format!("running since {start}"),
                    None => "stopped".to_string(),
                }
            ),
        };
        let task_system = match memory.task_system_flag() {
            Some(flag) => flag.to_string(),
            None => "unset".to_string(),
        };
        let repository = if memory.repository_signal().is_some() {
            "present"
        } else {
            "absent"
        };
        let mut other: Vec<&str> = memory.extra.keys().map(String::as_str).collect();
        other.sort_unstable();
        format!(
            "profiler: {profiler}\ntaskSystem: {task_system}\nrepository signal: {repository}\nother keys: {}",
            if other.is_empty() {
                "-".to_string()
            } else {
                other.join(", ")
            }
        )
    }

    /// Whether a world view would pass validation, and if not, why.
    pub fn world_report(&self, world: &RawWorldView) -> String {
        match validate_world(world) {
            Ok(ctx) => format!(
                "world ok at tick {} ({} required groups present)",
                ctx.tick(),
                Capability::REQUIRED.len()
            ),
            Err(err) => err.to_string(),
        }
    }
}
