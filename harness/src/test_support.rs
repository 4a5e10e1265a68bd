//! Test-only fakes and builders for driving the harness.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::bootstrap::BootstrapOptions;
use crate::core::config::{EnvOverride, FeatureFlagConfig, Tuning};
use crate::core::memory::{ExperimentalFeatures, Lenient, PersistedState};
use crate::core::profiler::{MemoryProfiler, ProfilerHandle};
use crate::core::world::{Capability, GameContext, RawWorldView, ValidationError};
use crate::kernel::{Kernel, KernelOptions};

/// What the next [`ScriptedKernel::run`] does.
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Ok,
    Fail(String),
    RejectWorld(Capability),
    Panic(String),
}

/// Kernel replaying a queue of scripted outcomes; `Ok` once the queue is empty.
pub struct ScriptedKernel {
    script: VecDeque<ScriptedRun>,
    pub config: FeatureFlagConfig,
    pub calls: u32,
    pub ticks_seen: Vec<u64>,
}

impl ScriptedKernel {
    /// Factory for [`crate::bootstrap::bootstrap`].
    pub fn factory(script: Vec<ScriptedRun>) -> impl FnOnce(KernelOptions) -> ScriptedKernel {
        move |options| ScriptedKernel {
            script: script.into(),
            config: *options.behavior.config(),
            calls: 0,
            ticks_seen: Vec::new(),
        }
    }
}

impl Kernel for ScriptedKernel {
    fn run(&mut self, world: GameContext<'_>, _memory: &mut PersistedState) -> Result<()> {
        self.calls += 1;
        self.ticks_seen.push(world.tick());
        match self.script.pop_front().unwrap_or(ScriptedRun::Ok) {
            ScriptedRun::Ok => Ok(()),
            ScriptedRun::Fail(message) => Err(anyhow!(message)),
            ScriptedRun::RejectWorld(missing) => Err(ValidationError { missing }.into()),
            ScriptedRun::Panic(message) => panic!("{message}"),
        }
    }
}

/// Memory-backed profiler that counts `start` calls.
#[derive(Debug, Default)]
pub struct CountingProfiler {
    inner: MemoryProfiler,
    starts: Cell<u32>,
}

impl CountingProfiler {
    pub fn starts(&self) -> u32 {
        self.starts.get()
    }
}

impl ProfilerHandle for CountingProfiler {
    fn start(&self, memory: &mut PersistedState, now: u64) -> String {
        self.starts.set(self.starts.get() + 1);
        self.inner.start(memory, now)
    }

    fn stop(&self, memory: &mut PersistedState, now: u64) -> String {
        self.inner.stop(memory, now)
    }

    fn status(&self, memory: &PersistedState) -> String {
        self.inner.status(memory)
    }

    fn output(&self, memory: &PersistedState) -> String {
        self.inner.output(memory)
    }

    fn clear(&self, memory: &mut PersistedState, now: u64) -> String {
        self.inner.clear(memory, now)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Options with default tuning and no inspection surfaces.
pub fn options_with(
    env: EnvOverride,
    profiler_enabled: bool,
    profiler: Rc<dyn ProfilerHandle>,
) -> BootstrapOptions {
    BootstrapOptions {
        env,
        tuning: Tuning::default(),
        profiler_enabled,
        profiler,
        surfaces: Vec::new(),
    }
}

/// World view exposing all four capability groups.
pub fn complete_world(time: u64) -> RawWorldView {
    world_from(json!({
        "time": time,
        "cpu": {"limit": 20, "tickLimit": 500, "bucket": 10000},
        "creeps": {"harvester1": {}, "upgrader1": {}},
        "spawns": {"Spawn1": {}},
        "rooms": {"W1N1": {}},
    }))
}

/// [`complete_world`] with the given groups removed.
pub fn world_without(time: u64, missing: &[Capability]) -> RawWorldView {
    let mut world = complete_world(time);
    for capability in missing {
        match capability {
            Capability::Cpu => world.cpu = None,
            Capability::Creeps => world.creeps = None,
            Capability::Spawns => world.spawns = None,
            Capability::Rooms => world.rooms = None,
        }
    }
    world
}

pub fn world_from(value: Value) -> RawWorldView {
    RawWorldView::from_value(value)
}

/// Persisted state carrying `experimentalFeatures.taskSystem`.
pub fn memory_with_task_flag(flag: Option<bool>) -> PersistedState {
    PersistedState {
        experimental_features: Some(Lenient::Parsed(ExperimentalFeatures::with_task_system(
            flag,
        ))),
        ..PersistedState::default()
    }
}

/// Persisted state whose profiler session started at `start`.
pub fn memory_with_running_profiler(start: u64) -> PersistedState {
    let mut memory = PersistedState::default();
    memory.profiler_or_init().set_start(Some(start));
    memory
}
