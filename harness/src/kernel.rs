//! Kernel contract consumed by the tick harness, plus the default kernel.
//!
//! Decision making about in-world entities lives behind [`Kernel`]. The
//! default [`StandardKernel`] only plans the per-tick CPU budget through its
//! [`BehaviorController`]; richer kernels plug in through the same trait.

use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::debug;

use crate::core::config::FeatureFlagConfig;
use crate::core::memory::{PersistedState, RepositorySignal};
use crate::core::world::GameContext;

/// Per-tick entry point of a kernel.
pub trait Kernel {
    /// Run one tick against a validated world view. The return value carries
    /// only failure; the harness does not inspect success.
    fn run(&mut self, world: GameContext<'_>, memory: &mut PersistedState) -> Result<()>;
}

/// Supplies the latest repository signal from persisted state, if any.
pub type RepositorySignalProvider = Box<dyn Fn(&PersistedState) -> Option<RepositorySignal>>;

/// Provider reading `systemReport.report.repository`.
pub fn default_repository_signal_provider() -> RepositorySignalProvider {
    Box::new(|memory| memory.repository_signal().cloned())
}

/// Construction options for [`create_kernel`].
pub struct KernelOptions {
    pub repository_signal_provider: RepositorySignalProvider,
    pub behavior: BehaviorController,
}

pub fn create_kernel(options: KernelOptions) -> StandardKernel {
    StandardKernel {
        repository_signal_provider: options.repository_signal_provider,
        behavior: options.behavior,
        last_plan: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    TaskSystem,
    Legacy,
}

/// CPU plan for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickPlan {
    pub mode: ExecutionMode,
    pub cpu_budget: f64,
    /// Agent entities that fit in the budget, in name order.
    pub scheduled: Vec<String>,
    pub deferred: usize,
}

impl TickPlan {
    pub fn planned_cpu(&self, max_cpu_per_creep: f64) -> f64 {
        self.scheduled.len() as f64 * max_cpu_per_creep
    }
}

/// Behavior configuration handed to the kernel at construction.
#[derive(Debug, Clone)]
pub struct BehaviorController {
    config: FeatureFlagConfig,
}

impl BehaviorController {
    pub fn new(config: FeatureFlagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureFlagConfig {
        &self.config
    }

    /// Budget is `limit * cpu_safety_margin`, capped by `tickLimit` when the
    /// host reports one.
    pub fn plan(&self, world: &GameContext<'_>) -> Result<TickPlan> {
        let cpu = world.cpu();
        let limit = cpu
            .get("limit")
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow!("cpu interface has no numeric limit"))?;
        let mut cpu_budget = limit * self.config.cpu_safety_margin;
        if let Some(tick_limit) = cpu.get("tickLimit").and_then(Value::as_f64) {
            cpu_budget = cpu_budget.min(tick_limit);
        }

        let creeps = world
            .creeps()
            .as_object()
            .ok_or_else(|| anyhow!("creeps registry is not an object"))?;
        let capacity = (cpu_budget / self.config.max_cpu_per_creep).floor().max(0.0) as usize;
        let mut names: Vec<&String> = creeps.keys().collect();
        names.sort();
        let scheduled: Vec<String> = names.iter().take(capacity).map(|name| (*name).clone()).collect();
        let deferred = names.len() - scheduled.len();

        Ok(TickPlan {
            mode: if self.config.use_task_system {
                ExecutionMode::TaskSystem
            } else {
                ExecutionMode::Legacy
            },
            cpu_budget,
            scheduled,
            deferred,
        })
    }
}

/// Kernel that plans CPU usage and records its cost in the profiler.
pub struct StandardKernel {
    repository_signal_provider: RepositorySignalProvider,
    behavior: BehaviorController,
    last_plan: Option<TickPlan>,
}

impl StandardKernel {
    pub fn behavior(&self) -> &BehaviorController {
        &self.behavior
    }

    pub fn last_plan(&self) -> Option<&TickPlan> {
        self.last_plan.as_ref()
    }
}

impl Kernel for StandardKernel {
    fn run(&mut self, world: GameContext<'_>, memory: &mut PersistedState) -> Result<()> {
        let plan = self.behavior.plan(&world)?;
        debug!(
            tick = world.tick(),
            mode = ?plan.mode,
            cpu_budget = plan.cpu_budget,
            scheduled = plan.scheduled.len(),
            deferred = plan.deferred,
            "kernel plan"
        );
        if let Some(signal) = (self.repository_signal_provider)(memory) {
            debug!(
                coverage = ?signal.coverage,
                lint_errors = ?signal.lint_errors,
                test_failures = ?signal.test_failures,
                "repository signal"
            );
        }
        if let Some(profiler) = memory.profiler_mut().filter(|record| record.is_running()) {
            profiler.record(
                "kernel.run",
                plan.planned_cpu(self.behavior.config.max_cpu_per_creep),
            );
        }
        self.last_plan = Some(plan);
        Ok(())
    }
}
