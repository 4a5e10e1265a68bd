//! Process start: everything that happens once before the first tick.
//!
//! Feature flags are resolved here and only here. The profiler handle is
//! created once and published to every inspection surface together with the
//! diagnostics utility. A recycled process starts over from this point.

use std::rc::Rc;

use tracing::info;

use crate::core::config::{ConfigResolver, EnvOverride, Tuning};
use crate::core::memory::PersistedState;
use crate::core::profiler::{
    MemoryProfiler, PROFILER_ENABLED, ProfilerHandle, ProfilerLifecycleManager,
};
use crate::diagnostics::Diagnostics;
use crate::io::console::ConsoleSink;
use crate::io::globals::{
    DIAGNOSTICS_GLOBAL, GlobalHandle, InspectionSurface, PROFILER_GLOBAL, Publisher,
};
use crate::kernel::{
    BehaviorController, Kernel, KernelOptions, StandardKernel, create_kernel,
    default_repository_signal_provider,
};
use crate::tick::TickHarness;

/// Inputs gathered by the host adapter before bootstrap.
pub struct BootstrapOptions {
    pub env: EnvOverride,
    pub tuning: Tuning,
    /// Build-time auto-start switch.
    pub profiler_enabled: bool,
    pub profiler: Rc<dyn ProfilerHandle>,
    pub surfaces: Vec<Rc<dyn InspectionSurface>>,
}

impl BootstrapOptions {
    /// Options for a deployed process: environment override from
    /// `TASK_SYSTEM_ENABLED`, the compiled profiler switch and the
    /// memory-backed profiler.
    pub fn from_env(tuning: Tuning, surfaces: Vec<Rc<dyn InspectionSurface>>) -> Self {
        Self {
            env: EnvOverride::from_env(),
            tuning,
            profiler_enabled: PROFILER_ENABLED,
            profiler: Rc::new(MemoryProfiler),
            surfaces,
        }
    }
}

/// Build a harness around a kernel produced by `kernel_factory`.
///
/// `persisted` is whatever state the host has made available at process start;
/// it may be `None`.
pub fn bootstrap<K, C, F>(
    options: BootstrapOptions,
    persisted: Option<&PersistedState>,
    console: C,
    kernel_factory: F,
) -> TickHarness<K, C>
where
    K: Kernel,
    C: ConsoleSink,
    F: FnOnce(KernelOptions) -> K,
{
    let config = ConfigResolver::new(options.env, options.tuning).resolve(persisted);
    info!(
        use_task_system = config.use_task_system,
        cpu_safety_margin = config.cpu_safety_margin,
        max_cpu_per_creep = config.max_cpu_per_creep,
        "feature flags resolved"
    );

    let kernel = kernel_factory(KernelOptions {
        repository_signal_provider: default_repository_signal_provider(),
        behavior: BehaviorController::new(config),
    });

    let publisher = Publisher::new(options.surfaces);
    publisher.publish(
        PROFILER_GLOBAL,
        GlobalHandle::Profiler(options.profiler.clone()),
    );
    publisher.publish(
        DIAGNOSTICS_GLOBAL,
        GlobalHandle::Diagnostics(Rc::new(Diagnostics)),
    );

    let lifecycle = ProfilerLifecycleManager::new(options.profiler_enabled, options.profiler);
    TickHarness::new(config, lifecycle, kernel, console)
}

/// [`bootstrap`] with the default kernel.
pub fn bootstrap_standard<C: ConsoleSink>(
    options: BootstrapOptions,
    persisted: Option<&PersistedState>,
    console: C,
) -> TickHarness<StandardKernel, C> {
    bootstrap(options, persisted, console, create_kernel)
}
