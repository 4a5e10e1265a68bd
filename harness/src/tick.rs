//! Orchestration for a single host tick.
//!
//! Each tick runs, in order: the profiler lifecycle check, world validation and
//! the kernel. Everything that escapes those steps (returned errors and panics
//! alike) is caught once at the outer boundary, classified and written to the
//! console. [`TickHarness::tick`] itself never fails.

use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::classifier::{Thrown, classify};
use crate::core::config::FeatureFlagConfig;
use crate::core::memory::PersistedState;
use crate::core::profiler::{AutoStartState, ProfilerLifecycleManager};
use crate::core::types::TickOutcome;
use crate::core::world::{RawWorldView, validate_world};
use crate::io::console::{ConsoleSink, PROFILER_TAG};
use crate::kernel::Kernel;

/// Per-process tick harness.
pub struct TickHarness<K: Kernel, C: ConsoleSink> {
    config: FeatureFlagConfig,
    lifecycle: ProfilerLifecycleManager,
    kernel: K,
    console: C,
}

impl<K: Kernel, C: ConsoleSink> TickHarness<K, C> {
    pub fn new(
        config: FeatureFlagConfig,
        lifecycle: ProfilerLifecycleManager,
        kernel: K,
        console: C,
    ) -> Self {
        Self {
            config,
            lifecycle,
            kernel,
            console,
        }
    }

    /// Flags resolved at bootstrap; fixed for the life of the process.
    pub fn config(&self) -> &FeatureFlagConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &ProfilerLifecycleManager {
        &self.lifecycle
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Run one tick. Never returns an error and never unwinds.
    #[instrument(skip_all, fields(tick = world.tick()))]
    pub fn tick(&mut self, world: &RawWorldView, memory: &mut PersistedState) -> TickOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.run_tick(world, memory)));
        let thrown = match attempt {
            Ok(Ok(())) => {
                debug!("tick completed");
                return TickOutcome::Completed;
            }
            Ok(Err(err)) => Thrown::Error(err),
            Err(payload) => Thrown::Panic(payload),
        };

        let record = classify(&thrown);
        warn!(kind = ?record.kind, message = %record.message, "tick abandoned");
        for line in record.log_lines() {
            self.console.line(&line);
        }
        TickOutcome::Failed(record.kind)
    }

    fn run_tick(&mut self, world: &RawWorldView, memory: &mut PersistedState) -> Result<()> {
        if self.lifecycle.check(memory, world.tick()) == Some(AutoStartState::AutoStarted) {
            self.console
                .line(&format!("{PROFILER_TAG} Auto-started profiler data collection"));
        }
        let context = validate_world(world)?;
        self.kernel.run(context, memory)
    }
}
