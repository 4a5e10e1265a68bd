//! Process-wide feature flags resolved once at bootstrap.

use tracing::debug;

use crate::core::memory::PersistedState;

/// Environment variable that overrides the task-system flag.
pub const TASK_SYSTEM_ENV: &str = "TASK_SYSTEM_ENABLED";

/// Three-valued environment override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvOverride {
    Enabled,
    Disabled,
    #[default]
    Unset,
}

impl EnvOverride {
    /// Only the exact literals `"true"` and `"false"` carry an opinion.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("true") => EnvOverride::Enabled,
            Some("false") => EnvOverride::Disabled,
            _ => EnvOverride::Unset,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(TASK_SYSTEM_ENV).ok().as_deref())
    }
}

/// Fixed tuning constants supplied at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub cpu_safety_margin: f64,
    pub max_cpu_per_creep: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            cpu_safety_margin: 0.8,
            max_cpu_per_creep: 1.5,
        }
    }
}

/// Resolved feature flags. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureFlagConfig {
    pub use_task_system: bool,
    pub cpu_safety_margin: f64,
    pub max_cpu_per_creep: f64,
}

/// Which input decided `use_task_system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSource {
    Environment,
    Persisted,
    Default,
}

/// Derives [`FeatureFlagConfig`] from the environment override and persisted state.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env: EnvOverride,
    tuning: Tuning,
}

impl ConfigResolver {
    pub fn new(env: EnvOverride, tuning: Tuning) -> Self {
        Self { env, tuning }
    }

    /// Resolve the flags. First match wins:
    /// 1. env `"false"` → off
    /// 2. env `"true"` → on
    /// 3. persisted `taskSystem` strictly `false` → off
    /// 4. otherwise on
    ///
    /// `persisted` may be `None` when the host has not made state available yet.
    pub fn resolve(&self, persisted: Option<&PersistedState>) -> FeatureFlagConfig {
        let (use_task_system, source) = match self.env {
            EnvOverride::Disabled => (false, FlagSource::Environment),
            EnvOverride::Enabled => (true, FlagSource::Environment),
            EnvOverride::Unset => match persisted.and_then(PersistedState::task_system_flag) {
                Some(false) => (false, FlagSource::Persisted),
                _ => (true, FlagSource::Default),
            },
        };
        debug!(use_task_system, ?source, "resolved task system flag");
        FeatureFlagConfig {
            use_task_system,
            cpu_safety_margin: self.tuning.cpu_safety_margin,
            max_cpu_per_creep: self.tuning.max_cpu_per_creep,
        }
    }
}
