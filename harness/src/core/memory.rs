//! Host-owned persisted state that survives ticks and process restarts.
//!
//! Every substructure is optional and may be malformed (the host and older bot
//! versions write to the same object). Anything that does not match the shape
//! the harness expects is kept as a [`Lenient::Raw`] value and written back
//! unchanged, and every record keeps the keys it does not declare in `extra`.
//! Reads go through the accessors on [`PersistedState`], which treat a raw
//! value as absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A persisted value that either has the expected shape or is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Parsed(T),
    Raw(Value),
}

impl<T> Lenient<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            Lenient::Parsed(value) => Some(value),
            Lenient::Raw(_) => None,
        }
    }

    pub fn parsed_mut(&mut self) -> Option<&mut T> {
        match self {
            Lenient::Parsed(value) => Some(value),
            Lenient::Raw(_) => None,
        }
    }

    /// The parsed value, replacing a raw one with `T::default()`.
    pub fn parsed_or_reset(&mut self) -> &mut T
    where
        T: Default,
    {
        if let Lenient::Raw(_) = self {
            *self = Lenient::Parsed(T::default());
        }
        match self {
            Lenient::Parsed(value) => value,
            Lenient::Raw(_) => unreachable!("raw value replaced above"),
        }
    }
}

impl<T: Default> Default for Lenient<T> {
    fn default() -> Self {
        Lenient::Parsed(T::default())
    }
}

/// Persisted cross-tick state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiler: Option<Lenient<ProfilerMemory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_features: Option<Lenient<ExperimentalFeatures>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_report: Option<Lenient<SystemReport>>,
    /// Keys owned by other subsystems; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Profiler bookkeeping record.
///
/// Fields are read independently so one malformed entry never hides the start
/// marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilerMemory {
    #[serde(default)]
    pub data: Lenient<BTreeMap<String, Lenient<ProfilerData>>>,
    /// Start marker of the current session; `None` when stopped. Any non-null
    /// value counts as a marker, even one that is not a tick number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Lenient<u64>>,
    #[serde(default)]
    pub total: Lenient<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accumulated cost of one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilerData {
    #[serde(default)]
    pub calls: u64,
    #[serde(default)]
    pub time: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfilerMemory {
    /// Add one call of `elapsed` CPU to the named instrument.
    ///
    /// A raw instrument entry (or a raw `data` table) is replaced by a fresh one.
    pub fn record(&mut self, name: &str, elapsed: f64) {
        let entry = self
            .data
            .parsed_or_reset()
            .entry(name.to_string())
            .or_default()
            .parsed_or_reset();
        entry.calls += 1;
        entry.time += elapsed;
    }

    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }

    /// Tick the running session started at, when the marker is a tick number.
    pub fn start_tick(&self) -> Option<u64> {
        self.start.as_ref().and_then(Lenient::parsed).copied()
    }

    pub fn set_start(&mut self, tick: Option<u64>) {
        self.start = tick.map(Lenient::Parsed);
    }

    /// Human-readable start marker, whatever its shape.
    pub fn start_label(&self) -> Option<String> {
        self.start.as_ref().map(|marker| match marker {
            Lenient::Parsed(tick) => tick.to_string(),
            Lenient::Raw(value) => value.to_string(),
        })
    }

    /// Ticks profiled by finished sessions; `0` when the stored total is unreadable.
    pub fn total(&self) -> f64 {
        self.total.parsed().copied().unwrap_or(0.0)
    }

    pub fn add_total(&mut self, ticks: f64) {
        *self.total.parsed_or_reset() += ticks;
    }

    pub fn instrument(&self, name: &str) -> Option<&ProfilerData> {
        self.data
            .parsed()
            .and_then(|data| data.get(name))
            .and_then(Lenient::parsed)
    }

    /// Readable instrument entries in name order.
    pub fn instruments(&self) -> impl Iterator<Item = (&str, &ProfilerData)> {
        self.data.parsed().into_iter().flat_map(|data| {
            data.iter()
                .filter_map(|(name, entry)| entry.parsed().map(|entry| (name.as_str(), entry)))
        })
    }

    pub fn has_data(&self) -> bool {
        self.instruments().next().is_some()
    }

    /// Drop collected data and totals, keeping foreign keys.
    pub fn reset_data(&mut self) {
        self.data = Lenient::default();
        self.total = Lenient::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentalFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_system: Option<Lenient<bool>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExperimentalFeatures {
    pub fn with_task_system(flag: Option<bool>) -> Self {
        Self {
            task_system: flag.map(Lenient::Parsed),
            extra: Map::new(),
        }
    }
}

/// Last system report written by the kernel's reporting pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Lenient<ReportBody>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Lenient<RepositorySignal>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repository health signal surfaced to the kernel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySignal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_errors: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_failures: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistedState {
    /// Persisted task-system opt-in/out, if one was recorded as a boolean.
    pub fn task_system_flag(&self) -> Option<bool> {
        self.experimental_features
            .as_ref()
            .and_then(Lenient::parsed)
            .and_then(|features| features.task_system.as_ref())
            .and_then(Lenient::parsed)
            .copied()
    }

    pub fn profiler(&self) -> Option<&ProfilerMemory> {
        self.profiler.as_ref().and_then(Lenient::parsed)
    }

    pub fn profiler_mut(&mut self) -> Option<&mut ProfilerMemory> {
        self.profiler.as_mut().and_then(Lenient::parsed_mut)
    }

    /// Profiler record, created empty (`{data: {}, total: 0}`) when absent or
    /// not an object.
    pub fn profiler_or_init(&mut self) -> &mut ProfilerMemory {
        self.profiler.get_or_insert_with(Lenient::default).parsed_or_reset()
    }

    pub fn repository_signal(&self) -> Option<&RepositorySignal> {
        self.system_report
            .as_ref()
            .and_then(Lenient::parsed)
            .and_then(|report| report.report.as_ref())
            .and_then(Lenient::parsed)
            .and_then(|body| body.repository.as_ref())
            .and_then(Lenient::parsed)
    }
}
