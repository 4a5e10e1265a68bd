//! Per-tick execution harness for an agent running inside a turn-based host.
//!
//! The host calls into the agent once per tick with a world view and a
//! persisted state object. The harness resolves feature flags once per
//! process, validates the world view every tick, manages profiler auto-start
//! and guarantees that nothing thrown during a tick reaches the host.
//!
//! - **[`core`]**: Pure, deterministic logic (validation, flag resolution,
//!   classification, profiler bookkeeping). No I/O.
//! - **[`io`]**: Side-effecting adapters (console, files, global surfaces).
//!
//! [`bootstrap`] wires a [`tick::TickHarness`] at process start; [`kernel`]
//! defines the collaborator invoked every tick.

pub mod bootstrap;
pub mod core;
pub mod diagnostics;
pub mod exit_codes;
pub mod io;
pub mod kernel;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tick;
