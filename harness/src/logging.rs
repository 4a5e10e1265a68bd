//! Development-time tracing for debugging the harness.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not part of what the host shows.
//!
//! - **Console (`io/console`)**: Tagged lines the host displays. Always written,
//!   unaffected by `RUST_LOG`.
//!
//! Useful targets: `tick_harness::tick` (one span per tick, contained failures),
//! `tick_harness::core::profiler` (the auto-start decision),
//! `tick_harness::core::config` (which source decided the task-system flag).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "warn";

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset or unparseable.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=warn,tick_harness::tick=debug,tick_harness::core::profiler=info \
///     tick-harness run --world world.json --memory memory.json --ticks 3
/// ```
pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(filter_from(directives.as_deref()))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
