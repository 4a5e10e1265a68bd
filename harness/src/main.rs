//! Host adapter for the tick harness.
//!
//! Sources the world view and persisted state from JSON files, bootstraps the
//! harness once per process and drives it tick by tick. Also exposes the
//! published profiler and diagnostics handles for interactive inspection.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use tick_harness::bootstrap::{BootstrapOptions, bootstrap_standard};
use tick_harness::core::world::RawWorldView;
use tick_harness::exit_codes;
use tick_harness::io::console::StdoutConsole;
use tick_harness::io::globals::{GlobalRegistry, InspectionSurface};
use tick_harness::io::settings::load_settings;
use tick_harness::io::state_store::{load_memory, load_world, write_memory};
use tick_harness::logging;

const DEFAULT_SETTINGS: &str = "harness.toml";

#[derive(Parser)]
#[command(
    name = "tick-harness",
    version,
    about = "Per-tick execution harness for a turn-based host"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one or more ticks against a world snapshot, persisting state after each.
    Run {
        /// World view JSON, re-read before every tick.
        #[arg(long)]
        world: PathBuf,
        /// Persisted state JSON (created if missing).
        #[arg(long)]
        memory: PathBuf,
        /// Tuning settings TOML.
        #[arg(long, default_value = DEFAULT_SETTINGS)]
        settings: PathBuf,
        /// Number of ticks to run in this process.
        #[arg(long, default_value_t = 1)]
        ticks: u32,
    },
    /// Invoke the published profiler handle.
    Profiler {
        #[arg(value_enum)]
        action: ProfilerAction,
        #[arg(long)]
        memory: PathBuf,
        /// Current tick for start/stop/clear.
        #[arg(long, default_value_t = 0)]
        time: u64,
        /// Tuning settings TOML.
        #[arg(long, default_value = DEFAULT_SETTINGS)]
        settings: PathBuf,
    },
    /// Print the diagnostics report for persisted state (and optionally a world view).
    Diagnostics {
        #[arg(long)]
        memory: PathBuf,
        #[arg(long)]
        world: Option<PathBuf>,
        /// Tuning settings TOML.
        #[arg(long, default_value = DEFAULT_SETTINGS)]
        settings: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProfilerAction {
    Start,
    Stop,
    Status,
    Output,
    Clear,
    Describe,
}

fn main() {
    logging::init();
    // Tick panics are reported on the console by the harness; keep the raw report in tracing.
    std::panic::set_hook(Box::new(|info| {
        tracing::debug!(panic = %info, "panic payload captured");
    }));
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            world,
            memory,
            settings,
            ticks,
        } => cmd_run(&world, &memory, &settings, ticks),
        Command::Profiler {
            action,
            memory,
            time,
            settings,
        } => cmd_profiler(action, &memory, time, &settings),
        Command::Diagnostics {
            memory,
            world,
            settings,
        } => cmd_diagnostics(&memory, world.as_deref(), &settings),
    }
}

fn cmd_run(world_path: &Path, memory_path: &Path, settings_path: &Path, ticks: u32) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let mut memory = load_memory(memory_path)?;
    let (global, surfaces) = surfaces();
    let mut harness = bootstrap_standard(
        BootstrapOptions::from_env(settings.tuning(), surfaces),
        Some(&memory),
        StdoutConsole,
    );
    info!(globals = ?global.names(), "harness bootstrapped");

    for _ in 0..ticks {
        // An unreadable snapshot still runs the tick, which reports the missing world.
        let world = load_world(world_path).unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "world view unavailable; ticking with an empty view");
            RawWorldView::default()
        });
        let outcome = harness.tick(&world, &mut memory);
        info!(tick = world.tick(), ?outcome, "tick finished");
        write_memory(memory_path, &memory)
            .with_context(|| format!("persist state after tick {}", world.tick()))?;
    }
    Ok(())
}

fn cmd_profiler(
    action: ProfilerAction,
    memory_path: &Path,
    time: u64,
    settings_path: &Path,
) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let mut memory = load_memory(memory_path)?;
    let (global, surfaces) = surfaces();
    let _harness = bootstrap_standard(
        BootstrapOptions::from_env(settings.tuning(), surfaces),
        Some(&memory),
        StdoutConsole,
    );
    let Some(profiler) = global.profiler() else {
        bail!("profiler handle was not published");
    };

    let message = match action {
        ProfilerAction::Start => profiler.start(&mut memory, time),
        ProfilerAction::Stop => profiler.stop(&mut memory, time),
        ProfilerAction::Status => profiler.status(&memory),
        ProfilerAction::Output => profiler.output(&memory),
        ProfilerAction::Clear => profiler.clear(&mut memory, time),
        ProfilerAction::Describe => profiler.describe(),
    };
    println!("{message}");

    if matches!(
        action,
        ProfilerAction::Start | ProfilerAction::Stop | ProfilerAction::Clear
    ) {
        write_memory(memory_path, &memory)?;
    }
    Ok(())
}

fn cmd_diagnostics(
    memory_path: &Path,
    world_path: Option<&Path>,
    settings_path: &Path,
) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let memory = load_memory(memory_path)?;
    let (global, surfaces) = surfaces();
    let _harness = bootstrap_standard(
        BootstrapOptions::from_env(settings.tuning(), surfaces),
        Some(&memory),
        StdoutConsole,
    );
    let Some(diagnostics) = global.diagnostics() else {
        bail!("diagnostics handle was not published");
    };

    println!("{}", diagnostics.memory_report(&memory));
    if let Some(world_path) = world_path {
        let world = load_world(world_path)?;
        println!("{}", diagnostics.world_report(&world));
    }
    Ok(())
}

/// Inspection surfaces available to this process.
fn surfaces() -> (Rc<GlobalRegistry>, Vec<Rc<dyn InspectionSurface>>) {
    let global = Rc::new(GlobalRegistry::new("global"));
    let surfaces: Vec<Rc<dyn InspectionSurface>> = vec![global.clone()];
    (global, surfaces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::parse_from([
            "tick-harness",
            "run",
            "--world",
            "world.json",
            "--memory",
            "memory.json",
        ]);
        match cli.command {
            Command::Run {
                ticks, settings, ..
            } => {
                assert_eq!(ticks, 1);
                assert_eq!(settings, PathBuf::from(DEFAULT_SETTINGS));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parse_profiler_action() {
        let cli = Cli::parse_from([
            "tick-harness",
            "profiler",
            "stop",
            "--memory",
            "memory.json",
            "--time",
            "12",
        ]);
        assert!(matches!(
            cli.command,
            Command::Profiler {
                action: ProfilerAction::Stop,
                time: 12,
                ..
            }
        ));
    }

    #[test]
    fn inspection_commands_take_a_settings_path() {
        let cli = Cli::parse_from([
            "tick-harness",
            "profiler",
            "status",
            "--memory",
            "memory.json",
            "--settings",
            "conf/alt.toml",
        ]);
        match cli.command {
            Command::Profiler { settings, .. } => {
                assert_eq!(settings, PathBuf::from("conf/alt.toml"));
            }
            _ => panic!("expected profiler"),
        }

        let cli = Cli::parse_from(["tick-harness", "diagnostics", "--memory", "memory.json"]);
        match cli.command {
            Command::Diagnostics { settings, .. } => {
                assert_eq!(settings, PathBuf::from(DEFAULT_SETTINGS));
            }
            _ => panic!("expected diagnostics"),
        }
    }
}
