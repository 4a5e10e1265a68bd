//! Process-level harness tests spanning many ticks.
//!
//! These drive a bootstrapped harness the way the host does: one call per
//! tick, persisted state carried between calls, the world view handed in
//! fresh each time.

use std::rc::Rc;

use tick_harness::bootstrap::bootstrap;
use tick_harness::core::classifier::ErrorKind;
use tick_harness::core::config::EnvOverride;
use tick_harness::core::memory::PersistedState;
use tick_harness::core::profiler::{AutoStartState, ProfilerHandle};
use tick_harness::core::types::TickOutcome;
use tick_harness::core::world::Capability;
use tick_harness::io::console::{PROFILER_TAG, RecordingConsole};
use tick_harness::test_support::{
    CountingProfiler, ScriptedKernel, ScriptedRun, complete_world, memory_with_running_profiler,
    memory_with_task_flag, options_with, world_without,
};

fn harness_with(
    env: EnvOverride,
    profiler_enabled: bool,
    profiler: Rc<CountingProfiler>,
    persisted: Option<&PersistedState>,
    script: Vec<ScriptedRun>,
) -> tick_harness::tick::TickHarness<ScriptedKernel, RecordingConsole> {
    let handle: Rc<dyn ProfilerHandle> = profiler;
    bootstrap(
        options_with(env, profiler_enabled, handle),
        persisted,
        RecordingConsole::new(),
        ScriptedKernel::factory(script),
    )
}

/// With no persisted profiler record, auto-start happens on the first tick
/// and never again, no matter how many ticks follow.
#[test]
fn profiler_starts_exactly_once_across_ticks() {
    let profiler = Rc::new(CountingProfiler::default());
    let mut memory = PersistedState::default();
    let mut harness = harness_with(
        EnvOverride::Unset,
        true,
        profiler.clone(),
        Some(&memory),
        Vec::new(),
    );

    for tick in 1..=5 {
        let outcome = harness.tick(&complete_world(tick), &mut memory);
        assert_eq!(outcome, TickOutcome::Completed);
    }

    assert_eq!(profiler.starts(), 1);
    assert_eq!(harness.lifecycle().state(), AutoStartState::AutoStarted);
    assert_eq!(memory.profiler().expect("record").start_tick(), Some(1));
    assert_eq!(
        harness.console().tagged(PROFILER_TAG),
        vec!["[Profiler] Auto-started profiler data collection"]
    );
    assert_eq!(harness.kernel().calls, 5);
}

/// A session that was already running when the process came up is left alone.
#[test]
fn running_profiler_is_never_restarted() {
    let profiler = Rc::new(CountingProfiler::default());
    let mut memory = memory_with_running_profiler(40);
    let mut harness = harness_with(
        EnvOverride::Unset,
        true,
        profiler.clone(),
        Some(&memory),
        Vec::new(),
    );

    for tick in 50..53 {
        harness.tick(&complete_world(tick), &mut memory);
    }

    assert_eq!(profiler.starts(), 0);
    assert_eq!(harness.lifecycle().state(), AutoStartState::Skipped);
    assert_eq!(memory.profiler().expect("record").start_tick(), Some(40));
    assert!(harness.console().tagged(PROFILER_TAG).is_empty());
}

/// A start marker counts even when other profiler fields are unreadable.
#[test]
fn marker_in_partly_malformed_record_blocks_auto_start() {
    let profiler = Rc::new(CountingProfiler::default());
    let mut memory: PersistedState = serde_json::from_value(serde_json::json!({
        "profiler": {"data": {"kernel.run": {"calls": 4, "time": []}}, "total": 0, "start": 5}
    }))
    .expect("memory");
    let mut harness = harness_with(
        EnvOverride::Unset,
        true,
        profiler.clone(),
        Some(&memory),
        Vec::new(),
    );

    harness.tick(&complete_world(50), &mut memory);

    assert_eq!(profiler.starts(), 0);
    assert_eq!(harness.lifecycle().state(), AutoStartState::Skipped);
    let written = serde_json::to_value(&memory).expect("serialize");
    assert_eq!(written["profiler"]["start"], serde_json::json!(5));
    assert_eq!(
        written["profiler"]["data"]["kernel.run"],
        serde_json::json!({"calls": 4, "time": []})
    );
}

/// Resetting the persisted record after the decision does not trigger another start.
#[test]
fn external_reset_after_decision_is_ignored() {
    let profiler = Rc::new(CountingProfiler::default());
    let mut memory = PersistedState::default();
    let mut harness = harness_with(
        EnvOverride::Unset,
        true,
        profiler.clone(),
        None,
        Vec::new(),
    );

    harness.tick(&complete_world(1), &mut memory);
    memory.profiler = None;
    harness.tick(&complete_world(2), &mut memory);
    profiler.stop(&mut memory, 3);
    harness.tick(&complete_world(4), &mut memory);

    assert_eq!(profiler.starts(), 1);
}

/// With the build switch off the lifecycle manager never touches anything.
#[test]
fn disabled_switch_is_a_no_op_every_tick() {
    let profiler = Rc::new(CountingProfiler::default());
    let mut memory = PersistedState::default();
    let mut harness = harness_with(
        EnvOverride::Unset,
        false,
        profiler.clone(),
        Some(&memory),
        Vec::new(),
    );

    for tick in 1..=3 {
        harness.tick(&complete_world(tick), &mut memory);
    }

    assert_eq!(profiler.starts(), 0);
    assert!(memory.profiler().is_none());
    assert_eq!(harness.lifecycle().state(), AutoStartState::NotChecked);
}

/// The profiler decision is made on the first tick even if that tick's world is invalid.
#[test]
fn profiler_decision_precedes_validation() {
    let profiler = Rc::new(CountingProfiler::default());
    let mut memory = PersistedState::default();
    let mut harness = harness_with(
        EnvOverride::Unset,
        true,
        profiler.clone(),
        None,
        Vec::new(),
    );

    let outcome = harness.tick(&world_without(1, &[Capability::Cpu]), &mut memory);

    assert_eq!(outcome, TickOutcome::Failed(ErrorKind::Validation));
    assert_eq!(profiler.starts(), 1);
    assert_eq!(harness.kernel().calls, 0);
}

/// Missing spatial registry: validation-tagged line naming the field, no kernel call.
#[test]
fn missing_rooms_is_logged_and_tick_returns() {
    let mut memory = PersistedState::default();
    let mut harness = harness_with(
        EnvOverride::Unset,
        false,
        Rc::new(CountingProfiler::default()),
        None,
        Vec::new(),
    );

    let outcome = harness.tick(&world_without(9, &[Capability::Rooms]), &mut memory);

    assert_eq!(outcome, TickOutcome::Failed(ErrorKind::Validation));
    assert_eq!(
        harness.console().lines(),
        vec!["[Type Error] Invalid Game object: missing rooms"]
    );
    assert_eq!(harness.kernel().calls, 0);
}

/// Every failure shape is contained and the next tick runs normally.
#[test]
fn every_failure_kind_is_contained_and_next_tick_runs() {
    let mut memory = PersistedState::default();
    let mut harness = harness_with(
        EnvOverride::Unset,
        false,
        Rc::new(CountingProfiler::default()),
        None,
        vec![
            ScriptedRun::RejectWorld(Capability::Spawns),
            ScriptedRun::Fail("spawn queue corrupt".to_string()),
            ScriptedRun::Panic("kernel exploded".to_string()),
            ScriptedRun::Ok,
        ],
    );

    let outcomes: Vec<TickOutcome> = (1..=4)
        .map(|tick| harness.tick(&complete_world(tick), &mut memory))
        .collect();

    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Failed(ErrorKind::Validation),
            TickOutcome::Failed(ErrorKind::Runtime),
            TickOutcome::Failed(ErrorKind::Unrecognized),
            TickOutcome::Completed,
        ]
    );
    assert_eq!(
        harness.console().lines(),
        vec![
            "[Type Error] Invalid Game object: missing spawns",
            "[Runtime Error] spawn queue corrupt",
            "[Unknown Error] kernel exploded",
        ]
    );
    assert_eq!(harness.kernel().ticks_seen, vec![1, 2, 3, 4]);
}

/// Flags are resolved once; later changes to persisted state do not leak in.
#[test]
fn config_is_fixed_after_bootstrap() {
    let mut memory = memory_with_task_flag(Some(false));
    let mut harness = harness_with(
        EnvOverride::Unset,
        false,
        Rc::new(CountingProfiler::default()),
        Some(&memory),
        Vec::new(),
    );
    assert!(!harness.config().use_task_system);

    memory = memory_with_task_flag(Some(true));
    for tick in 1..=3 {
        harness.tick(&complete_world(tick), &mut memory);
    }

    assert!(!harness.config().use_task_system);
    assert!(!harness.kernel().config.use_task_system);
}

/// Environment override `"true"` beats a persisted `false`.
#[test]
fn environment_override_wins_end_to_end() {
    let memory = memory_with_task_flag(Some(false));
    let harness = harness_with(
        EnvOverride::parse(Some("true")),
        false,
        Rc::new(CountingProfiler::default()),
        Some(&memory),
        Vec::new(),
    );
    assert!(harness.config().use_task_system);
    assert!(harness.kernel().config.use_task_system);
}

/// A recycled process re-derives its flags and re-makes the profiler decision
/// from persisted state alone.
#[test]
fn recycled_process_starts_from_scratch() {
    let mut memory = memory_with_task_flag(None);

    let first = Rc::new(CountingProfiler::default());
    let mut harness = harness_with(EnvOverride::Unset, true, first.clone(), Some(&memory), Vec::new());
    harness.tick(&complete_world(1), &mut memory);
    drop(harness);
    assert_eq!(first.starts(), 1);

    memory.experimental_features = memory_with_task_flag(Some(false)).experimental_features;
    let second = Rc::new(CountingProfiler::default());
    let mut harness = harness_with(EnvOverride::Unset, true, second.clone(), Some(&memory), Vec::new());
    harness.tick(&complete_world(2), &mut memory);

    assert!(!harness.config().use_task_system);
    assert_eq!(second.starts(), 0);
    assert_eq!(harness.lifecycle().state(), AutoStartState::Skipped);
}
