//! Deterministic, pure logic shared by the harness.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! host objects and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod config;
pub mod memory;
pub mod profiler;
pub mod types;
pub mod world;
