//! I/O helpers for the harness adapter.

pub mod console;
pub mod globals;
pub mod settings;
pub mod state_store;
