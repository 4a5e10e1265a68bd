//! Stable exit codes for harness CLI commands.

/// Command succeeded. Failed ticks still exit with `OK`.
pub const OK: i32 = 0;
/// Command failed before or outside the tick boundary (unreadable files, bad settings).
pub const INVALID: i32 = 1;
