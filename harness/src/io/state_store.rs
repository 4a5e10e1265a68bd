//! JSON storage for the host world view and persisted state.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::memory::PersistedState;
use crate::core::world::RawWorldView;

/// Load a world view snapshot. Fails only when the file cannot be read or is
/// not JSON; any JSON shape becomes a view for validation to judge.
pub fn load_world(path: &Path) -> Result<RawWorldView> {
    debug!(path = %path.display(), "loading world view");
    read_json::<Value>(path, "world view").map(RawWorldView::from_value)
}

/// Load persisted state. A missing file is an empty state.
pub fn load_memory(path: &Path) -> Result<PersistedState> {
    if !path.exists() {
        debug!(path = %path.display(), "no persisted state; starting empty");
        return Ok(PersistedState::default());
    }
    debug!(path = %path.display(), "loading persisted state");
    read_json(path, "persisted state")
}

/// Atomically write persisted state (temp file + rename).
pub fn write_memory(path: &Path, memory: &PersistedState) -> Result<()> {
    debug!(path = %path.display(), "writing persisted state");
    write_json_atomic(path, memory)
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {what} {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {what} {}", path.display()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf).with_context(|| format!("write temp {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
