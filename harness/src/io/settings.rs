//! Harness tuning settings stored in a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::config::Tuning;

/// Harness settings (TOML).
///
/// Read once at bootstrap. Missing fields default to the deployed values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessSettings {
    /// Fraction of the CPU limit the kernel may plan against.
    pub cpu_safety_margin: f64,

    /// CPU budget reserved for each agent entity.
    pub max_cpu_per_creep: f64,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        let tuning = Tuning::default();
        Self {
            cpu_safety_margin: tuning.cpu_safety_margin,
            max_cpu_per_creep: tuning.max_cpu_per_creep,
        }
    }
}

impl HarnessSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.cpu_safety_margin > 0.0 && self.cpu_safety_margin <= 1.0) {
            return Err(anyhow!("cpu_safety_margin must be in (0, 1]"));
        }
        if !(self.max_cpu_per_creep > 0.0) {
            return Err(anyhow!("max_cpu_per_creep must be > 0"));
        }
        Ok(())
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            cpu_safety_margin: self.cpu_safety_margin,
            max_cpu_per_creep: self.max_cpu_per_creep,
        }
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `HarnessSettings::default()`.
pub fn load_settings(path: &Path) -> Result<HarnessSettings> {
    if !path.exists() {
        let settings = HarnessSettings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: HarnessSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}
