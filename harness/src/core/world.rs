//! Host-provided world view and its per-tick validation.
//!
//! The host hands in a fresh (or mutated) world object every tick and its shape
//! is not trusted. [`validate_world`] checks that the four required capability
//! groups are present before any other logic reads them, and returns a
//! [`GameContext`] that borrows the same object. Nothing is copied.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw world view exactly as the host supplied it.
///
/// Every field is optional at this level and stored as the host sent it.
/// Unknown keys are kept in `extra` so the view can be handed to a kernel
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWorldView {
    /// Current tick number, read through [`RawWorldView::tick`].
    pub time: Option<Value>,
    pub cpu: Option<Value>,
    pub creeps: Option<Value>,
    pub spawns: Option<Value>,
    pub rooms: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawWorldView {
    /// View over any JSON value. A value that is not an object exposes nothing,
    /// so validation reports it like an empty world.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => {
                serde_json::from_value(Value::Object(fields)).unwrap_or_default()
            }
            _ => Self::default(),
        }
    }

    /// Tick number, or `0` when the host omitted it or sent something that is
    /// not a non-negative number. Numeric strings and fractional numbers are
    /// accepted and truncated.
    pub fn tick(&self) -> u64 {
        match &self.time {
            Some(Value::Number(number)) => number
                .as_u64()
                .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
                .unwrap_or(0),
            Some(Value::String(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map_or(0, |n| n as u64),
            _ => 0,
        }
    }
}

/// The capability groups a world view must expose, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Cpu,
    Creeps,
    Spawns,
    Rooms,
}

impl Capability {
    pub const REQUIRED: [Capability; 4] = [
        Capability::Cpu,
        Capability::Creeps,
        Capability::Spawns,
        Capability::Rooms,
    ];

    /// Stable human-readable name used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            Capability::Cpu => "cpu interface",
            Capability::Creeps => "creeps",
            Capability::Spawns => "spawns",
            Capability::Rooms => "rooms",
        }
    }

    fn lookup(self, raw: &RawWorldView) -> Option<&Value> {
        match self {
            Capability::Cpu => raw.cpu.as_ref(),
            Capability::Creeps => raw.creeps.as_ref(),
            Capability::Spawns => raw.spawns.as_ref(),
            Capability::Rooms => raw.rooms.as_ref(),
        }
    }
}

/// A world view rejected by [`validate_world`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid Game object: missing {}", .missing.label())]
pub struct ValidationError {
    pub missing: Capability,
}

/// A world view that passed validation.
///
/// Borrows the host's object for the duration of one tick; the accessors for
/// the required groups cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct GameContext<'a> {
    raw: &'a RawWorldView,
}

impl<'a> GameContext<'a> {
    /// The underlying host object (same reference that was validated).
    pub fn raw(&self) -> &'a RawWorldView {
        self.raw
    }

    pub fn tick(&self) -> u64 {
        self.raw.tick()
    }

    pub fn cpu(&self) -> &'a Value {
        self.required(Capability::Cpu)
    }

    pub fn creeps(&self) -> &'a Value {
        self.required(Capability::Creeps)
    }

    pub fn spawns(&self) -> &'a Value {
        self.required(Capability::Spawns)
    }

    pub fn rooms(&self) -> &'a Value {
        self.required(Capability::Rooms)
    }

    fn required(&self, capability: Capability) -> &'a Value {
        // Presence was established in `validate_world`.
        capability.lookup(self.raw).unwrap_or(&Value::Null)
    }
}

/// Check the four required capability groups in fixed order, stopping at the
/// first one that is missing or falsy.
///
/// Only presence is checked; an empty registry (`{}`) passes.
pub fn validate_world(raw: &RawWorldView) -> Result<GameContext<'_>, ValidationError> {
    for capability in Capability::REQUIRED {
        if !is_truthy(capability.lookup(raw)) {
            return Err(ValidationError {
                missing: capability,
            });
        }
    }
    Ok(GameContext { raw })
}

/// Truthiness as the host runtime defines it: `null`, `false`, `0`, `NaN` and
/// `""` are falsy; every object and array (including empty ones) is truthy.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
