//! Global inspection surfaces that expose handles for interactive use.
//!
//! A runtime may offer more than one surface (e.g. a process-wide registry and
//! a console scope). The [`Publisher`] is given every available surface once
//! at startup and publishes each handle to all of them. Handles are never read
//! back by the harness.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::core::profiler::ProfilerHandle;
use crate::diagnostics::Diagnostics;

/// Well-known global names.
pub const PROFILER_GLOBAL: &str = "Profiler";
pub const DIAGNOSTICS_GLOBAL: &str = "Diagnostics";

/// A handle that can be published to a surface.
#[derive(Clone)]
pub enum GlobalHandle {
    Profiler(Rc<dyn ProfilerHandle>),
    Diagnostics(Rc<Diagnostics>),
}

impl fmt::Debug for GlobalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalHandle::Profiler(handle) => write!(f, "Profiler({})", handle.describe()),
            GlobalHandle::Diagnostics(_) => f.write_str("Diagnostics"),
        }
    }
}

pub trait InspectionSurface {
    fn name(&self) -> &str;
    fn publish(&self, name: &str, handle: GlobalHandle);
}

/// In-memory global scope.
#[derive(Debug, Default)]
pub struct GlobalRegistry {
    name: String,
    entries: RefCell<BTreeMap<String, GlobalHandle>>,
}

impl GlobalRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<GlobalHandle> {
        self.entries.borrow().get(name).cloned()
    }

    pub fn profiler(&self) -> Option<Rc<dyn ProfilerHandle>> {
        match self.get(PROFILER_GLOBAL)? {
            GlobalHandle::Profiler(handle) => Some(handle),
            GlobalHandle::Diagnostics(_) => None,
        }
    }

    pub fn diagnostics(&self) -> Option<Rc<Diagnostics>> {
        match self.get(DIAGNOSTICS_GLOBAL)? {
            GlobalHandle::Diagnostics(handle) => Some(handle),
            GlobalHandle::Profiler(_) => None,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl InspectionSurface for GlobalRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, name: &str, handle: GlobalHandle) {
        self.entries.borrow_mut().insert(name.to_string(), handle);
    }
}

/// Publishes handles to every surface resolved at startup.
pub struct Publisher {
    surfaces: Vec<Rc<dyn InspectionSurface>>,
}

impl Publisher {
    pub fn new(surfaces: Vec<Rc<dyn InspectionSurface>>) -> Self {
        Self { surfaces }
    }

    /// Returns how many surfaces received the handle.
    pub fn publish(&self, name: &str, handle: GlobalHandle) -> usize {
        for surface in &self.surfaces {
            debug!(surface = surface.name(), global = name, "publishing global");
            surface.publish(name, handle.clone());
        }
        self.surfaces.len()
    }
}
