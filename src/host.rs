//! Host wiring.
//!
//! Whether the harness is exported as an importable entry point is decided
//! by whoever composes the application and passed in as a [`HostConfig`].
//! Nothing here inspects the process or the environment.

use crate::engine::{Engine, EngineError};
use crate::harness;
use crate::sink::LogSink;

/// Signature of the harness entry point.
pub type Entry = fn(&dyn Engine, &mut dyn LogSink, Option<&str>) -> Result<(), EngineError>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    pub expose_as_module: bool,
}

impl HostConfig {
    /// Plain script host: the caller runs the harness itself.
    pub fn script() -> Self {
        Self {
            expose_as_module: false,
        }
    }

    /// Module host: the entry point is registered for importers.
    pub fn module() -> Self {
        Self {
            expose_as_module: true,
        }
    }
}

/// What the host ends up exporting. Decided once, by [`bootstrap`].
#[derive(Debug, Clone, Copy)]
pub enum Exports {
    Unregistered,
    Registered(Entry),
}

impl Exports {
    pub fn registered(&self) -> Option<Entry> {
        match self {
            Exports::Registered(entry) => Some(*entry),
            Exports::Unregistered => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Exports::Registered(_))
    }
}

/// The harness entry point.
pub fn entry() -> Entry {
    harness::run
}

pub fn bootstrap(config: &HostConfig) -> Exports {
    if config.expose_as_module {
        log::debug!("registering harness entry point for module host");
        Exports::Registered(entry())
    } else {
        Exports::Unregistered
    }
}
