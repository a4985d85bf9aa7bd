//! Device location seam
//!
//! The location subsystem (permissions, GPS fixes) lives outside this crate.
//! Consumers only ever read the latest known coordinate.

use std::sync::{Arc, RwLock};

use crate::types::Coordinate;

/// Source of the device's current coordinate
pub trait LocationProvider: Send + Sync {
    /// Latest known coordinate, or `None` when no fix is available
    fn current_location(&self) -> Option<Coordinate>;

    /// Ask the provider to begin producing fixes
    ///
    /// Providers with nothing to start may ignore this.
    fn start_tracking(&self) {}
}

/// A provider that always reports the same coordinate (or none)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(Option<Coordinate>);

impl FixedLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        Self(Some(coordinate))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl From<Option<Coordinate>> for FixedLocation {
    fn from(coordinate: Option<Coordinate>) -> Self {
        Self(coordinate)
    }
}

impl LocationProvider for FixedLocation {
    fn current_location(&self) -> Option<Coordinate> {
        self.0
    }
}

/// A shared, updatable location value
///
/// Clones share the same slot: a tracker holds one handle and calls
/// [`SharedLocation::update`], forms hold another and read it.
#[derive(Debug, Clone, Default)]
pub struct SharedLocation {
    slot: Arc<RwLock<Option<Coordinate>>>,
    tracking: Arc<RwLock<bool>>,
}

impl SharedLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, coordinate: Coordinate) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(coordinate);
        }
    }

    pub fn forget(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.read().map(|t| *t).unwrap_or(false)
    }
}

impl LocationProvider for SharedLocation {
    fn current_location(&self) -> Option<Coordinate> {
        self.slot.read().ok().and_then(|slot| *slot)
    }

    fn start_tracking(&self) {
        if let Ok(mut tracking) = self.tracking.write() {
            if !*tracking {
                tracing::debug!("Location tracking started");
            }
            *tracking = true;
        }
    }
}
