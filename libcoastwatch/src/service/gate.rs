//! Launch gate
//!
//! Decides at startup whether the user lands on the main screens or on the
//! login screen. The decision is held back until a minimum display time has
//! passed, however quickly the session check finishes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::events::{Event, EventBus};
use crate::location::LocationProvider;
use crate::session::SessionStore;

/// Where the gate routes the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Checking,
    Authenticated,
    Unauthenticated,
}

impl GateState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, GateState::Checking)
    }
}

#[derive(Clone)]
pub struct EntryGate {
    sessions: SessionStore,
    location: Arc<dyn LocationProvider>,
    min_display: Duration,
    event_bus: EventBus,
    state: Arc<RwLock<GateState>>,
}

impl EntryGate {
    pub fn new(
        sessions: SessionStore,
        location: Arc<dyn LocationProvider>,
        min_display: Duration,
        event_bus: EventBus,
    ) -> Self {
        Self {
            sessions,
            location,
            min_display,
            event_bus,
            state: Arc::new(RwLock::new(GateState::Checking)),
        }
    }

    pub fn state(&self) -> GateState {
        self.state.read().map(|s| *s).unwrap_or(GateState::Checking)
    }

    /// Check the stored session at `now`
    ///
    /// An expired session is purged. A session that cannot be read counts as
    /// absent.
    pub fn decide(&self, now: DateTime<Utc>) -> GateState {
        let session = match self.sessions.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                return GateState::Unauthenticated;
            }
        };

        let Some(session) = session else {
            tracing::debug!("No stored session");
            return GateState::Unauthenticated;
        };

        if session.is_valid_at(now) {
            return GateState::Authenticated;
        }

        tracing::info!("Stored session has expired");
        if let Err(e) = self.sessions.clear() {
            tracing::warn!("Failed to clear expired session: {}", e);
        }
        self.event_bus.emit(Event::SessionExpired);
        GateState::Unauthenticated
    }

    /// Run the launch sequence and return the resolved route
    ///
    /// Location tracking is started first. The session check and the minimum
    /// display delay run concurrently; the state changes only once both
    /// have finished.
    pub async fn run(&self) -> GateState {
        self.set_state(GateState::Checking);
        self.location.start_tracking();

        let check = async { self.decide(Utc::now()) };
        let (resolved, ()) = tokio::join!(check, tokio::time::sleep(self.min_display));

        self.set_state(resolved);
        self.event_bus.emit(Event::GateResolved {
            authenticated: resolved == GateState::Authenticated,
        });
        tracing::debug!("Gate resolved to {:?}", resolved);
        resolved
    }

    fn set_state(&self, state: GateState) {
        match self.state.write() {
            Ok(mut slot) => *slot = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}
