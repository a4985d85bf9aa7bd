//! Service layer for Coastwatch
//!
//! Business logic shared by the command-line tools, kept free of any
//! terminal concerns so it can be driven from tests or another front end.
//!
//! # Architecture
//!
//! `CoastwatchService` is the entry point and owns the shared pieces (config,
//! API client, session store, location provider, event bus). It hands out:
//!
//! - `FeedService`: fetch, normalize and search hazard reports
//! - `ReportService`: validate and submit a report form
//! - `EntryGate`: launch-time session check
//! - `ValidationService`: field checks without I/O
//! - `EventBus`: in-flight state for observers
//!
//! # Example
//!
//! ```no_run
//! use libcoastwatch::service::CoastwatchService;
//!
//! # async fn example() -> libcoastwatch::Result<()> {
//! let service = CoastwatchService::new()?;
//!
//! service.feed().load().await?;
//! for item in service.feed().search("oil") {
//!     println!("{} {} ({})", item.icon, item.type_label, item.relative_time);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod events;
pub mod feed;
pub mod gate;
pub mod report;
pub mod validation;

pub use analytics::{Analytics, Period};
pub use gate::GateState;
pub use report::ReportForm;

use self::events::EventBus;
use self::feed::FeedService;
use self::gate::EntryGate;
use self::report::ReportService;
use self::validation::ValidationService;
use crate::api::http::HttpApi;
use crate::api::HazardApi;
use crate::location::{FixedLocation, LocationProvider};
use crate::session::SessionStore;
use crate::store::LocalStore;
use crate::{Config, Result};
use chrono::Utc;
use std::sync::Arc;

/// Main service facade
///
/// All sub-services share the same config, session store and event bus, so
/// a session cleared by the gate is immediately gone for the report form.
pub struct CoastwatchService {
    config: Arc<Config>,
    sessions: SessionStore,
    feed: FeedService,
    report: ReportService,
    gate: EntryGate,
    validation: ValidationService,
    event_bus: EventBus,
}

impl CoastwatchService {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the HTTP
    /// client cannot be built.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service talking to the configured backend over HTTP
    ///
    /// The location provider is the fixed `[location]` coordinate, or none.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = LocalStore::open(config.session.expand_path())?;
        let api = HttpApi::new(&config.api)?;
        let location = FixedLocation::from(config.location.map(Into::into));

        Self::with_parts(
            config,
            Arc::new(api),
            SessionStore::new(store),
            Arc::new(location),
        )
    }

    /// Assemble a service from explicit collaborators
    pub fn with_parts(
        config: Config,
        api: Arc<dyn HazardApi>,
        sessions: SessionStore,
        location: Arc<dyn LocationProvider>,
    ) -> Result<Self> {
        let min_display = config.gate.min_display()?;
        let config = Arc::new(config);
        let event_bus = EventBus::new(100);

        tracing::debug!("Using {} backend", api.name());

        let feed = FeedService::new(Arc::clone(&api), Arc::clone(&config), event_bus.clone());
        let report = ReportService::new(
            Arc::clone(&api),
            sessions.clone(),
            Arc::clone(&location),
            Arc::clone(&config),
            event_bus.clone(),
        );
        let gate = EntryGate::new(sessions.clone(), location, min_display, event_bus.clone());

        Ok(Self {
            config,
            sessions,
            feed,
            report,
            gate,
            validation: ValidationService::new(),
            event_bus,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the persisted session
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Access the feed service
    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    /// Access the report submission service
    pub fn report(&self) -> &ReportService {
        &self.report
    }

    /// Access the launch gate
    pub fn gate(&self) -> &EntryGate {
        &self.gate
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// Statistics over the currently loaded feed
    pub fn analytics(&self, period: Period) -> Analytics {
        Analytics::compute(&self.feed.state().items, period, Utc::now())
    }

    /// Subscribe to service events
    ///
    /// Returns a receiver for progress events from every sub-service.
    /// Multiple subscribers are supported.
    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }
}
