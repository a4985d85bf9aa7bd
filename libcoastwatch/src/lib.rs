//! Coastwatch - crowd-sourced coastal hazard reporting
//!
//! Core library for the coast-* command-line tools: browsing the public
//! hazard feed, submitting reports with an optional photo, and keeping the
//! locally persisted login session.

pub mod api;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, CoastwatchError, Result};
pub use location::{FixedLocation, LocationProvider, SharedLocation};
pub use service::CoastwatchService;
pub use session::{Session, SessionStore};
pub use store::LocalStore;
pub use types::{Coordinate, FeedItem, HazardType, Media, ReportStatus, Severity};
