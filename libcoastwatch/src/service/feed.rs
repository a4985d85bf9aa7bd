//! Feed service for browsing hazard reports
//!
//! Fetches the report listing, normalizes each record for display and keeps
//! the last good result around so a failed refresh never blanks the feed.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use super::events::{Event, EventBus};
use crate::api::{HazardApi, RawReport};
use crate::error::Result;
use crate::types::{Coordinate, FeedItem, ReportStatus, Severity};
use crate::Config;

/// Shown as the reporter; the listing carries no reporter names
pub const REPORTER_LABEL: &str = "Community User";

/// (threshold in seconds, unit), largest first
const TIME_UNITS: &[(i64, &str)] = &[
    (31_536_000, "years"),
    (2_592_000, "months"),
    (86_400, "days"),
    (3_600, "hours"),
    (60, "minutes"),
];

/// Icon for a hazard type, by ordered keyword match
pub fn hazard_icon(hazard_type: &str) -> &'static str {
    let lower = hazard_type.to_lowercase();
    if lower.contains("oil") {
        "🛢️"
    } else if lower.contains("sewage") {
        "☣️"
    } else if lower.contains("plastic") || lower.contains("debris") {
        "🗑️"
    } else if lower.contains("algal") {
        "🌿"
    } else if lower.contains("tide") {
        "🌊"
    } else {
        "⚠️"
    }
}

/// Render an elapsed duration in whole seconds as "N unit ago"
///
/// Picks the largest unit whose threshold the elapsed time strictly exceeds,
/// falling back to seconds. Negative input (clock skew) counts as zero.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    for (threshold, unit) in TIME_UNITS {
        if seconds > *threshold {
            return format!("{} {} ago", seconds / threshold, unit);
        }
    }
    format!("{} seconds ago", seconds)
}

/// Relative time between `created_at` and `now`
pub fn format_time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_elapsed(now.signed_duration_since(created_at).num_seconds())
}

/// Hazard type with its first letter upper-cased
pub fn display_type(hazard_type: &str) -> String {
    let mut chars = hazard_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a listing record into a feed item
pub fn normalize(raw: &RawReport, now: DateTime<Utc>, placeholder_image: &str) -> FeedItem {
    let coordinates = Coordinate::new(raw.latitude, raw.longitude);
    let type_label = display_type(&raw.hazard_type);

    FeedItem {
        id: raw.id.clone(),
        hazard_type: raw.hazard_type.clone(),
        icon: hazard_icon(&type_label),
        type_label,
        location: coordinates.label(),
        description: raw.description.clone(),
        reporter: REPORTER_LABEL.to_string(),
        relative_time: format_time_ago(raw.created_at, now),
        image_url: raw
            .media_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| placeholder_image.to_string()),
        severity: Severity::from_status(&raw.status),
        status: ReportStatus::parse(&raw.status),
        coordinates,
        created_at: raw.created_at,
    }
}

/// Items whose type or location contains `query`, ignoring case
///
/// An empty query keeps everything. Order is preserved.
pub fn filter_items<'a, I>(items: I, query: &str) -> Vec<&'a FeedItem>
where
    I: IntoIterator<Item = &'a FeedItem>,
{
    let query = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            query.is_empty()
                || item.type_label.to_lowercase().contains(&query)
                || item.location.to_lowercase().contains(&query)
        })
        .collect()
}

/// Snapshot of the feed as a screen would render it
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub items: Vec<FeedItem>,
    /// First load in flight
    pub loading: bool,
    /// Explicit re-fetch in flight
    pub refreshing: bool,
    pub last_error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Feed service
#[derive(Clone)]
pub struct FeedService {
    api: Arc<dyn HazardApi>,
    config: Arc<Config>,
    event_bus: EventBus,
    state: Arc<RwLock<FeedState>>,
}

impl FeedService {
    pub fn new(api: Arc<dyn HazardApi>, config: Arc<Config>, event_bus: EventBus) -> Self {
        Self {
            api,
            config,
            event_bus,
            state: Arc::new(RwLock::new(FeedState::default())),
        }
    }

    /// Fetch and normalize the listing without touching the cached state
    ///
    /// # Errors
    ///
    /// Returns an API error when the backend is unreachable or its envelope
    /// is not `{ success: true, data: [...] }`.
    pub async fn fetch(&self) -> Result<Vec<FeedItem>> {
        let reports = self.api.list_reports().await?;
        let now = Utc::now();
        let placeholder = &self.config.api.placeholder_image_url;
        Ok(reports
            .iter()
            .map(|raw| normalize(raw, now, placeholder))
            .collect())
    }

    /// Initial load
    pub async fn load(&self) -> Result<usize> {
        self.run_fetch(false).await
    }

    /// Pull-to-refresh
    pub async fn refresh(&self) -> Result<usize> {
        self.run_fetch(true).await
    }

    async fn run_fetch(&self, refresh: bool) -> Result<usize> {
        self.update(|state| {
            if refresh {
                state.refreshing = true;
            } else {
                state.loading = true;
            }
        });
        self.event_bus.emit(Event::FeedLoading { refresh });

        let result = self.fetch().await;

        match result {
            Ok(items) => {
                let count = items.len();
                self.update(|state| {
                    state.items = items;
                    state.last_error = None;
                    state.fetched_at = Some(Utc::now());
                    state.loading = false;
                    state.refreshing = false;
                });
                self.event_bus.emit(Event::FeedLoaded { count });
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Failed to fetch hazards: {}", e);
                let message = e.to_string();
                self.update(|state| {
                    state.last_error = Some(message.clone());
                    state.loading = false;
                    state.refreshing = false;
                });
                self.event_bus.emit(Event::FeedFailed { error: message });
                Err(e)
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut FeedState)) {
        match self.state.write() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Copy of the current state
    pub fn state(&self) -> FeedState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Cached items matching `query`
    pub fn search(&self, query: &str) -> Vec<FeedItem> {
        let state = self.state();
        filter_items(&state.items, query)
            .into_iter()
            .cloned()
            .collect()
    }
}
