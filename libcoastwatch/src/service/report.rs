//! Report submission service
//!
//! Checks a report form locally, then posts it as a multipart request.
//! The checks run in a fixed order (fields, location, session) and each
//! failure has its own error kind so callers can tell them apart. Nothing
//! reaches the network unless every check passes.

use chrono::Utc;
use std::sync::Arc;

use super::events::{Event, EventBus};
use super::validation::{ValidationRequest, ValidationService};
use crate::api::{HazardApi, ReportSubmission, SubmitReceipt};
use crate::error::{CoastwatchError, Result};
use crate::location::LocationProvider;
use crate::session::{Session, SessionStore};
use crate::types::{Coordinate, HazardType, Media};
use crate::Config;

pub const LOCATION_UNAVAILABLE_MESSAGE: &str =
    "Unable to get your current location. Please enable location services.";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to submit a report.";
pub const SUBMISSION_IN_PROGRESS_MESSAGE: &str = "A report is already being submitted.";

/// Editable state of the report form
#[derive(Debug, Clone, Default)]
pub struct ReportForm {
    pub hazard_type: Option<&'static HazardType>,
    /// Display label of the coordinate the report will carry
    pub location_text: String,
    pub description: String,
    pub image: Option<Media>,
    submitting: bool,
}

impl ReportForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Clear every field
    pub fn reset(&mut self) {
        self.hazard_type = None;
        self.location_text.clear();
        self.description.clear();
        self.image = None;
    }
}

/// Service for submitting hazard reports
#[derive(Clone)]
pub struct ReportService {
    api: Arc<dyn HazardApi>,
    sessions: SessionStore,
    location: Arc<dyn LocationProvider>,
    config: Arc<Config>,
    validation: ValidationService,
    event_bus: EventBus,
}

impl ReportService {
    pub fn new(
        api: Arc<dyn HazardApi>,
        sessions: SessionStore,
        location: Arc<dyn LocationProvider>,
        config: Arc<Config>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            api,
            sessions,
            location,
            config,
            validation: ValidationService::new(),
            event_bus,
        }
    }

    /// Fill the form's location label from the provider
    ///
    /// Returns the coordinate when one is available; the label is left
    /// untouched otherwise.
    pub fn prefill_location(&self, form: &mut ReportForm) -> Option<Coordinate> {
        let coordinate = self.location.current_location()?;
        form.location_text = coordinate.label();
        Some(coordinate)
    }

    /// Submit the form
    ///
    /// On success the form is reset. On any failure it is left as it was so
    /// the user can correct it and retry. The `submitting` flag is set for
    /// the duration of the call.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when a required field is blank, the description is
    ///   too long, or another submission is in flight
    /// - `LocationUnavailable` when there is no usable coordinate
    /// - `AuthRequired` when there is no valid session
    /// - `Api` when the backend is unreachable or rejects the report
    pub async fn submit(&self, form: &mut ReportForm) -> Result<SubmitReceipt> {
        if form.submitting {
            return Err(CoastwatchError::InvalidInput(
                SUBMISSION_IN_PROGRESS_MESSAGE.to_string(),
            ));
        }

        form.submitting = true;
        self.event_bus.emit(Event::SubmissionStarted {
            hazard_type: form.hazard_type.map(|t| t.id.to_string()).unwrap_or_default(),
        });

        let result = self.send(form).await;
        form.submitting = false;

        match result {
            Ok(receipt) => {
                tracing::info!("Report submitted");
                form.reset();
                self.event_bus.emit(Event::SubmissionSucceeded {
                    message: receipt.message.clone(),
                });
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!("Report submission failed: {}", e);
                self.event_bus.emit(Event::SubmissionFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn send(&self, form: &ReportForm) -> Result<SubmitReceipt> {
        let hazard_type = self.validation.check(&ValidationRequest {
            hazard_type: form.hazard_type.map(|t| t.id.to_string()),
            description: form.description.clone(),
        })?;

        let coordinate = self.require_location()?;
        let session = self.require_session()?;

        let submission = ReportSubmission {
            hazard_type: hazard_type.id.to_string(),
            description: form.description.trim().to_string(),
            coordinate,
            user_id: self.sessions.user_id(),
            media: form.image.clone(),
            bearer_token: self
                .config
                .api
                .send_auth_header
                .then(|| session.token().to_string()),
        };

        tracing::debug!(
            "Submitting {} report at {} (user={:?})",
            submission.hazard_type,
            coordinate.label(),
            submission.user_id
        );

        self.api.submit_report(&submission).await
    }

    fn require_location(&self) -> Result<Coordinate> {
        let coordinate = self.location.current_location().ok_or_else(|| {
            CoastwatchError::LocationUnavailable(LOCATION_UNAVAILABLE_MESSAGE.to_string())
        })?;
        coordinate
            .validate()
            .map_err(CoastwatchError::LocationUnavailable)?;
        Ok(coordinate)
    }

    fn require_session(&self) -> Result<Session> {
        let now = Utc::now();
        match self.sessions.load()? {
            Some(session) if session.is_valid_at(now) => Ok(session),
            Some(_) => {
                self.sessions.clear()?;
                self.event_bus.emit(Event::SessionExpired);
                Err(CoastwatchError::AuthRequired(
                    "Your session has expired. Please log in again.".to_string(),
                ))
            }
            None => Err(CoastwatchError::AuthRequired(
                LOGIN_REQUIRED_MESSAGE.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::error::ApiError;
    use crate::location::FixedLocation;
    use crate::store::LocalStore;
    use crate::types::ImageMimeType;
    use chrono::Duration;

    struct Fixture {
        service: ReportService,
        api: Arc<MockApi>,
        sessions: SessionStore,
        events: EventBus,
    }

    fn fixture(api: MockApi, location: Option<Coordinate>, logged_in: bool) -> Fixture {
        let api = Arc::new(api);
        let sessions = SessionStore::new(LocalStore::in_memory());
        if logged_in {
            sessions.save("token-123").unwrap();
        }
        let events = EventBus::new(16);
        let service = ReportService::new(
            api.clone(),
            sessions.clone(),
            Arc::new(FixedLocation::from(location)),
            Arc::new(Config::default_config()),
            events.clone(),
        );
        Fixture {
            service,
            api,
            sessions,
            events,
        }
    }

    fn chennai() -> Option<Coordinate> {
        Some(Coordinate::new(13.0827, 80.2707))
    }

    fn filled_form() -> ReportForm {
        ReportForm {
            hazard_type: HazardType::find("flood"),
            location_text: "Lat: 13.0827, Lng: 80.2707".to_string(),
            description: "Water over the coast road".to_string(),
            image: Some(Media::new(vec![1, 2, 3], "photo.png", ImageMimeType::Png)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_successful_submit_resets_form() {
        let f = fixture(MockApi::with_reports(vec![]), chennai(), true);
        let mut form = filled_form();

        let receipt = f.service.submit(&mut form).await.unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Report submitted"));

        assert!(form.hazard_type.is_none());
        assert!(form.description.is_empty());
        assert!(form.location_text.is_empty());
        assert!(form.image.is_none());
        assert!(!form.is_submitting());

        let submissions = f.api.submissions();
        let sent = &submissions.lock().unwrap()[0];
        assert_eq!(sent.hazard_type, "flood");
        assert_eq!(sent.coordinate, Coordinate::new(13.0827, 80.2707));
        assert_eq!(sent.media.as_ref().map(|m| m.file_name.as_str()), Some("photo.png"));
        assert!(sent.user_id.is_none());
        // header policy defaults to off
        assert!(sent.bearer_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_description_sends_nothing() {
        let f = fixture(MockApi::with_reports(vec![]), chennai(), true);
        let mut form = filled_form();
        form.description = "   ".to_string();

        let err = f.service.submit(&mut form).await.unwrap_err();
        assert!(matches!(err, CoastwatchError::InvalidInput(_)));
        assert_eq!(f.api.submit_call_count(), 0);
        assert_eq!(form.hazard_type.map(|t| t.id), Some("flood"));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_missing_location_checked_before_session() {
        let f = fixture(MockApi::with_reports(vec![]), None, false);
        let mut form = filled_form();

        let err = f.service.submit(&mut form).await.unwrap_err();
        assert!(matches!(err, CoastwatchError::LocationUnavailable(_)));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(f.api.submit_call_count(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_location_rejected() {
        let f = fixture(
            MockApi::with_reports(vec![]),
            Some(Coordinate::new(95.0, 80.0)),
            true,
        );
        let err = f.service.submit(&mut filled_form()).await.unwrap_err();
        assert!(matches!(err, CoastwatchError::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_no_session_requires_auth() {
        let f = fixture(MockApi::with_reports(vec![]), chennai(), false);
        let mut form = filled_form();

        let err = f.service.submit(&mut form).await.unwrap_err();
        assert!(matches!(err, CoastwatchError::AuthRequired(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(f.api.submit_call_count(), 0);
        assert_eq!(form.description, "Water over the coast road");
    }

    #[tokio::test]
    async fn test_expired_session_is_purged() {
        let f = fixture(MockApi::with_reports(vec![]), chennai(), false);
        f.sessions
            .save_at("old", Utc::now() - Duration::days(8))
            .unwrap();
        let mut events = f.events.subscribe();

        let err = f.service.submit(&mut filled_form()).await.unwrap_err();
        assert!(matches!(err, CoastwatchError::AuthRequired(_)));
        assert!(f.sessions.load().unwrap().is_none());

        assert!(matches!(
            events.recv().await.unwrap(),
            Event::SubmissionStarted { .. }
        ));
        assert_eq!(events.recv().await.unwrap(), Event::SessionExpired);
        assert!(matches!(
            events.recv().await.unwrap(),
            Event::SubmissionFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_form() {
        let f = fixture(
            MockApi::submit_failure(ApiError::Rejected("Invalid hazard type".to_string())),
            chennai(),
            true,
        );
        let mut form = filled_form();

        let err = f.service.submit(&mut form).await.unwrap_err();
        assert_eq!(err.to_string(), "Server error: Invalid hazard type");
        assert_eq!(form.description, "Water over the coast road");
        assert!(form.image.is_some());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_submit_while_submitting_rejected() {
        let f = fixture(MockApi::with_reports(vec![]), chennai(), true);
        let mut form = filled_form();
        form.submitting = true;

        let err = f.service.submit(&mut form).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Missing information: {}", SUBMISSION_IN_PROGRESS_MESSAGE)
        );
        assert_eq!(f.api.submit_call_count(), 0);
    }

    #[tokio::test]
    async fn test_user_id_and_auth_header_policy() {
        let api = Arc::new(MockApi::with_reports(vec![]));
        let sessions = SessionStore::new(LocalStore::in_memory());
        sessions.save("token-123").unwrap();
        sessions
            .save_user(&serde_json::json!({"id": "user-42", "name": "Asha"}))
            .unwrap();

        let mut config = Config::default_config();
        config.api.send_auth_header = true;

        let service = ReportService::new(
            api.clone(),
            sessions,
            Arc::new(FixedLocation::from(chennai())),
            Arc::new(config),
            EventBus::new(16),
        );
        service.submit(&mut filled_form()).await.unwrap();

        let submissions = api.submissions();
        let sent = &submissions.lock().unwrap()[0];
        assert_eq!(sent.user_id.as_deref(), Some("user-42"));
        assert_eq!(sent.bearer_token.as_deref(), Some("token-123"));
    }

    #[test]
    fn test_prefill_location() {
        let f = fixture(MockApi::with_reports(vec![]), chennai(), true);
        let mut form = ReportForm::new();
        assert!(f.service.prefill_location(&mut form).is_some());
        assert_eq!(form.location_text, "Lat: 13.0827, Lng: 80.2707");
    }
}
