//! Integration tests for CoastwatchService
//!
//! Drives the service facade end to end against the mock backend and a
//! file-backed session store.

use chrono::{Duration, Utc};
use libcoastwatch::api::mock::{MockApi, MockConfig};
use libcoastwatch::api::RawReport;
use libcoastwatch::service::events::Event;
use libcoastwatch::service::{GateState, Period, ReportForm};
use libcoastwatch::{
    ApiError, CoastwatchError, CoastwatchService, Config, Coordinate, HazardType, LocalStore,
    SessionStore, SharedLocation,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    service: CoastwatchService,
    api: Arc<MockApi>,
    location: SharedLocation,
    session_path: std::path::PathBuf,
    _temp_dir: TempDir,
}

fn report(id: &str, hazard_type: &str, status: &str, days_ago: i64) -> RawReport {
    RawReport {
        id: id.to_string(),
        hazard_type: hazard_type.to_string(),
        latitude: 13.0827,
        longitude: 80.2707,
        description: format!("{} near the beach", hazard_type),
        created_at: Utc::now() - Duration::days(days_ago),
        status: status.to_string(),
        media_url: None,
    }
}

fn setup(api: MockApi) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let session_path = temp_dir.path().join("session.toml");

    let mut config = Config::default_config();
    config.session.path = session_path.to_string_lossy().into_owned();
    config.gate.min_display = "10ms".to_string();

    let api = Arc::new(api);
    let location = SharedLocation::new();
    let sessions = SessionStore::new(LocalStore::open(&session_path).unwrap());

    let service = CoastwatchService::with_parts(
        config,
        api.clone(),
        sessions,
        Arc::new(location.clone()),
    )
    .unwrap();

    Harness {
        service,
        api,
        location,
        session_path,
        _temp_dir: temp_dir,
    }
}

fn form(description: &str) -> ReportForm {
    let mut form = ReportForm::new();
    form.hazard_type = HazardType::find("ocean_trash");
    form.description = description.to_string();
    form
}

#[tokio::test]
async fn test_launch_login_and_report_workflow() {
    let h = setup(MockApi::with_reports(vec![]));
    let mut events = h.service.subscribe();

    // Fresh install: gate routes to login and starts tracking
    assert_eq!(h.service.gate().run().await, GateState::Unauthenticated);
    assert!(h.location.is_tracking());
    assert_eq!(
        events.recv().await.unwrap(),
        Event::GateResolved {
            authenticated: false
        }
    );

    // Sign in, then a fix arrives
    h.service.sessions().save("token-abc").unwrap();
    h.location.update(Coordinate::new(13.05, 80.28));
    assert_eq!(h.service.gate().run().await, GateState::Authenticated);

    let mut form = form("Fishing nets tangled on the rocks");
    assert!(h.service.report().prefill_location(&mut form).is_some());
    h.service.report().submit(&mut form).await.unwrap();

    assert!(form.description.is_empty());
    assert!(form.hazard_type.is_none());
    assert_eq!(h.api.submit_call_count(), 1);
    let submissions = h.api.submissions();
    assert_eq!(
        submissions.lock().unwrap()[0].coordinate,
        Coordinate::new(13.05, 80.28)
    );
}

#[tokio::test]
async fn test_session_persists_across_service_instances() {
    let h = setup(MockApi::with_reports(vec![]));
    h.service.sessions().save("persisted").unwrap();

    let reopened = SessionStore::new(LocalStore::open(&h.session_path).unwrap());
    let session = reopened.load().unwrap().unwrap();
    assert_eq!(session.token(), "persisted");
    assert!(session.is_valid_at(Utc::now()));
}

#[tokio::test]
async fn test_expired_session_blocks_report() {
    let h = setup(MockApi::with_reports(vec![]));
    h.service
        .sessions()
        .save_at("old", Utc::now() - Duration::days(7) - Duration::seconds(5))
        .unwrap();
    h.location.update(Coordinate::new(13.0, 80.0));

    let mut form = form("Plastic everywhere");
    let err = h.service.report().submit(&mut form).await.unwrap_err();
    assert!(matches!(err, CoastwatchError::AuthRequired(_)));
    assert_eq!(h.api.submit_call_count(), 0);
    assert!(h.service.sessions().load().unwrap().is_none());
    assert_eq!(form.description, "Plastic everywhere");
}

#[tokio::test]
async fn test_feed_load_search_and_analytics() {
    let h = setup(MockApi::with_reports(vec![
        report("1", "oil_spill", "pending", 1),
        report("2", "flood", "resolved", 3),
        report("3", "flood", "in_progress", 20),
        report("4", "high tide", "resolved", 200),
    ]));

    assert_eq!(h.service.feed().load().await.unwrap(), 4);

    let floods = h.service.feed().search("flood");
    assert_eq!(floods.len(), 2);
    assert_eq!(floods[0].id, "2");

    let week = h.service.analytics(Period::Week);
    assert_eq!(week.total, 2);
    assert_eq!(week.resolved, 1);
    assert_eq!(week.resolution_rate, 50);

    let all = h.service.analytics(Period::All);
    assert_eq!(all.total, 4);
    assert_eq!(all.top_types[0].label, "Flood");
    assert_eq!(all.top_types[0].percent, 50);
}

#[tokio::test]
async fn test_feed_failure_reports_server_error() {
    let failing = setup(MockApi::new(MockConfig {
        list_error: Some(ApiError::Status("Failed with status 502".to_string())),
        ..Default::default()
    }));
    let mut events = failing.service.subscribe();

    let err = failing.service.feed().refresh().await.unwrap_err();
    assert_eq!(err.to_string(), "Server error: Failed with status 502");
    assert_eq!(err.exit_code(), 1);

    let state = failing.service.feed().state();
    assert!(state.items.is_empty());
    assert!(!state.refreshing);
    assert_eq!(
        events.recv().await.unwrap(),
        Event::FeedLoading { refresh: true }
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        Event::FeedFailed { .. }
    ));
}

#[tokio::test]
async fn test_feed_loading_flag_during_fetch() {
    let h = setup(MockApi::new(MockConfig {
        reports: vec![report("1", "flood", "pending", 0)],
        delay: std::time::Duration::from_millis(50),
        ..Default::default()
    }));

    let feed = h.service.feed().clone();
    let task = tokio::spawn(async move { feed.load().await });

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(h.service.feed().state().loading);

    task.await.unwrap().unwrap();
    let state = h.service.feed().state();
    assert!(!state.loading);
    assert_eq!(state.items.len(), 1);
}

#[tokio::test]
async fn test_submission_events() {
    let h = setup(MockApi::submit_failure(ApiError::Network(
        "Network error. Please check your connection and try again.".to_string(),
    )));
    h.service.sessions().save("tok").unwrap();
    h.location.update(Coordinate::new(13.0, 80.0));
    let mut events = h.service.subscribe();

    let mut form = form("Debris after the storm");
    let err = h.service.report().submit(&mut form).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Network error. Please check your connection and try again."
    );
    assert!(!form.is_submitting());
    assert_eq!(form.description, "Debris after the storm");

    assert_eq!(
        events.recv().await.unwrap(),
        Event::SubmissionStarted {
            hazard_type: "ocean_trash".to_string()
        }
    );
    assert!(matches!(
        events.recv().await.unwrap(),
        Event::SubmissionFailed { .. }
    ));
}

#[test]
fn test_invalid_gate_duration_rejected() {
    let mut config = Config::default_config();
    config.gate.min_display = "soon".to_string();

    let result = CoastwatchService::with_parts(
        config,
        Arc::new(MockApi::with_reports(vec![])),
        SessionStore::new(LocalStore::in_memory()),
        Arc::new(SharedLocation::new()),
    );
    assert!(matches!(result, Err(CoastwatchError::Config(_))));
}
