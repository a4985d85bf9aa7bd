//! Mock hazard API for testing
//!
//! A configurable in-process backend that records calls and submissions, so
//! service logic can be exercised without a network.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::api::{HazardApi, RawReport, ReportSubmission, SubmitReceipt};
use crate::error::{ApiError, Result};

/// Configuration for mock API behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Reports returned by a successful listing
    pub reports: Vec<RawReport>,

    /// Error returned by the listing instead of `reports`
    pub list_error: Option<ApiError>,

    /// Error returned by submissions
    pub submit_error: Option<ApiError>,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    /// Number of times list_reports has been called
    pub list_call_count: Arc<Mutex<usize>>,

    /// Submissions received (for verification)
    pub submissions: Arc<Mutex<Vec<ReportSubmission>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            reports: Vec::new(),
            list_error: None,
            submit_error: None,
            delay: Duration::from_millis(0),
            list_call_count: Arc::new(Mutex::new(0)),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock backend for testing
pub struct MockApi {
    config: MockConfig,
}

impl MockApi {
    /// Create a new mock API with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A backend that lists `reports` and accepts every submission
    pub fn with_reports(reports: Vec<RawReport>) -> Self {
        Self::new(MockConfig {
            reports,
            ..Default::default()
        })
    }

    /// A backend whose listing fails
    pub fn list_failure(error: ApiError) -> Self {
        Self::new(MockConfig {
            list_error: Some(error),
            ..Default::default()
        })
    }

    /// A backend that rejects every submission
    pub fn submit_failure(error: ApiError) -> Self {
        Self::new(MockConfig {
            submit_error: Some(error),
            ..Default::default()
        })
    }

    /// Handle onto the recorded submissions
    pub fn submissions(&self) -> Arc<Mutex<Vec<ReportSubmission>>> {
        Arc::clone(&self.config.submissions)
    }

    /// Handle onto the listing call counter
    pub fn list_calls(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.config.list_call_count)
    }

    pub fn submit_call_count(&self) -> usize {
        self.config.submissions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl HazardApi for MockApi {
    async fn list_reports(&self) -> Result<Vec<RawReport>> {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
        if let Ok(mut count) = self.config.list_call_count.lock() {
            *count += 1;
        }
        match &self.config.list_error {
            Some(error) => Err(error.clone().into()),
            None => Ok(self.config.reports.clone()),
        }
    }

    async fn submit_report(&self, submission: &ReportSubmission) -> Result<SubmitReceipt> {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
        if let Ok(mut submissions) = self.config.submissions.lock() {
            submissions.push(submission.clone());
        }
        match &self.config.submit_error {
            Some(error) => Err(error.clone().into()),
            None => Ok(SubmitReceipt {
                message: Some("Report submitted".to_string()),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
