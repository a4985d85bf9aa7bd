//! Boundary to the remote hazard-report API
//!
//! The [`HazardApi`] trait is the only way the services reach the backend.
//! Responses are checked against typed envelopes here, so nothing loosely
//! typed leaks inward: a bad envelope becomes [`ApiError`].
//!
//! # Examples
//!
//! ```no_run
//! use libcoastwatch::api::{HazardApi, http::HttpApi};
//! use libcoastwatch::config::ApiConfig;
//!
//! # async fn example() -> libcoastwatch::Result<()> {
//! let api = HttpApi::new(&ApiConfig::default())?;
//! let reports = api.list_reports().await?;
//! println!("{} reports", reports.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::types::{Coordinate, Media};

pub mod http;

// Mock API is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Shown for any connectivity failure
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Shown when the server rejects a submission without saying why
pub const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to submit report. Please try again.";

/// A report as the listing endpoint returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "hazardType")]
    pub hazard_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "mediaUrl", default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

/// Everything the submission endpoint receives
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    /// Catalog id, not the display name
    pub hazard_type: String,
    pub description: String,
    pub coordinate: Coordinate,
    pub user_id: Option<String>,
    pub media: Option<Media>,
    /// Bearer token, present only when the auth-header policy is on
    pub bearer_token: Option<String>,
}

/// A successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Hazard-report backend
#[async_trait]
pub trait HazardApi: Send + Sync {
    /// Fetch every report the backend lists, in server order
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` when the backend cannot be reached
    /// - `ApiError::Status` on a non-2xx response
    /// - `ApiError::Rejected` / `ApiError::Malformed` on a bad envelope
    async fn list_reports(&self) -> Result<Vec<RawReport>>;

    /// Post one report
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` when the backend cannot be reached
    /// - `ApiError::Status` with the response body on a non-2xx response
    /// - `ApiError::Rejected` with the server message on `success: false`
    async fn submit_report(&self, submission: &ReportSubmission) -> Result<SubmitReceipt>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Validate a listing response body and extract its reports
///
/// The envelope must be `{ success: true, data: [...] }`. Individual records
/// that do not match [`RawReport`] are skipped with a warning.
pub fn parse_listing(body: &str) -> std::result::Result<Vec<RawReport>, ApiError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    if json.get("success").and_then(Value::as_bool) != Some(true) {
        let message = json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("listing reported failure");
        return Err(ApiError::Rejected(message.to_string()));
    }

    let Some(items) = json.get("data").and_then(Value::as_array) else {
        return Err(ApiError::Malformed("`data` is not an array".to_string()));
    };

    let mut reports = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<RawReport>(item.clone()) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!("Skipping malformed report at index {}: {}", index, e),
        }
    }
    Ok(reports)
}

/// Turn a submission response into a receipt or the reason it failed
///
/// Non-2xx bodies are plain text and are never parsed as the envelope.
pub fn parse_submit_response(
    status: u16,
    body: &str,
) -> std::result::Result<SubmitReceipt, ApiError> {
    if !(200..300).contains(&status) {
        let body = body.trim();
        let reason = if body.is_empty() {
            format!("Failed with status {}", status)
        } else {
            body.to_string()
        };
        return Err(ApiError::Status(reason));
    }

    let envelope: SubmitEnvelope =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    if envelope.success {
        Ok(SubmitReceipt {
            message: envelope.message,
        })
    } else {
        let reason = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| SUBMIT_FALLBACK_MESSAGE.to_string());
        Err(ApiError::Rejected(reason))
    }
}
