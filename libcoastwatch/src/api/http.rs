//! reqwest-backed implementation of [`HazardApi`]

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::api::{
    parse_listing, parse_submit_response, HazardApi, RawReport, ReportSubmission, SubmitReceipt,
    NETWORK_ERROR_MESSAGE,
};
use crate::config::ApiConfig;
use crate::error::{ApiError, CoastwatchError, Result};

/// Talks to the hazard-report backend over HTTP
pub struct HttpApi {
    client: Client,
    listing_url: String,
    report_url: String,
}

/// Log the transport detail, surface the generic connectivity message
fn map_network_error(error: reqwest::Error, context: &str) -> ApiError {
    if error.is_timeout() {
        tracing::warn!("{} timed out: {}", context, error);
    } else {
        tracing::warn!("{} failed: {}", context, error);
    }
    ApiError::Network(NETWORK_ERROR_MESSAGE.to_string())
}

impl HttpApi {
    /// Build a client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout()?)
            .user_agent(concat!("coastwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| map_network_error(e, "building HTTP client"))?;

        Ok(Self {
            client,
            listing_url: config.listing_url(),
            report_url: config.report_url(),
        })
    }

    fn build_form(submission: &ReportSubmission) -> Result<Form> {
        let mut form = Form::new()
            .text("hazardType", submission.hazard_type.clone())
            .text("description", submission.description.clone())
            .text("latitude", submission.coordinate.latitude.to_string())
            .text("longitude", submission.coordinate.longitude.to_string());

        if let Some(user_id) = &submission.user_id {
            form = form.text("userId", user_id.clone());
        }

        if let Some(media) = &submission.media {
            let part = Part::bytes(media.bytes.clone())
                .file_name(media.file_name.clone())
                .mime_str(media.mime_type.as_str())
                .map_err(|e| {
                    CoastwatchError::InvalidInput(format!("Invalid image type: {}", e))
                })?;
            form = form.part("media", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl HazardApi for HttpApi {
    async fn list_reports(&self) -> Result<Vec<RawReport>> {
        tracing::debug!("GET {}", self.listing_url);

        let response = self
            .client
            .get(&self.listing_url)
            .send()
            .await
            .map_err(|e| map_network_error(e, "fetching reports"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_network_error(e, "reading report listing"))?;

        if !status.is_success() {
            tracing::error!("Report listing failed with {}: {}", status, body);
            let reason = if body.trim().is_empty() {
                format!("Failed with status {}", status.as_u16())
            } else {
                body.trim().to_string()
            };
            return Err(ApiError::Status(reason).into());
        }

        let reports = parse_listing(&body).inspect_err(|e| {
            tracing::error!("API did not return successful data: {}", e);
        })?;
        tracing::debug!("Fetched {} reports", reports.len());
        Ok(reports)
    }

    async fn submit_report(&self, submission: &ReportSubmission) -> Result<SubmitReceipt> {
        let form = Self::build_form(submission)?;

        let mut request = self.client.post(&self.report_url).multipart(form);
        if let Some(token) = &submission.bearer_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(
            "POST {} (hazardType={}, media={})",
            self.report_url,
            submission.hazard_type,
            submission.media.is_some()
        );

        let response = request
            .send()
            .await
            .map_err(|e| map_network_error(e, "submitting report"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_network_error(e, "reading submission response"))?;

        if !status.is_success() {
            tracing::error!("Report submit failed {} {}", status.as_u16(), body);
        }

        Ok(parse_submit_response(status.as_u16(), &body)?)
    }

    fn name(&self) -> &str {
        "http"
    }
}
