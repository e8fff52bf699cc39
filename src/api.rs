//! HTTP client for the comparison/report server.
//!
//! All calls are blocking and run on background task closures so the UI
//! thread never waits on the network. The analysis endpoint gets its own
//! client with an extended timeout to accommodate slow generation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{AnalysisResult, ComparisonResult, ReportEntry};

/// Timeout for ordinary requests. Generous because comparisons over large
/// requirement files take noticeable time.
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Timeout for the generative-analysis request. Generation routinely takes
/// over a minute on large reports.
const ANALYSIS_TIMEOUT_SECS: u64 = 120;

/// Default server address when neither flag nor env var is set.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Explicit error payload from the server; preferred verbatim over any
    /// generic message.
    #[error("{0}")]
    Server(String),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("reading requirements file: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True when the server sent an explicit error message the user should
    /// see verbatim.
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

#[derive(Debug, Deserialize)]
struct VisualsResponse {
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    ok: bool,
}

/// Blocking client for every remote operation the workspace issues.
pub struct ApiClient {
    base: String,
    client: reqwest::blocking::Client,
    analysis_client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Result<Self, ApiError> {
        let base = base.into();
        let base = base.trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("reqlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let analysis_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(ANALYSIS_TIMEOUT_SECS))
            .user_agent(concat!("reqlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base,
            client,
            analysis_client,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Run a comparison: uploads the requirements file plus the schema URL
    /// and returns the full result. An `{error}` body becomes
    /// [`ApiError::Server`].
    pub fn compare(
        &self,
        requirements: &Path,
        schema_url: &str,
    ) -> Result<ComparisonResult, ApiError> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("file", requirements)?
            .text("schema_url", schema_url.to_string());
        let response = self
            .client
            .post(format!("{}/api/compare", self.base))
            .multipart(form)
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        let value: serde_json::Value = response.json()?;
        into_payload(value)
    }

    pub fn list_reports(&self) -> Result<Vec<ReportEntry>, ApiError> {
        let response = self
            .client
            .get(format!("{}/reports", self.base))
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        let reports: Vec<ReportEntry> = response.json()?;
        debug!(count = reports.len(), "listed reports");
        Ok(reports)
    }

    /// Fetch the visuals listing for one report. An empty image list is a
    /// valid outcome, not an error.
    pub fn fetch_visuals(&self, path: &str) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/reports/visuals?path={}",
                self.base,
                urlencoding::encode(path)
            ))
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        let visuals: VisualsResponse = response.json()?;
        Ok(visuals.images)
    }

    /// Request a generative full-text analysis of one report. Long-running;
    /// uses the extended-timeout client.
    pub fn analyze(&self, path: &str) -> Result<AnalysisResult, ApiError> {
        let response = self
            .analysis_client
            .post(format!("{}/reports/analysis", self.base))
            .form(&[("path", path)])
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        let value: serde_json::Value = response.json()?;
        into_payload(value)
    }

    /// Delete one report. Returns the server's `ok` verdict; an
    /// already-deleted path comes back as a failure like any other.
    pub fn delete_report(&self, path: &str) -> Result<bool, ApiError> {
        let response = self
            .client
            .post(format!("{}/reports/delete", self.base))
            .form(&[("path", path)])
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        let verdict: DeleteResponse = response.json()?;
        Ok(verdict.ok)
    }

    /// Direct download link for a report; the client only constructs it.
    pub fn download_url(&self, path: &str) -> String {
        format!(
            "{}/download?path={}",
            self.base,
            urlencoding::encode(path)
        )
    }
}

/// Decode a body that is either the success payload or `{"error": "..."}`.
fn into_payload<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
        return Err(ApiError::Server(message.to_string()));
    }
    serde_json::from_value(value).map_err(|e| {
        debug!("undecodable response body: {e}");
        ApiError::Server("unknown response".to_string())
    })
}
