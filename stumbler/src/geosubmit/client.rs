//! Geosubmit upload and geolocate client.

use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::Url;
use tracing::{debug, info};

use super::dto::{GeosubmitRequest, LocateRequest, LocateResponse, LocationEstimate};
use super::transport::{HttpTransport, TransportError, DEFAULT_TIMEOUT};
use super::{join_url, SubmitError};
use crate::report::Report;

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.beacondb.net";

/// Default upload path.
pub const DEFAULT_SUBMISSION_PATH: &str = "/v2/geosubmit";

/// Default geolocate path.
pub const DEFAULT_LOCATE_PATH: &str = "/v1/geolocate";

/// Endpoint settings for [`GeosubmitClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeosubmitConfig {
    pub base_url: String,
    pub submission_path: String,
    pub locate_path: String,
    /// Appended as `?key=` when set.
    pub api_key: Option<String>,
    /// Per-request timeout applied by the transport.
    pub timeout: Duration,
}

impl Default for GeosubmitConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            submission_path: DEFAULT_SUBMISSION_PATH.to_string(),
            locate_path: DEFAULT_LOCATE_PATH.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeosubmitConfig {
    pub fn submission_url(&self) -> Result<Url, SubmitError> {
        self.endpoint(&self.submission_path)
    }

    pub fn locate_url(&self) -> Result<Url, SubmitError> {
        self.endpoint(&self.locate_path)
    }

    fn endpoint(&self, path: &str) -> Result<Url, SubmitError> {
        let joined = join_url(&self.base_url, path);
        let mut url = Url::parse(&joined).map_err(|e| SubmitError::InvalidEndpoint {
            url: joined.clone(),
            reason: e.to_string(),
        })?;
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

/// Client for the geosubmit (upload) and geolocate (query) protocols.
///
/// Holds no state across calls beyond the transport. Failures are
/// classified (see [`SubmitError::is_retryable`]) but never retried here.
pub struct GeosubmitClient<T> {
    transport: T,
    config: GeosubmitConfig,
}

impl<T: HttpTransport> GeosubmitClient<T> {
    pub fn new(transport: T, config: GeosubmitConfig) -> Self {
        Self { transport, config }
    }

    /// Upload a batch of reports as one gzip-compressed geosubmit request.
    ///
    /// Empty reports are left out. A batch with nothing left to send
    /// succeeds without a request.
    pub async fn send_reports(&self, reports: &[Report]) -> Result<(), SubmitError> {
        let sendable: Vec<Report> = reports.iter().filter(|r| !r.is_empty()).cloned().collect();
        if sendable.is_empty() {
            debug!("No non-empty reports to submit");
            return Ok(());
        }

        let url = self.config.submission_url()?;
        let body = encode_submission(&GeosubmitRequest::from_reports(&sendable))?;

        debug!(url = %redact(&url), reports = sendable.len(), bytes = body.len(), "Submitting reports");
        self.transport.post(url.as_str(), body, true).await?;

        info!(reports = sendable.len(), "Reports submitted");
        Ok(())
    }

    /// [`send_reports`](Self::send_reports) bounded by `deadline`.
    ///
    /// An expired deadline aborts the in-flight request and is reported as a
    /// retryable timeout.
    pub async fn send_reports_within(
        &self,
        reports: &[Report],
        deadline: Duration,
    ) -> Result<(), SubmitError> {
        tokio::time::timeout(deadline, self.send_reports(reports))
            .await
            .map_err(|_| SubmitError::Transport(TransportError::Timeout))?
    }

    /// Ask the service for a position estimate.
    pub async fn get_location(&self, request: &LocateRequest) -> Result<LocationEstimate, SubmitError> {
        let url = self.config.locate_url()?;
        let body =
            serde_json::to_vec(request).map_err(|e| SubmitError::Serialization(e.to_string()))?;

        debug!(url = %redact(&url), bytes = body.len(), "Requesting location");
        let response = self.transport.post(url.as_str(), body, false).await?;

        let parsed: LocateResponse = serde_json::from_slice(&response)
            .map_err(|e| SubmitError::Protocol(format!("Malformed geolocate response: {}", e)))?;
        LocationEstimate::try_from(parsed)
            .map_err(|e| SubmitError::Protocol(format!("Geolocate returned {}", e)))
    }

    pub fn config(&self) -> &GeosubmitConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Serialize and gzip a geosubmit body.
pub fn encode_submission(request: &GeosubmitRequest) -> Result<Vec<u8>, SubmitError> {
    let json = serde_json::to_vec(request).map_err(|e| SubmitError::Serialization(e.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
    let gzip_error = |e: std::io::Error| SubmitError::Serialization(format!("gzip: {}", e));
    encoder.write_all(&json).map_err(gzip_error)?;
    encoder.finish().map_err(gzip_error)
}

/// URL for logging with the API key masked.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    if url.query_pairs().any(|(k, _)| k == "key") {
        shown.set_query(Some("key=***"));
    }
    shown.to_string()
}
