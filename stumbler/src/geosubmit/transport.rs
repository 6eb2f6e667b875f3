//! HTTP transport abstraction for testability.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use thiserror::Error;
use tracing::{trace, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("stumbler/", env!("CARGO_PKG_VERSION"));

/// Failure of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request or connection timed out.
    #[error("Request timed out")]
    Timeout,

    /// No connection could be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Other I/O failure. The network stack may hint the call can be
    /// repeated at once, e.g. after a reset of a pooled connection.
    #[error("I/O error: {message}")]
    Io {
        message: String,
        immediately_retryable: bool,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    /// Timeouts are retryable; other I/O failures only with a retry hint.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout => true,
            TransportError::Io {
                immediately_retryable,
                ..
            } => *immediately_retryable,
            TransportError::Connection(_) | TransportError::Status { .. } => false,
        }
    }
}

/// Trait for asynchronous HTTP POST operations.
pub trait HttpTransport: Send + Sync {
    /// POST a JSON `body` to `url` and return the response body.
    ///
    /// When `gzip` is set the body is already gzip-compressed and is sent
    /// with `Content-Encoding: gzip`. Non-2xx answers are
    /// [`TransportError::Status`].
    fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        gzip: bool,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Asynchronous HTTP transport using reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Io {
                message: format!("Failed to create HTTP client: {}", e),
                immediately_retryable: false,
            })?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn post(&self, url: &str, body: Vec<u8>, gzip: bool) -> Result<Vec<u8>, TransportError> {
        trace!(url = url, bytes = body.len(), gzip, "HTTP POST");

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json");
        if gzip {
            request = request.header(CONTENT_ENCODING, "gzip");
        }

        let response = request.body(body).send().await.map_err(|e| {
            warn!(
                url = url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            classify(&e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| classify(&e))?;

        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    match io_error_kind(err) {
        Some(io::ErrorKind::TimedOut) => TransportError::Timeout,
        Some(kind) if is_immediately_retryable(kind) => TransportError::Io {
            message: err.to_string(),
            immediately_retryable: true,
        },
        _ if err.is_connect() => TransportError::Connection(err.to_string()),
        _ => TransportError::Io {
            message: err.to_string(),
            immediately_retryable: false,
        },
    }
}

/// Kind of the innermost `io::Error` in an error's source chain.
fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    let mut found = None;
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            found = Some(io_err.kind());
        }
        current = e.source();
    }
    found
}

/// A dropped pooled connection; a fresh attempt is expected to succeed.
fn is_immediately_retryable(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
