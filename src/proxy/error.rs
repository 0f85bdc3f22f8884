//! Error types for the checking engine

use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single probe request
///
/// Never leaves the probe client; it is folded into a failed
/// [`ProbeResult`](crate::proxy::ProbeResult).
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build session: {0}")]
    Session(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid check URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("check URL has no host or port: {0}")]
    InvalidUrl(String),
    #[error("SOCKS4 handshake failed: {0}")]
    Socks(#[from] tokio_socks::Error),
    #[error("TLS handshake failed: {0}")]
    Tls(#[from] tokio_native_tls::native_tls::Error),
    #[error("invalid request: {0}")]
    Http(#[from] hyper::http::Error),
    #[error("connection failed: {0}")]
    Connection(#[from] hyper::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP status: {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("response has no origin field")]
    MissingOrigin,
}

/// Errors surfaced by the checker to whoever waits on a batch
#[derive(Debug, Error)]
pub enum CheckError {
    /// No protocol was selected for a submitted proxy
    #[error("proxy not checked: {proxy}")]
    NotChecked { proxy: String },
    #[error("check task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for CheckError {
    fn from(err: tokio::task::JoinError) -> Self {
        CheckError::TaskFailed(err.to_string())
    }
}
