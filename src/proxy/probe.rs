//! Probe client issuing health-check requests through a proxy

use crate::proxy::error::ProbeError;
use crate::proxy::models::{ProbeResult, Protocol};
use crate::proxy::session::Session;
use log::debug;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

/// Echo endpoint for HTTP probes
pub const DEFAULT_HTTP_CHECK_URL: &str = "http://httpbin.org/get?show_env=1";

/// Echo endpoint for HTTPS probes
pub const DEFAULT_HTTPS_CHECK_URL: &str = "https://httpbin.org/get?show_env=1";

/// Echo endpoints per protocol slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckUrls {
    pub http: String,
    pub https: String,
}

impl CheckUrls {
    pub fn for_protocol(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::Http => &self.http,
            Protocol::Https => &self.https,
        }
    }
}

impl Default for CheckUrls {
    fn default() -> Self {
        Self {
            http: DEFAULT_HTTP_CHECK_URL.to_string(),
            https: DEFAULT_HTTPS_CHECK_URL.to_string(),
        }
    }
}

/// Issues probes and validates echo responses
#[derive(Debug, Clone)]
pub struct ProbeClient {
    urls: CheckUrls,
    max_retries: usize,
    retry_timeout: Duration,
}

impl ProbeClient {
    pub fn new(urls: CheckUrls) -> Self {
        Self {
            urls,
            max_retries: 0,
            retry_timeout: Duration::ZERO,
        }
    }

    /// Retry failed requests `max_retries` times, `retry_timeout` apart
    pub fn with_retries(mut self, max_retries: usize, retry_timeout: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_timeout = retry_timeout;
        self
    }

    /// Probe `protocol` through the proxy the session is bound to
    ///
    /// Every failure (network error, timeout, bad status, malformed body or
    /// missing origin marker) is reported as a failed result.
    pub async fn probe(
        &self,
        session: &dyn Session,
        protocol: Protocol,
        proxy_url: &str,
    ) -> ProbeResult {
        let url = self.urls.for_protocol(protocol);
        let strategy = FixedInterval::new(self.retry_timeout).take(self.max_retries);

        match Retry::start(strategy, || Self::fetch_echo(session, url)).await {
            Ok(()) => {
                debug!("Check {} success: {}", protocol, proxy_url);
                ProbeResult::success(protocol)
            }
            Err(e) => {
                debug!("Check {} fail: {}: {}", protocol, proxy_url, e);
                ProbeResult::failure(protocol, e.to_string())
            }
        }
    }

    async fn fetch_echo(session: &dyn Session, url: &str) -> Result<(), ProbeError> {
        let response = session.get(url).await?;
        if response.status >= 400 {
            return Err(ProbeError::Status(response.status));
        }
        validate_echo(&response.body)
    }
}

/// Check that a body is a JSON echo carrying the origin marker
pub fn validate_echo(body: &str) -> Result<(), ProbeError> {
    let echo: Value = serde_json::from_str(body)?;
    match echo.get("origin") {
        Some(_) => Ok(()),
        None => Err(ProbeError::MissingOrigin),
    }
}
