//! Proxy data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Proxy type enumeration
///
/// Used both as the scheme of a proxy address and as a capability tag in
/// [`Proxy::types`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyType {
    /// Capabilities that imply the proxy can carry HTTPS traffic
    pub const HTTPS_CAPABLE: [ProxyType; 3] =
        [ProxyType::Https, ProxyType::Socks4, ProxyType::Socks5];

    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "http" => Some(ProxyType::Http),
            "https" => Some(ProxyType::Https),
            "socks4" => Some(ProxyType::Socks4),
            "socks5" => Some(ProxyType::Socks5),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

/// Protocol slot a probe is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// Proxy record together with its check state
///
/// Records are created and stored by the caller; the checker only mutates the
/// capability set and the success/failure bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub scheme: ProxyType,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<ProxyAuth>,
    /// Protocols and tunneling modes the proxy is believed to support
    #[serde(default)]
    pub types: BTreeSet<ProxyType>,
    #[serde(default)]
    pub success_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fail_at: Option<DateTime<Utc>>,
    /// Consecutive failed probes
    #[serde(default)]
    pub fail_count: u32,
}

/// Proxy record shared between its owner and the task checking it
pub type SharedProxy = Arc<Mutex<Proxy>>;

impl Proxy {
    /// Create a new proxy without authentication
    ///
    /// The capability set starts out as the scheme itself.
    pub fn new(host: String, port: u16, scheme: ProxyType) -> Self {
        Self {
            scheme,
            host,
            port,
            auth: None,
            types: BTreeSet::from([scheme]),
            success_at: None,
            fail_at: None,
            fail_count: 0,
        }
    }

    /// Create a new proxy with authentication
    pub fn with_auth(
        host: String,
        port: u16,
        scheme: ProxyType,
        username: String,
        password: String,
    ) -> Self {
        Self {
            auth: Some(ProxyAuth::new(username, password)),
            ..Self::new(host, port, scheme)
        }
    }

    /// Replace the capability set
    pub fn with_types<I: IntoIterator<Item = ProxyType>>(mut self, types: I) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    /// Wrap the record for handing it to a checker
    pub fn into_shared(self) -> SharedProxy {
        Arc::new(Mutex::new(self))
    }

    /// Get the proxy URL string
    pub fn url(&self) -> String {
        let auth_part = self.auth.as_ref().map_or(String::new(), |auth| {
            format!("{}:{}@", auth.username, auth.password)
        });

        format!("{}://{}{}:{}", self.scheme, auth_part, self.host, self.port)
    }

    /// Get the proxy string in IP:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether the address scheme is http or https
    pub fn is_http_scheme(&self) -> bool {
        self.scheme.to_string().starts_with("http")
    }

    /// Whether any known capability implies HTTPS support
    pub fn supports_https(&self) -> bool {
        ProxyType::HTTPS_CAPABLE
            .iter()
            .any(|t| self.types.contains(t))
    }

    /// No failure recorded since the last successful probe
    pub fn is_healthy(&self) -> bool {
        self.fail_count == 0
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Outcome of a single probe through a proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub protocol: Protocol,
    pub succeeded: bool,
    /// Diagnostic detail for failed probes
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn success(protocol: Protocol) -> Self {
        Self {
            protocol,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(protocol: Protocol, error: impl Into<String>) -> Self {
        Self {
            protocol,
            succeeded: false,
            error: Some(error.into()),
        }
    }
}
