//! HTTP sessions routed through a single proxy

use crate::proxy::error::ProbeError;
use crate::proxy::models::{Proxy, ProxyType};
use crate::proxy::socks4::Socks4Session;
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::time::Duration;

/// Default user agent for probe requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Raw response of a session request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    pub status: u16,
    pub body: String,
}

/// A client bound to one proxy
#[async_trait]
pub trait Session: Send + Sync {
    async fn get(&self, url: &str) -> Result<SessionResponse, ProbeError>;
}

/// Creates a fresh [`Session`] for every check task
pub trait SessionFactory: Send + Sync {
    fn create_session(
        &self,
        proxy: &Proxy,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, ProbeError>;
}

/// Session backed by a dedicated reqwest client
pub struct ReqwestSession {
    client: Client,
}

#[async_trait]
impl Session for ReqwestSession {
    async fn get(&self, url: &str) -> Result<SessionResponse, ProbeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(SessionResponse { status, body })
    }
}

/// Builds one reqwest client per session
///
/// Both http and https requests go through the proxy, so proxies that only
/// accept CONNECT tunnelling over plain HTTP are exercised for HTTPS too. The
/// client has no cookie store, so nothing carries over between probes.
/// SOCKS4 proxies, which reqwest cannot route, get a [`Socks4Session`].
#[derive(Debug, Clone)]
pub struct ReqwestSessionFactory {
    user_agent: String,
}

impl ReqwestSessionFactory {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    fn build_client(&self, proxy: &Proxy, timeout: Duration) -> Result<Client, reqwest::Error> {
        Client::builder()
            .proxy(ReqwestProxy::all(proxy.url())?)
            .timeout(timeout)
            .user_agent(&self.user_agent)
            .build()
    }
}

impl Default for ReqwestSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactory for ReqwestSessionFactory {
    fn create_session(
        &self,
        proxy: &Proxy,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, ProbeError> {
        if proxy.scheme == ProxyType::Socks4 {
            return Ok(Box::new(Socks4Session::new(
                proxy,
                timeout,
                self.user_agent.clone(),
            )));
        }

        let client = self
            .build_client(proxy, timeout)
            .map_err(|e| ProbeError::Session(e.to_string()))?;
        Ok(Box::new(ReqwestSession { client }))
    }
}
