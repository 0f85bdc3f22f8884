//! Sessions tunnelled through SOCKS4 proxies
//!
//! reqwest only speaks SOCKS5, so SOCKS4(a) proxies get a connection built by
//! hand: a `tokio-socks` CONNECT, optional TLS, then a single HTTP/1.1
//! exchange driven by hyper.

use crate::proxy::error::ProbeError;
use crate::proxy::models::Proxy;
use crate::proxy::session::{Session, SessionResponse};
use async_trait::async_trait;
use hyper::client::conn;
use hyper::header::{CONNECTION, HOST, USER_AGENT};
use hyper::{Body, Request};
use log::trace;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_native_tls::{native_tls, TlsConnector};
use tokio_socks::tcp::Socks4Stream;
use url::{Position, Url};

/// Session bound to one SOCKS4 proxy
///
/// Every request opens its own tunnel; nothing is kept between requests.
#[derive(Debug, Clone)]
pub struct Socks4Session {
    proxy_addr: String,
    user_id: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl Socks4Session {
    pub fn new(proxy: &Proxy, timeout: Duration, user_agent: String) -> Self {
        Self {
            proxy_addr: proxy.to_simple_string(),
            user_id: proxy.auth.as_ref().map(|auth| auth.username.clone()),
            timeout,
            user_agent,
        }
    }

    async fn fetch(&self, url: &str) -> Result<SessionResponse, ProbeError> {
        let url = Url::parse(url)?;
        let host = url
            .host_str()
            .ok_or_else(|| ProbeError::InvalidUrl(url.to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ProbeError::InvalidUrl(url.to_string()))?;

        let proxy_addr = self.proxy_addr.as_str();
        let target = (host.as_str(), port);
        let stream = match &self.user_id {
            Some(user_id) => Socks4Stream::connect_with_userid(proxy_addr, target, user_id).await?,
            None => Socks4Stream::connect(proxy_addr, target).await?,
        };
        trace!("SOCKS4 tunnel to {}:{} via {}", host, port, self.proxy_addr);

        let request = Request::get(&url[Position::BeforePath..])
            .header(HOST, host.as_str())
            .header(USER_AGENT, self.user_agent.as_str())
            .header(CONNECTION, "close")
            .body(Body::empty())?;

        if url.scheme() == "https" {
            let tls = TlsConnector::from(native_tls::TlsConnector::new()?);
            let stream = tls.connect(&host, stream).await?;
            send_request(stream, request).await
        } else {
            send_request(stream, request).await
        }
    }
}

async fn send_request<S>(io: S, request: Request<Body>) -> Result<SessionResponse, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = conn::handshake(io).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            trace!("SOCKS4 connection closed: {}", e);
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status().as_u16();
    let body = hyper::body::to_bytes(response.into_body()).await?;

    Ok(SessionResponse {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

#[async_trait]
impl Session for Socks4Session {
    async fn get(&self, url: &str) -> Result<SessionResponse, ProbeError> {
        tokio::time::timeout(self.timeout, self.fetch(url))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
    }
}
