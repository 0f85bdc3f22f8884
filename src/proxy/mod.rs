//! Proxy module for checking proxies
//!
//! This module provides functionality for:
//! - Parsing proxy lists from text and storing checked records as JSON
//! - Choosing which protocol to probe a proxy with
//! - Probing proxies against an echo service through a bounded worker pool
//! - Recording success/failure state and discovered HTTPS support

pub mod capability;
pub mod checker;
pub mod error;
pub mod models;
pub mod parser;
pub mod probe;
pub mod processor;
pub mod session;
pub mod socks4;
pub mod state;
pub mod store;

pub use capability::select_protocol;
pub use checker::{CheckerConfig, ProxyChecker};
pub use error::{CheckError, ProbeError};
pub use models::{ProbeResult, Protocol, Proxy, ProxyAuth, ProxyType, SharedProxy};
pub use parser::ProxyParser;
pub use probe::{CheckUrls, ProbeClient};
pub use processor::{ChannelProcessor, NoopProcessor, ProxyProcessor};
pub use session::{ReqwestSessionFactory, Session, SessionFactory, SessionResponse};
pub use socks4::Socks4Session;
pub use state::apply_probe_result;
pub use store::ProxyList;
