//! Proxy Checker
//!
//! Validates proxies by probing an echo service through each of them
//! concurrently, tracking success/failure state and inferring HTTPS support.

pub mod proxy;

pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
