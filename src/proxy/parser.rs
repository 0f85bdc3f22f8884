//! Proxy parser module for parsing proxy lists from text

use crate::proxy::models::{Proxy, ProxyType};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// scheme://[user:pass@]host:port
static URL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?|socks[45])://(?:([^:@/]+):([^@/]+)@)?([^:@/]+):(\d+)/?$")
        .expect("Invalid proxy URL regex")
});

/// user:pass@host:port
static AUTH_AT_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:@]+):([^@]+)@([^:@]+):(\d+)$").expect("Invalid user:pass@host:port regex")
});

/// Proxy parser for parsing proxies from strings and files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Supports formats:
    /// - IP:PORT
    /// - IP:PORT:USER:PASS
    /// - USER:PASS@IP:PORT
    /// - scheme://IP:PORT
    /// - scheme://USER:PASS@IP:PORT
    ///
    /// Lines without a scheme use `default_scheme`. The capability set of a
    /// parsed proxy is its scheme.
    pub fn parse_line(line: &str, default_scheme: ProxyType) -> Option<Proxy> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        Self::parse_url_format(line)
            .or_else(|| Self::parse_auth_at_format(line, default_scheme))
            .or_else(|| Self::parse_colon_format(line, default_scheme))
    }

    fn parse_url_format(line: &str) -> Option<Proxy> {
        let caps = URL_FORMAT.captures(line)?;
        let scheme = ProxyType::from_scheme(&caps[1])?;
        let host = caps[4].to_string();
        let port: u16 = caps[5].parse().ok()?;

        match (caps.get(2), caps.get(3)) {
            (Some(user), Some(pass)) => Some(Proxy::with_auth(
                host,
                port,
                scheme,
                user.as_str().to_string(),
                pass.as_str().to_string(),
            )),
            _ => Some(Proxy::new(host, port, scheme)),
        }
    }

    fn parse_auth_at_format(line: &str, default_scheme: ProxyType) -> Option<Proxy> {
        let caps = AUTH_AT_FORMAT.captures(line)?;
        let port: u16 = caps[4].parse().ok()?;

        Some(Proxy::with_auth(
            caps[3].to_string(),
            port,
            default_scheme,
            caps[1].to_string(),
            caps[2].to_string(),
        ))
    }

    fn parse_colon_format(line: &str, default_scheme: ProxyType) -> Option<Proxy> {
        let parts: Vec<&str> = line.split(':').collect();

        match parts.as_slice() {
            [host, port] => Some(Proxy::new(host.to_string(), port.parse().ok()?, default_scheme)),
            [host, port, user, pass] => Some(Proxy::with_auth(
                host.to_string(),
                port.parse().ok()?,
                default_scheme,
                user.to_string(),
                pass.to_string(),
            )),
            _ => None,
        }
    }

    /// Parse proxies from a string (multiple lines)
    pub fn parse_string(content: &str, default_scheme: ProxyType) -> Vec<Proxy> {
        content
            .lines()
            .filter_map(|line| Self::parse_line(line, default_scheme))
            .collect()
    }

    /// Parse proxies from a file
    pub fn parse_file<P: AsRef<Path>>(path: P, default_scheme: ProxyType) -> Result<Vec<Proxy>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_string(&content, default_scheme))
    }
}
