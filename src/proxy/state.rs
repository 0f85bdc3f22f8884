//! Applying probe outcomes to proxy records

use crate::proxy::models::{ProbeResult, Protocol, Proxy, ProxyType};
use chrono::Utc;

/// Apply a probe outcome to a proxy record
///
/// A success clears the failure bookkeeping. A failure bumps the consecutive
/// failure counter. HTTPS probes through http(s)-scheme proxies also add or
/// revoke the `Https` capability.
pub fn apply_probe_result(proxy: &mut Proxy, result: &ProbeResult) {
    let https_over_http = result.protocol == Protocol::Https && proxy.is_http_scheme();

    if result.succeeded {
        proxy.success_at = Some(Utc::now());
        proxy.fail_at = None;
        proxy.fail_count = 0;
        if https_over_http {
            proxy.types.insert(ProxyType::Https);
        }
    } else {
        proxy.fail_at = Some(Utc::now());
        proxy.fail_count = proxy.fail_count.saturating_add(1);
        if https_over_http {
            proxy.types.remove(&ProxyType::Https);
        }
    }
}
