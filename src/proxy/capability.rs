//! Capability inference: which protocol to probe a proxy with

use crate::proxy::checker::CheckerConfig;
use crate::proxy::models::{Protocol, ProxyType};
use std::collections::BTreeSet;

/// Select the protocol to probe for a proxy with the given capabilities
///
/// HTTPS is probed when the proxy is known to tunnel HTTPS (or the check is
/// forced). A working HTTPS probe is taken as evidence that plain HTTP works
/// too, so HTTP is only probed when the HTTPS branch was not taken at all.
/// Returns `None` when the configuration selects nothing for this proxy.
pub fn select_protocol(types: &BTreeSet<ProxyType>, config: &CheckerConfig) -> Option<Protocol> {
    let https_support = ProxyType::HTTPS_CAPABLE.iter().any(|t| types.contains(t));

    if (config.https_check && https_support) || config.https_force_check {
        Some(Protocol::Https)
    } else if config.http_check {
        Some(Protocol::Http)
    } else {
        None
    }
}
