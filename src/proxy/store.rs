//! JSON persistence of proxy records

use crate::proxy::models::{Proxy, SharedProxy};
use crate::Result;
use anyhow::Context;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Ordered list of proxy records, unique by address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyList {
    proxies: Vec<Proxy>,
}

impl ProxyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a list saved with [`ProxyList::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read proxy list {:?}", path))?;
        let proxies: Vec<Proxy> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid proxy list {:?}", path))?;

        let mut list = Self::new();
        list.extend(proxies);
        Ok(list)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.proxies)?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Append proxies whose address is not in the list yet
    pub fn extend<I: IntoIterator<Item = Proxy>>(&mut self, proxies: I) {
        let mut seen: HashSet<String> = self.proxies.iter().map(Proxy::to_simple_string).collect();
        for proxy in proxies {
            if seen.insert(proxy.to_simple_string()) {
                self.proxies.push(proxy);
            }
        }
    }

    /// Hand the records out for checking
    pub fn into_shared(self) -> Vec<SharedProxy> {
        self.proxies.into_iter().map(Proxy::into_shared).collect()
    }

    /// Collect checked records back into a list
    pub async fn from_shared(shared: &[SharedProxy]) -> Self {
        let mut proxies = Vec::with_capacity(shared.len());
        for proxy in shared {
            proxies.push(proxy.lock().await.clone());
        }
        Self { proxies }
    }

    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn healthy(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies.iter().filter(|p| p.is_healthy() && p.success_at.is_some())
    }
}

impl FromIterator<Proxy> for ProxyList {
    fn from_iter<I: IntoIterator<Item = Proxy>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::ProxyType;
    use chrono::Utc;

    fn proxy(host: &str, port: u16) -> Proxy {
        Proxy::new(host.to_string(), port, ProxyType::Http)
    }

    #[test]
    fn test_extend_deduplicates_by_address() {
        let mut list = ProxyList::new();
        list.extend([proxy("1.1.1.1", 80), proxy("1.1.1.1", 80), proxy("1.1.1.1", 81)]);
        list.extend([Proxy::new("1.1.1.1".to_string(), 80, ProxyType::Socks5)]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.proxies()[0].scheme, ProxyType::Http);
    }

    #[test]
    fn test_save_and_load_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.json");

        let mut checked = proxy("2.2.2.2", 3128).with_types([ProxyType::Http, ProxyType::Https]);
        checked.fail_at = Some(Utc::now());
        checked.fail_count = 2;
        let list: ProxyList = vec![checked, proxy("3.3.3.3", 8080)].into_iter().collect();

        list.save(&path).unwrap();
        let loaded = ProxyList::load(&path).unwrap();

        assert_eq!(loaded, list);
        assert_eq!(loaded.proxies()[0].fail_count, 2);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        assert!(ProxyList::load(&path).is_err());
        assert!(ProxyList::load(dir.path().join("missing.json")).is_err());
    }

    #[tokio::test]
    async fn test_shared_round_trip_sees_mutations() {
        let list: ProxyList = vec![proxy("1.1.1.1", 80), proxy("2.2.2.2", 80)]
            .into_iter()
            .collect();
        let shared = list.into_shared();
        shared[1].lock().await.success_at = Some(Utc::now());

        let list = ProxyList::from_shared(&shared).await;
        let healthy: Vec<_> = list.healthy().map(|p| p.host.as_str()).collect();
        assert_eq!(healthy, vec!["2.2.2.2"]);
    }
}
