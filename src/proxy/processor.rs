//! Post-check hooks invoked once per checked proxy

use crate::proxy::models::{Proxy, SharedProxy};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receives every proxy after its state has been updated
#[async_trait]
pub trait ProxyProcessor: Send + Sync {
    async fn process_proxy(&self, proxy: &SharedProxy);
}

/// Hook that does nothing
#[derive(Debug, Clone, Default)]
pub struct NoopProcessor;

#[async_trait]
impl ProxyProcessor for NoopProcessor {
    async fn process_proxy(&self, _proxy: &SharedProxy) {}
}

/// Forwards a snapshot of each checked proxy over a channel
#[derive(Debug, Clone)]
pub struct ChannelProcessor {
    tx: mpsc::UnboundedSender<Proxy>,
}

impl ChannelProcessor {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Proxy>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProxyProcessor for ChannelProcessor {
    async fn process_proxy(&self, proxy: &SharedProxy) {
        let snapshot = proxy.lock().await.clone();
        // Receiver may be gone; checking carries on regardless
        let _ = self.tx.send(snapshot);
    }
}
