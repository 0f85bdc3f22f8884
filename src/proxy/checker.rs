//! Proxy checker module driving concurrent proxy checks

use crate::proxy::capability::select_protocol;
use crate::proxy::error::CheckError;
use crate::proxy::models::{ProbeResult, SharedProxy};
use crate::proxy::probe::{CheckUrls, ProbeClient};
use crate::proxy::processor::{NoopProcessor, ProxyProcessor};
use crate::proxy::session::{ReqwestSessionFactory, SessionFactory};
use crate::proxy::state::apply_probe_result;
use crate::proxy::store::ProxyList;
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent checks
const DEFAULT_POOL_SIZE: usize = 10;

type Worker = JoinHandle<Result<ProbeResult, CheckError>>;

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each probe request, connect and read included
    pub timeout: Duration,
    /// Upper bound on checks in flight
    pub pool_size: usize,
    /// Probe plain HTTP when HTTPS is not probed
    pub http_check: bool,
    /// Probe HTTPS for proxies known to support it
    pub https_check: bool,
    /// Probe HTTPS regardless of known capabilities
    ///
    /// Some sources never report HTTPS support even when the proxy tunnels it.
    pub https_force_check: bool,
    /// Extra attempts for a failed probe
    pub max_retries: usize,
    /// Delay between probe attempts
    pub retry_timeout: Duration,
    /// Echo endpoints probed through each proxy
    pub check_urls: CheckUrls,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pool_size: DEFAULT_POOL_SIZE,
            http_check: true,
            https_check: true,
            https_force_check: false,
            max_retries: 0,
            retry_timeout: Duration::ZERO,
            check_urls: CheckUrls::default(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_http_check(mut self, enabled: bool) -> Self {
        self.http_check = enabled;
        self
    }

    pub fn with_https_check(mut self, enabled: bool) -> Self {
        self.https_check = enabled;
        self
    }

    pub fn with_https_force_check(mut self, enabled: bool) -> Self {
        self.https_force_check = enabled;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, retry_timeout: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_timeout = retry_timeout;
        self
    }

    pub fn with_check_urls(mut self, check_urls: CheckUrls) -> Self {
        self.check_urls = check_urls;
        self
    }
}

/// Everything a check task needs, shared by all tasks of a checker
struct CheckWorker {
    config: CheckerConfig,
    probe: ProbeClient,
    sessions: Arc<dyn SessionFactory>,
    processor: Arc<dyn ProxyProcessor>,
}

impl CheckWorker {
    async fn check(&self, proxy: &SharedProxy) -> Result<ProbeResult, CheckError> {
        let snapshot = proxy.lock().await.clone();
        let url = snapshot.url();

        let protocol = select_protocol(&snapshot.types, &self.config)
            .ok_or_else(|| CheckError::NotChecked { proxy: url.clone() })?;

        // A fresh session per task keeps descriptor usage bounded by the pool
        let result = match self.sessions.create_session(&snapshot, self.config.timeout) {
            Ok(session) => self.probe.probe(session.as_ref(), protocol, &url).await,
            Err(e) => {
                warn!("Could not create session for {}: {}", url, e);
                ProbeResult::failure(protocol, e.to_string())
            }
        };

        apply_probe_result(&mut *proxy.lock().await, &result);
        self.processor.process_proxy(proxy).await;

        Ok(result)
    }
}

/// Proxy checker for validating proxies
pub struct ProxyChecker {
    worker: Arc<CheckWorker>,
    pool: Arc<Semaphore>,
    /// Fire-and-forget tasks not yet joined
    background: Mutex<Vec<Worker>>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self::from_parts(
            config,
            Arc::new(ReqwestSessionFactory::new()),
            Arc::new(NoopProcessor),
        )
    }

    /// Replace the factory that creates per-task sessions
    pub fn with_session_factory(self, sessions: Arc<dyn SessionFactory>) -> Self {
        Self::from_parts(
            self.worker.config.clone(),
            sessions,
            Arc::clone(&self.worker.processor),
        )
    }

    /// Replace the hook invoked after each proxy is checked
    pub fn with_processor(self, processor: Arc<dyn ProxyProcessor>) -> Self {
        Self::from_parts(
            self.worker.config.clone(),
            Arc::clone(&self.worker.sessions),
            processor,
        )
    }

    fn from_parts(
        config: CheckerConfig,
        sessions: Arc<dyn SessionFactory>,
        processor: Arc<dyn ProxyProcessor>,
    ) -> Self {
        let probe = ProbeClient::new(config.check_urls.clone())
            .with_retries(config.max_retries, config.retry_timeout);
        let pool = Arc::new(Semaphore::new(config.pool_size.max(1)));

        Self {
            worker: Arc::new(CheckWorker {
                config,
                probe,
                sessions,
                processor,
            }),
            pool,
            background: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.worker.config
    }

    /// Check a single proxy on the current task, outside the pool
    pub async fn check_proxy(&self, proxy: &SharedProxy) -> Result<ProbeResult, CheckError> {
        self.worker.check(proxy).await
    }

    /// Check a batch of proxies, one task per proxy
    ///
    /// Waits for a free pool slot before spawning each task. With `join` the
    /// call returns once every task of the batch has finished, reporting the
    /// first task error. Without it the tasks keep running in the background
    /// and can be awaited later with [`ProxyChecker::join`].
    pub async fn check_batch(
        &self,
        proxies: Vec<SharedProxy>,
        join: bool,
    ) -> Result<(), CheckError> {
        let mut workers = Vec::with_capacity(proxies.len());
        for proxy in proxies {
            workers.push(self.spawn(proxy).await?);
        }

        if join {
            Self::join_workers(workers).await
        } else {
            let mut background = self.background.lock().await;
            // Finished tasks already logged their own errors
            background.retain(|w| !w.is_finished());
            background.extend(workers);
            Ok(())
        }
    }

    /// Check every record of a list and collect their updated state
    ///
    /// The list comes back even when a task failed, so partial progress can
    /// be saved before the error is reported.
    pub async fn check_list(&self, list: ProxyList) -> (ProxyList, Result<(), CheckError>) {
        let shared = list.into_shared();
        let outcome = self.check_batch(shared.clone(), true).await;
        (ProxyList::from_shared(&shared).await, outcome)
    }

    /// Wait for every background task spawned so far
    pub async fn join(&self) -> Result<(), CheckError> {
        let workers = std::mem::take(&mut *self.background.lock().await);
        Self::join_workers(workers).await
    }

    async fn spawn(&self, proxy: SharedProxy) -> Result<Worker, CheckError> {
        let permit = Arc::clone(&self.pool)
            .acquire_owned()
            .await
            .map_err(|e| CheckError::TaskFailed(e.to_string()))?;
        let worker = Arc::clone(&self.worker);

        Ok(tokio::spawn(async move {
            let _permit = permit;
            let outcome = worker.check(&proxy).await;
            if let Err(ref e) = outcome {
                error!("{}", e);
            }
            outcome
        }))
    }

    async fn join_workers(workers: Vec<Worker>) -> Result<(), CheckError> {
        let total = workers.len();
        let mut succeeded = 0;
        let mut first_error = None;

        for joined in join_all(workers).await {
            match joined.map_err(CheckError::from).and_then(|outcome| outcome) {
                Ok(result) if result.succeeded => succeeded += 1,
                Ok(_) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(
            "Checked {} proxies: {} good, {} bad",
            total,
            succeeded,
            total - succeeded
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
