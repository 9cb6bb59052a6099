//! Pool of live proxies with bounded repopulation

use crate::config::PoolConfig;
use crate::error::{DiscoveryError, PoolExhausted, PoolKind};
use crate::proxy::discovery::{Discovered, ProxyDiscovery};
use crate::proxy::models::{Proxy, ProxyType};
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Intake channel capacity; discovery blocks when the pool falls behind
const INTAKE_CAPACITY: usize = 16;

/// Live proxy endpoints handed out at random
pub struct ProxyPool {
    /// Proxies not yet known to be bad
    endpoints: Vec<Proxy>,
    /// Where replacements come from; `None` for a fixed pool
    discovery: Option<Box<dyn ProxyDiscovery>>,
    config: PoolConfig,
    /// Repopulations started so far
    refills: usize,
}

impl ProxyPool {
    /// A fixed pool that is never refilled
    pub fn new(endpoints: Vec<Proxy>) -> Self {
        Self {
            endpoints,
            discovery: None,
            config: PoolConfig::default(),
            refills: 0,
        }
    }

    /// A pool that refills itself from `discovery` whenever it runs dry
    pub fn with_discovery(
        endpoints: Vec<Proxy>,
        discovery: Box<dyn ProxyDiscovery>,
        config: PoolConfig,
    ) -> Self {
        Self {
            endpoints,
            discovery: Some(discovery),
            config,
            refills: 0,
        }
    }

    /// Pick a uniformly random live proxy, repopulating first if empty
    pub async fn pick_random(&mut self) -> Result<Proxy, PoolExhausted> {
        if self.endpoints.is_empty() {
            warn!("Ran out of proxies, repopulating pool");
            self.repopulate().await?;
        }

        self.endpoints
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(PoolExhausted(PoolKind::Proxies))
    }

    /// Drop a proxy that failed at the connection level
    pub fn remove(&mut self, proxy: &Proxy) {
        self.endpoints.retain(|p| p != proxy);
    }

    /// Run discovery until the pool holds something or the attempt budget
    /// is spent. Returns the pool size afterwards.
    pub async fn repopulate(&mut self) -> Result<usize, PoolExhausted> {
        let Some(discovery) = self.discovery.as_deref() else {
            return Err(PoolExhausted(PoolKind::Proxies));
        };
        if self.refills >= self.config.max_refills {
            warn!(refills = self.refills, "proxy refill budget spent");
            return Err(PoolExhausted(PoolKind::Proxies));
        }
        self.refills += 1;

        let mut backoff = self.config.discovery_backoff;
        for attempt in 1..=self.config.max_discovery_attempts {
            debug!(attempt, target = self.config.target, "finding proxies");

            let run = Self::intake(
                discovery,
                &mut self.endpoints,
                &self.config.types,
                self.config.target,
            );
            match tokio::time::timeout(self.config.discovery_timeout, run).await {
                Ok(Ok(added)) => info!(added, "proxy pool repopulated"),
                Ok(Err(error)) => warn!(attempt, %error, "proxy discovery failed"),
                Err(_) => warn!(attempt, "proxy discovery timed out"),
            }

            if !self.endpoints.is_empty() {
                return Ok(self.endpoints.len());
            }
            if attempt < self.config.max_discovery_attempts {
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
        }

        Err(PoolExhausted(PoolKind::Proxies))
    }

    /// Drive one discovery run to completion, draining its channel into
    /// `endpoints`. Proxies received before a failure are kept.
    async fn intake(
        discovery: &dyn ProxyDiscovery,
        endpoints: &mut Vec<Proxy>,
        types: &[ProxyType],
        target: usize,
    ) -> Result<usize, DiscoveryError> {
        let (tx, mut rx) = mpsc::channel(INTAKE_CAPACITY);

        let producer = discovery.discover(types, target, tx);
        let consumer = async move {
            let mut added = 0;
            while added < target {
                match rx.recv().await {
                    Some(Discovered::Proxy(proxy)) => {
                        if endpoints.contains(&proxy) {
                            continue;
                        }
                        debug!(%proxy, "added proxy to pool");
                        endpoints.push(proxy);
                        added += 1;
                    }
                    Some(Discovered::Finished) | None => break,
                }
            }
            added
        };

        let (produced, added) = tokio::join!(producer, consumer);
        produced.map(|()| added)
    }

    /// Number of live proxies
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Repopulations started over the pool's lifetime
    pub fn refills(&self) -> usize {
        self.refills
    }
}
