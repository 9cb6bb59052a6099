//! Proxy checker module for checking proxy liveness concurrently

use crate::proxy::models::{Proxy, ProxyCheckResult};
use crate::Result;
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, Proxy as ReqwestProxy};
use std::time::{Duration, Instant};

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 20;

/// HTTPS target so only CONNECT-capable proxies pass
const DEFAULT_TEST_URL: &str = "https://httpbin.org/ip";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// URL to test proxies against
    pub test_url: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
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
}

/// Proxy checker for validating proxies
#[derive(Debug, Clone)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Check a single proxy against the test URL
    pub async fn check_proxy(&self, proxy: &Proxy) -> ProxyCheckResult {
        let start = Instant::now();

        let client = match self.create_client(proxy) {
            Ok(client) => client,
            Err(e) => return ProxyCheckResult::failed(proxy.clone(), e.to_string()),
        };

        let request = client.get(&self.config.test_url).send();
        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => {
                let elapsed = start.elapsed().as_millis() as u64;
                ProxyCheckResult::working(proxy.clone(), elapsed)
            }
            Ok(Ok(response)) => ProxyCheckResult::failed(
                proxy.clone(),
                format!("HTTP status: {}", response.status()),
            ),
            Ok(Err(e)) => ProxyCheckResult::failed(proxy.clone(), e.to_string()),
            Err(_) => ProxyCheckResult::timeout(proxy.clone()),
        }
    }

    /// Check proxies concurrently, yielding results as they complete
    pub fn check_stream(&self, proxies: Vec<Proxy>) -> impl Stream<Item = ProxyCheckResult> + '_ {
        stream::iter(proxies)
            .map(move |proxy| async move { self.check_proxy(&proxy).await })
            .buffer_unordered(self.config.concurrency.max(1))
    }

    /// Create an HTTP client that routes through the given proxy
    fn create_client(&self, proxy: &Proxy) -> Result<Client> {
        let client = Client::builder()
            .proxy(ReqwestProxy::all(proxy.connect_url())?)
            .timeout(self.config.timeout)
            .build()?;

        Ok(client)
    }
}
