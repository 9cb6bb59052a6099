//! Proxy discovery: the producer side of pool repopulation

use crate::error::DiscoveryError;
use crate::proxy::checker::ProxyChecker;
use crate::proxy::crawler::{dedup_proxies, ProxyCrawler, ProxySource};
use crate::proxy::models::{Proxy, ProxyType};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Message on the intake channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    Proxy(Proxy),
    /// No more proxies will follow
    Finished,
}

/// Something that can find working proxies.
///
/// Implementations stream what they find onto `intake` and should stop
/// early once the receiver is dropped.
#[async_trait]
pub trait ProxyDiscovery: Send + Sync {
    async fn discover(
        &self,
        types: &[ProxyType],
        limit: usize,
        intake: mpsc::Sender<Discovered>,
    ) -> Result<(), DiscoveryError>;
}

/// Discovery backed by public proxy lists and a liveness check
pub struct CrawlerDiscovery {
    crawler: ProxyCrawler,
    checker: ProxyChecker,
    sources: Vec<ProxySource>,
}

impl CrawlerDiscovery {
    /// Discovery over the built-in public proxy lists
    pub fn new(crawler: ProxyCrawler, checker: ProxyChecker) -> Self {
        Self {
            crawler,
            checker,
            sources: ProxyCrawler::common_sources(),
        }
    }

    /// Replace the proxy lists to crawl
    pub fn with_sources(mut self, sources: Vec<ProxySource>) -> Self {
        self.sources = sources;
        self
    }
}

#[async_trait]
impl ProxyDiscovery for CrawlerDiscovery {
    async fn discover(
        &self,
        types: &[ProxyType],
        limit: usize,
        intake: mpsc::Sender<Discovered>,
    ) -> Result<(), DiscoveryError> {
        let sources: Vec<ProxySource> = self
            .sources
            .iter()
            .filter(|source| types.contains(&source.proxy_type))
            .cloned()
            .collect();

        let mut candidates = Vec::new();
        let mut reached = 0;
        for result in self.crawler.crawl_sources_with_results(&sources).await {
            match result.error {
                None => {
                    reached += 1;
                    candidates.extend(result.proxies);
                }
                Some(error) => warn!(source = %result.source, %error, "proxy source failed"),
            }
        }
        if reached == 0 && !sources.is_empty() {
            return Err(DiscoveryError::Unreachable);
        }

        dedup_proxies(&mut candidates);
        debug!(candidates = candidates.len(), "checking proxy candidates");

        let mut sent = 0;
        let mut checks = Box::pin(self.checker.check_stream(candidates));
        while sent < limit {
            let Some(result) = checks.next().await else {
                break;
            };
            if !result.is_working() {
                continue;
            }
            debug!(
                proxy = %result.proxy,
                ms = ?result.response_time_ms,
                "proxy passed check"
            );
            if intake.send(Discovered::Proxy(result.proxy)).await.is_err() {
                // Consumer has what it needs
                return Ok(());
            }
            sent += 1;
        }

        let _ = intake.send(Discovered::Finished).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::checker::CheckerConfig;
    use crate::proxy::crawler::CrawlerConfig;
    use crate::proxy::test_support::spawn_proxy_list;
    use std::time::Duration;

    fn crawler_discovery(sources: Vec<ProxySource>) -> CrawlerDiscovery {
        let timeout = Duration::from_secs(2);
        let crawler = ProxyCrawler::with_config(CrawlerConfig::new().with_timeout(timeout));
        let checker = ProxyChecker::with_config(CheckerConfig {
            timeout,
            concurrency: 4,
            // Plain HTTP so the local responders can act as proxies
            test_url: "http://wigle-sweep.test/ip".to_string(),
        });
        CrawlerDiscovery::new(crawler.unwrap(), checker)
            .with_sources(sources)
    }

    /// Three local responders, each serving a list naming all three
    async fn local_proxy_list() -> (ProxySource, Vec<Proxy>) {
        let ports = spawn_proxy_list(3).await;

        let url = format!("http://127.0.0.1:{}/list.txt", ports[0]);
        let source = ProxySource::new("local", &url, ProxyType::Http);
        let proxies = ports
            .iter()
            .map(|port| Proxy::new("127.0.0.1", *port, ProxyType::Http))
            .collect();
        (source, proxies)
    }

    async fn drain(mut rx: mpsc::Receiver<Discovered>) -> Vec<Discovered> {
        let mut received = Vec::new();
        while let Some(message) = rx.recv().await {
            received.push(message);
        }
        received
    }

    #[tokio::test]
    async fn test_every_source_down_is_unreachable() {
        // Nothing listens on port 9 of the loopback interface
        let dead = ProxySource::new("dead", "http://127.0.0.1:9/", ProxyType::Http);
        let (tx, rx) = mpsc::channel(16);

        let discovery = crawler_discovery(vec![dead]);
        let result = discovery.discover(&[ProxyType::Http], 5, tx).await;
        assert_eq!(result, Err(DiscoveryError::Unreachable));
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_sources_of_other_types_are_skipped() {
        let socks = ProxySource::new("socks", "http://127.0.0.1:9/", ProxyType::Socks5);
        let (tx, rx) = mpsc::channel(16);

        let discovery = crawler_discovery(vec![socks]);
        let result = discovery.discover(&[ProxyType::Http], 5, tx).await;
        assert_eq!(result, Ok(()));
        assert_eq!(drain(rx).await, vec![Discovered::Finished]);
    }

    #[tokio::test]
    async fn test_working_proxies_are_sent_up_to_the_limit() {
        let (source, proxies) = local_proxy_list().await;
        let (tx, rx) = mpsc::channel(16);

        let discovery = crawler_discovery(vec![source]);
        let result = discovery.discover(&[ProxyType::Http], 2, tx).await;
        assert_eq!(result, Ok(()));

        let received = drain(rx).await;
        assert_eq!(received.len(), 3);
        assert_eq!(received[2], Discovered::Finished);
        for message in &received[..2] {
            match message {
                Discovered::Proxy(proxy) => assert!(proxies.contains(proxy)),
                Discovered::Finished => panic!("finished before the limit"),
            }
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_discovery() {
        let (source, _) = local_proxy_list().await;
        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        let discovery = crawler_discovery(vec![source]);
        let result = discovery.discover(&[ProxyType::Http], 3, tx).await;
        assert_eq!(result, Ok(()));
    }
}
