//! Proxy handling
//!
//! This module provides functionality for:
//! - Parsing proxies from various formats (IP:PORT, IP:PORT:USER:PASS, etc.)
//! - Crawling proxy list websites and checking candidates concurrently
//! - Discovering working proxies onto an intake channel
//! - Keeping a pool of live proxies that refills itself when exhausted

pub mod checker;
pub mod crawler;
pub mod discovery;
pub mod models;
pub mod parser;
pub mod pool;

#[cfg(test)]
pub(crate) mod test_support;

pub use checker::{CheckerConfig, ProxyChecker};
pub use crawler::{CrawlResult, CrawlerConfig, ProxyCrawler, ProxySource};
pub use discovery::{CrawlerDiscovery, Discovered, ProxyDiscovery};
pub use models::{Proxy, ProxyAuth, ProxyCheckResult, ProxyCheckStatus, ProxyType};
pub use parser::ProxyParser;
pub use pool::ProxyPool;
