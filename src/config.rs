//! Configuration file loading
//!
//! The file is JSON with camelCase keys; only `creds` is mandatory.

use crate::credentials::Credential;
use crate::error::WigleError;
use crate::proxy::{Proxy, ProxyParser, ProxyType};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default WiGLE API root
pub const DEFAULT_API_BASE: &str = "https://api.wigle.net/api/v2";

const DEFAULT_NUM_PROXIES: usize = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 120;
const DEFAULT_DISCOVERY_ATTEMPTS: usize = 3;
const DEFAULT_MAX_REFILLS: usize = 5;
const DEFAULT_MAX_REJECTIONS: usize = 3;

/// On-disk layout of `config.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    debug: bool,
    creds: Vec<Credential>,
    num_proxies: Option<usize>,
    #[serde(default)]
    proxies: Vec<String>,
    api_base: Option<String>,
    request_timeout_secs: Option<u64>,
    discovery_timeout_secs: Option<u64>,
    max_discovery_attempts: Option<usize>,
    max_refills: Option<usize>,
    max_rejections: Option<usize>,
}

/// Limits for proxy pool repopulation
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// How many proxies one repopulation aims for
    pub target: usize,
    /// Proxy types requested from discovery
    pub types: Vec<ProxyType>,
    /// Upper bound on a single discovery run
    pub discovery_timeout: Duration,
    /// Discovery runs per repopulation
    pub max_discovery_attempts: usize,
    /// Delay before the second discovery run, doubled after each failure
    pub discovery_backoff: Duration,
    /// Repopulations allowed over the pool's lifetime
    pub max_refills: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_NUM_PROXIES,
            types: vec![ProxyType::Http, ProxyType::Https],
            discovery_timeout: Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
            max_discovery_attempts: DEFAULT_DISCOVERY_ATTEMPTS,
            discovery_backoff: Duration::from_secs(1),
            max_refills: DEFAULT_MAX_REFILLS,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_max_discovery_attempts(mut self, attempts: usize) -> Self {
        self.max_discovery_attempts = attempts;
        self
    }

    pub fn with_max_refills(mut self, refills: usize) -> Self {
        self.max_refills = refills;
        self
    }
}

/// Bounds on retries that do not shrink a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive unrecognised rejections tolerated per page or address
    pub max_rejections: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Log at debug level
    pub debug: bool,
    /// WiGLE API credentials, at least one
    pub credentials: Vec<Credential>,
    /// Proxies to start with before any discovery
    pub seed_proxies: Vec<Proxy>,
    /// API root without a trailing slash
    pub api_base: String,
    /// Timeout for each upstream call
    pub request_timeout: Duration,
    pub pool: PoolConfig,
    pub retry: RetryPolicy,
}

impl Config {
    /// Read and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WigleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> Result<Self, WigleError> {
        let raw: RawConfig = serde_json::from_str(content)?;

        if raw.creds.is_empty() {
            return Err(WigleError::Config(
                "at least one entry in \"creds\" is required".to_string(),
            ));
        }

        let mut seed_proxies = Vec::with_capacity(raw.proxies.len());
        for line in &raw.proxies {
            let proxy = ProxyParser::parse_line(line, ProxyType::Http)
                .ok_or_else(|| WigleError::Config(format!("unparseable proxy: {}", line)))?;
            seed_proxies.push(proxy);
        }

        let mut pool = PoolConfig::new();
        if let Some(target) = raw.num_proxies {
            pool = pool.with_target(target);
        }
        if let Some(secs) = raw.discovery_timeout_secs {
            pool = pool.with_discovery_timeout(Duration::from_secs(secs));
        }
        if let Some(attempts) = raw.max_discovery_attempts {
            pool = pool.with_max_discovery_attempts(attempts);
        }
        if let Some(refills) = raw.max_refills {
            pool = pool.with_max_refills(refills);
        }

        let api_base = raw.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let request_timeout = raw
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            debug: raw.debug,
            credentials: raw.creds,
            seed_proxies,
            api_base: api_base.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(request_timeout),
            pool,
            retry: RetryPolicy {
                max_rejections: raw.max_rejections.unwrap_or(DEFAULT_MAX_REJECTIONS),
            },
        })
    }
}
