//! Proxy crawler module for fetching proxies from websites
//!
//! Fetches public proxy-list pages and pulls `ip:port` entries out of them,
//! line by line first and by regex when the page is HTML.

use crate::proxy::models::{Proxy, ProxyType};
use crate::proxy::parser::ProxyParser;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Regex pattern to match IP:PORT patterns in text
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})\b")
        .expect("Invalid IP:PORT regex")
});

/// HTML tables list the address and the port in adjacent cells
static TABLE_ROW_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<td>\s*(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s*</td>\s*<td>\s*(\d{1,5})\s*</td>")
        .expect("Invalid table row regex")
});

/// Result of crawling a single source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The source that was crawled
    pub source: String,
    /// Proxies extracted from the source
    pub proxies: Vec<Proxy>,
    /// Error message if crawling failed
    pub error: Option<String>,
}

impl CrawlResult {
    /// Create a successful crawl result
    pub fn success(source: String, proxies: Vec<Proxy>) -> Self {
        Self {
            source,
            proxies,
            error: None,
        }
    }

    /// Create a failed crawl result
    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            proxies: Vec::new(),
            error: Some(error),
        }
    }
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Proxy source representing a website that provides proxy lists
#[derive(Debug, Clone)]
pub struct ProxySource {
    /// Name of the proxy source
    pub name: String,
    /// URL to fetch proxies from
    pub url: String,
    /// Type assigned to every proxy found on this page
    pub proxy_type: ProxyType,
}

impl ProxySource {
    pub fn new(name: &str, url: &str, proxy_type: ProxyType) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            proxy_type,
        }
    }
}

/// Proxy crawler for fetching proxies from websites
pub struct ProxyCrawler {
    client: Client,
}

impl ProxyCrawler {
    /// Create a new proxy crawler with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch and parse proxies from a single URL
    pub async fn crawl_url(&self, url: &str, proxy_type: ProxyType) -> Result<Vec<Proxy>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content = response.text().await?;
        Ok(Self::parse_proxies_from_text(&content, proxy_type))
    }

    /// Fetch and parse proxies from a ProxySource
    pub async fn crawl_source(&self, source: &ProxySource) -> Result<Vec<Proxy>> {
        self.crawl_url(&source.url, source.proxy_type).await
    }

    /// Crawl every source in turn, keeping per-source failures
    pub async fn crawl_sources_with_results(&self, sources: &[ProxySource]) -> Vec<CrawlResult> {
        let mut results = Vec::with_capacity(sources.len());

        for source in sources {
            let result = match self.crawl_source(source).await {
                Ok(proxies) => {
                    debug!(source = %source.name, found = proxies.len(), "crawled proxy source");
                    CrawlResult::success(source.name.clone(), proxies)
                }
                Err(e) => CrawlResult::failure(source.name.clone(), e.to_string()),
            };
            results.push(result);
        }

        results
    }

    /// Parse proxies from raw text content
    ///
    /// Plain lists are parsed line by line; anything else falls back to
    /// regex extraction. The result is deduplicated on host:port.
    pub fn parse_proxies_from_text(content: &str, proxy_type: ProxyType) -> Vec<Proxy> {
        let mut proxies = ProxyParser::parse_string(content, proxy_type);

        if proxies.is_empty() {
            proxies = Self::extract_proxies_with_regex(content, proxy_type);
        }

        dedup_proxies(&mut proxies);
        proxies
    }

    /// Extract proxies using regex patterns
    fn extract_proxies_with_regex(content: &str, proxy_type: ProxyType) -> Vec<Proxy> {
        IP_PORT_REGEX
            .captures_iter(content)
            .chain(TABLE_ROW_REGEX.captures_iter(content))
            .filter_map(|cap| {
                let host = cap.get(1)?.as_str();
                let port: u16 = cap.get(2)?.as_str().parse().ok()?;

                let valid_octets = host
                    .split('.')
                    .all(|part| part.parse::<u32>().map_or(false, |n| n <= 255));
                if !valid_octets || port == 0 {
                    return None;
                }

                Some(Proxy::new(host, port, proxy_type))
            })
            .collect()
    }

    /// Public lists offering plain HTTP and CONNECT-capable proxies
    pub fn common_sources() -> Vec<ProxySource> {
        vec![
            ProxySource::new(
                "free-proxy-list.net",
                "https://free-proxy-list.net/",
                ProxyType::Http,
            ),
            ProxySource::new(
                "us-proxy.org",
                "https://www.us-proxy.org/",
                ProxyType::Http,
            ),
            ProxySource::new(
                "sslproxies",
                "https://www.sslproxies.org/",
                ProxyType::Https,
            ),
            ProxySource::new(
                "proxyscrape-http",
                "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http",
                ProxyType::Https,
            ),
        ]
    }
}

/// Drop repeated host:port pairs, keeping the first
pub(crate) fn dedup_proxies(proxies: &mut Vec<Proxy>) {
    let mut seen = HashSet::new();
    proxies.retain(|p| seen.insert(p.endpoint()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawler_config_builder() {
        let config = CrawlerConfig::new().with_timeout(Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);

        let default_timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        assert_eq!(CrawlerConfig::default().timeout, default_timeout);
    }

    #[test]
    fn test_crawl_result() {
        let proxies = vec![Proxy::new("192.168.1.1", 8080, ProxyType::Http)];
        let ok = CrawlResult::success("src".to_string(), proxies);
        assert!(ok.error.is_none());
        assert_eq!(ok.proxies.len(), 1);

        let failed = CrawlResult::failure("src".to_string(), "refused".to_string());
        assert_eq!(failed.error.as_deref(), Some("refused"));
        assert!(failed.proxies.is_empty());
    }

    #[test]
    fn test_parse_plain_list_with_comments() {
        let content = "# HTTP Proxies\n192.168.1.1:8080\n\n192.168.1.2:3128\n";
        let proxies = ProxyCrawler::parse_proxies_from_text(content, ProxyType::Https);
        assert_eq!(proxies.len(), 2);
        assert!(proxies.iter().all(|p| p.proxy_type == ProxyType::Https));
    }

    #[test]
    fn test_parse_html_table() {
        let content = r#"
<table>
<tr><td>192.168.1.1</td><td>8080</td><td>US</td></tr>
<tr><td> 10.0.0.7 </td><td>3128</td><td>DE</td></tr>
</table>
Some text with 10.0.0.1:3128 embedded
"#;
        let proxies = ProxyCrawler::parse_proxies_from_text(content, ProxyType::Http);
        assert_eq!(proxies.len(), 3);
        assert!(proxies.iter().any(|p| p.endpoint() == "10.0.0.7:3128"));
        assert!(proxies.iter().any(|p| p.endpoint() == "192.168.1.1:8080"));
    }

    #[test]
    fn test_parse_deduplicates_in_order() {
        let content = "192.168.1.1:8080\n192.168.1.2:3128\n192.168.1.1:8080\n";
        let proxies = ProxyCrawler::parse_proxies_from_text(content, ProxyType::Http);
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0].endpoint(), "192.168.1.1:8080");
        assert_eq!(proxies[1].endpoint(), "192.168.1.2:3128");
    }

    #[test]
    fn test_regex_rejects_bad_octets_and_ports() {
        let content = "<p>999.999.999.999:8080 and 192.168.1.1:0</p>";
        let proxies = ProxyCrawler::extract_proxies_with_regex(content, ProxyType::Http);
        assert!(proxies.is_empty());
    }

    #[test]
    fn test_common_sources_cover_http_and_https() {
        let sources = ProxyCrawler::common_sources();
        assert!(sources.iter().any(|s| s.proxy_type == ProxyType::Http));
        assert!(sources.iter().any(|s| s.proxy_type == ProxyType::Https));
        assert!(sources.iter().all(|s| s.url.starts_with("https://")));
    }
}
