//! Proxy endpoint models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol a proxy speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProxyType {
    #[default]
    Http,
    /// HTTP proxy that supports CONNECT tunnelling
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

/// Login for an authenticated proxy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyAuth {
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
}

/// A single proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
    /// Host address (IP or hostname)
    pub host: String,
    /// Port number
    pub port: u16,
    /// Type of proxy
    pub proxy_type: ProxyType,
    /// Optional authentication
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(host: impl Into<String>, port: u16, proxy_type: ProxyType) -> Self {
        Self {
            host: host.into(),
            port,
            proxy_type,
            auth: None,
        }
    }

    /// Create a new proxy with authentication
    pub fn with_auth(
        host: impl Into<String>,
        port: u16,
        proxy_type: ProxyType,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            proxy_type,
            auth: Some(ProxyAuth {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL handed to the HTTP client.
    ///
    /// HTTP and HTTPS proxies are both reached over plain HTTP; HTTPS only
    /// means the proxy will tunnel TLS with CONNECT.
    pub fn connect_url(&self) -> String {
        let scheme = match self.proxy_type {
            ProxyType::Http | ProxyType::Https => "http",
            ProxyType::Socks4 => "socks4",
            ProxyType::Socks5 => "socks5",
        };
        let auth_part = self.auth.as_ref().map_or(String::new(), |auth| {
            format!("{}:{}@", auth.username, auth.password)
        });

        format!("{}://{}{}", scheme, auth_part, self.endpoint())
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.proxy_type, self.endpoint())
    }
}

/// Outcome of checking one proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCheckStatus {
    Working,
    Failed(String),
    Timeout,
}

/// Result of a proxy check
#[derive(Debug, Clone)]
pub struct ProxyCheckResult {
    /// The proxy that was checked
    pub proxy: Proxy,
    /// Status of the check
    pub status: ProxyCheckStatus,
    /// Response time in milliseconds (if successful)
    pub response_time_ms: Option<u64>,
}

impl ProxyCheckResult {
    /// Create a successful check result
    pub fn working(proxy: Proxy, response_time_ms: u64) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Working,
            response_time_ms: Some(response_time_ms),
        }
    }

    /// Create a failed check result
    pub fn failed(proxy: Proxy, error: String) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Failed(error),
            response_time_ms: None,
        }
    }

    /// Create a timeout check result
    pub fn timeout(proxy: Proxy) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Timeout,
            response_time_ms: None,
        }
    }

    /// Check if the proxy is working
    pub fn is_working(&self) -> bool {
        matches!(self.status, ProxyCheckStatus::Working)
    }
}
