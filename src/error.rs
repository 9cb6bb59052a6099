//! Error types shared across the crate

use std::fmt;
use thiserror::Error;

/// Which pool ran dry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Credentials,
    Proxies,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Credentials => write!(f, "credential"),
            PoolKind::Proxies => write!(f, "proxy"),
        }
    }
}

/// A pool had nothing left to hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} pool exhausted")]
pub struct PoolExhausted(pub PoolKind);

/// Transport-level failure of a single upstream call.
///
/// Every variant is blamed on the proxy the call went through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection via {proxy} failed: {message}")]
    Connection { proxy: String, message: String },
    #[error("request via {proxy} timed out")]
    Timeout { proxy: String },
    #[error("unreadable response via {proxy} (HTTP {status}): {message}")]
    Malformed {
        proxy: String,
        status: u16,
        message: String,
    },
    #[error("could not build client for {proxy}: {message}")]
    Client { proxy: String, message: String },
}

/// Failure of a proxy discovery run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("no proxy source could be reached")]
    Unreachable,
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum WigleError {
    #[error(transparent)]
    PoolExhausted(#[from] PoolExhausted),
    #[error("ran out of working credentials, results may not be complete")]
    OutOfCredentials,
    #[error("no geocoding result for {address:?}: {message}")]
    NoGeocodeResult { address: String, message: String },
    #[error("no data to export")]
    NoDataToExport,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}
