//! WiGLE Sweep
//!
//! Queries the WiGLE wireless network database through rotating API
//! credentials and proxies, pages through every result, and converts the
//! records to JSON, CSV or KML.

pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod logging;
pub mod proxy;
pub mod wigle;

pub use config::{Config, PoolConfig, RetryPolicy};
pub use credentials::{Credential, CredentialPool};
pub use error::{DiscoveryError, PoolExhausted, PoolKind, TransportError, WigleError};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
