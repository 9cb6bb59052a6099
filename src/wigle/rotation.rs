//! Credential and proxy rotation

use crate::credentials::{Credential, CredentialPool};
use crate::error::PoolExhausted;
use crate::proxy::{Proxy, ProxyPool};
use tracing::debug;

/// Credential and proxy for exactly one upstream call
#[derive(Debug, Clone)]
pub struct Lease {
    pub credential: Credential,
    pub proxy: Proxy,
}

/// Owns both pools; resolver and fetcher borrow it in turn
pub struct Rotation {
    credentials: CredentialPool,
    proxies: ProxyPool,
}

impl Rotation {
    pub fn new(credentials: CredentialPool, proxies: ProxyPool) -> Self {
        Self {
            credentials,
            proxies,
        }
    }

    /// Random credential plus random proxy.
    ///
    /// Credentials are checked first so an exhausted credential pool never
    /// triggers a proxy refill.
    pub async fn lease(&mut self) -> Result<Lease, PoolExhausted> {
        let credential = self.credentials.pick_random()?;
        let proxy = self.proxies.pick_random().await?;

        debug!(
            proxy = %proxy,
            credential = %credential.identifier,
            "proxying request"
        );
        Ok(Lease { credential, proxy })
    }

    /// Retire a credential whose quota is spent
    pub fn burn_credential(&mut self, credential: &Credential) {
        self.credentials.remove(credential);
        debug!(
            credential = %credential.identifier,
            remaining = self.credentials.len(),
            "removed exhausted credential"
        );
    }

    /// Retire a proxy that failed at the transport level
    pub fn burn_proxy(&mut self, proxy: &Proxy) {
        self.proxies.remove(proxy);
        debug!(proxy = %proxy, remaining = self.proxies.len(), "removed failing proxy");
    }

    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }
}
