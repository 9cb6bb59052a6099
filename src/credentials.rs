//! API credentials and the pool they are drawn from

use crate::error::{PoolExhausted, PoolKind};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One WiGLE API name/token pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "api_name")]
    pub identifier: String,
    #[serde(rename = "api_token")]
    pub secret: String,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}

/// Live credentials. Entries only ever leave the pool.
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Pick a uniformly random live credential
    pub fn pick_random(&self) -> Result<Credential, PoolExhausted> {
        self.credentials
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(PoolExhausted(PoolKind::Credentials))
    }

    /// Drop a credential for good, e.g. once its daily quota is spent
    pub fn remove(&mut self, credential: &Credential) {
        self.credentials.retain(|c| c != credential);
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
