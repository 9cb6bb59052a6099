//! Scripted upstream for resolver and fetcher tests.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GeocodeResponse, NetworkRecord, SearchQuery, SearchResponse, WigleApi};
use crate::credentials::{Credential, CredentialPool};
use crate::error::TransportError;
use crate::proxy::{Proxy, ProxyPool, ProxyType};
use crate::wigle::Rotation;

/// One search call as the stub saw it
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub credential: String,
    pub proxy: String,
    pub first: usize,
}

/// Plays back scripted responses in order.
///
/// An exhausted search script answers with `resultCount: 0`; an exhausted
/// geocode script answers with no results.
#[derive(Default)]
pub struct ScriptedApi {
    geocodes: Mutex<VecDeque<Result<GeocodeResponse, TransportError>>>,
    searches: Mutex<VecDeque<Result<SearchResponse, TransportError>>>,
    search_calls: Mutex<Vec<SearchCall>>,
    geocode_calls: Mutex<usize>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_searches(self, searches: Vec<Result<SearchResponse, TransportError>>) -> Self {
        *self.searches.lock().unwrap() = searches.into();
        self
    }

    pub fn with_geocodes(self, geocodes: Vec<Result<GeocodeResponse, TransportError>>) -> Self {
        *self.geocodes.lock().unwrap() = geocodes.into();
        self
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn geocode_calls(&self) -> usize {
        *self.geocode_calls.lock().unwrap()
    }
}

#[async_trait]
impl WigleApi for ScriptedApi {
    async fn geocode(
        &self,
        _credential: &Credential,
        _proxy: &Proxy,
        _address: &str,
    ) -> Result<GeocodeResponse, TransportError> {
        *self.geocode_calls.lock().unwrap() += 1;
        self.geocodes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GeocodeResponse::default()))
    }

    async fn search(
        &self,
        credential: &Credential,
        proxy: &Proxy,
        _query: &SearchQuery,
        first: usize,
    ) -> Result<SearchResponse, TransportError> {
        self.search_calls.lock().unwrap().push(SearchCall {
            credential: credential.identifier.clone(),
            proxy: proxy.endpoint(),
            first,
        });
        self.searches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(empty_page()))
    }
}

pub fn records(count: usize, offset: usize) -> Vec<NetworkRecord> {
    (offset..offset + count)
        .map(|i| {
            let bssid = format!("00:00:00:00:{:02x}:{:02x}", i / 256, i % 256);
            NetworkRecord::new(format!("net-{}", i), bssid, 51.0, -1.0)
        })
        .collect()
}

pub fn page(count: usize, offset: usize) -> Result<SearchResponse, TransportError> {
    Ok(SearchResponse {
        result_count: Some(count as u64),
        results: records(count, offset),
        ..SearchResponse::default()
    })
}

pub fn empty_page() -> SearchResponse {
    SearchResponse {
        result_count: Some(0),
        ..SearchResponse::default()
    }
}

pub fn refusal(message: &str) -> SearchResponse {
    SearchResponse {
        message: Some(message.to_string()),
        ..SearchResponse::default()
    }
}

pub fn quota() -> Result<SearchResponse, TransportError> {
    Ok(refusal("too many queries today"))
}

pub fn geocode_refusal(message: &str) -> GeocodeResponse {
    GeocodeResponse {
        message: Some(message.to_string()),
        ..GeocodeResponse::default()
    }
}

pub fn dead_proxy<T>() -> Result<T, TransportError> {
    Err(TransportError::Connection {
        proxy: "scripted".to_string(),
        message: "connection refused".to_string(),
    })
}

/// Rotation over `credentials` named AID1.. and `proxies` fixed proxies
pub fn rotation(credentials: usize, proxies: usize) -> Rotation {
    Rotation::new(
        CredentialPool::new(
            (1..=credentials)
                .map(|i| Credential::new(format!("AID{}", i), format!("token{}", i)))
                .collect(),
        ),
        ProxyPool::new(
            (1..=proxies)
                .map(|i| Proxy::new(format!("10.0.0.{}", i), 8080, ProxyType::Http))
                .collect(),
        ),
    )
}
