//! Authenticated access to the WiGLE API through a proxy

use crate::credentials::Credential;
use crate::error::TransportError;
use crate::proxy::Proxy;
use crate::wigle::models::{ApiResponse, GeocodeResponse, SearchQuery, SearchResponse};
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

const GEOCODE_PATH: &str = "/network/geocode";
const SEARCH_PATH: &str = "/network/search";

/// User agent sent with every API call
const USER_AGENT: &str = concat!("wigle-sweep/", env!("CARGO_PKG_VERSION"));

/// The two upstream calls the tool makes.
///
/// Both are a single attempt through one proxy with one credential.
/// Anything that stops a JSON object from arriving is a [`TransportError`];
/// API-level refusals come back as a parsed response.
#[async_trait]
pub trait WigleApi: Send + Sync {
    async fn geocode(
        &self,
        credential: &Credential,
        proxy: &Proxy,
        address: &str,
    ) -> Result<GeocodeResponse, TransportError>;

    async fn search(
        &self,
        credential: &Credential,
        proxy: &Proxy,
        query: &SearchQuery,
        first: usize,
    ) -> Result<SearchResponse, TransportError>;
}

/// [`WigleApi`] over HTTPS with reqwest
#[derive(Debug, Clone)]
pub struct HttpWigleApi {
    /// API root, e.g. `https://api.wigle.net/api/v2`
    base_url: String,
    /// Timeout for each call
    timeout: Duration,
}

impl HttpWigleApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    fn create_client(&self, proxy: &Proxy) -> Result<Client, TransportError> {
        let to_error = |e: reqwest::Error| TransportError::Client {
            proxy: proxy.endpoint(),
            message: e.to_string(),
        };

        Client::builder()
            .proxy(ReqwestProxy::all(proxy.connect_url()).map_err(to_error)?)
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(to_error)
    }

    async fn get<T: ApiResponse + Send>(
        &self,
        credential: &Credential,
        proxy: &Proxy,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let client = self.create_client(proxy)?;
        let to_error = |e: reqwest::Error| convert_reqwest_error(e, proxy);

        let response = client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&credential.identifier, Some(&credential.secret))
            .query(query)
            .send()
            .await
            .map_err(to_error)?;

        // WiGLE reports quota and auth problems in a JSON body on non-2xx
        // statuses, so the status alone decides nothing here.
        let status = response.status();
        let body = response.bytes().await.map_err(to_error)?;

        decode(proxy, status, &body)
    }
}

/// Turn a response body into `T`.
///
/// Only a body that is not a JSON object is blamed on the proxy; an object
/// of the wrong shape becomes a refusal via [`ApiResponse::unreadable`].
fn decode<T: ApiResponse>(
    proxy: &Proxy,
    status: StatusCode,
    body: &[u8],
) -> Result<T, TransportError> {
    let malformed = |message: String| TransportError::Malformed {
        proxy: proxy.endpoint(),
        status: status.as_u16(),
        message,
    };

    let value: Value = serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("body is not a JSON object".to_string()));
    }

    match serde_json::from_value(value) {
        Ok(response) => Ok(response),
        Err(e) => {
            warn!(%status, error = %e, "WiGLE response did not match the expected shape");
            Ok(T::unreadable(e.to_string()))
        }
    }
}

#[async_trait]
impl WigleApi for HttpWigleApi {
    async fn geocode(
        &self,
        credential: &Credential,
        proxy: &Proxy,
        address: &str,
    ) -> Result<GeocodeResponse, TransportError> {
        let query = [("addresscode", address.to_string())];
        self.get(credential, proxy, GEOCODE_PATH, &query).await
    }

    async fn search(
        &self,
        credential: &Credential,
        proxy: &Proxy,
        query: &SearchQuery,
        first: usize,
    ) -> Result<SearchResponse, TransportError> {
        let params = query.params(first);
        self.get(credential, proxy, SEARCH_PATH, &params).await
    }
}

fn convert_reqwest_error(error: reqwest::Error, proxy: &Proxy) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout {
            proxy: proxy.endpoint(),
        };
    }
    TransportError::Connection {
        proxy: proxy.endpoint(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyType;
    use crate::wigle::models::{GeocodeOutcome, SearchOutcome};

    fn proxy() -> Proxy {
        Proxy::new("10.0.0.1", 8080, ProxyType::Http)
    }

    #[test]
    fn test_client_builds_for_each_proxy_type() {
        let api = HttpWigleApi::new("https://api.wigle.net/api/v2", Duration::from_secs(5));
        for proxy_type in [ProxyType::Http, ProxyType::Https, ProxyType::Socks5] {
            let proxy = Proxy::new("127.0.0.1", 8080, proxy_type);
            assert!(api.create_client(&proxy).is_ok());
        }
    }

    #[test]
    fn test_decode_page() {
        let body = br#"{"success": true, "resultCount": 1, "results": [{"netid": "aa"}]}"#;
        let response: SearchResponse = decode(&proxy(), StatusCode::OK, body).unwrap();
        assert_eq!(response.result_count, Some(1));
    }

    #[test]
    fn test_non_json_body_blames_proxy() {
        let body = b"<html>502 Bad Gateway</html>";
        let err = decode::<SearchResponse>(&proxy(), StatusCode::BAD_GATEWAY, body).unwrap_err();
        assert!(matches!(err, TransportError::Malformed { status: 502, .. }));

        let err = decode::<GeocodeResponse>(&proxy(), StatusCode::OK, b"\"blocked\"").unwrap_err();
        assert!(matches!(err, TransportError::Malformed { status: 200, .. }));
    }

    #[test]
    fn test_unexpected_shape_is_a_refusal() {
        let body = br#"{"success": true, "resultCount": 1, "results": [{"channel": "six"}]}"#;
        let response: SearchResponse = decode(&proxy(), StatusCode::OK, body).unwrap();
        assert!(matches!(response.into_outcome(), SearchOutcome::Rejected(_)));

        let body = br#"{"success": true, "results": [{"boundingbox": "nowhere"}]}"#;
        let response: GeocodeResponse = decode(&proxy(), StatusCode::OK, body).unwrap();
        assert!(matches!(response.into_outcome(), GeocodeOutcome::NoResult(_)));
    }

    #[tokio::test]
    async fn test_dead_proxy_is_a_transport_error() {
        let api = HttpWigleApi::new("http://127.0.0.1:9/api/v2", Duration::from_secs(2));
        let proxy = Proxy::new("127.0.0.1", 9, ProxyType::Http);
        let credential = Credential::new("AID1", "token");

        let result = api.search(&credential, &proxy, &SearchQuery::new(), 0).await;
        assert!(matches!(
            result,
            Err(TransportError::Connection { .. }) | Err(TransportError::Timeout { .. })
        ));
    }
}
