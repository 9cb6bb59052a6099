//! WiGLE API data models

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Records per search page; the API maximum
pub const PAGE_SIZE: usize = 100;

/// Message WiGLE sends once a credential's daily allowance is spent
const QUOTA_MESSAGE: &str = "too many queries";

/// A rectangular search area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_a: f64, lat_b: f64, lon_a: f64, lon_b: f64) -> Self {
        Self {
            lat_min: lat_a.min(lat_b),
            lat_max: lat_a.max(lat_b),
            lon_min: lon_a.min(lon_b),
            lon_max: lon_a.max(lon_b),
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    /// Geocoder order: `[lat, lat, lon, lon]`
    fn from(corners: [f64; 4]) -> Self {
        Self::new(corners[0], corners[1], corners[2], corners[3])
    }
}

/// One observed wireless network.
///
/// Fields the tool reads are typed; everything else WiGLE returns is kept
/// in `extra` so exports carry the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub ssid: Option<String>,
    /// BSSID
    pub netid: Option<String>,
    pub channel: Option<i64>,
    pub encryption: Option<String>,
    #[serde(rename = "type")]
    pub network_type: Option<String>,
    pub firsttime: Option<String>,
    pub lastupdt: Option<String>,
    pub trilat: Option<f64>,
    pub trilong: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetworkRecord {
    /// Minimal record, mostly for building fixtures
    pub fn new(
        ssid: impl Into<String>,
        netid: impl Into<String>,
        trilat: f64,
        trilong: f64,
    ) -> Self {
        Self {
            ssid: Some(ssid.into()),
            netid: Some(netid.into()),
            channel: None,
            encryption: None,
            network_type: None,
            firsttime: None,
            lastupdt: None,
            trilat: Some(trilat),
            trilong: Some(trilong),
            extra: Map::new(),
        }
    }
}

/// What to search for. Empty filters are left out of the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub bbox: Option<BoundingBox>,
    pub ssid: Option<String>,
    pub bssid: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_ssid(mut self, ssid: impl Into<String>) -> Self {
        self.ssid = Some(ssid.into());
        self
    }

    pub fn with_bssid(mut self, bssid: impl Into<String>) -> Self {
        self.bssid = Some(bssid.into());
        self
    }

    /// Query string for the page starting at `first`
    pub fn params(&self, first: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("first", first.to_string()),
            ("resultsPerPage", PAGE_SIZE.to_string()),
        ];

        if let Some(bbox) = &self.bbox {
            params.push(("latrange1", bbox.lat_min.to_string()));
            params.push(("latrange2", bbox.lat_max.to_string()));
            params.push(("longrange1", bbox.lon_min.to_string()));
            params.push(("longrange2", bbox.lon_max.to_string()));
        }
        if let Some(ssid) = &self.ssid {
            params.push(("ssidlike", ssid.clone()));
        }
        if let Some(bssid) = &self.bssid {
            params.push(("netid", bssid.clone()));
        }

        params
    }
}

fn is_quota_message(message: Option<&str>) -> bool {
    message.map_or(false, |m| m.to_lowercase().contains(QUOTA_MESSAGE))
}

/// A JSON body the API client can decode.
///
/// A well-formed JSON object that does not fit the expected shape is an
/// upstream data problem, not a proxy fault, so it becomes a refusal.
pub trait ApiResponse: DeserializeOwned {
    /// Stand-in for a body that did not match the schema
    fn unreadable(message: String) -> Self;
}

/// Body of `/network/search`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Records on this page; absent when the search was refused
    pub result_count: Option<u64>,
    /// Matches across all pages
    pub total_results: Option<u64>,
    #[serde(default)]
    pub results: Vec<NetworkRecord>,
    /// Reason for a refusal
    pub message: Option<String>,
}

impl ApiResponse for SearchResponse {
    fn unreadable(message: String) -> Self {
        Self {
            message: Some(format!("unexpected response: {}", message)),
            ..Self::default()
        }
    }
}

/// How the fetch loop should treat a search response
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Page(Vec<NetworkRecord>),
    /// Past the last page
    Exhausted,
    QuotaExceeded,
    Rejected(String),
}

impl SearchResponse {
    pub fn into_outcome(self) -> SearchOutcome {
        match self.result_count {
            Some(0) => SearchOutcome::Exhausted,
            Some(_) => SearchOutcome::Page(self.results),
            None if is_quota_message(self.message.as_deref()) => SearchOutcome::QuotaExceeded,
            None => SearchOutcome::Rejected(
                self.message
                    .unwrap_or_else(|| "response carried no result count".to_string()),
            ),
        }
    }
}

/// One geocoder match
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    /// `[lat, lat, lon, lon]`
    pub boundingbox: [f64; 4],
    /// Place name the geocoder matched
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Body of `/network/geocode`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    /// Reason for a refusal
    pub message: Option<String>,
}

impl ApiResponse for GeocodeResponse {
    fn unreadable(message: String) -> Self {
        Self {
            results: Vec::new(),
            message: Some(format!("unexpected response: {}", message)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Found(BoundingBox),
    QuotaExceeded,
    NoResult(String),
}

impl GeocodeResponse {
    /// Name of the first match, if the geocoder gave one
    pub fn place(&self) -> Option<&str> {
        self.results.first()?.display_name.as_deref()
    }

    pub fn into_outcome(self) -> GeocodeOutcome {
        if let Some(first) = self.results.first() {
            return GeocodeOutcome::Found(BoundingBox::from(first.boundingbox));
        }
        if is_quota_message(self.message.as_deref()) {
            return GeocodeOutcome::QuotaExceeded;
        }
        GeocodeOutcome::NoResult(self.message.unwrap_or_else(|| "no results".to_string()))
    }
}
