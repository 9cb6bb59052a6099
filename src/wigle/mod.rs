//! WiGLE querying
//!
//! Geocoding and paginated network search, each call made with a freshly
//! leased credential and proxy so failures can be pinned on one of them.

pub mod client;
pub mod fetcher;
pub mod models;
pub mod resolver;
pub mod rotation;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{HttpWigleApi, WigleApi};
pub use fetcher::{FetchReport, NetworkFetcher, StopReason};
pub use models::{
    BoundingBox, GeocodeOutcome, GeocodeResponse, GeocodeResult, NetworkRecord, SearchOutcome,
    SearchQuery, SearchResponse, PAGE_SIZE,
};
pub use resolver::GeoResolver;
pub use rotation::{Lease, Rotation};
