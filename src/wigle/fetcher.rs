//! Paginated network search

use crate::config::RetryPolicy;
use crate::error::{PoolExhausted, PoolKind};
use crate::wigle::client::WigleApi;
use crate::wigle::models::{NetworkRecord, SearchOutcome, SearchQuery, PAGE_SIZE};
use crate::wigle::rotation::Rotation;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Why the fetch loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Ran past the last page
    #[default]
    Completed,
    Exhausted(PoolKind),
    /// Gave up on a page after repeated unrecognised refusals
    Rejected(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::Exhausted(kind) => write!(f, "{} exhausted", kind),
            StopReason::Rejected(message) => write!(f, "refused: {}", message),
        }
    }
}

/// Everything one fetch produced
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Records in arrival order
    pub records: Vec<NetworkRecord>,
    /// Pages that contributed records
    pub pages: usize,
    /// Upstream calls made, failures included
    pub requests: usize,
    /// Match count WiGLE reported for the whole query, when it sent one
    pub total: Option<u64>,
    pub stop: StopReason,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Completed
    }
}

/// Pages through a search, leasing a credential and proxy for every call
pub struct NetworkFetcher<'a, A: WigleApi + ?Sized> {
    api: &'a A,
    rotation: &'a mut Rotation,
    policy: RetryPolicy,
}

impl<'a, A: WigleApi + ?Sized> NetworkFetcher<'a, A> {
    pub fn new(api: &'a A, rotation: &'a mut Rotation, policy: RetryPolicy) -> Self {
        Self {
            api,
            rotation,
            policy,
        }
    }

    /// Drain every page of `query`.
    ///
    /// Never fails: pool exhaustion ends the loop and whatever was already
    /// accumulated is returned in the report.
    pub async fn fetch_all(&mut self, query: &SearchQuery) -> FetchReport {
        let mut report = FetchReport::default();
        let mut first = 0;
        let mut rejections = 0;

        report.stop = loop {
            let lease = match self.rotation.lease().await {
                Ok(lease) => lease,
                Err(PoolExhausted(kind)) => {
                    error!("{} pool exhausted, results may not be complete", kind);
                    break StopReason::Exhausted(kind);
                }
            };

            report.requests += 1;
            let request = self.api.search(&lease.credential, &lease.proxy, query, first);
            let response = match request.await {
                Ok(response) => response,
                Err(err) => {
                    debug!(%err, first, "search request failed, retrying with another proxy");
                    self.rotation.burn_proxy(&lease.proxy);
                    rejections = 0;
                    continue;
                }
            };

            if response.total_results.is_some() {
                report.total = response.total_results;
            }
            match response.into_outcome() {
                SearchOutcome::Exhausted => break StopReason::Completed,
                SearchOutcome::Page(records) => {
                    let count = records.len();
                    report.records.extend(records);
                    report.pages += 1;
                    rejections = 0;
                    debug!(first, count, "added page to the result list");

                    if count < PAGE_SIZE {
                        break StopReason::Completed;
                    }
                    first += PAGE_SIZE;
                }
                SearchOutcome::QuotaExceeded => {
                    debug!(first, "credential quota spent, retrying page");
                    self.rotation.burn_credential(&lease.credential);
                    rejections = 0;
                }
                SearchOutcome::Rejected(message) => {
                    rejections += 1;
                    warn!(first, attempt = rejections, %message, "search refused");
                    if rejections >= self.policy.max_rejections {
                        break StopReason::Rejected(message);
                    }
                }
            }
        };

        info!(
            records = report.records.len(),
            total = ?report.total,
            pages = report.pages,
            requests = report.requests,
            credentials = self.rotation.credentials().len(),
            proxies = self.rotation.proxies().len(),
            refills = self.rotation.proxies().refills(),
            stop = %report.stop,
            "fetch finished"
        );
        report
    }
}
