//! Address to bounding box resolution

use crate::config::RetryPolicy;
use crate::error::{PoolExhausted, PoolKind, WigleError};
use crate::wigle::client::WigleApi;
use crate::wigle::models::{BoundingBox, GeocodeOutcome};
use crate::wigle::rotation::Rotation;
use tracing::{debug, error, info, warn};

/// Geocoder front end sharing the run's [`Rotation`]
pub struct GeoResolver<'a, A: WigleApi + ?Sized> {
    api: &'a A,
    rotation: &'a mut Rotation,
    policy: RetryPolicy,
}

impl<'a, A: WigleApi + ?Sized> GeoResolver<'a, A> {
    pub fn new(api: &'a A, rotation: &'a mut Rotation, policy: RetryPolicy) -> Self {
        Self {
            api,
            rotation,
            policy,
        }
    }

    /// Geocode a free-text address into a search box.
    ///
    /// Dead proxies and spent credentials are retired and the call retried
    /// until a pool runs dry; other refusals are retried at most
    /// `max_rejections` times in a row.
    pub async fn resolve_address(&mut self, address: &str) -> Result<BoundingBox, WigleError> {
        let mut rejections = 0;

        loop {
            let lease = match self.rotation.lease().await {
                Ok(lease) => lease,
                Err(PoolExhausted(PoolKind::Credentials)) => {
                    error!("Run out of working credentials while geocoding {:?}", address);
                    return Err(WigleError::OutOfCredentials);
                }
                Err(exhausted) => return Err(exhausted.into()),
            };

            let request = self.api.geocode(&lease.credential, &lease.proxy, address);
            let response = match request.await {
                Ok(response) => response,
                Err(err) => {
                    debug!(%err, "geocode request failed, retrying with another proxy");
                    self.rotation.burn_proxy(&lease.proxy);
                    rejections = 0;
                    continue;
                }
            };

            let place = response.place().unwrap_or("-").to_string();
            match response.into_outcome() {
                GeocodeOutcome::Found(bbox) => {
                    info!(?bbox, %place, "resolved {:?}", address);
                    return Ok(bbox);
                }
                GeocodeOutcome::QuotaExceeded => {
                    debug!("credential quota spent, retrying with another credential");
                    self.rotation.burn_credential(&lease.credential);
                    rejections = 0;
                }
                GeocodeOutcome::NoResult(message) => {
                    rejections += 1;
                    warn!(attempt = rejections, %message, "geocoder returned no result");
                    if rejections >= self.policy.max_rejections {
                        return Err(WigleError::NoGeocodeResult {
                            address: address.to_string(),
                            message,
                        });
                    }
                }
            }
        }
    }
}
