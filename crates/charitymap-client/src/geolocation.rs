//! Device location acquisition.
//!
//! A [`LocationProvider`] answers one-shot position requests. The
//! [`GeolocationService`] wraps one with the request options: a hard timeout
//! and a cache tolerance during which the previous fix is reused instead of
//! asking the device again. Failures are classified, never retried.

use async_trait::async_trait;
use charitymap_core::config::GeolocationConfig;
use charitymap_core::error::GeolocationError;
use charitymap_core::types::{Coordinate, UserLocation};
use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options passed with every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::from(&GeolocationConfig::default())
    }
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(config: &GeolocationConfig) -> Self {
        Self {
            enable_high_accuracy: config.enable_high_accuracy,
            timeout: config.timeout(),
            maximum_age: config.maximum_age(),
        }
    }
}

/// Something that can report where the device is.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<UserLocation, GeolocationError>;
}

/// Reports a configured position, or `Unavailable` when none is configured.
///
/// Headless front ends have no positioning hardware; the operator supplies
/// the coordinate instead.
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    position: Option<Coordinate>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<UserLocation, GeolocationError> {
        match self.position {
            Some(c) if c.is_valid() => Ok(UserLocation::new(c.latitude, c.longitude)),
            Some(c) => Err(GeolocationError::unavailable(format!(
                "configured position {} is not a valid coordinate",
                c
            ))),
            None => Err(GeolocationError::unavailable("no position source configured")),
        }
    }
}

/// One-shot position requests with timeout and fix caching.
pub struct GeolocationService {
    provider: Arc<dyn LocationProvider>,
    options: PositionOptions,
    last_fix: Mutex<Option<UserLocation>>,
}

impl GeolocationService {
    pub fn new(provider: Arc<dyn LocationProvider>, options: PositionOptions) -> Self {
        Self {
            provider,
            options,
            last_fix: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Returns the cached fix if it is younger than `maximum_age`, otherwise
    /// asks the provider, giving up after `timeout`.
    pub async fn locate(&self) -> Result<UserLocation, GeolocationError> {
        if let Some(cached) = self.cached_fix() {
            debug!(location = %cached.coordinate(), "Reusing cached location");
            return Ok(cached);
        }

        counter!("charitymap_location_requests_total").increment(1);
        let timeout_ms = self.options.timeout.as_millis() as u64;

        let result = match tokio::time::timeout(
            self.options.timeout,
            self.provider.current_position(&self.options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GeolocationError::Timeout { timeout_ms }),
        };

        match &result {
            Ok(location) => {
                info!(location = %location.coordinate(), "Acquired user location");
                *self.last_fix.lock() = Some(*location);
            }
            Err(e) => {
                counter!("charitymap_location_failures_total").increment(1);
                warn!(error = %e, "Failed to acquire user location");
            }
        }

        result
    }

    /// Forgets the cached fix.
    pub fn forget(&self) {
        *self.last_fix.lock() = None;
    }

    fn cached_fix(&self) -> Option<UserLocation> {
        let cached = (*self.last_fix.lock())?;
        let max_age = chrono::Duration::from_std(self.options.maximum_age).ok()?;
        (cached.age(Utc::now()) <= max_age).then_some(cached)
    }
}
