//! Current-position capability.
//!
//! "Use my location" needs the caller's coordinates, which come from
//! whatever the host platform offers. [`LocationProvider`] abstracts that so
//! the lookup can be driven by a fixed coordinate, an environment variable,
//! or nothing at all, and [`resolve_position`] applies the timeout and
//! fallback rules uniformly.

use std::time::Duration;

use zip_map_census_models::LatLng;

/// Used when no position is available (Mountain View, CA).
pub const DEFAULT_POSITION: LatLng = LatLng::new(37.4056, -122.0775);

/// How long to wait for a provider before falling back.
pub const POSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable read by [`EnvLocation`], formatted `"lat,lng"`.
pub const CURRENT_LOCATION_ENV: &str = "ZIP_MAP_CURRENT_LOCATION";

/// Source of the caller's current position.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Returns the current position, or `None` if it is unavailable or
    /// access was denied.
    async fn current_position(&self) -> Option<LatLng>;
}

/// A provider that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub LatLng);

#[async_trait::async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Option<LatLng> {
        Some(self.0)
    }
}

/// A provider for platforms with no location capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocation;

#[async_trait::async_trait]
impl LocationProvider for UnavailableLocation {
    async fn current_position(&self) -> Option<LatLng> {
        None
    }
}

/// Reads the position from [`CURRENT_LOCATION_ENV`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLocation;

#[async_trait::async_trait]
impl LocationProvider for EnvLocation {
    async fn current_position(&self) -> Option<LatLng> {
        let raw = std::env::var(CURRENT_LOCATION_ENV).ok()?;
        let position = parse_lat_lng(&raw);
        if position.is_none() {
            log::warn!("Ignoring malformed {CURRENT_LOCATION_ENV} value: {raw:?}");
        }
        position
    }
}

/// Parses `"lat,lng"`, rejecting out-of-range values.
#[must_use]
pub fn parse_lat_lng(s: &str) -> Option<LatLng> {
    let (lat, lng) = s.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }

    Some(LatLng::new(lat, lng))
}

/// Asks `provider` for the current position, falling back to
/// [`DEFAULT_POSITION`] when it has none or takes longer than
/// [`POSITION_TIMEOUT`].
pub async fn resolve_position(provider: &dyn LocationProvider) -> LatLng {
    resolve_position_within(provider, POSITION_TIMEOUT).await
}

async fn resolve_position_within(provider: &dyn LocationProvider, timeout: Duration) -> LatLng {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Some(position)) => position,
        Ok(None) => {
            log::warn!("Current location unavailable, using default location");
            DEFAULT_POSITION
        }
        Err(_) => {
            log::warn!(
                "Timed out after {}s waiting for current location, using default location",
                timeout.as_secs()
            );
            DEFAULT_POSITION
        }
    }
}
