//! Initial map center.
//!
//! The map always gets a center: the device position when one can be had,
//! otherwise a fixed fallback. Failures are logged, never surfaced.

use async_trait::async_trait;
use mapofus_types::Coordinates;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum GeolocationError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("timed out")]
    Timeout,
}

impl From<reqwest::Error> for GeolocationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeolocationError::Timeout
        } else {
            GeolocationError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always reports the same position.
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Coarse position from an IP lookup service returning
/// `{"latitude": .., "longitude": ..}`.
pub struct IpGeolocator {
    http: reqwest::Client,
    endpoint: String,
}

impl IpGeolocator {
    pub const DEFAULT_ENDPOINT: &'static str = "https://ipapi.co/json/";

    pub fn new() -> Self {
        Self::with_endpoint(Self::DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            http: supabase_client::http::shared_client().clone(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let response = self.http.get(&self.endpoint).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(GeolocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(GeolocationError::Unavailable(format!("HTTP {}", status)));
        }

        let location: IpLocation = response.json().await?;
        match (location.latitude, location.longitude) {
            (Some(lat), Some(lng)) => Ok(Coordinates::new(lat, lng)),
            _ => Err(GeolocationError::Unavailable(
                "lookup returned no coordinates".to_string(),
            )),
        }
    }
}

pub struct GeolocationResolver {
    geolocator: Option<Arc<dyn Geolocator>>,
    fallback: Coordinates,
}

impl GeolocationResolver {
    /// `None` means the platform offers no position capability at all.
    pub fn new(geolocator: Option<Arc<dyn Geolocator>>) -> Self {
        Self {
            geolocator,
            fallback: Coordinates::JAKARTA,
        }
    }

    pub fn with_fallback(mut self, fallback: Coordinates) -> Self {
        self.fallback = fallback;
        self
    }

    pub async fn resolve(&self) -> Coordinates {
        let Some(geolocator) = &self.geolocator else {
            log::info!("[GEO] Geolocation is not supported, using fallback center");
            return self.fallback;
        };

        match geolocator.current_position().await {
            Ok(position) if position.is_valid() => position,
            Ok(position) => {
                log::warn!(
                    "[GEO] Ignoring out-of-range position ({}, {})",
                    position.latitude,
                    position.longitude
                );
                self.fallback
            }
            Err(e) => {
                log::warn!("[GEO] Error getting location: {}", e);
                self.fallback
            }
        }
    }
}
