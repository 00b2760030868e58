//! Geographic coordinates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point on the globe in decimal degrees.
///
/// Always valid once constructed: deserialization runs the same range checks
/// as [`Location::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LocationParts")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct LocationParts {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<LocationParts> for Location {
    type Error = LocationError;

    fn try_from(parts: LocationParts) -> Result<Self, Self::Error> {
        Self::new(parts.latitude, parts.longitude)
    }
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(LocationError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "latitude": self.latitude,
            "longitude": self.longitude
        })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Location validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("coordinates must be finite numbers")]
    NotFinite,
}
