//! Distance and scoring engine.
//!
//! A guess is scored by the great-circle distance to the actual location,
//! mapped through an exponential decay:
//!
//! ```text
//! score = round(MAX_SCORE * exp(-distance_km / DECAY_KM))
//! ```

use thiserror::Error;

use super::location::Location;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance over which the score falls to 1/e of the maximum.
pub const DECAY_KM: f64 = 1500.0;

/// Score for an exact guess.
pub const MAX_SCORE: u32 = 5000;

/// Scoring errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("distance must be a non-negative number of kilometers, got {distance_km}")]
    InvalidArgument { distance_km: f64 },
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_distance(a: Location, b: Location) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 near antipodes.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    c * EARTH_RADIUS_KM
}

/// Map a distance to a score in `[0, MAX_SCORE]`.
pub fn score_from_distance(distance_km: f64) -> Result<u32, ScoringError> {
    if distance_km.is_nan() || distance_km < 0.0 {
        return Err(ScoringError::InvalidArgument { distance_km });
    }
    let score = (f64::from(MAX_SCORE) * (-distance_km / DECAY_KM).exp()).round();
    Ok(score.clamp(0.0, f64::from(MAX_SCORE)) as u32)
}

/// Score a guess against the actual location of a round.
pub fn score_round(actual: Location, guess: Location) -> Result<u32, ScoringError> {
    score_from_distance(haversine_distance(actual, guess))
}
