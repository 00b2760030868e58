//! A single "where was this photo taken?" round.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::game::GameError;
use super::location::Location;
use super::scoring::score_round;

/// One round of a game.
///
/// Created with the actual location and image set. The guess and score are
/// filled in exactly once by [`Round::record_guess`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub actual_location: Location,
    pub guess_location: Option<Location>,
    pub image_url: String,
    pub score: Option<u32>,
}

impl Round {
    pub fn new(actual_location: Location, image_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actual_location,
            guess_location: None,
            image_url: image_url.into(),
            score: None,
        }
    }

    /// Whether a guess has been recorded.
    pub fn is_completed(&self) -> bool {
        self.score.is_some()
    }

    /// Score `guess` and store it on the round.
    pub fn record_guess(&mut self, guess: Location) -> Result<u32, GameError> {
        if self.is_completed() {
            return Err(GameError::RoundAlreadyCompleted { round_id: self.id });
        }
        let score = score_round(self.actual_location, guess)?;
        self.guess_location = Some(guess);
        self.score = Some(score);
        Ok(score)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "actual_location": self.actual_location.to_json(),
            "guess_location": self.guess_location.map(|l| l.to_json()),
            "image_url": self.image_url,
            "score": self.score
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nyc_round() -> Round {
        Round::new(
            Location::new(40.7128, -74.0060).unwrap(),
            "https://example.com/image.jpg",
        )
    }

    #[test]
    fn test_round_new_is_unguessed() {
        let round = nyc_round();
        assert!(!round.is_completed());
        assert_eq!(round.guess_location, None);
        assert_eq!(round.score, None);
        assert_ne!(round.id, nyc_round().id);
    }

    #[test]
    fn test_round_record_guess_once() {
        let mut round = nyc_round();
        let guess = Location::new(40.7128, -74.0060).unwrap();

        assert_eq!(round.record_guess(guess).unwrap(), 5000);
        assert!(round.is_completed());
        assert_eq!(round.guess_location, Some(guess));
        assert_eq!(round.score, Some(5000));

        let before = round.clone();
        let err = round
            .record_guess(Location::new(0.0, 0.0).unwrap())
            .unwrap_err();
        assert!(
            matches!(err, GameError::RoundAlreadyCompleted { round_id } if round_id == round.id)
        );
        assert_eq!(round, before);
    }

    #[test]
    fn test_round_json_matches_serde() {
        let mut round = nyc_round();
        assert_eq!(round.to_json(), serde_json::to_value(&round).unwrap());
        assert_eq!(round.to_json()["guess_location"], serde_json::Value::Null);

        round
            .record_guess(Location::new(34.0522, -118.2437).unwrap())
            .unwrap();
        assert_eq!(round.to_json(), serde_json::to_value(&round).unwrap());
    }
}
