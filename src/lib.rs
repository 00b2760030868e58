//! GeoGuess State Library
//!
//! This crate provides game state and scoring for a geography guessing game:
//! players see a photo, drop a pin where they think it was taken and score
//! points by how close they got.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Scoring Engine** - Haversine great-circle distance between the guess and
//!   the actual location, mapped to 0..=5000 points by exponential decay.
//!
//! - **Game Sessions** - A fixed number of pre-generated rounds guessed strictly
//!   in order, with a running score and a terminal completed state.
//!
//! - **Session Store** - Games indexed by ID so any number can run at once.
//!
//! - **Round Catalog** - Locations and images loaded and validated from disk.
//!
//! # Design Principles
//!
//! 1. **State machines validate transitions** - Out-of-order or repeated
//!    guesses are rejected with typed errors and leave the game untouched.
//!
//! 2. **No networking** - This crate is pure state, no HTTP. A transport layer
//!    calls `create_game`, `get_state` and `submit_guess`.
//!
//! 3. **Serialization-ready** - All responses serialize to the JSON shapes
//!    clients expect.
//!
//! # Example
//!
//! ```rust
//! use geoguess_state::state::{AppState, FixedRoundSource, Location};
//!
//! let nyc = Location::new(40.7128, -74.0060).unwrap();
//! let mut app = AppState::new(FixedRoundSource::new(nyc, "https://example.com/nyc.jpg"));
//!
//! let game_id = app.create_game().unwrap().id;
//! let state = app.get_state(&game_id).unwrap();
//! assert_eq!(state.rounds.len(), 5);
//!
//! let round_id = state.current_round_id.unwrap();
//! let outcome = app.submit_guess(&game_id, round_id, nyc).unwrap();
//! assert_eq!(outcome.score_from_last_round, 5000);
//! assert!(!outcome.is_last_round);
//! ```

pub mod config;
pub mod state;
pub mod telemetry;

pub use config::{Config, ConfigError};

// Re-export everything from state module at crate root
pub use state::*;
