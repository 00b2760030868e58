//! State management module for the guessing game.
//!
//! This module provides the core state types and managers:
//!
//! - `location` - Validated latitude/longitude pairs
//! - `scoring` - Haversine distance and the distance-to-points curve
//! - `round` - A single guess-this-photo round
//! - `catalog` - Round providers, including the on-disk catalog
//! - `game` - Game sessions and the session store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         AppState<S>                              │
//! │                                                                  │
//! │  ┌─────────────────┐   generate_round   ┌─────────────────────┐  │
//! │  │  S: RoundSource │◀───────────────────│     GameManager     │  │
//! │  │                 │                    │                     │  │
//! │  │  FileCatalog    │                    │  game_id → Game     │  │
//! │  │  project →      │                    │                     │  │
//! │  │    locations    │                    │  Created            │  │
//! │  └─────────────────┘                    │    │ guess          │  │
//! │                                         │    ▼                │  │
//! │                                         │  InProgress ◀─┐     │  │
//! │                                         │    │ guess    │     │  │
//! │                                         │    ├──────────┘     │  │
//! │                                         │    ▼ last guess     │  │
//! │                                         │  Completed          │  │
//! │                                         └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

pub mod catalog;
pub mod game;
pub mod location;
pub mod round;
pub mod scoring;

// Re-export commonly used types
pub use catalog::{
    CatalogError, FileCatalog, FixedRoundSource, LocationWithImage, RandomRoundSource, RoundSource,
};
pub use game::{
    CreateGameResponse, Game, GameError, GameManager, GameStateResponse, GameStatus,
    GuessResponse, RoundIdPolicy, DEFAULT_ROUNDS_PER_GAME,
};
pub use location::{Location, LocationError};
pub use round::Round;
pub use scoring::{
    haversine_distance, score_from_distance, score_round, ScoringError, DECAY_KM,
    EARTH_RADIUS_KM, MAX_SCORE,
};

/// Game state shared between request handlers.
pub type SharedState<S> = Arc<Mutex<AppState<S>>>;

/// Combined application state.
///
/// Bundles the session store with the round source it draws from. These are
/// the three operations a transport layer calls.
#[derive(Debug)]
pub struct AppState<S> {
    pub games: GameManager,
    pub source: S,
}

impl<S: RoundSource> AppState<S> {
    pub fn new(source: S) -> Self {
        Self::with_manager(GameManager::new(), source)
    }

    pub fn with_manager(games: GameManager, source: S) -> Self {
        Self { games, source }
    }

    /// Wrap in the lock that serializes every read-modify-write of a game.
    pub fn shared(self) -> SharedState<S> {
        Arc::new(Mutex::new(self))
    }

    /// Start a new game with freshly generated rounds.
    pub fn create_game(&mut self) -> Result<CreateGameResponse, GameError> {
        self.games.create(&mut self.source)
    }

    /// Current state of a game.
    pub fn get_state(&self, game_id: &Uuid) -> Result<GameStateResponse, GameError> {
        self.games.state(game_id)
    }

    /// Guess the current round of a game.
    pub fn submit_guess(
        &mut self,
        game_id: &Uuid,
        round_id: Uuid,
        guess: Location,
    ) -> Result<GuessResponse, GameError> {
        self.games.submit_guess(game_id, round_id, guess)
    }
}

/// Lock shared state, recovering the guard if a previous holder panicked.
///
/// Every mutation is validated before it is applied, so a game is never left
/// half-updated by a panic.
pub fn lock<S>(state: &SharedState<S>) -> MutexGuard<'_, AppState<S>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
