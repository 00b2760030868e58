//! Game session state management.
//!
//! A game is a fixed sequence of pre-generated rounds guessed strictly in
//! order. Each guess scores the current round, adds it to the running total
//! and advances to the next round until the last one is done.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::catalog::{CatalogError, RoundSource};
use super::location::Location;
use super::round::Round;
use super::scoring::ScoringError;

/// Rounds per game.
pub const DEFAULT_ROUNDS_PER_GAME: usize = 5;

/// Game state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Rounds generated, nothing guessed yet
    #[default]
    Created,
    /// At least one round guessed, at least one left
    InProgress,
    /// Every round guessed
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Check if game can still take guesses.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if game is terminal (cannot change).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// How the round id supplied with a guess is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundIdPolicy {
    /// The id must name the current round.
    #[default]
    Strict,
    /// The id is ignored and the guess always lands on the current round.
    Lenient,
}

impl std::str::FromStr for RoundIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown round id policy '{other}'")),
        }
    }
}

/// Game errors.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("no active game {game_id}; create a game first")]
    NoActiveGame { game_id: Uuid },

    #[error("failed to generate round: {0}")]
    UpstreamUnavailable(#[from] CatalogError),

    #[error("guess is for round {got} but the current round is {expected}")]
    RoundMismatch { expected: Uuid, got: Uuid },

    #[error("round {round_id} has already been guessed")]
    RoundAlreadyCompleted { round_id: Uuid },

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl GameError {
    /// Whether the caller misused the protocol (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoActiveGame { .. }
                | Self::RoundMismatch { .. }
                | Self::RoundAlreadyCompleted { .. }
        )
    }
}

/// Returned when a game is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateGameResponse {
    pub id: Uuid,
}

/// Read-only projection of a game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStateResponse {
    pub current_round_id: Option<Uuid>,
    pub rounds: Vec<Round>,
    pub current_round_index: usize,
    pub current_score: u32,
}

/// Outcome of a guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuessResponse {
    /// The round as it stood right after scoring
    pub completed_round: Round,
    pub is_last_round: bool,
    pub score_from_last_round: u32,
    pub total_current_score: u32,
}

/// Game session state.
#[derive(Debug, Clone)]
pub struct Game {
    /// Unique game ID
    pub id: Uuid,

    /// Pre-generated rounds, guessed in order
    rounds: Vec<Round>,

    /// Index of the round awaiting a guess (last index once completed)
    current_round_index: usize,

    /// ID of the round awaiting a guess, None once completed
    current_round_id: Option<Uuid>,

    /// Sum of completed round scores
    current_score: u32,

    /// Current status
    pub status: GameStatus,

    /// When game was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When the last round was guessed
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Game {
    /// Create a game over already generated rounds.
    ///
    /// Returns None when `rounds` is empty.
    pub fn new(id: Uuid, rounds: Vec<Round>) -> Option<Self> {
        let current_round_id = rounds.first()?.id;
        Some(Self {
            id,
            rounds,
            current_round_index: 0,
            current_round_id: Some(current_round_id),
            current_score: 0,
            status: GameStatus::Created,
            created_at: chrono::Utc::now(),
            completed_at: None,
        })
    }

    /// Pull `rounds_per_game` rounds from `source` and build a fresh game.
    pub fn generate<S: RoundSource + ?Sized>(
        source: &mut S,
        rounds_per_game: usize,
    ) -> Result<Self, GameError> {
        let rounds = (0..rounds_per_game.max(1))
            .map(|_| source.generate_round())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(Uuid::new_v4(), rounds).ok_or_else(|| CatalogError::NoDataAvailable.into())
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    pub fn current_round_id(&self) -> Option<Uuid> {
        self.current_round_id
    }

    pub fn current_score(&self) -> u32 {
        self.current_score
    }

    /// Round awaiting a guess.
    pub fn current_round(&self) -> Option<&Round> {
        self.current_round_id
            .and_then(|_| self.rounds.get(self.current_round_index))
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check the supplied round id against the round awaiting a guess.
    fn check_round(&self, round_id: Uuid, policy: RoundIdPolicy) -> Result<(), GameError> {
        let Some(expected) = self.current_round_id else {
            let last = self.rounds.last().map(|r| r.id).unwrap_or_default();
            let round_id = match policy {
                RoundIdPolicy::Lenient => last,
                RoundIdPolicy::Strict if self.rounds.iter().any(|r| r.id == round_id) => round_id,
                RoundIdPolicy::Strict => {
                    return Err(GameError::RoundMismatch {
                        expected: last,
                        got: round_id,
                    })
                }
            };
            return Err(GameError::RoundAlreadyCompleted { round_id });
        };

        if policy == RoundIdPolicy::Lenient || round_id == expected {
            return Ok(());
        }

        let already_guessed = self.rounds[..self.current_round_index]
            .iter()
            .any(|r| r.id == round_id);
        if already_guessed {
            Err(GameError::RoundAlreadyCompleted { round_id })
        } else {
            Err(GameError::RoundMismatch {
                expected,
                got: round_id,
            })
        }
    }

    /// Score a guess for the current round and advance.
    pub fn submit_guess(
        &mut self,
        round_id: Uuid,
        guess: Location,
        policy: RoundIdPolicy,
    ) -> Result<GuessResponse, GameError> {
        self.check_round(round_id, policy)?;

        let round = &mut self.rounds[self.current_round_index];
        let score = round.record_guess(guess)?;
        let completed_round = round.clone();

        self.current_score += score;

        let is_last_round = self.current_round_index == self.rounds.len() - 1;
        if is_last_round {
            self.current_round_id = None;
            self.status = GameStatus::Completed;
            self.completed_at = Some(chrono::Utc::now());
        } else {
            self.current_round_index += 1;
            self.current_round_id = Some(self.rounds[self.current_round_index].id);
            self.status = GameStatus::InProgress;
        }

        Ok(GuessResponse {
            completed_round,
            is_last_round,
            score_from_last_round: score,
            total_current_score: self.current_score,
        })
    }

    /// Read-only projection for clients.
    pub fn state(&self) -> GameStateResponse {
        GameStateResponse {
            current_round_id: self.current_round_id,
            rounds: self.rounds.clone(),
            current_round_index: self.current_round_index,
            current_score: self.current_score,
        }
    }

    /// Convert full game state to JSON snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        let rounds: Vec<serde_json::Value> = self.rounds.iter().map(|r| r.to_json()).collect();

        serde_json::json!({
            "id": self.id,
            "status": self.status.as_str(),
            "current_round_id": self.current_round_id,
            "current_round_index": self.current_round_index,
            "current_score": self.current_score,
            "rounds": rounds,
            "created_at": self.created_at,
            "completed_at": self.completed_at
        })
    }
}

/// Game manager - the session store for all games.
#[derive(Debug)]
pub struct GameManager {
    games: HashMap<Uuid, Game>,
    rounds_per_game: usize,
    policy: RoundIdPolicy,
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GameManager {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_ROUNDS_PER_GAME, RoundIdPolicy::default())
    }

    pub fn with_settings(rounds_per_game: usize, policy: RoundIdPolicy) -> Self {
        Self {
            games: HashMap::new(),
            rounds_per_game: rounds_per_game.max(1),
            policy,
        }
    }

    pub fn rounds_per_game(&self) -> usize {
        self.rounds_per_game
    }

    pub fn policy(&self) -> RoundIdPolicy {
        self.policy
    }

    /// Generate and store a new game.
    pub fn create<S: RoundSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<CreateGameResponse, GameError> {
        let game = Game::generate(source, self.rounds_per_game).map_err(|e| {
            warn!(error = %e, "Failed to create game");
            e
        })?;
        let id = game.id;
        info!(game_id = %id, rounds = game.rounds.len(), "Game created");
        self.add(game);
        Ok(CreateGameResponse { id })
    }

    /// Add a game.
    pub fn add(&mut self, game: Game) {
        self.games.insert(game.id, game);
    }

    /// Get a game.
    pub fn get(&self, game_id: &Uuid) -> Option<&Game> {
        self.games.get(game_id)
    }

    /// Get a mutable game.
    pub fn get_mut(&mut self, game_id: &Uuid) -> Option<&mut Game> {
        self.games.get_mut(game_id)
    }

    /// Read-only projection of a game.
    pub fn state(&self, game_id: &Uuid) -> Result<GameStateResponse, GameError> {
        self.get(game_id)
            .map(Game::state)
            .ok_or(GameError::NoActiveGame { game_id: *game_id })
    }

    /// Submit a guess for a game's current round.
    pub fn submit_guess(
        &mut self,
        game_id: &Uuid,
        round_id: Uuid,
        guess: Location,
    ) -> Result<GuessResponse, GameError> {
        let policy = self.policy;
        let game = self
            .games
            .get_mut(game_id)
            .ok_or(GameError::NoActiveGame { game_id: *game_id })?;

        match game.submit_guess(round_id, guess, policy) {
            Ok(response) => {
                info!(
                    game_id = %game_id,
                    round_id = %response.completed_round.id,
                    score = response.score_from_last_round,
                    total = response.total_current_score,
                    "Guess scored"
                );
                if response.is_last_round {
                    info!(game_id = %game_id, total = response.total_current_score, "Game completed");
                }
                Ok(response)
            }
            Err(e) => {
                warn!(game_id = %game_id, %round_id, error = %e, "Guess rejected");
                Err(e)
            }
        }
    }

    /// Remove a game.
    pub fn remove(&mut self, game_id: &Uuid) -> Option<Game> {
        self.games.remove(game_id)
    }

    /// Clean up completed games.
    pub fn cleanup_completed(&mut self) -> Vec<Uuid> {
        let completed: Vec<Uuid> = self
            .games
            .iter()
            .filter(|(_, g)| g.status.is_terminal())
            .map(|(id, _)| *id)
            .collect();

        for id in &completed {
            self.remove(id);
        }

        completed
    }

    /// Count games still taking guesses.
    pub fn active_count(&self) -> usize {
        self.games.values().filter(|g| g.status.is_active()).count()
    }

    /// Total game count.
    pub fn count(&self) -> usize {
        self.games.len()
    }
}
