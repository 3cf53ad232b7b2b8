//! Siguo Arena - self-play sessions for the Siguo AI
//!
//! This crate provides session infrastructure:
//! - Per-seat AI players, each with its own piece memory
//! - Single games with a ply limit
//! - Series of games, optionally in parallel
//! - Finished-game snapshots for statistics collectors
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 2: play_series (phases)
//! - Level 3: GameRunner::play_game (steps)
//! - Level 4: configuration, snapshots

mod config;
mod game_runner;
mod series;
mod snapshot;

pub use config::{AiConfig, SeriesConfig};
pub use game_runner::{count_eliminations, GameOutcome, GameRunner};
pub use series::{initial_state, play_series, SeriesResult};
pub use snapshot::{FinishedGame, FlagPlacementStats, GameObserver, JsonLinesRecorder, PieceSnapshot};
