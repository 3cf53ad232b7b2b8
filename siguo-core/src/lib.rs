//! Siguo Core - rules engine and AI for four-player Junqi
//!
//! This crate provides the core game logic:
//! - Cross-shaped board topology with railways and corner junctions
//! - Piece ranks, rosters and deployments
//! - Move legality, move generation and combat resolution
//! - Game state with turn rotation, elimination and team victory
//! - Per-seat piece memory for hidden ranks
//! - Persona-weighted evaluation
//! - Greedy and alpha-beta minimax move selection

pub mod topology;
pub mod pieces;
pub mod board;
pub mod rules;
pub mod combat;
pub mod setup;
pub mod game;
pub mod memory;
pub mod eval;
pub mod ai;

// Re-exports for convenience
pub use topology::{CellKind, Position, Seat, Team, Topology, BOARD_SIZE};
pub use pieces::{Piece, PieceId, Rank, Roster};
pub use board::Board;
pub use rules::{is_valid_move, possible_moves};
pub use combat::{resolve, CombatOutcome};
pub use setup::{build_board, Deployment, Placement, SetupError};
pub use game::{Elimination, GameError, GameResult, GameState, Move, MoveReport, SeatStatus};
pub use memory::{PieceMemory, RankEstimate};
pub use eval::{evaluate, flag_threat, Persona, PersonaWeights, WIN_VALUE};
pub use ai::{MoveBonus, NoBonus, SearchConfig, SearchResult, SiguoAI, Strategy};
