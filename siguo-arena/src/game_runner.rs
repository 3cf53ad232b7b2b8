//! Game runner - executes single games
//!
//! Level 3 - Step-level implementation

use siguo_core::{
    Elimination, GameResult, GameState, Move, PieceMemory, Seat, SiguoAI, Team,
};

use crate::config::AiConfig;
use crate::snapshot::{FinishedGame, GameObserver};

/// Outcome of a single game
#[derive(Clone, Debug)]
pub struct GameOutcome {
    /// Final game result
    pub result: GameResult,
    /// Number of plies played
    pub plies: u32,
    /// Move history
    pub moves: Vec<(Seat, Move)>,
    /// Snapshot for statistics collectors
    pub finished: FinishedGame,
}

impl GameOutcome {
    /// Winning team (None for draw)
    pub fn winner(&self) -> Option<Team> {
        match self.result {
            GameResult::Won(team) => Some(team),
            _ => None,
        }
    }

    /// Check if game is a draw (ply limit or simultaneous collapse)
    pub fn is_draw(&self) -> bool {
        self.winner().is_none()
    }
}

/// One seat at the table: its AI and the memory it builds up during a game
struct SeatPlayer {
    ai: SiguoAI,
    memory: PieceMemory,
}

/// Game runner that plays four AI seats against each other
pub struct GameRunner {
    /// AI configuration per seat
    seats: [AiConfig; 4],
}

impl GameRunner {
    /// Create a new game runner
    pub fn new(seats: [AiConfig; 4]) -> Self {
        Self { seats }
    }

    /// Same configuration on every seat
    pub fn uniform(config: AiConfig) -> Self {
        Self::new(std::array::from_fn(|_| config.clone()))
    }

    /// Get configuration
    pub fn config(&self, seat: Seat) -> &AiConfig {
        &self.seats[seat.index()]
    }

    /// Play a single game, returning the outcome
    pub fn play_game(&self, initial: GameState, max_plies: u32) -> GameOutcome {
        let mut players: Vec<SeatPlayer> = Seat::ALL
            .into_iter()
            .map(|seat| {
                let config = &self.seats[seat.index()];
                SeatPlayer {
                    ai: SiguoAI::new(config.search_config(), config.persona),
                    memory: PieceMemory::new(seat, initial.board()),
                }
            })
            .collect();

        let mut state = initial.clone();
        let mut moves = Vec::new();
        let mut eliminations = Vec::new();

        while !state.is_over() && state.ply < max_plies {
            let seat = state.current_seat();
            let player = &players[seat.index()];
            let Some(mv) = player.ai.best_move(&state, &player.memory) else {
                tracing::warn!(%seat, ply = state.ply, "no move found for seat to act");
                break;
            };

            let report = match state.commit(mv) {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(%seat, "search produced a rejected move: {e}");
                    break;
                }
            };

            for player in players.iter_mut() {
                player.memory.observe(&report, state.board());
            }
            for &(out, reason) in &report.eliminated {
                tracing::info!(seat = %out, ?reason, ply = state.ply, "seat eliminated");
                eliminations.push((out, reason, state.ply));
            }
            moves.push((seat, mv));
        }

        if !state.is_over() {
            state.declare_draw();
        }
        tracing::info!(result = ?state.result(), plies = state.ply, "game finished");

        // Memories are per game
        drop(players);

        GameOutcome {
            result: state.result(),
            plies: state.ply,
            moves,
            finished: FinishedGame::new(&initial, &state, eliminations),
        }
    }

    /// Play a game and hand the snapshot to an observer
    pub fn play_observed(
        &self,
        initial: GameState,
        max_plies: u32,
        observer: &mut dyn GameObserver,
    ) -> GameOutcome {
        let outcome = self.play_game(initial, max_plies);
        observer.game_finished(&outcome.finished);
        outcome
    }
}

/// Count eliminations of a given kind
pub fn count_eliminations(outcome: &GameOutcome, reason: Elimination) -> usize {
    outcome
        .finished
        .eliminations
        .iter()
        .filter(|(_, r, _)| *r == reason)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use siguo_core::{Board, Piece, PieceId, Position, Rank};

    /// South corps can take East's flag at once; North and West cannot move
    fn short_game() -> GameState {
        let mut board = Board::standard();
        for (i, seat) in Seat::ALL.into_iter().enumerate() {
            let hq = board.topology().headquarters(seat)[0];
            board.place(hq, Piece::new(PieceId(100 + i as u16), Rank::Flag, seat));
        }
        board.place(Position::new(8, 16), Piece::new(PieceId(0), Rank::Corps, Seat::South));
        board.place(Position::new(10, 13), Piece::new(PieceId(1), Rank::Division, Seat::East));
        GameState::new(board)
    }

    struct Counter(usize);

    impl GameObserver for Counter {
        fn game_finished(&mut self, _: &FinishedGame) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_game_runner_creation() {
        let runner = GameRunner::uniform(AiConfig::minimax(2));
        assert_eq!(runner.config(Seat::West).depth, 2);
    }

    #[test]
    fn test_short_game_is_won() {
        let runner = GameRunner::uniform(AiConfig::greedy());
        let outcome = runner.play_game(short_game(), 50);
        assert_eq!(outcome.winner(), Some(Team::NorthSouth));
        assert_eq!(outcome.plies, 1);
        assert_eq!(count_eliminations(&outcome, Elimination::FlagCaptured), 1);
        assert_eq!(count_eliminations(&outcome, Elimination::Immobilized), 2);
        assert_eq!(outcome.finished.flag_positions.len(), 4);
    }

    #[test]
    fn test_ply_limit_draws() {
        let runner = GameRunner::uniform(AiConfig::greedy());
        let outcome = runner.play_game(GameState::standard(), 8);
        assert_eq!(outcome.plies, 8);
        assert!(outcome.is_draw());
        assert_eq!(outcome.result, GameResult::Draw);
        assert_eq!(outcome.moves.len(), 8);
        // Turn order
        let seats: Vec<Seat> = outcome.moves.iter().take(4).map(|(s, _)| *s).collect();
        assert_eq!(seats, Seat::ALL.to_vec());
    }

    #[test]
    fn test_observer_receives_game() {
        let runner = GameRunner::uniform(AiConfig::greedy());
        let mut counter = Counter(0);
        runner.play_observed(short_game(), 10, &mut counter);
        assert_eq!(counter.0, 1);
    }
}
