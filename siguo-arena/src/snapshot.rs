//! Finished-game snapshots for outside consumers
//!
//! Level 4 - Utilities and configuration

use std::io::Write;

use serde::{Deserialize, Serialize};
use siguo_core::{Elimination, GameResult, GameState, Position, Rank, Seat};

/// One piece left on the final board
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub position: Position,
    pub rank: Rank,
    pub owner: Seat,
    pub revealed: bool,
}

/// Everything a statistics collector receives about a game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinishedGame {
    pub result: GameResult,
    pub plies: u32,
    /// Where each seat deployed its flag
    pub flag_positions: Vec<(Seat, Position)>,
    /// Seats in the order they left the game, with the ply it happened on
    pub eliminations: Vec<(Seat, Elimination, u32)>,
    pub final_board: Vec<PieceSnapshot>,
}

impl FinishedGame {
    pub fn new(
        initial: &GameState,
        last: &GameState,
        eliminations: Vec<(Seat, Elimination, u32)>,
    ) -> Self {
        let flag_positions = Seat::ALL
            .into_iter()
            .filter_map(|seat| initial.flag_position(seat).map(|pos| (seat, pos)))
            .collect();
        let final_board = last
            .board()
            .pieces()
            .map(|(position, piece)| PieceSnapshot {
                position,
                rank: piece.rank,
                owner: piece.owner,
                revealed: piece.revealed,
            })
            .collect();
        Self {
            result: last.result(),
            plies: last.ply,
            flag_positions,
            eliminations,
            final_board,
        }
    }
}

/// Receives every finished game
pub trait GameObserver {
    fn game_finished(&mut self, game: &FinishedGame);
}

/// Writes one JSON object per finished game
pub struct JsonLinesRecorder<W: Write> {
    out: W,
    written: usize,
    failed: usize,
}

impl<W: Write> JsonLinesRecorder<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            failed: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GameObserver for JsonLinesRecorder<W> {
    fn game_finished(&mut self, game: &FinishedGame) {
        let line = match serde_json::to_string(game) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("could not serialize finished game: {e}");
                self.failed += 1;
                return;
            }
        };
        match writeln!(self.out, "{line}") {
            Ok(()) => self.written += 1,
            Err(e) => {
                tracing::warn!("could not record finished game: {e}");
                self.failed += 1;
            }
        }
    }
}

/// Tally of where flags were deployed, per seat
#[derive(Clone, Debug, Default)]
pub struct FlagPlacementStats {
    counts: Vec<(Seat, Position, u32)>,
}

impl FlagPlacementStats {
    pub fn count(&self, seat: Seat, position: Position) -> u32 {
        self.counts
            .iter()
            .find(|(s, p, _)| *s == seat && *p == position)
            .map_or(0, |(_, _, n)| *n)
    }
}

impl GameObserver for FlagPlacementStats {
    fn game_finished(&mut self, game: &FinishedGame) {
        for &(seat, position) in &game.flag_positions {
            match self.counts.iter_mut().find(|(s, p, _)| *s == seat && *p == position) {
                Some(entry) => entry.2 += 1,
                None => self.counts.push((seat, position, 1)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_of_fresh_game() {
        let state = GameState::standard();
        let game = FinishedGame::new(&state, &state, Vec::new());
        assert_eq!(game.flag_positions.len(), 4);
        assert_eq!(game.final_board.len(), 100);
        assert_eq!(game.result, GameResult::Ongoing);
    }

    #[test]
    fn test_json_lines_recorder() {
        let state = GameState::standard();
        let game = FinishedGame::new(&state, &state, Vec::new());
        let mut recorder = JsonLinesRecorder::new(Vec::new());
        recorder.game_finished(&game);
        recorder.game_finished(&game);
        assert_eq!(recorder.written(), 2);

        let bytes = recorder.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let first = text.lines().next().unwrap();
        let back: FinishedGame = serde_json::from_str(first).unwrap();
        assert_eq!(back, game);
    }

    #[test]
    fn test_flag_placement_stats() {
        let state = GameState::standard();
        let game = FinishedGame::new(&state, &state, Vec::new());
        let mut stats = FlagPlacementStats::default();
        stats.game_finished(&game);
        stats.game_finished(&game);
        let south_flag = state.flag_position(Seat::South).unwrap();
        assert_eq!(stats.count(Seat::South, south_flag), 2);
        assert_eq!(stats.count(Seat::South, Position::new(16, 9)), 0);
    }
}
