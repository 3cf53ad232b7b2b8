//! Game state, move commitment and termination

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Board;
use crate::combat::{resolve, CombatOutcome};
use crate::pieces::{Piece, PieceId, Rank, Roster};
use crate::rules::{has_any_move, is_valid_move, possible_moves, requires_engineer};
use crate::setup::{build_board, Deployment, SetupError};
use crate::topology::{CellKind, Position, Seat, Team, Topology};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    Won(Team),
    Draw,
}

/// Why a seat left the game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Elimination {
    FlagCaptured,
    Immobilized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatStatus {
    Active,
    Eliminated(Elimination),
}

/// A move candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub const fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    pub fn reversed(self) -> Self {
        Self::new(self.to, self.from)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// One engagement as seen on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub attacker: Piece,
    pub defender: Piece,
    pub outcome: CombatOutcome,
}

/// Everything observable about a committed move
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    pub seat: Seat,
    pub piece: Piece,
    pub from: Position,
    pub to: Position,
    /// No non-engineer could have travelled this path
    pub engineer_path: bool,
    pub battle: Option<Battle>,
    pub revealed: Vec<(PieceId, Rank)>,
    pub eliminated: Vec<(Seat, Elimination)>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("game is already over")]
    GameOver,
    #[error("illegal move {mv} for {seat}")]
    IllegalMove { seat: Seat, mv: Move },
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (clone to simulate)
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    current: Seat,
    status: [SeatStatus; 4],
    last_move: [Option<Move>; 4],
    /// Moves committed so far
    pub ply: u32,
    result: GameResult,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Start from a populated board; South moves first
    pub fn new(board: Board) -> Self {
        let mut state = Self {
            board,
            current: Seat::South,
            status: [SeatStatus::Active; 4],
            last_move: [None; 4],
            ply: 0,
            result: GameResult::Ongoing,
        };
        // Seats with no flag or no moves at all never get a turn
        let mut report = Vec::new();
        for seat in Seat::ALL {
            if state.board.flag_position(seat).is_none() {
                state.eliminate(seat, Elimination::FlagCaptured, &mut report);
            }
        }
        state.update_result();
        if state.result == GameResult::Ongoing && !state.has_legal_move(Seat::South) {
            state.advance_turn(&mut report);
        }
        state
    }

    /// All four seats deployed from validated layouts
    pub fn from_deployments(
        topology: std::sync::Arc<Topology>,
        deployments: &[Deployment; 4],
        roster: &Roster,
    ) -> Result<Self, SetupError> {
        Ok(Self::new(build_board(topology, deployments, roster)?))
    }

    /// Standard board with the standard layout for every seat
    pub fn standard() -> Self {
        let deployments: [Deployment; 4] = std::array::from_fn(|_| Deployment::standard());
        match Self::from_deployments(Topology::standard(), &deployments, &Roster::standard()) {
            Ok(state) => state,
            Err(e) => panic!("standard deployment is invalid: {e}"),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn topology(&self) -> &Topology {
        self.board.topology()
    }

    pub fn current_seat(&self) -> Seat {
        self.current
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result != GameResult::Ongoing
    }

    pub fn status(&self, seat: Seat) -> SeatStatus {
        self.status[seat.index()]
    }

    pub fn is_active(&self, seat: Seat) -> bool {
        self.status(seat) == SeatStatus::Active
    }

    pub fn is_team_eliminated(&self, team: Team) -> bool {
        team.seats().iter().all(|&s| !self.is_active(s))
    }

    pub fn last_move(&self, seat: Seat) -> Option<Move> {
        self.last_move[seat.index()]
    }

    pub fn flag_position(&self, seat: Seat) -> Option<Position> {
        self.board.flag_position(seat)
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Legal moves of the seat to act
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            return Vec::new();
        }
        self.legal_moves_for(self.current)
    }

    pub fn legal_moves_for(&self, seat: Seat) -> Vec<Move> {
        if !self.is_active(seat) {
            return Vec::new();
        }
        let mut moves = Vec::new();
        for (from, _) in self.board.pieces_of(seat) {
            for to in possible_moves(&self.board, from) {
                moves.push(Move::new(from, to));
            }
        }
        moves
    }

    /// Legal destinations of whatever stands on `from`
    pub fn possible_moves(&self, from: Position) -> Vec<Position> {
        possible_moves(&self.board, from)
    }

    pub fn has_legal_move(&self, seat: Seat) -> bool {
        self.is_active(seat)
            && self
                .board
                .pieces_of(seat)
                .any(|(from, _)| has_any_move(&self.board, from))
    }

    pub fn is_valid_move(&self, mv: Move) -> bool {
        match self.board.get(mv.from) {
            Some(piece) if piece.owner == self.current && !self.is_over() => {
                is_valid_move(&self.board, mv.from, mv.to, piece)
            }
            _ => false,
        }
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Apply a generated move to a copy; the original is untouched
    pub fn apply_move(&self, mv: Move) -> Self {
        let mut next = self.clone();
        next.commit_unchecked(mv);
        next
    }

    /// Validate and commit a move by the seat to act
    pub fn commit(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if !self.is_valid_move(mv) {
            return Err(GameError::IllegalMove { seat: self.current, mv });
        }
        Ok(self.commit_unchecked(mv))
    }

    fn commit_unchecked(&mut self, mv: Move) -> MoveReport {
        let seat = self.current;
        let engineer_path = requires_engineer(&self.board, mv.from, mv.to);
        let piece = self
            .board
            .remove(mv.from)
            .expect("No piece at from position");

        let mut report = MoveReport {
            seat,
            piece,
            from: mv.from,
            to: mv.to,
            engineer_path,
            battle: None,
            revealed: Vec::new(),
            eliminated: Vec::new(),
        };

        match self.board.remove(mv.to) {
            None => {
                self.board.place(mv.to, piece);
            }
            Some(defender) => {
                let outcome = resolve(piece.rank, defender.rank);
                if outcome.attacker_survives {
                    self.board.place(mv.to, piece);
                } else if outcome.defender_survives {
                    self.board.place(mv.to, defender);
                }

                if outcome.is_commander_death {
                    if piece.rank == Rank::Commander && !outcome.attacker_survives {
                        self.reveal_flag(piece.owner, &mut report);
                    }
                    if defender.rank == Rank::Commander && !outcome.defender_survives {
                        self.reveal_flag(defender.owner, &mut report);
                    }
                }

                report.battle = Some(Battle {
                    attacker: piece,
                    defender,
                    outcome,
                });

                if outcome.is_flag_capture {
                    self.eliminate(defender.owner, Elimination::FlagCaptured, &mut report.eliminated);
                }
            }
        }

        self.last_move[seat.index()] = Some(mv);
        self.ply += 1;
        self.update_result();
        if !self.is_over() {
            self.advance_turn(&mut report.eliminated);
        }
        report
    }

    fn reveal_flag(&mut self, seat: Seat, report: &mut MoveReport) {
        if let Some(pos) = self.board.flag_position(seat) {
            if let Some(flag) = self.board.get_mut(pos) {
                if !flag.revealed {
                    flag.reveal();
                    report.revealed.push((flag.id, flag.rank));
                }
            }
        }
    }

    // ========================================================================
    // TERMINATION
    // ========================================================================

    fn eliminate(&mut self, seat: Seat, reason: Elimination, eliminated: &mut Vec<(Seat, Elimination)>) {
        if !self.is_active(seat) {
            return;
        }
        self.status[seat.index()] = SeatStatus::Eliminated(reason);
        self.board.clear_seat(seat);
        eliminated.push((seat, reason));
        tracing::debug!(%seat, ?reason, ply = self.ply, "seat eliminated");
    }

    /// Pass the turn to the next active seat, eliminating any seat found
    /// without a legal move
    fn advance_turn(&mut self, eliminated: &mut Vec<(Seat, Elimination)>) {
        let mut next = self.current;
        for _ in 0..4 {
            next = next.next();
            if !self.is_active(next) {
                continue;
            }
            if self.has_legal_move(next) {
                self.current = next;
                return;
            }
            self.eliminate(next, Elimination::Immobilized, eliminated);
            self.update_result();
            if self.is_over() {
                return;
            }
        }
    }

    fn update_result(&mut self) {
        if self.result != GameResult::Ongoing {
            return;
        }
        let ns_out = self.is_team_eliminated(Team::NorthSouth);
        let ew_out = self.is_team_eliminated(Team::EastWest);
        self.result = match (ns_out, ew_out) {
            (true, true) => GameResult::Draw,
            (true, false) => GameResult::Won(Team::EastWest),
            (false, true) => GameResult::Won(Team::NorthSouth),
            (false, false) => GameResult::Ongoing,
        };
    }

    /// Stop the game without a winner (ply limit)
    pub fn declare_draw(&mut self) {
        if self.result == GameResult::Ongoing {
            self.result = GameResult::Draw;
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topo = self.topology();
        for row in 0..topo.size() {
            for col in 0..topo.size() {
                let pos = Position::new(row, col);
                if !topo.contains(pos) {
                    f.write_str("   ")?;
                    continue;
                }
                match self.board.get(pos) {
                    Some(piece) => write!(f, "{}{} ", piece.owner.index(), piece.rank.info().symbol)?,
                    None => {
                        let glyph = match topo.classify(pos) {
                            CellKind::Campsite => "()",
                            CellKind::Headquarters => "[]",
                            _ if !topo.is_stoppable(pos) => "++",
                            CellKind::RailwayStation => "==",
                            CellKind::Normal => "..",
                        };
                        write!(f, "{glyph} ")?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
