//! Move selection: greedy one-ply scoring and team minimax with alpha-beta

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::eval::{evaluate, flag_threat, piece_value, Persona, PersonaWeights, WIN_VALUE};
use crate::game::{GameState, Move};
use crate::memory::PieceMemory;
use crate::pieces::Rank;
use crate::topology::{Position, Seat};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Scores are clamped to this range before leaving the search
const SCORE_BOUND: f32 = 2.0 * WIN_VALUE;

/// Fixed score of a node whose seat to act has no legal move
const NO_MOVE_SCORE: f32 = WIN_VALUE / 2.0;

const THREAT_INTERCEPT_WEIGHT: f32 = 40.0;
const REPETITION_PENALTY: f32 = 6.0;
const ENDGAME_APPROACH_WEIGHT: f32 = 3.0;
const BLUFF_BONUS: f32 = 0.8;
const CONFIRMED_MINE_PENALTY: f32 = 30.0;
const SUSPECTED_MINE_PENALTY: f32 = 4.0;
const ENGINEER_SWEEP_BONUS: f32 = 8.0;
const KNOWN_STRONGER_PENALTY: f32 = 25.0;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Greedy,
    Minimax,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub strategy: Strategy,
    /// Plies searched normally (one ply = one seat's move)
    pub depth: u32,
    /// Plies searched while the own flag is under threat
    pub threatened_depth: u32,
    /// Threat units that switch to `threatened_depth`
    pub threat_trigger: u32,
    pub pruning: bool,
    /// Multiplier on the external move bonus
    pub bonus_weight: f32,
    /// Stop considering further root candidates once this much time passed
    pub time_budget: Option<Duration>,
    /// Moves searched per inner node, best ordered first; the root searches all
    pub max_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Minimax,
            depth: 2,
            threatened_depth: 3,
            threat_trigger: 3,
            pruning: true,
            bonus_weight: 0.0,
            time_budget: None,
            max_candidates: 24,
        }
    }
}

impl SearchConfig {
    pub fn greedy() -> Self {
        Self {
            strategy: Strategy::Greedy,
            ..Self::default()
        }
    }

    pub fn minimax(depth: u32) -> Self {
        Self {
            strategy: Strategy::Minimax,
            depth,
            threatened_depth: depth.max(3),
            ..Self::default()
        }
    }
}

// ============================================================================
// EXTERNAL BONUS
// ============================================================================

/// Additive per-candidate signal from an outside source (a learned value
/// function, for example). The search only ever adds
/// `bonus_weight * move_bonus(..)` to a candidate's score.
pub trait MoveBonus: Send + Sync {
    fn move_bonus(&self, state: &GameState, from: Position, to: Position, seat: Seat) -> f32;
}

/// No external signal
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBonus;

impl MoveBonus for NoBonus {
    fn move_bonus(&self, _: &GameState, _: Position, _: Position, _: Seat) -> f32 {
        0.0
    }
}

// ============================================================================
// AI
// ============================================================================

/// Outcome of one decision
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchResult {
    pub best: Option<Move>,
    pub score: f32,
    pub nodes: u64,
    pub depth: u32,
    /// Root candidates actually scored
    pub considered: usize,
}

/// Decision engine for one seat
pub struct SiguoAI {
    pub config: SearchConfig,
    pub persona: Persona,
    bonus: Box<dyn MoveBonus>,
}

impl SiguoAI {
    pub fn new(config: SearchConfig, persona: Persona) -> Self {
        Self {
            config,
            persona,
            bonus: Box::new(NoBonus),
        }
    }

    pub fn with_bonus(mut self, bonus: Box<dyn MoveBonus>) -> Self {
        self.bonus = bonus;
        self
    }

    /// Best move for the seat to act, seen through that seat's memory
    pub fn best_move(&self, state: &GameState, memory: &PieceMemory) -> Option<Move> {
        self.search(state, memory).best
    }

    pub fn search(&self, state: &GameState, memory: &PieceMemory) -> SearchResult {
        let result = match self.config.strategy {
            Strategy::Greedy => self.greedy(state, memory),
            Strategy::Minimax => self.minimax_root(state, memory),
        };
        tracing::debug!(
            seat = %state.current_seat(),
            best = ?result.best,
            score = result.score,
            nodes = result.nodes,
            depth = result.depth,
            "search finished"
        );
        result
    }

    /// Search depth for the seat to act
    pub fn effective_depth(&self, state: &GameState) -> u32 {
        if flag_threat(state, state.current_seat()) >= self.config.threat_trigger {
            self.config.threatened_depth
        } else {
            self.config.depth
        }
    }

    fn external_bonus(&self, state: &GameState, mv: Move, seat: Seat) -> f32 {
        if self.config.bonus_weight == 0.0 {
            return 0.0;
        }
        let bonus = self.bonus.move_bonus(state, mv.from, mv.to, seat);
        if bonus.is_finite() {
            self.config.bonus_weight * bonus
        } else {
            0.0
        }
    }

    fn budget_spent(&self, start: Instant) -> bool {
        self.config.time_budget.map_or(false, |budget| start.elapsed() >= budget)
    }

    // ========================================================================
    // GREEDY
    // ========================================================================

    fn greedy(&self, state: &GameState, memory: &PieceMemory) -> SearchResult {
        let seat = state.current_seat();
        let moves = state.legal_moves();

        let score_move = |&mv: &Move| {
            let next = state.apply_move(mv);
            let score = evaluate(&next, memory, seat, self.persona)
                + situational_bonus(state, &next, mv, memory, self.persona.weights())
                + self.external_bonus(state, mv, seat);
            sanitize(score)
        };

        #[cfg(feature = "parallel")]
        let scores: Vec<f32> = {
            use rayon::prelude::*;
            moves.par_iter().map(score_move).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let scores: Vec<f32> = {
            let start = Instant::now();
            let mut scores = Vec::with_capacity(moves.len());
            for mv in &moves {
                if !scores.is_empty() && self.budget_spent(start) {
                    break;
                }
                scores.push(score_move(mv));
            }
            scores
        };

        // First maximum wins ties
        let mut best: Option<(Move, f32)> = None;
        for (&mv, &score) in moves.iter().zip(&scores) {
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((mv, score));
            }
        }

        SearchResult {
            best: best.map(|(mv, _)| mv),
            score: best.map_or(-NO_MOVE_SCORE, |(_, s)| s),
            nodes: scores.len() as u64,
            depth: 1,
            considered: scores.len(),
        }
    }

    // ========================================================================
    // MINIMAX WITH ALPHA-BETA
    // ========================================================================

    fn minimax_root(&self, state: &GameState, memory: &PieceMemory) -> SearchResult {
        let root = state.current_seat();
        let depth = self.effective_depth(state).max(1);
        // Every legal move is searched at the root; only inner nodes are cut
        let moves = ordered_moves(state);
        let weights = self.persona.weights();
        let start = Instant::now();
        let mut nodes = 0u64;
        let mut considered = 0usize;
        let mut best: Option<(Move, f32)> = None;

        for mv in moves {
            if best.is_some() && self.budget_spent(start) {
                break;
            }
            let child = state.apply_move(mv);
            let bonus = self.external_bonus(state, mv, root)
                + situational_bonus(state, &child, mv, memory, weights);
            // A child only matters if it can beat the best total so far
            let alpha = match best {
                Some((_, b)) if self.config.pruning => b - bonus,
                _ => -SCORE_BOUND,
            };
            let value = self.minimax(&child, memory, root, depth - 1, alpha, SCORE_BOUND, &mut nodes);
            let score = sanitize(value + bonus);
            considered += 1;
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((mv, score));
            }
        }

        SearchResult {
            best: best.map(|(mv, _)| mv),
            score: best.map_or(-NO_MOVE_SCORE, |(_, s)| s),
            nodes,
            depth,
            considered,
        }
    }

    /// Seats on the root's team maximize, the other team minimizes
    #[allow(clippy::too_many_arguments)]
    fn minimax(
        &self,
        state: &GameState,
        memory: &PieceMemory,
        root: Seat,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
        nodes: &mut u64,
    ) -> f32 {
        *nodes += 1;

        // Terminal check with depth bonus: win sooner, lose later
        if state.is_over() {
            let base = evaluate(state, memory, root, Persona::Balanced);
            let bonus = if base > 0.0 {
                depth as f32
            } else if base < 0.0 {
                -(depth as f32)
            } else {
                0.0
            };
            return sanitize(base + bonus);
        }

        if depth == 0 {
            return sanitize(evaluate(state, memory, root, Persona::Balanced));
        }

        let maximizing = state.current_seat().is_teammate(root);
        let mut moves = ordered_moves(state);
        moves.truncate(self.config.max_candidates.max(1));
        if moves.is_empty() {
            return if maximizing { -NO_MOVE_SCORE } else { NO_MOVE_SCORE };
        }

        let mut best: Option<f32> = None;
        for mv in moves {
            let child = state.apply_move(mv);
            let score = self.minimax(&child, memory, root, depth - 1, alpha, beta, nodes);

            if maximizing {
                best = Some(best.map_or(score, |b| b.max(score)));
                alpha = alpha.max(score);
            } else {
                best = Some(best.map_or(score, |b| b.min(score)));
                beta = beta.min(score);
            }

            if self.config.pruning && alpha >= beta {
                break;
            }
        }

        best.unwrap_or(0.0)
    }

}

// ============================================================================
// MOVE ORDERING
// ============================================================================

/// Legal moves, best first: captures (most valuable victim first), then
/// quiet moves towards the own flag while it is threatened, otherwise
/// towards the nearest enemy headquarters
fn ordered_moves(state: &GameState) -> Vec<Move> {
    let seat = state.current_seat();
    let guard = state
        .flag_position(seat)
        .filter(|_| flag_threat(state, seat) > 0);
    let targets: Vec<Position> = seat
        .team()
        .opponent()
        .seats()
        .into_iter()
        .filter(|&e| state.is_active(e))
        .flat_map(|e| state.topology().headquarters(e))
        .collect();

    let mut keyed: Vec<(f32, Move)> = state
        .legal_moves()
        .into_iter()
        .map(|mv| (move_score(state, mv, guard, &targets), mv))
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    keyed.into_iter().map(|(_, mv)| mv).collect()
}

/// Score a move for ordering (higher = search first)
fn move_score(state: &GameState, mv: Move, guard: Option<Position>, targets: &[Position]) -> f32 {
    match state.board().get(mv.to) {
        Some(victim) if !victim.owner.is_teammate(state.current_seat()) => {
            if victim.rank == Rank::Flag {
                WIN_VALUE
            } else {
                100.0 + piece_value(victim.rank)
            }
        }
        _ => {
            let closer = |target: Position| {
                mv.from.distance_to(target) as f32 - mv.to.distance_to(target) as f32
            };
            match guard {
                Some(flag) => 50.0 + closer(flag),
                None => {
                    let nearest = |p: Position| targets.iter().map(|&t| p.distance_to(t)).min();
                    match (nearest(mv.from), nearest(mv.to)) {
                        (Some(a), Some(b)) => a as f32 - b as f32,
                        _ => 0.0,
                    }
                }
            }
        }
    }
}

/// Map NaN and infinities back into the finite score range
fn sanitize(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-SCORE_BOUND, SCORE_BOUND)
    }
}

// ============================================================================
// SITUATIONAL BONUSES (greedy)
// ============================================================================

fn situational_bonus(
    state: &GameState,
    next: &GameState,
    mv: Move,
    memory: &PieceMemory,
    weights: PersonaWeights,
) -> f32 {
    let Some(mover) = state.board().get(mv.from) else {
        return 0.0;
    };
    let seat = mover.owner;

    let mut bonus = 0.0;

    // Threat interception
    let before = flag_threat(state, seat) as f32;
    let after = flag_threat(next, seat) as f32;
    bonus += weights.defense * THREAT_INTERCEPT_WEIGHT * (before - after);

    bonus -= repetition_penalty(state, seat, mv);

    // Endgame aggression once an enemy seat is gone
    let enemies = seat.team().opponent().seats();
    if enemies.iter().any(|&e| !state.is_active(e)) {
        let targets: Vec<Position> = enemies
            .iter()
            .filter(|&&e| state.is_active(e))
            .flat_map(|&e| state.topology().headquarters(e))
            .collect();
        let nearest = |p: Position| targets.iter().map(|&t| p.distance_to(t)).min().unwrap_or(0) as f32;
        bonus += weights.attack * ENDGAME_APPROACH_WEIGHT * (nearest(mv.from) - nearest(mv.to));
    }

    match state.board().get(mv.to) {
        None => {
            // Bluff: a weak piece parks next to an enemy as if it were strong
            if mover.rank.is_ordinary() && mover.rank <= Rank::Company {
                let next_to_enemy = state.board().pieces().any(|(pos, p)| {
                    !p.owner.is_teammate(seat) && state.topology().are_adjacent(pos, mv.to)
                });
                if next_to_enemy {
                    bonus += weights.attack * BLUFF_BONUS;
                }
            }
        }
        Some(target) => {
            if let Some(est) = memory.estimate(target.id) {
                if est.confirmed_mine {
                    // Only an engineer clears a mine, whatever it has beaten before
                    if mover.rank == Rank::Engineer {
                        return bonus + ENGINEER_SWEEP_BONUS;
                    }
                    bonus -= CONFIRMED_MINE_PENALTY;
                } else if est.mine_possible && !est.has_moved && mover.rank != Rank::Engineer {
                    bonus -= SUSPECTED_MINE_PENALTY;
                }

                if mover.rank.is_ordinary() && est.defeated_our_rank >= mover.rank.value() {
                    bonus -= KNOWN_STRONGER_PENALTY;
                }
            }
        }
    }

    bonus
}

fn repetition_penalty(state: &GameState, seat: Seat, mv: Move) -> f32 {
    if state.last_move(seat) == Some(mv.reversed()) {
        REPETITION_PENALTY
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::game::GameResult;
    use crate::pieces::{Piece, PieceId};
    use crate::topology::Team;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn game_with(extra: &[(Rank, Seat, i8, i8)]) -> GameState {
        game_with_flags(&Seat::ALL, extra)
    }

    /// Flags only for `flags`; a seat without one is out from the start
    fn game_with_flags(flags: &[Seat], extra: &[(Rank, Seat, i8, i8)]) -> GameState {
        let mut board = Board::standard();
        let mut id = 100;
        for &seat in flags {
            let hq = board.topology().headquarters(seat)[0];
            board.place(hq, Piece::new(PieceId(id), Rank::Flag, seat));
            id += 1;
        }
        for (i, &(rank, seat, row, col)) in extra.iter().enumerate() {
            board.place(Position::new(row, col), Piece::new(PieceId(i as u16), rank, seat));
        }
        GameState::new(board)
    }

    /// South corps next to East's flag; North and West cannot move, so
    /// taking the flag ends the game
    fn winning_position() -> GameState {
        game_with(&[
            (Rank::Corps, Seat::South, 8, 16),
            (Rank::Platoon, Seat::South, 13, 6),
            (Rank::Division, Seat::East, 10, 13),
        ])
    }

    fn midgame(seed: u64, plies: usize) -> GameState {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = GameState::standard();
        for _ in 0..plies {
            let moves = state.legal_moves();
            let Some(&mv) = moves.choose(&mut rng) else { break };
            state = state.apply_move(mv);
        }
        state
    }

    struct Prefer(Move);

    impl MoveBonus for Prefer {
        fn move_bonus(&self, _: &GameState, from: Position, to: Position, _: Seat) -> f32 {
            if Move::new(from, to) == self.0 {
                1000.0
            } else {
                0.0
            }
        }
    }

    #[test]
    fn test_greedy_takes_winning_flag() {
        let state = winning_position();
        let memory = PieceMemory::new(Seat::South, state.board());
        let ai = SiguoAI::new(SearchConfig::greedy(), Persona::Balanced);
        let mv = ai.best_move(&state, &memory).unwrap();
        assert_eq!(mv, Move::new(Position::new(8, 16), Position::new(9, 16)));
        assert_eq!(state.apply_move(mv).result(), GameResult::Won(Team::NorthSouth));
    }

    #[test]
    fn test_minimax_takes_winning_flag() {
        let state = winning_position();
        let memory = PieceMemory::new(Seat::South, state.board());
        let ai = SiguoAI::new(SearchConfig::minimax(2), Persona::Balanced);
        let result = ai.search(&state, &memory);
        assert_eq!(result.best, Some(Move::new(Position::new(8, 16), Position::new(9, 16))));
        assert!(result.score >= WIN_VALUE);
    }

    #[test]
    fn test_pruning_preserves_score() {
        for (seed, plies) in [(1, 0), (2, 12), (3, 30)] {
            let state = midgame(seed, plies);
            let memory = PieceMemory::new(state.current_seat(), state.board());

            let mut config = SearchConfig::minimax(2);
            config.max_candidates = 10;
            config.threatened_depth = 2;
            let pruned = SiguoAI::new(config.clone(), Persona::Balanced).search(&state, &memory);
            config.pruning = false;
            let full = SiguoAI::new(config, Persona::Balanced).search(&state, &memory);

            assert_eq!(pruned.score, full.score, "seed {seed}");
            assert_eq!(pruned.best, full.best, "seed {seed}");
            assert!(pruned.nodes <= full.nodes);
        }
    }

    #[test]
    fn test_external_bonus_steers_choice() {
        let state = GameState::standard();
        let memory = PieceMemory::new(Seat::South, state.board());
        let moves = state.legal_moves();
        let target = moves[moves.len() - 1];

        for config in [SearchConfig::greedy(), SearchConfig::minimax(2)] {
            let mut config = config;
            config.bonus_weight = 1.0;
            config.max_candidates = moves.len();
            let ai = SiguoAI::new(config, Persona::Balanced).with_bonus(Box::new(Prefer(target)));
            assert_eq!(ai.best_move(&state, &memory), Some(target));
        }
    }

    #[test]
    fn test_zero_bonus_weight_ignores_bonus() {
        let state = GameState::standard();
        let memory = PieceMemory::new(Seat::South, state.board());
        let target = *state.legal_moves().last().unwrap();
        let plain = SiguoAI::new(SearchConfig::greedy(), Persona::Balanced);
        let steered = SiguoAI::new(SearchConfig::greedy(), Persona::Balanced)
            .with_bonus(Box::new(Prefer(target)));
        assert_eq!(plain.search(&state, &memory), steered.search(&state, &memory));
    }

    #[test]
    fn test_search_is_deterministic() {
        let state = midgame(9, 20);
        let memory = PieceMemory::new(state.current_seat(), state.board());
        let ai = SiguoAI::new(SearchConfig::minimax(2), Persona::Defensive);
        assert_eq!(ai.search(&state, &memory), ai.search(&state, &memory));
    }

    #[test]
    fn test_time_budget_still_returns_move() {
        let state = GameState::standard();
        let memory = PieceMemory::new(Seat::South, state.board());
        let mut config = SearchConfig::minimax(2);
        config.time_budget = Some(Duration::ZERO);
        let result = SiguoAI::new(config, Persona::Balanced).search(&state, &memory);
        assert!(result.best.is_some());
        assert_eq!(result.considered, 1);
    }

    #[test]
    fn test_threat_deepens_search() {
        // East platoon next to South's flag at (16,7)
        let state = game_with(&[
            (Rank::Corps, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 16, 8),
        ]);
        let ai = SiguoAI::new(SearchConfig::minimax(2), Persona::Balanced);
        assert_eq!(ai.effective_depth(&state), 3);
        assert_eq!(ai.effective_depth(&GameState::standard()), 2);
    }

    #[test]
    fn test_repetition_penalty() {
        let mut state = game_with(&[
            (Rank::Corps, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 8, 13),
            (Rank::Platoon, Seat::North, 2, 7),
            (Rank::Platoon, Seat::West, 7, 2),
        ]);
        let forward = Move::new(Position::new(13, 6), Position::new(14, 6));
        state.commit(forward).unwrap();
        assert_eq!(repetition_penalty(&state, Seat::South, forward.reversed()), REPETITION_PENALTY);
        assert_eq!(repetition_penalty(&state, Seat::South, forward), 0.0);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), SCORE_BOUND);
        assert_eq!(sanitize(f32::NEG_INFINITY), -SCORE_BOUND);
        assert_eq!(sanitize(12.5), 12.5);
    }

    #[test]
    fn test_captures_ordered_first() {
        let state = game_with(&[
            (Rank::Corps, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 12, 6),
        ]);
        let moves = ordered_moves(&state);
        assert_eq!(moves[0], Move::new(Position::new(13, 6), Position::new(12, 6)));
        assert_eq!(moves.len(), state.legal_moves().len());
    }

    #[test]
    fn test_threatened_flag_orders_guard_moves_first() {
        // East platoon next to South's flag; the corps heads home first
        let state = game_with(&[
            (Rank::Corps, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 16, 8),
        ]);
        let flag = Position::new(16, 7);
        let moves = ordered_moves(&state);
        assert_eq!(moves[0].from.distance_to(flag), 4);
        assert_eq!(moves[0].to.distance_to(flag), 2);
        let last = moves[moves.len() - 1];
        assert!(last.to.distance_to(flag) > last.from.distance_to(flag));
    }

    #[test]
    fn test_root_searches_every_legal_move() {
        let state = GameState::standard();
        let memory = PieceMemory::new(Seat::South, state.board());
        let config = SearchConfig::minimax(2);
        let legal = state.legal_moves().len();
        assert!(legal > config.max_candidates);

        let result = SiguoAI::new(config, Persona::Balanced).search(&state, &memory);
        assert_eq!(result.considered, legal);
    }

    #[test]
    fn test_persona_shapes_minimax_root() {
        // East is out; whatever South plays, North moves and West (flag only)
        // falls, so every root move wins and only the root bonuses differ
        let state = game_with_flags(
            &[Seat::South, Seat::North, Seat::West],
            &[(Rank::Corps, Seat::South, 13, 6), (Rank::Platoon, Seat::North, 2, 7)],
        );
        let memory = PieceMemory::new(Seat::South, state.board());
        let search = |persona| SiguoAI::new(SearchConfig::minimax(2), persona).search(&state, &memory);

        let aggressive = search(Persona::AggressiveSolo);
        let defensive = search(Persona::Defensive);
        assert!(aggressive.score >= WIN_VALUE);
        assert!(aggressive.score > defensive.score);
    }

    // ------------------------------------------------------------------------
    // Situational bonuses
    // ------------------------------------------------------------------------

    fn bonus_for(state: &GameState, memory: &PieceMemory, mv: Move, persona: Persona) -> f32 {
        situational_bonus(state, &state.apply_move(mv), mv, memory, persona.weights())
    }

    fn step(from: (i8, i8), to: (i8, i8)) -> Move {
        Move::new(Position::new(from.0, from.1), Position::new(to.0, to.1))
    }

    #[test]
    fn test_threat_interception_bonus() {
        // South corps takes the East platoon standing next to South's flag
        let state = game_with(&[
            (Rank::Corps, Seat::South, 14, 7),
            (Rank::Platoon, Seat::East, 15, 7),
        ]);
        let memory = PieceMemory::new(Seat::South, state.board());
        let mv = step((14, 7), (15, 7));

        let before = flag_threat(&state, Seat::South) as f32;
        let after = flag_threat(&state.apply_move(mv), Seat::South) as f32;
        assert!(before > after);

        for persona in [Persona::Balanced, Persona::Defensive] {
            let expected = persona.weights().defense * THREAT_INTERCEPT_WEIGHT * (before - after);
            assert!((bonus_for(&state, &memory, mv, persona) - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_endgame_aggression_bonus() {
        let pieces = [(Rank::Corps, Seat::South, 13, 6), (Rank::Platoon, Seat::North, 2, 7)];
        let mv = step((13, 6), (12, 6));

        // East is out: one step closer to West's headquarters
        let endgame = game_with_flags(&[Seat::South, Seat::North, Seat::West], &pieces);
        let memory = PieceMemory::new(Seat::South, endgame.board());
        for persona in [Persona::Balanced, Persona::AggressiveSolo] {
            let expected = persona.weights().attack * ENDGAME_APPROACH_WEIGHT;
            assert!((bonus_for(&endgame, &memory, mv, persona) - expected).abs() < 1e-5);
        }

        // Both enemies still in: no approach bonus
        let full = game_with(&pieces);
        let memory = PieceMemory::new(Seat::South, full.board());
        assert_eq!(bonus_for(&full, &memory, mv, Persona::AggressiveSolo), 0.0);
    }

    #[test]
    fn test_bluff_bonus_for_weak_pieces() {
        let mv = step((13, 6), (12, 6));
        for (rank, expected) in [(Rank::Platoon, BLUFF_BONUS), (Rank::Corps, 0.0)] {
            let state = game_with(&[(rank, Seat::South, 13, 6), (Rank::Platoon, Seat::East, 11, 6)]);
            let memory = PieceMemory::new(Seat::South, state.board());
            let bonus = bonus_for(&state, &memory, mv, Persona::Balanced);
            assert!((bonus - expected).abs() < 1e-5, "{rank}: {bonus}");
        }
    }

    #[test]
    fn test_suspected_mine_penalty() {
        // Unmoved East piece in East's back rows
        let state = game_with(&[
            (Rank::Brigade, Seat::South, 9, 14),
            (Rank::Mine, Seat::East, 9, 15),
        ]);
        let memory = PieceMemory::new(Seat::South, state.board());
        let bonus = bonus_for(&state, &memory, step((9, 14), (9, 15)), Persona::Balanced);
        assert_eq!(bonus, -SUSPECTED_MINE_PENALTY);
    }

    /// South's platoon dies attacking the East mine at (9,15)
    fn after_lost_attack(extra: &[(Rank, Seat, i8, i8)], attack: Move) -> (GameState, PieceMemory) {
        let mut state = game_with(extra);
        let mut memory = PieceMemory::new(Seat::South, state.board());
        let report = state.commit(attack).unwrap();
        memory.observe(&report, state.board());
        (state, memory)
    }

    #[test]
    fn test_confirmed_mine_penalty_and_engineer_sweep() {
        let (state, memory) = after_lost_attack(
            &[
                (Rank::Platoon, Seat::South, 9, 14),
                (Rank::Mine, Seat::East, 9, 15),
                (Rank::Corps, Seat::South, 8, 15),
                (Rank::Engineer, Seat::South, 10, 15),
                (Rank::Platoon, Seat::East, 8, 13),
                (Rank::Platoon, Seat::North, 2, 7),
                (Rank::Platoon, Seat::West, 7, 2),
            ],
            step((9, 14), (9, 15)),
        );
        let mine = state.board().get(Position::new(9, 15)).unwrap();
        assert!(memory.estimate(mine.id).unwrap().confirmed_mine);

        let corps = bonus_for(&state, &memory, step((8, 15), (9, 15)), Persona::Balanced);
        assert_eq!(corps, -CONFIRMED_MINE_PENALTY);

        // The mine beat a platoon, which must not scare the engineer off
        let engineer = bonus_for(&state, &memory, step((10, 15), (9, 15)), Persona::Balanced);
        assert_eq!(engineer, ENGINEER_SWEEP_BONUS);
    }

    #[test]
    fn test_known_stronger_penalty() {
        // South's brigade dies attacking the East corps
        let (state, memory) = after_lost_attack(
            &[
                (Rank::Brigade, Seat::South, 13, 6),
                (Rank::Corps, Seat::East, 12, 6),
                (Rank::Regiment, Seat::South, 12, 7),
                (Rank::Platoon, Seat::North, 2, 7),
                (Rank::Platoon, Seat::West, 7, 2),
            ],
            step((13, 6), (12, 6)),
        );
        let corps = state.board().get(Position::new(12, 6)).unwrap();
        assert_eq!(corps.rank, Rank::Corps);
        assert_eq!(memory.estimate(corps.id).unwrap().defeated_our_rank, Rank::Brigade.value());

        let regiment = bonus_for(&state, &memory, step((12, 7), (12, 6)), Persona::Balanced);
        assert_eq!(regiment, -KNOWN_STRONGER_PENALTY);
    }
}
