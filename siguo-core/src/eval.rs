//! Position evaluation
//!
//! Scores a state from one seat's point of view using that seat's piece
//! memory for every piece it does not own. Magnitudes are tuning constants;
//! the ordering is what matters: flag safety outweighs material, and
//! material outweighs positional terms.

use serde::{Deserialize, Serialize};

use crate::game::{GameResult, GameState};
use crate::memory::{PieceMemory, RankEstimate};
use crate::pieces::{Piece, Rank};
use crate::topology::{CellKind, Position, Seat};

/// Win value (effectively infinite)
pub const WIN_VALUE: f32 = 100000.0;

/// Penalty per unit of threat against the own flag
const FLAG_THREAT_WEIGHT: f32 = 60.0;

/// Bonus per strong piece standing guard near the own flag
const FLAG_GUARD_BONUS: f32 = 4.0;

/// Enemies further than this from a flag do not threaten it
pub const THREAT_RADIUS: u8 = 3;

const RAILWAY_BONUS: f32 = 0.5;
const CAMPSITE_BONUS: f32 = 1.0;

// ============================================================================
// PERSONAS
// ============================================================================

/// Named playing style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    Balanced,
    AggressiveSolo,
    Defensive,
    TeamSupport,
}

/// Multipliers over the evaluation terms
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonaWeights {
    /// Enemy material
    pub attack: f32,
    /// Flag threat and flag guard
    pub defense: f32,
    /// Railway and campsite occupancy
    pub mobility: f32,
    /// Approach to enemy flags
    pub flag_capture: f32,
}

impl Persona {
    pub const ALL: [Persona; 4] = [
        Persona::Balanced,
        Persona::AggressiveSolo,
        Persona::Defensive,
        Persona::TeamSupport,
    ];

    pub fn weights(self) -> PersonaWeights {
        match self {
            Persona::Balanced => PersonaWeights {
                attack: 1.0,
                defense: 1.0,
                mobility: 1.0,
                flag_capture: 1.0,
            },
            Persona::AggressiveSolo => PersonaWeights {
                attack: 1.4,
                defense: 0.7,
                mobility: 1.2,
                flag_capture: 1.5,
            },
            Persona::Defensive => PersonaWeights {
                attack: 0.8,
                defense: 1.6,
                mobility: 0.8,
                flag_capture: 0.6,
            },
            Persona::TeamSupport => PersonaWeights {
                attack: 1.1,
                defense: 1.2,
                mobility: 1.0,
                flag_capture: 1.0,
            },
        }
    }

    /// Share of a teammate's material and flag safety counted as our own
    pub fn teammate_share(self) -> f32 {
        match self {
            Persona::TeamSupport => 0.8,
            Persona::AggressiveSolo => 0.3,
            _ => 0.5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Persona::Balanced => "balanced",
            Persona::AggressiveSolo => "aggressive-solo",
            Persona::Defensive => "defensive",
            Persona::TeamSupport => "team-support",
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Persona::Balanced
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Persona::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown persona '{s}'"))
    }
}

// ============================================================================
// MATERIAL
// ============================================================================

/// Material value of a rank
pub fn piece_value(rank: Rank) -> f32 {
    match rank {
        Rank::Flag => 0.0,
        Rank::Engineer => 5.0,
        Rank::Platoon => 2.0,
        Rank::Company => 3.0,
        Rank::Battalion => 4.5,
        Rank::Regiment => 6.0,
        Rank::Brigade => 8.0,
        Rank::Division => 11.0,
        Rank::Corps => 15.0,
        Rank::Commander => 20.0,
        Rank::Bomb => 10.0,
        Rank::Mine => 5.0,
    }
}

/// Value of a fractional ordinary rank, interpolated between neighbours
fn interpolated_value(rank: f32) -> f32 {
    let lo = rank.floor().clamp(1.0, 9.0) as u8;
    let hi = rank.ceil().clamp(1.0, 9.0) as u8;
    let (Some(lo_rank), Some(hi_rank)) = (Rank::from_value(lo), Rank::from_value(hi)) else {
        return 0.0;
    };
    let t = rank - lo as f32;
    piece_value(lo_rank) * (1.0 - t) + piece_value(hi_rank) * t
}

/// Expected value of a hidden piece from its memory estimate
pub fn estimated_value(estimate: &RankEstimate) -> f32 {
    if let Some(rank) = estimate.known {
        return piece_value(rank);
    }
    if estimate.confirmed_mine {
        return piece_value(Rank::Mine);
    }
    let mut value = interpolated_value(estimate.midpoint());
    if estimate.mine_possible {
        value = value * 0.8 + piece_value(Rank::Mine) * 0.2;
    }
    if estimate.bomb_possible {
        value += 1.0;
    }
    // Something that beat our pieces is at least that strong
    if let Some(beaten) = Rank::from_value(estimate.defeated_our_rank) {
        value = value.max(piece_value(beaten));
    }
    value
}

/// Value of a piece as seen by the memory's observer; partners share
/// their layouts, so only enemy ranks are estimated
fn perceived_value(piece: &Piece, memory: &PieceMemory) -> f32 {
    if piece.owner.is_teammate(memory.observer()) || piece.revealed {
        return piece_value(piece.rank);
    }
    match memory.estimate(piece.id) {
        Some(estimate) => estimated_value(&estimate),
        None => piece_value(piece.rank),
    }
}

// ============================================================================
// FLAG SAFETY
// ============================================================================

/// Threat units against a seat's flag: every enemy within `THREAT_RADIUS`
/// steps contributes `THREAT_RADIUS + 1 - distance`
pub fn flag_threat(state: &GameState, seat: Seat) -> u32 {
    let Some(flag) = state.flag_position(seat) else {
        return 0;
    };
    state
        .board()
        .pieces()
        .filter(|(_, p)| !p.owner.is_teammate(seat))
        .map(|(pos, _)| pos.distance_to(flag))
        .filter(|&d| d <= THREAT_RADIUS)
        .map(|d| (THREAT_RADIUS + 1 - d) as u32)
        .sum()
}

/// Strong own pieces within two steps of the flag
fn flag_guards(state: &GameState, seat: Seat) -> usize {
    let Some(flag) = state.flag_position(seat) else {
        return 0;
    };
    state
        .board()
        .pieces_of(seat)
        .filter(|(pos, p)| {
            pos.distance_to(flag) <= 2
                && (p.rank == Rank::Bomb || (p.rank.is_ordinary() && p.rank >= Rank::Brigade))
        })
        .count()
}

/// Where `seat` believes an enemy flag stands: revealed flags exactly,
/// otherwise every enemy headquarters still occupied
fn flag_targets(state: &GameState, seat: Seat) -> Vec<(Position, f32)> {
    let topo = state.topology();
    let mut targets = Vec::new();
    for enemy in seat.team().opponent().seats() {
        if !state.is_active(enemy) {
            continue;
        }
        match state.flag_position(enemy) {
            Some(pos) if state.board().get(pos).map_or(false, |p| p.revealed) => {
                targets.push((pos, 1.0));
            }
            _ => {
                for hq in topo.headquarters(enemy) {
                    if state.board().is_occupied(hq) {
                        targets.push((hq, 0.3));
                    }
                }
            }
        }
    }
    targets
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluate `state` for `seat`'s team
pub fn evaluate(state: &GameState, memory: &PieceMemory, seat: Seat, persona: Persona) -> f32 {
    match state.result() {
        GameResult::Won(team) => {
            return if team == seat.team() { WIN_VALUE } else { -WIN_VALUE };
        }
        GameResult::Draw => return 0.0,
        GameResult::Ongoing => {}
    }

    let weights = persona.weights();
    let share = persona.teammate_share();
    let topo = state.topology();
    let mut score = 0.0f32;

    // Material and position
    for (pos, piece) in state.board().pieces() {
        let value = perceived_value(piece, memory);
        let positional = match topo.classify(pos) {
            CellKind::Campsite => CAMPSITE_BONUS,
            _ if topo.is_railway(pos) && piece.rank.is_mobile() => RAILWAY_BONUS,
            _ => 0.0,
        } * weights.mobility;

        if piece.owner == seat {
            score += value + positional;
        } else if piece.owner.is_teammate(seat) {
            score += share * (value + positional);
        } else {
            score -= weights.attack * value + positional;
        }
    }

    // Flag safety
    let own_threat = flag_threat(state, seat) as f32;
    let partner_threat = flag_threat(state, seat.partner()) as f32;
    score -= weights.defense * FLAG_THREAT_WEIGHT * (own_threat + share * partner_threat);
    score += weights.defense * FLAG_GUARD_BONUS * flag_guards(state, seat) as f32;

    // Flag capture
    if weights.flag_capture > 0.0 {
        let targets = flag_targets(state, seat);
        if !targets.is_empty() {
            let mut pull = 0.0;
            for (pos, piece) in state.board().pieces_of(seat) {
                if !piece.rank.is_mobile() {
                    continue;
                }
                let best = targets
                    .iter()
                    .map(|&(target, w)| w * (8.0 - pos.distance_to(target).min(8) as f32))
                    .fold(0.0f32, f32::max);
                pull += best;
            }
            score += weights.flag_capture * pull * 0.25;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::pieces::PieceId;

    fn game_with(extra: &[(Rank, Seat, i8, i8)]) -> GameState {
        let mut board = Board::standard();
        let mut id = 100;
        for seat in Seat::ALL {
            let hq = board.topology().headquarters(seat)[0];
            board.place(hq, Piece::new(PieceId(id), Rank::Flag, seat));
            id += 1;
        }
        for (i, &(rank, seat, row, col)) in extra.iter().enumerate() {
            board.place(Position::new(row, col), Piece::new(PieceId(i as u16), rank, seat));
        }
        GameState::new(board)
    }

    #[test]
    fn test_standard_is_balanced() {
        let state = GameState::standard();
        let memory = PieceMemory::new(Seat::South, state.board());
        let score = evaluate(&state, &memory, Seat::South, Persona::Balanced);
        assert!(score.is_finite());
        assert!(score.abs() < WIN_VALUE / 10.0);
    }

    #[test]
    fn test_flag_threat_units() {
        // South flag at (16,7)
        let state = game_with(&[
            (Rank::Platoon, Seat::East, 15, 7),
            (Rank::Platoon, Seat::West, 13, 7),
            (Rank::Platoon, Seat::North, 15, 8),
            (Rank::Platoon, Seat::South, 13, 6),
        ]);
        // distance 1 -> 3 units, distance 3 -> 1 unit, teammate ignored
        assert_eq!(flag_threat(&state, Seat::South), 4);
        assert_eq!(flag_threat(&state, Seat::East), 0);
    }

    #[test]
    fn test_flag_safety_outweighs_material() {
        let quiet = game_with(&[
            (Rank::Commander, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 12, 10),
        ]);
        // Same material, but the enemy platoon stands next to South's flag
        let threatened = game_with(&[
            (Rank::Commander, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 16, 8),
        ]);
        let m1 = PieceMemory::new(Seat::South, quiet.board());
        let m2 = PieceMemory::new(Seat::South, threatened.board());
        let a = evaluate(&quiet, &m1, Seat::South, Persona::Balanced);
        let b = evaluate(&threatened, &m2, Seat::South, Persona::Balanced);
        assert!(a - b > piece_value(Rank::Commander));
    }

    #[test]
    fn test_material_counts() {
        let base = game_with(&[
            (Rank::Commander, Seat::South, 13, 6),
            (Rank::Platoon, Seat::East, 8, 13),
        ]);
        let stronger = game_with(&[
            (Rank::Commander, Seat::South, 13, 6),
            (Rank::Corps, Seat::South, 13, 10),
            (Rank::Platoon, Seat::East, 8, 13),
        ]);
        let m1 = PieceMemory::new(Seat::South, base.board());
        let m2 = PieceMemory::new(Seat::South, stronger.board());
        assert!(
            evaluate(&stronger, &m2, Seat::South, Persona::Balanced)
                > evaluate(&base, &m1, Seat::South, Persona::Balanced)
        );
    }

    #[test]
    fn test_partner_material_at_true_value() {
        let with = |rank| {
            let state = game_with(&[
                (Rank::Commander, Seat::South, 13, 6),
                (rank, Seat::North, 2, 7),
                (Rank::Platoon, Seat::East, 8, 13),
            ]);
            let memory = PieceMemory::new(Seat::South, state.board());
            let partner = *state.board().get(Position::new(2, 7)).unwrap();
            assert_eq!(perceived_value(&partner, &memory), piece_value(rank));
            evaluate(&state, &memory, Seat::South, Persona::Balanced)
        };

        let share = Persona::Balanced.teammate_share();
        let gap = with(Rank::Corps) - with(Rank::Platoon);
        let expected = share * (piece_value(Rank::Corps) - piece_value(Rank::Platoon));
        assert!((gap - expected).abs() < 1e-3, "{gap} vs {expected}");
    }

    #[test]
    fn test_terminal_scores() {
        let state = game_with(&[(Rank::Commander, Seat::South, 13, 6)]);
        // East and West never had a movable piece
        assert_eq!(state.result(), GameResult::Ongoing);
        let mut state = state;
        let mv = state.legal_moves()[0];
        state.commit(mv).unwrap();
        assert_eq!(state.result(), GameResult::Won(crate::topology::Team::NorthSouth));
        let memory = PieceMemory::new(Seat::East, state.board());
        assert_eq!(evaluate(&state, &memory, Seat::South, Persona::Balanced), WIN_VALUE);
        assert_eq!(evaluate(&state, &memory, Seat::East, Persona::Defensive), -WIN_VALUE);
    }

    #[test]
    fn test_estimated_value_uses_interval() {
        let mut estimate = RankEstimate {
            min_rank: 7,
            max_rank: 9,
            confirmed_mine: false,
            defeated_our_rank: 0,
            probe_count: 0,
            mine_possible: false,
            bomb_possible: false,
            flag_possible: false,
            has_moved: true,
            known: None,
        };
        assert_eq!(estimated_value(&estimate), piece_value(Rank::Corps));
        estimate.confirmed_mine = true;
        assert_eq!(estimated_value(&estimate), piece_value(Rank::Mine));
    }

    #[test]
    fn test_persona_parse() {
        for persona in Persona::ALL {
            assert_eq!(persona.name().parse::<Persona>(), Ok(persona));
        }
        assert!("reckless".parse::<Persona>().is_err());
    }
}
