//! Piece memory: what one seat has inferred about every piece it cannot see
//!
//! Records only ever narrow. The rank interval covers ordinary ranks
//! (Engineer..=Commander); the possibility set also tracks Flag, Bomb and
//! Mine. Any update that would empty the set is skipped rather than applied.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::game::MoveReport;
use crate::pieces::{Piece, PieceId, Rank, MAX_ORDINARY, MIN_ORDINARY};
use crate::topology::{CellKind, Seat};

// ============================================================================
// RANK SET
// ============================================================================

/// Bit set over the 12 ranks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSet(u16);

impl RankSet {
    pub const ALL: RankSet = RankSet((1 << 12) - 1);
    pub const EMPTY: RankSet = RankSet(0);

    pub fn single(rank: Rank) -> Self {
        Self(1 << rank.value())
    }

    pub fn contains(self, rank: Rank) -> bool {
        self.0 & (1 << rank.value()) != 0
    }

    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn without(self, rank: Rank) -> Self {
        Self(self.0 & !(1 << rank.value()))
    }

    pub fn with(self, rank: Rank) -> Self {
        Self(self.0 | (1 << rank.value()))
    }

    pub fn intersect(self, other: RankSet) -> Self {
        Self(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Rank> {
        Rank::ALL.into_iter().filter(move |&r| self.contains(r))
    }

    /// Ordinary ranks strictly above `rank`
    pub fn above(rank: u8) -> Self {
        Rank::ALL
            .into_iter()
            .filter(|r| r.is_ordinary() && r.value() > rank)
            .fold(Self::EMPTY, Self::with)
    }

    /// Lowest and highest ordinary rank in the set
    fn ordinary_span(self) -> Option<(u8, u8)> {
        let mut ordinary = self.iter().filter(|r| r.is_ordinary()).map(Rank::value);
        let lo = ordinary.next()?;
        let hi = ordinary.last().unwrap_or(lo);
        Some((lo, hi))
    }

    pub fn single_rank(self) -> Option<Rank> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Everything known about one hidden piece
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub owner: Seat,
    pub min_rank: u8,
    pub max_rank: u8,
    pub possible: RankSet,
    /// Heuristic only: a back-row piece that never moved and beat a
    /// non-engineer attacker. Mine stays a possibility, not a certainty.
    pub confirmed_mine: bool,
    pub in_back_rows: bool,
    pub has_moved: bool,
    pub probed_by_engineer: bool,
    pub probe_count: u32,
    /// Highest rank of the observer's own pieces this piece has beaten (0 = none)
    pub defeated_our_rank: u8,
}

impl MemoryRecord {
    fn new(owner: Seat) -> Self {
        Self {
            owner,
            min_rank: MIN_ORDINARY,
            max_rank: MAX_ORDINARY,
            possible: RankSet::ALL,
            confirmed_mine: false,
            in_back_rows: false,
            has_moved: false,
            probed_by_engineer: false,
            probe_count: 0,
            defeated_our_rank: 0,
        }
    }

    fn raise_min(&mut self, value: u8) {
        self.min_rank = self.min_rank.max(value.min(self.max_rank));
    }

    fn lower_max(&mut self, value: u8) {
        self.max_rank = self.max_rank.min(value.max(self.min_rank));
    }

    /// Intersect the possibility set, skipping contradictions, then pull the
    /// interval in to the set's ordinary span
    fn restrict(&mut self, allowed: RankSet) {
        let narrowed = self.possible.intersect(allowed);
        if narrowed.is_empty() {
            return;
        }
        self.possible = narrowed;
        if let Some((lo, hi)) = narrowed.ordinary_span() {
            self.raise_min(lo);
            self.lower_max(hi);
        }
    }

    fn exclude(&mut self, rank: Rank) {
        self.restrict(RankSet::ALL.without(rank));
    }

    /// Ordinary ranks outside [min, max] are gone from the set too
    fn sync_set(&mut self) {
        let allowed = Rank::ALL
            .into_iter()
            .filter(|r| !r.is_ordinary() || (self.min_rank..=self.max_rank).contains(&r.value()))
            .fold(RankSet::EMPTY, RankSet::with);
        self.restrict(allowed);
    }

    fn collapse(&mut self, rank: Rank) {
        self.restrict(RankSet::single(rank));
    }

    fn observe_moved(&mut self) {
        self.has_moved = true;
        self.confirmed_mine = false;
        self.exclude(Rank::Mine);
        self.exclude(Rank::Flag);
    }

    pub fn known_rank(&self) -> Option<Rank> {
        self.possible.single_rank()
    }
}

/// Summary handed to the evaluator
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankEstimate {
    pub min_rank: u8,
    pub max_rank: u8,
    pub confirmed_mine: bool,
    pub defeated_our_rank: u8,
    pub probe_count: u32,
    pub mine_possible: bool,
    pub bomb_possible: bool,
    pub flag_possible: bool,
    pub has_moved: bool,
    pub known: Option<Rank>,
}

impl RankEstimate {
    pub fn midpoint(&self) -> f32 {
        (self.min_rank as f32 + self.max_rank as f32) / 2.0
    }
}

// ============================================================================
// PIECE MEMORY
// ============================================================================

/// One seat's model of every piece it does not own
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PieceMemory {
    observer: Seat,
    records: FxHashMap<PieceId, MemoryRecord>,
}

impl PieceMemory {
    /// Fresh records from the starting board, using only public placement
    /// rules: mines start in the back two rows, flags in a headquarters,
    /// bombs off the front row
    pub fn new(observer: Seat, board: &Board) -> Self {
        let topo = board.topology();
        let mut records = FxHashMap::default();
        for (pos, piece) in board.pieces() {
            if piece.owner == observer {
                continue;
            }
            let mut record = MemoryRecord::new(piece.owner);
            record.in_back_rows = topo.in_back_rows(pos, piece.owner);
            if !record.in_back_rows {
                record.exclude(Rank::Mine);
            }
            if topo.classify(pos) != CellKind::Headquarters {
                record.exclude(Rank::Flag);
            }
            if matches!(topo.zone_local(pos), Some((seat, 0, _)) if seat == piece.owner) {
                record.exclude(Rank::Bomb);
            }
            if piece.revealed {
                record.collapse(piece.rank);
            }
            records.insert(piece.id, record);
        }
        Self { observer, records }
    }

    pub fn observer(&self) -> Seat {
        self.observer
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, id: PieceId) -> Option<&MemoryRecord> {
        self.records.get(&id)
    }

    /// The only query the evaluator uses
    pub fn estimate(&self, id: PieceId) -> Option<RankEstimate> {
        self.records.get(&id).map(|r| RankEstimate {
            min_rank: r.min_rank,
            max_rank: r.max_rank,
            confirmed_mine: r.confirmed_mine,
            defeated_our_rank: r.defeated_our_rank,
            probe_count: r.probe_count,
            mine_possible: r.possible.contains(Rank::Mine),
            bomb_possible: r.possible.contains(Rank::Bomb),
            flag_possible: r.possible.contains(Rank::Flag),
            has_moved: r.has_moved,
            known: r.known_rank(),
        })
    }

    /// Explicit reveal: the record collapses to the observed rank
    pub fn reveal(&mut self, id: PieceId, rank: Rank) {
        if let Some(record) = self.records.get_mut(&id) {
            record.collapse(rank);
            if rank.is_ordinary() {
                record.raise_min(rank.value());
                record.lower_max(rank.value());
            }
        }
    }

    /// Rank the observer can be sure of
    fn known_rank(&self, piece: &Piece) -> Option<Rank> {
        if piece.owner == self.observer || piece.revealed {
            return Some(piece.rank);
        }
        self.records.get(&piece.id).and_then(MemoryRecord::known_rank)
    }

    /// Fold one committed move into the records
    pub fn observe(&mut self, report: &MoveReport, board: &Board) {
        let topo = board.topology();

        // Rank knowledge from before this move's updates
        let battle_ranks = report.battle.map(|b| {
            (self.known_rank(&b.attacker), self.known_rank(&b.defender))
        });

        if let Some(record) = self.records.get_mut(&report.piece.id) {
            record.observe_moved();
            record.in_back_rows = topo.in_back_rows(report.to, record.owner);
            if report.engineer_path {
                record.collapse(Rank::Engineer);
            }
        }

        if let (Some(battle), Some((attacker_rank, defender_rank))) = (report.battle, battle_ranks) {
            let outcome = battle.outcome;

            if let Some(record) = self.records.get_mut(&battle.defender.id) {
                record.probe_count += 1;
                if attacker_rank == Some(Rank::Engineer) {
                    record.probed_by_engineer = true;
                }
            }

            if outcome.attacker_survives && !outcome.defender_survives && !outcome.is_flag_capture {
                self.winner_update(&battle.attacker, &battle.defender, defender_rank, true);
            }
            if outcome.defender_survives && !outcome.attacker_survives {
                self.winner_update(&battle.defender, &battle.attacker, attacker_rank, false);
            }

            if !outcome.attacker_survives {
                self.records.remove(&battle.attacker.id);
            }
            if !outcome.defender_survives {
                self.records.remove(&battle.defender.id);
            }
        }

        for &(id, rank) in &report.revealed {
            self.reveal(id, rank);
        }

        for &(seat, _) in &report.eliminated {
            self.records.retain(|_, r| r.owner != seat);
        }
    }

    /// Narrow the record of a battle winner against a loser of known or
    /// unknown rank
    fn winner_update(&mut self, winner: &Piece, loser: &Piece, loser_rank: Option<Rank>, attacking: bool) {
        let observer = self.observer;
        let Some(record) = self.records.get_mut(&winner.id) else {
            return;
        };

        // Bombs never survive, flags never win
        record.exclude(Rank::Bomb);
        record.exclude(Rank::Flag);

        // Beating a mine or bomb says nothing about strength
        if loser.owner == observer && loser.rank.is_ordinary() {
            record.defeated_our_rank = record.defeated_our_rank.max(loser.rank.value());
        }

        let Some(loser_rank) = loser_rank else {
            return;
        };

        if attacking {
            match loser_rank {
                Rank::Mine => record.collapse(Rank::Engineer),
                r if r.is_ordinary() => {
                    record.raise_min(r.value() + 1);
                    record.sync_set();
                }
                _ => {}
            }
            return;
        }

        // Defender held against a known attacker
        if !loser_rank.is_ordinary() {
            return;
        }
        let stronger = RankSet::above(loser_rank.value());
        let mine_candidate = loser_rank != Rank::Engineer
            && record.in_back_rows
            && !record.has_moved
            && record.possible.contains(Rank::Mine);
        if mine_candidate {
            record.confirmed_mine = true;
            record.restrict(stronger.with(Rank::Mine));
        } else {
            record.restrict(stronger);
        }
        record.raise_min(loser_rank.value() + 1);
        record.sync_set();
    }
}

// ============================================================================
// TESTS
// ============================================================================
