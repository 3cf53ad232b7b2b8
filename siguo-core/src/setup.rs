//! Deployment - where each seat places its roster before play

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Board;
use crate::pieces::{Piece, PieceId, Rank, Roster};
use crate::topology::{CellKind, Seat, Topology};

/// A deployment that breaks the placement rules
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("roster mismatch for {rank}: expected {expected}, found {found}")]
    RosterMismatch { rank: Rank, expected: u8, found: u8 },
    #[error("flag must stand in a headquarters")]
    FlagNotInHeadquarters,
    #[error("mine at ({depth},{lateral}) is outside the back two rows")]
    MineOutsideBackRows { depth: i8, lateral: i8 },
    #[error("bomb at lateral {lateral} stands on the front row")]
    BombOnFrontRow { lateral: i8 },
    #[error("({depth},{lateral}) is a campsite")]
    OnCampsite { depth: i8, lateral: i8 },
    #[error("({depth},{lateral}) is outside the zone")]
    OutOfZone { depth: i8, lateral: i8 },
    #[error("({depth},{lateral}) is used twice")]
    DuplicatePosition { depth: i8, lateral: i8 },
}

/// One piece in zone-local coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub rank: Rank,
    /// 0 = front row
    pub depth: i8,
    pub lateral: i8,
}

impl Placement {
    pub const fn new(rank: Rank, depth: i8, lateral: i8) -> Self {
        Self { rank, depth, lateral }
    }
}

/// Seat-independent layout; every seat's zone is addressed the same way
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    pub placements: Vec<Placement>,
}

impl Deployment {
    /// Fixed layout used when no other deployment is given
    pub fn standard() -> Self {
        use Rank::*;
        let rows: [[Option<Rank>; 5]; 6] = [
            [Some(Brigade), Some(Platoon), Some(Engineer), Some(Company), Some(Platoon)],
            [Some(Regiment), None, Some(Commander), None, Some(Division)],
            [Some(Engineer), Some(Corps), None, Some(Battalion), Some(Company)],
            [Some(Division), None, Some(Bomb), None, Some(Brigade)],
            [Some(Mine), Some(Engineer), Some(Bomb), Some(Battalion), Some(Regiment)],
            [Some(Mine), Some(Flag), Some(Mine), Some(Platoon), Some(Company)],
        ];

        let placements = rows
            .iter()
            .enumerate()
            .flat_map(|(d, row)| {
                row.iter()
                    .enumerate()
                    .filter_map(move |(l, rank)| rank.map(|r| Placement::new(r, d as i8, l as i8)))
            })
            .collect();

        Self {
            name: "standard".to_string(),
            placements,
        }
    }

    /// Random layout that satisfies the placement rules
    pub fn random<R: Rng>(rng: &mut R, topology: &Topology, roster: &Roster) -> Self {
        let depth = topology.zone_depth();
        let width = topology.zone_width();
        let reference = Seat::South;

        let mut free: Vec<(i8, i8)> = (0..depth)
            .flat_map(|d| (0..width).map(move |l| (d, l)))
            .filter(|&(d, l)| {
                topology.classify(topology.to_global(reference, d, l)) != CellKind::Campsite
            })
            .collect();
        free.shuffle(rng);

        let mut placements = Vec::with_capacity(roster.total());
        let mut take = |free: &mut Vec<(i8, i8)>, rank: Rank, accept: &dyn Fn(i8, i8) -> bool| {
            if let Some(i) = free.iter().position(|&(d, l)| accept(d, l)) {
                let (d, l) = free.swap_remove(i);
                placements.push(Placement::new(rank, d, l));
            }
        };

        // Most constrained ranks first
        let hq = |d: i8, l: i8| {
            topology.classify(topology.to_global(reference, d, l)) == CellKind::Headquarters
        };
        for _ in 0..roster.count(Rank::Flag) {
            take(&mut free, Rank::Flag, &hq);
        }
        for _ in 0..roster.count(Rank::Mine) {
            take(&mut free, Rank::Mine, &|d, _| d >= depth - 2);
        }
        for _ in 0..roster.count(Rank::Bomb) {
            take(&mut free, Rank::Bomb, &|d, _| d > 0);
        }
        for &(rank, count) in &roster.counts {
            if matches!(rank, Rank::Flag | Rank::Mine | Rank::Bomb) {
                continue;
            }
            for _ in 0..count {
                take(&mut free, rank, &|_, _| true);
            }
        }

        Self {
            name: "random".to_string(),
            placements,
        }
    }

    /// Check the placement rules against a roster
    pub fn validate(&self, topology: &Topology, roster: &Roster) -> Result<(), SetupError> {
        let depth = topology.zone_depth();
        let width = topology.zone_width();
        let reference = Seat::South;
        let mut used = vec![false; (depth * width) as usize];

        for p in &self.placements {
            if !(0..depth).contains(&p.depth) || !(0..width).contains(&p.lateral) {
                return Err(SetupError::OutOfZone { depth: p.depth, lateral: p.lateral });
            }
            let slot = (p.depth * width + p.lateral) as usize;
            if used[slot] {
                return Err(SetupError::DuplicatePosition { depth: p.depth, lateral: p.lateral });
            }
            used[slot] = true;

            let kind = topology.classify(topology.to_global(reference, p.depth, p.lateral));
            if kind == CellKind::Campsite {
                return Err(SetupError::OnCampsite { depth: p.depth, lateral: p.lateral });
            }
            match p.rank {
                Rank::Flag if kind != CellKind::Headquarters => {
                    return Err(SetupError::FlagNotInHeadquarters)
                }
                Rank::Mine if p.depth < depth - 2 => {
                    return Err(SetupError::MineOutsideBackRows { depth: p.depth, lateral: p.lateral })
                }
                Rank::Bomb if p.depth == 0 => {
                    return Err(SetupError::BombOnFrontRow { lateral: p.lateral })
                }
                _ => {}
            }
        }

        for rank in Rank::ALL {
            let expected = roster.count(rank);
            let found = self.placements.iter().filter(|p| p.rank == rank).count() as u8;
            if expected != found {
                return Err(SetupError::RosterMismatch { rank, expected, found });
            }
        }
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let deployment: Deployment = serde_json::from_str(&content)?;
        Ok(deployment)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::standard()
    }
}

/// Validate four deployments and lay them out on a fresh board. Piece ids
/// are assigned seat by seat in placement order.
pub fn build_board(
    topology: std::sync::Arc<Topology>,
    deployments: &[Deployment; 4],
    roster: &Roster,
) -> Result<Board, SetupError> {
    let mut board = Board::empty(topology);
    let mut next_id = 0u16;

    for seat in Seat::ALL {
        let deployment = &deployments[seat.index()];
        deployment.validate(board.topology(), roster)?;
        for p in &deployment.placements {
            let pos = board.topology().to_global(seat, p.depth, p.lateral);
            board.place(pos, Piece::new(PieceId(next_id), p.rank, seat));
            next_id += 1;
        }
    }
    Ok(board)
}
