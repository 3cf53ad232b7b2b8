//! Piece ranks, identities and rosters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::topology::Seat;

/// Piece rank. The integer value orders ordinary ranks (1..=9); Flag, Bomb
/// and Mine are combat exceptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Flag = 0,
    Engineer = 1,
    Platoon = 2,
    Company = 3,
    Battalion = 4,
    Regiment = 5,
    Brigade = 6,
    Division = 7,
    Corps = 8,
    Commander = 9,
    Bomb = 10,
    Mine = 11,
}

/// Static description of a rank
#[derive(Clone, Debug)]
pub struct RankInfo {
    pub rank: Rank,
    pub name: &'static str,
    pub symbol: char,
    pub mobile: bool,
}

impl RankInfo {
    const fn new(rank: Rank, name: &'static str, symbol: char, mobile: bool) -> Self {
        Self { rank, name, symbol, mobile }
    }
}

/// All 12 ranks, indexed by rank value
pub static RANKS: [RankInfo; 12] = [
    RankInfo::new(Rank::Flag, "Flag", 'F', false),
    RankInfo::new(Rank::Engineer, "Engineer", 'E', true),
    RankInfo::new(Rank::Platoon, "Platoon", '2', true),
    RankInfo::new(Rank::Company, "Company", '3', true),
    RankInfo::new(Rank::Battalion, "Battalion", '4', true),
    RankInfo::new(Rank::Regiment, "Regiment", '5', true),
    RankInfo::new(Rank::Brigade, "Brigade", '6', true),
    RankInfo::new(Rank::Division, "Division", '7', true),
    RankInfo::new(Rank::Corps, "Corps", '8', true),
    RankInfo::new(Rank::Commander, "Commander", 'C', true),
    RankInfo::new(Rank::Bomb, "Bomb", 'B', true),
    RankInfo::new(Rank::Mine, "Mine", 'M', false),
];

/// Lowest rank that can move and fight normally
pub const MIN_ORDINARY: u8 = Rank::Engineer as u8;

/// Highest ordinary rank
pub const MAX_ORDINARY: u8 = Rank::Commander as u8;

impl Rank {
    pub const ALL: [Rank; 12] = [
        Rank::Flag,
        Rank::Engineer,
        Rank::Platoon,
        Rank::Company,
        Rank::Battalion,
        Rank::Regiment,
        Rank::Brigade,
        Rank::Division,
        Rank::Corps,
        Rank::Commander,
        Rank::Bomb,
        Rank::Mine,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Rank> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn info(self) -> &'static RankInfo {
        &RANKS[self as usize]
    }

    /// Engineer through Commander
    pub fn is_ordinary(self) -> bool {
        (MIN_ORDINARY..=MAX_ORDINARY).contains(&self.value())
    }

    /// Flag and Mine never move
    pub fn is_mobile(self) -> bool {
        self.info().mobile
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Stable identity of a piece for the whole game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u16);

/// A piece on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub rank: Rank,
    pub owner: Seat,
    /// Set once the true rank has been shown; never cleared
    pub revealed: bool,
}

impl Piece {
    pub fn new(id: PieceId, rank: Rank, owner: Seat) -> Self {
        Self { id, rank, owner, revealed: false }
    }

    pub fn reveal(&mut self) {
        self.revealed = true;
    }

    pub fn is_ally_of(&self, other: &Piece) -> bool {
        self.owner.is_teammate(other.owner)
    }
}

/// Number of pieces of each rank one seat deploys
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub counts: Vec<(Rank, u8)>,
}

impl Roster {
    /// 25 pieces per seat
    pub fn standard() -> Self {
        Self {
            counts: vec![
                (Rank::Commander, 1),
                (Rank::Corps, 1),
                (Rank::Division, 2),
                (Rank::Brigade, 2),
                (Rank::Regiment, 2),
                (Rank::Battalion, 2),
                (Rank::Company, 3),
                (Rank::Platoon, 3),
                (Rank::Engineer, 3),
                (Rank::Mine, 3),
                (Rank::Bomb, 2),
                (Rank::Flag, 1),
            ],
        }
    }

    pub fn count(&self, rank: Rank) -> u8 {
        self.counts
            .iter()
            .filter(|(r, _)| *r == rank)
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| *n as usize).sum()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_table_order() {
        for (i, info) in RANKS.iter().enumerate() {
            assert_eq!(info.rank.value() as usize, i);
        }
        assert_eq!(Rank::from_value(9), Some(Rank::Commander));
        assert_eq!(Rank::from_value(12), None);
    }

    #[test]
    fn test_mobility() {
        assert!(!Rank::Flag.is_mobile());
        assert!(!Rank::Mine.is_mobile());
        assert!(Rank::Bomb.is_mobile());
        assert!(Rank::Engineer.is_mobile());
    }

    #[test]
    fn test_ordinary() {
        assert!(Rank::Engineer.is_ordinary());
        assert!(Rank::Commander.is_ordinary());
        assert!(!Rank::Bomb.is_ordinary());
        assert!(!Rank::Flag.is_ordinary());
    }

    #[test]
    fn test_standard_roster() {
        let roster = Roster::standard();
        assert_eq!(roster.total(), 25);
        assert_eq!(roster.count(Rank::Flag), 1);
        assert_eq!(roster.count(Rank::Mine), 3);
    }
}
