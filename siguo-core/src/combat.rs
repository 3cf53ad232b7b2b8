//! Combat resolution
//!
//! `resolve` is pure: the game commit and the search simulation call the
//! same function and must see identical outcomes.

use serde::{Deserialize, Serialize};

use crate::pieces::Rank;

/// Result of one engagement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub attacker_survives: bool,
    pub defender_survives: bool,
    pub is_flag_capture: bool,
    /// A Commander died on either side
    pub is_commander_death: bool,
}

impl CombatOutcome {
    fn new(attacker: Rank, defender: Rank, attacker_survives: bool, defender_survives: bool) -> Self {
        let is_commander_death = (attacker == Rank::Commander && !attacker_survives)
            || (defender == Rank::Commander && !defender_survives);
        Self {
            attacker_survives,
            defender_survives,
            is_flag_capture: defender == Rank::Flag,
            is_commander_death,
        }
    }

    pub fn mutual_destruction(&self) -> bool {
        !self.attacker_survives && !self.defender_survives
    }
}

/// Resolve an attack of `attacker` onto `defender`
pub fn resolve(attacker: Rank, defender: Rank) -> CombatOutcome {
    // A flag always falls to whatever reaches it
    if defender == Rank::Flag {
        return CombatOutcome::new(attacker, defender, true, false);
    }
    if attacker == Rank::Flag {
        return CombatOutcome::new(attacker, defender, false, true);
    }

    if attacker == Rank::Bomb || defender == Rank::Bomb {
        return CombatOutcome::new(attacker, defender, false, false);
    }

    // Mines only yield to engineers. Mines never attack; the mirrored case
    // keeps the function total and symmetric.
    if defender == Rank::Mine {
        let engineer = attacker == Rank::Engineer;
        return CombatOutcome::new(attacker, defender, engineer, !engineer);
    }
    if attacker == Rank::Mine {
        let engineer = defender == Rank::Engineer;
        return CombatOutcome::new(attacker, defender, !engineer, engineer);
    }

    match attacker.value().cmp(&defender.value()) {
        std::cmp::Ordering::Greater => CombatOutcome::new(attacker, defender, true, false),
        std::cmp::Ordering::Less => CombatOutcome::new(attacker, defender, false, true),
        std::cmp::Ordering::Equal => CombatOutcome::new(attacker, defender, false, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engineer_clears_mine() {
        let out = resolve(Rank::Engineer, Rank::Mine);
        assert!(out.attacker_survives);
        assert!(!out.defender_survives);
        assert!(!out.is_commander_death);
    }

    #[test]
    fn test_mine_stops_others() {
        let out = resolve(Rank::Commander, Rank::Mine);
        assert!(!out.attacker_survives);
        assert!(out.defender_survives);
        assert!(out.is_commander_death);
    }

    #[test]
    fn test_commander_trade() {
        let out = resolve(Rank::Commander, Rank::Commander);
        assert!(out.mutual_destruction());
        assert!(out.is_commander_death);
    }

    #[test]
    fn test_bomb_takes_both() {
        for other in [Rank::Engineer, Rank::Commander, Rank::Mine, Rank::Bomb] {
            assert!(resolve(Rank::Bomb, other).mutual_destruction());
            assert!(resolve(other, Rank::Bomb).mutual_destruction());
        }
        assert!(resolve(Rank::Bomb, Rank::Commander).is_commander_death);
    }

    #[test]
    fn test_flag_capture() {
        let out = resolve(Rank::Engineer, Rank::Flag);
        assert!(out.attacker_survives);
        assert!(!out.defender_survives);
        assert!(out.is_flag_capture);
    }

    #[test]
    fn test_higher_rank_wins() {
        let out = resolve(Rank::Corps, Rank::Brigade);
        assert!(out.attacker_survives && !out.defender_survives);
        let out = resolve(Rank::Platoon, Rank::Brigade);
        assert!(!out.attacker_survives && out.defender_survives);
    }

    #[test]
    fn test_role_swap_is_consistent() {
        for &a in &Rank::ALL {
            for &b in &Rank::ALL {
                if a == Rank::Flag && b == Rank::Flag {
                    continue;
                }
                let forward = resolve(a, b);
                let backward = resolve(b, a);
                let a_beats_b = forward.attacker_survives && !forward.defender_survives;
                let b_beats_a = backward.attacker_survives && !backward.defender_survives;
                assert!(!(a_beats_b && b_beats_a), "{a:?} and {b:?} both win as attacker");
                if a == b && a.is_ordinary() {
                    assert!(forward.mutual_destruction());
                }
            }
        }
    }
}
