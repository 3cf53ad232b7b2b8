//! Series play - many self-play games between seat configurations
//!
//! Level 2 - Phase-level implementation

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use siguo_core::{Deployment, GameState, Roster, Team, Topology};

use crate::config::SeriesConfig;
use crate::game_runner::{GameOutcome, GameRunner};

/// Result of a series
#[derive(Clone, Debug)]
pub struct SeriesResult {
    /// Wins for the North-South team
    pub north_south_wins: u32,
    /// Wins for the East-West team
    pub east_west_wins: u32,
    /// Draws (ply limit reached or both teams out together)
    pub draws: u32,
    /// Average game length in plies
    pub avg_plies: f32,
    /// Individual game outcomes, in game order
    pub outcomes: Vec<GameOutcome>,
}

impl SeriesResult {
    pub fn games_played(&self) -> u32 {
        self.outcomes.len() as u32
    }

    /// Wins = 1.0, Draws = 0.5, Losses = 0.0
    pub fn score_for(&self, team: Team) -> f32 {
        let wins = match team {
            Team::NorthSouth => self.north_south_wins,
            Team::EastWest => self.east_west_wins,
        };
        wins as f32 + 0.5 * self.draws as f32
    }

    pub fn win_rate(&self, team: Team) -> f32 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            let wins = match team {
                Team::NorthSouth => self.north_south_wins,
                Team::EastWest => self.east_west_wins,
            };
            wins as f32 / self.outcomes.len() as f32
        }
    }
}

/// Play a whole series (Level 2 phase)
pub fn play_series(config: &SeriesConfig) -> SeriesResult {
    let runner = GameRunner::new(config.seats.clone());
    let play = |index: usize| {
        let initial = initial_state(config, index);
        runner.play_game(initial, config.max_plies)
    };

    let outcomes: Vec<GameOutcome> = if config.parallel {
        (0..config.games).into_par_iter().map(play).collect()
    } else {
        (0..config.games).map(play).collect()
    };

    aggregate(outcomes)
}

/// Starting position of game `index`
pub fn initial_state(config: &SeriesConfig, index: usize) -> GameState {
    if !config.random_deployment {
        return GameState::standard();
    }
    let topology = Topology::standard();
    let roster = Roster::standard();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(index as u64));
    let deployments: [Deployment; 4] =
        std::array::from_fn(|_| Deployment::random(&mut rng, &topology, &roster));
    match GameState::from_deployments(topology, &deployments, &roster) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("random deployment rejected ({e}), using the standard layout");
            GameState::standard()
        }
    }
}

fn aggregate(outcomes: Vec<GameOutcome>) -> SeriesResult {
    let mut result = SeriesResult {
        north_south_wins: 0,
        east_west_wins: 0,
        draws: 0,
        avg_plies: 0.0,
        outcomes: Vec::new(),
    };
    for outcome in &outcomes {
        match outcome.winner() {
            Some(Team::NorthSouth) => result.north_south_wins += 1,
            Some(Team::EastWest) => result.east_west_wins += 1,
            None => result.draws += 1,
        }
    }
    if !outcomes.is_empty() {
        let total: u32 = outcomes.iter().map(|o| o.plies).sum();
        result.avg_plies = total as f32 / outcomes.len() as f32;
    }
    result.outcomes = outcomes;
    result
}
