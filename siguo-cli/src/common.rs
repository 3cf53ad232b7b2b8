//! Shared helpers for the commands
//!
//! Level 4 - Utilities

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use siguo_core::{Deployment, GameState, Position, Roster, Strategy, Topology};

/// Search strategy as a command-line value
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Greedy,
    Minimax,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Greedy => Strategy::Greedy,
            StrategyArg::Minimax => Strategy::Minimax,
        }
    }
}

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Load and validate a deployment file
pub fn load_deployment(path: &Path) -> Result<Deployment> {
    let deployment = Deployment::load(path)
        .with_context(|| format!("Failed to load deployment: {}", path.display()))?;
    deployment
        .validate(&Topology::standard(), &Roster::standard())
        .with_context(|| format!("Invalid deployment: {}", path.display()))?;
    Ok(deployment)
}

/// Starting position: a deployment file for every seat, random layouts, or
/// the standard layout
pub fn initial_state(
    deployment: Option<&Path>,
    random: bool,
    rng: &mut ChaCha8Rng,
) -> Result<GameState> {
    let topology = Topology::standard();
    let roster = Roster::standard();
    let deployments: [Deployment; 4] = match deployment {
        Some(path) => {
            let d = load_deployment(path)?;
            std::array::from_fn(|_| d.clone())
        }
        None if random => std::array::from_fn(|_| Deployment::random(rng, &topology, &roster)),
        None => std::array::from_fn(|_| Deployment::standard()),
    };
    GameState::from_deployments(topology, &deployments, &roster).context("Failed to set up board")
}

/// Parse "row,col"
pub fn parse_position(s: &str) -> Result<Position, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{s}'"))?;
    let row: i8 = row.trim().parse().map_err(|e| format!("bad row '{row}': {e}"))?;
    let col: i8 = col.trim().parse().map_err(|e| format!("bad column '{col}': {e}"))?;
    Ok(Position::new(row, col))
}
