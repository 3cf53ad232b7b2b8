//! Configuration types for self-play
//!
//! Level 4 - Utilities and configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use siguo_core::{Persona, SearchConfig, Strategy};

/// AI configuration for one seat
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Greedy one-ply or minimax
    pub strategy: Strategy,
    /// Playing style
    pub persona: Persona,
    /// Minimax depth in plies
    pub depth: u32,
    /// Minimax depth while the own flag is threatened
    pub threatened_depth: u32,
    /// Moves searched per inner search node
    pub max_candidates: usize,
    /// Optional time limit per decision in milliseconds
    pub time_limit_ms: Option<u64>,
    /// Weight of the external move bonus
    pub bonus_weight: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        let search = SearchConfig::default();
        Self {
            strategy: search.strategy,
            persona: Persona::Balanced,
            depth: search.depth,
            threatened_depth: search.threatened_depth,
            max_candidates: search.max_candidates,
            time_limit_ms: None,
            bonus_weight: 0.0,
        }
    }
}

impl AiConfig {
    /// Create config for greedy one-ply play
    pub fn greedy() -> Self {
        Self {
            strategy: Strategy::Greedy,
            ..Default::default()
        }
    }

    /// Create config for minimax at given depth
    pub fn minimax(depth: u32) -> Self {
        Self {
            strategy: Strategy::Minimax,
            depth,
            threatened_depth: depth.max(3),
            ..Default::default()
        }
    }

    /// Set playing style
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Set per-decision time limit
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Limit moves searched per node
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Search settings handed to the core
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            strategy: self.strategy,
            depth: self.depth,
            threatened_depth: self.threatened_depth,
            max_candidates: self.max_candidates,
            bonus_weight: self.bonus_weight,
            time_budget: self.time_limit_ms.map(std::time::Duration::from_millis),
            ..SearchConfig::default()
        }
    }
}

/// Series of self-play games
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Number of games to play
    pub games: usize,
    /// AI for each seat, in seat order
    pub seats: [AiConfig; 4],
    /// Plies before a game is declared drawn
    pub max_plies: u32,
    /// Whether to run games in parallel
    pub parallel: bool,
    /// Random legal deployments instead of the standard layout
    pub random_deployment: bool,
    /// Base seed; game `i` uses `seed + i`
    pub seed: u64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            games: 10,
            seats: std::array::from_fn(|_| AiConfig::default()),
            max_plies: 400,
            parallel: true,
            random_deployment: false,
            seed: 42,
        }
    }
}

impl SeriesConfig {
    /// Same AI on every seat
    pub fn uniform(games: usize, ai: AiConfig) -> Self {
        Self {
            games,
            seats: std::array::from_fn(|_| ai.clone()),
            ..Default::default()
        }
    }

    /// One AI for the North-South team, another for East-West
    pub fn teams(games: usize, north_south: AiConfig, east_west: AiConfig) -> Self {
        Self {
            games,
            seats: [north_south.clone(), east_west.clone(), north_south, east_west],
            ..Default::default()
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set ply limit
    pub fn with_max_plies(mut self, max_plies: u32) -> Self {
        self.max_plies = max_plies;
        self
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.strategy, Strategy::Minimax);
        assert_eq!(config.depth, 2);
        assert_eq!(config.threatened_depth, 3);
        assert_eq!(config.persona, Persona::Balanced);
    }

    #[test]
    fn test_ai_config_builders() {
        let config = AiConfig::greedy()
            .with_persona(Persona::Defensive)
            .with_time_limit(250);
        assert_eq!(config.strategy, Strategy::Greedy);
        assert_eq!(config.persona, Persona::Defensive);

        let search = config.search_config();
        assert_eq!(search.strategy, Strategy::Greedy);
        assert_eq!(search.time_budget, Some(std::time::Duration::from_millis(250)));
        assert!(search.pruning);
    }

    #[test]
    fn test_series_config_defaults() {
        let config = SeriesConfig::default();
        assert_eq!(config.max_plies, 400);
        assert!(config.parallel);
        assert_eq!(config.seats.len(), 4);
    }

    #[test]
    fn test_series_config_teams() {
        let config = SeriesConfig::teams(4, AiConfig::greedy(), AiConfig::minimax(2));
        assert_eq!(config.seats[0], config.seats[2]);
        assert_eq!(config.seats[1].strategy, Strategy::Minimax);
        assert_eq!(config.seats[3].strategy, Strategy::Minimax);
    }

    #[test]
    fn test_series_config_json() {
        let config = SeriesConfig::uniform(3, AiConfig::greedy()).with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        let back: SeriesConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
