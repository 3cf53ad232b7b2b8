//! Series command - many self-play games with team statistics
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), record(), print results
//! - Level 4: formatting utilities

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use siguo_arena::{
    count_eliminations, AiConfig, FlagPlacementStats, GameObserver, JsonLinesRecorder,
    SeriesConfig, SeriesResult,
};
use siguo_core::{Elimination, Persona, Seat, Team};

use crate::common::StrategyArg;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SeriesArgs {
    /// Series configuration JSON; overrides the team options
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of games
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Strategy for the North-South team
    #[arg(long, value_enum, default_value = "minimax")]
    pub ns: StrategyArg,

    /// Strategy for the East-West team
    #[arg(long, value_enum, default_value = "greedy")]
    pub ew: StrategyArg,

    /// Persona for the North-South team
    #[arg(long, default_value = "balanced")]
    pub ns_persona: Persona,

    /// Persona for the East-West team
    #[arg(long, default_value = "balanced")]
    pub ew_persona: Persona,

    /// Minimax depth in plies
    #[arg(long, default_value = "2")]
    pub depth: u32,

    /// Plies before a game is drawn
    #[arg(long, default_value = "400")]
    pub max_plies: u32,

    /// Random legal deployments, seeded per game
    #[arg(long)]
    pub random_deployment: bool,

    /// Play games one after another
    #[arg(long)]
    pub sequential: bool,

    /// Write every finished game as one JSON line to this file
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run series command
pub fn run(args: SeriesArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed)?;

    tracing::info!(
        "Starting series: {} games (max plies={}, parallel={}, random deployment={})",
        config.games,
        config.max_plies,
        config.parallel,
        config.random_deployment
    );

    let result = siguo_arena::play_series(&config);

    let mut flags = FlagPlacementStats::default();
    for outcome in &result.outcomes {
        flags.game_finished(&outcome.finished);
    }
    if let Some(path) = &args.record {
        record(&result, path)?;
    }

    if args.json {
        print_json_results(&result)?;
    } else {
        print_text_results(&result, &flags);
    }

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn team_config(strategy: StrategyArg, persona: Persona, depth: u32) -> AiConfig {
    let base = match strategy {
        StrategyArg::Greedy => AiConfig::greedy(),
        StrategyArg::Minimax => AiConfig::minimax(depth),
    };
    base.with_persona(persona)
}

fn build_config(args: &SeriesArgs, seed: Option<u64>) -> Result<SeriesConfig> {
    let mut config = match &args.config {
        Some(path) => SeriesConfig::load(path)
            .with_context(|| format!("Failed to load series config: {}", path.display()))?,
        None => {
            let ns = team_config(args.ns, args.ns_persona, args.depth);
            let ew = team_config(args.ew, args.ew_persona, args.depth);
            let mut config = SeriesConfig::teams(args.games, ns, ew).with_max_plies(args.max_plies);
            config.random_deployment = args.random_deployment;
            config
        }
    };

    if args.sequential {
        config.parallel = false;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

fn record(result: &SeriesResult, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create record file: {}", path.display()))?;
    let mut recorder = JsonLinesRecorder::new(BufWriter::new(file));
    for outcome in &result.outcomes {
        recorder.game_finished(&outcome.finished);
    }
    anyhow::ensure!(
        recorder.failed() == 0,
        "{} of {} games could not be recorded",
        recorder.failed(),
        result.games_played()
    );
    tracing::info!("Recorded {} games to {}", recorder.written(), path.display());
    Ok(())
}

fn print_json_results(result: &SeriesResult) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonResult {
        games: u32,
        north_south_wins: u32,
        east_west_wins: u32,
        draws: u32,
        north_south_win_rate: f32,
        east_west_win_rate: f32,
        avg_plies: f32,
        flag_captures: usize,
        immobilized: usize,
    }

    let json = JsonResult {
        games: result.games_played(),
        north_south_wins: result.north_south_wins,
        east_west_wins: result.east_west_wins,
        draws: result.draws,
        north_south_win_rate: result.win_rate(Team::NorthSouth),
        east_west_win_rate: result.win_rate(Team::EastWest),
        avg_plies: result.avg_plies,
        flag_captures: total_eliminations(result, Elimination::FlagCaptured),
        immobilized: total_eliminations(result, Elimination::Immobilized),
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_text_results(result: &SeriesResult, flags: &FlagPlacementStats) {
    println!("\n=== Series Results ===");
    println!("Games played: {}", result.games_played());
    println!(
        "North-South: {} wins ({})",
        result.north_south_wins,
        percent(result.win_rate(Team::NorthSouth))
    );
    println!(
        "East-West:   {} wins ({})",
        result.east_west_wins,
        percent(result.win_rate(Team::EastWest))
    );
    println!("Draws:       {}", result.draws);
    println!("Avg plies:   {:.1}", result.avg_plies);
    println!(
        "Eliminations: {} by flag capture, {} immobilized",
        total_eliminations(result, Elimination::FlagCaptured),
        total_eliminations(result, Elimination::Immobilized)
    );

    println!("\nFlag placements:");
    let topo = siguo_core::Topology::standard();
    for seat in Seat::ALL {
        let [left, right] = topo.headquarters(seat);
        println!(
            "  {seat}: {} left, {} right",
            flags.count(seat, left),
            flags.count(seat, right)
        );
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn total_eliminations(result: &SeriesResult, reason: Elimination) -> usize {
    result
        .outcomes
        .iter()
        .map(|o| count_eliminations(o, reason))
        .sum()
}

fn percent(rate: f32) -> String {
    format!("{:.1}%", rate * 100.0)
}
