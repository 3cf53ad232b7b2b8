//! Play command - one self-play game between two team configurations
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_runner(), play(), report()
//! - Level 4: formatting utilities

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use siguo_arena::{AiConfig, GameObserver, GameOutcome, GameRunner, JsonLinesRecorder};
use siguo_core::{GameState, Persona};

use crate::common::{create_rng, initial_state, StrategyArg};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
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

    /// Time limit per decision in milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Plies before the game is drawn
    #[arg(long, default_value = "400")]
    pub max_plies: u32,

    /// Deployment JSON used by every seat
    #[arg(long, value_name = "FILE")]
    pub deployment: Option<PathBuf>,

    /// Random legal deployments
    #[arg(long, conflicts_with = "deployment")]
    pub random_deployment: bool,

    /// Append the finished game as one JSON line to this file
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Print the final board
    #[arg(long)]
    pub show: bool,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let mut rng = create_rng(seed);
    let initial = initial_state(args.deployment.as_deref(), args.random_deployment, &mut rng)?;
    let runner = build_runner(&args);

    tracing::info!(
        "Starting game: NS {:?}/{} vs EW {:?}/{} (depth={}, max plies={})",
        args.ns,
        args.ns_persona.name(),
        args.ew,
        args.ew_persona.name(),
        args.depth,
        args.max_plies
    );

    let outcome = play(&runner, initial, &args)?;
    report(&outcome, &args);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn team_config(strategy: StrategyArg, persona: Persona, args: &PlayArgs) -> AiConfig {
    let base = match strategy {
        StrategyArg::Greedy => AiConfig::greedy(),
        StrategyArg::Minimax => AiConfig::minimax(args.depth),
    };
    let config = base.with_persona(persona);
    match args.time_limit_ms {
        Some(ms) => config.with_time_limit(ms),
        None => config,
    }
}

fn build_runner(args: &PlayArgs) -> GameRunner {
    let ns = team_config(args.ns, args.ns_persona, args);
    let ew = team_config(args.ew, args.ew_persona, args);
    GameRunner::new([ns.clone(), ew.clone(), ns, ew])
}

fn play(runner: &GameRunner, initial: GameState, args: &PlayArgs) -> Result<GameOutcome> {
    let outcome = runner.play_game(initial, args.max_plies);

    if let Some(path) = &args.record {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open record file: {}", path.display()))?;
        let mut recorder = JsonLinesRecorder::new(BufWriter::new(file));
        recorder.game_finished(&outcome.finished);
        anyhow::ensure!(recorder.failed() == 0, "Failed to record game to {}", path.display());
    }

    Ok(outcome)
}

fn report(outcome: &GameOutcome, args: &PlayArgs) {
    if args.json {
        match serde_json::to_string_pretty(&outcome.finished) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("could not serialize result: {e}"),
        }
        return;
    }

    println!("\n=== Game Result ===");
    match outcome.winner() {
        Some(team) => println!("Winner: {team:?}"),
        None => println!("Draw"),
    }
    println!("Plies: {}", outcome.plies);
    for (seat, reason, ply) in &outcome.finished.eliminations {
        println!("  {seat} eliminated at ply {ply} ({reason:?})");
    }

    if args.show {
        println!();
        print!("{}", render_final(outcome));
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Final board as rows of "seat+symbol" cells
fn render_final(outcome: &GameOutcome) -> String {
    let topo = siguo_core::Topology::standard();
    let mut grid = vec![vec!["   ".to_string(); topo.size() as usize]; topo.size() as usize];
    for pos in topo.positions() {
        grid[pos.row as usize][pos.col as usize] = ".. ".to_string();
    }
    for piece in &outcome.finished.final_board {
        let p = piece.position;
        grid[p.row as usize][p.col as usize] =
            format!("{}{} ", piece.owner.index(), piece.rank.info().symbol);
    }
    grid.into_iter()
        .map(|row| row.concat().trim_end().to_string() + "\n")
        .collect()
}
