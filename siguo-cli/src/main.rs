//! Siguo CLI - Command-line interface
//!
//! Commands:
//! - play: Play a single self-play game
//! - series: Play many games and report team results
//! - moves: List legal destinations of one piece
//! - board: Show or export a deployment

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod board_cmd;
mod common;
mod moves_cmd;
mod play_cmd;
mod series_cmd;

#[derive(Parser)]
#[command(name = "siguo")]
#[command(about = "Four-player Junqi rules engine and AI")]
struct Cli {
    /// Random seed for deployments
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(play_cmd::PlayArgs),
    /// Play a series of games
    Series(series_cmd::SeriesArgs),
    /// List legal moves of a piece
    Moves(moves_cmd::MovesArgs),
    /// Show or export a deployment
    Board(board_cmd::BoardArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Series(args) => series_cmd::run(args, cli.seed),
        Commands::Moves(args) => moves_cmd::run(args),
        Commands::Board(args) => board_cmd::run(args, cli.seed),
    }
}
