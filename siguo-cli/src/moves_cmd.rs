//! Moves command - legal destinations of one piece on a starting board

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use siguo_core::{possible_moves, Position};

use crate::common::{create_rng, initial_state, parse_position};

#[derive(Args)]
pub struct MovesArgs {
    /// Piece position as ROW,COL
    #[arg(long, value_parser = parse_position)]
    pub from: Position,

    /// Deployment JSON used by every seat
    #[arg(long, value_name = "FILE")]
    pub deployment: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run moves command
pub fn run(args: MovesArgs) -> Result<()> {
    let state = initial_state(args.deployment.as_deref(), false, &mut create_rng(Some(0)))?;
    let board = state.board();

    if !board.topology().contains(args.from) {
        bail!("{} is not on the board", args.from);
    }
    let Some(piece) = board.get(args.from) else {
        bail!("no piece at {}", args.from);
    };

    let mut targets = possible_moves(board, args.from);
    targets.sort_by_key(|p| (p.row, p.col));

    if args.json {
        #[derive(serde::Serialize)]
        struct JsonMoves {
            from: Position,
            rank: String,
            owner: String,
            targets: Vec<Position>,
        }
        let json = JsonMoves {
            from: args.from,
            rank: piece.rank.to_string(),
            owner: piece.owner.to_string(),
            targets,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{} {} at {}: {} moves", piece.owner, piece.rank, args.from, targets.len());
    for target in &targets {
        let note = match board.get(*target) {
            Some(defender) => format!(" (attacks {} {})", defender.owner, defender.rank),
            None => String::new(),
        };
        println!("  -> {target}{note}");
    }
    Ok(())
}
