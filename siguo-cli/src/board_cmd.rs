//! Board command - show a starting board or export its deployment

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use siguo_core::{Deployment, Roster, Topology};

use crate::common::{create_rng, initial_state, load_deployment};

#[derive(Args)]
pub struct BoardArgs {
    /// Deployment JSON used by every seat
    #[arg(long, value_name = "FILE")]
    pub deployment: Option<PathBuf>,

    /// Random legal deployment
    #[arg(long, conflicts_with = "deployment")]
    pub random: bool,

    /// Write the deployment to this file instead of printing the board
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

/// Run board command
pub fn run(args: BoardArgs, seed: Option<u64>) -> Result<()> {
    let mut rng = create_rng(seed);

    if let Some(out) = &args.save {
        let deployment = match &args.deployment {
            Some(path) => load_deployment(path)?,
            None if args.random => {
                Deployment::random(&mut rng, &Topology::standard(), &Roster::standard())
            }
            None => Deployment::standard(),
        };
        deployment
            .save(out)
            .with_context(|| format!("Failed to save deployment: {}", out.display()))?;
        tracing::info!(
            "Saved deployment '{}' ({} pieces) to {}",
            deployment.name,
            deployment.placements.len(),
            out.display()
        );
        return Ok(());
    }

    let state = initial_state(args.deployment.as_deref(), args.random, &mut rng)?;
    print!("{state}");
    Ok(())
}
