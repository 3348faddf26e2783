pub mod capture;
pub mod compare;
pub mod decide;
pub mod history;
pub mod init;
pub mod revert;

use anyhow::Result;
use vrt_core::DecisionAction;
use vrt_engine::Engine;

use crate::cli::{Cli, Commands};
use crate::context::Context;

pub async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Init => init::handle(&cli),
        Commands::Capture { name, image } => capture::handle(&open(&cli)?, name, image).await,
        Commands::Compare { reset, all } => compare::handle(&open(&cli)?, *reset, *all).await,
        Commands::Approve { names } => {
            decide::handle(&open(&cli)?, names, DecisionAction::Accept).await
        }
        Commands::Reject { names } => {
            decide::handle(&open(&cli)?, names, DecisionAction::Reject).await
        }
        Commands::History => history::handle(&open(&cli)?).await,
        Commands::Revert { short_sha } => revert::handle(&open(&cli)?, short_sha).await,
    }
}

/// Engine for every command that works on an existing project
fn open(cli: &Cli) -> Result<Engine> {
    Context::load(cli)?.engine()
}
