use clap::{Parser, Subcommand};

use self::{
    evolve_placements::EvolvePlacementsArg, evolve_weights::EvolveWeightsArg,
    inspect_snapshot::InspectSnapshotArg,
};

mod evolve_placements;
mod evolve_weights;
mod inspect_snapshot;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve fleet placements against the opponent shooter panel
    EvolvePlacements(#[clap(flatten)] EvolvePlacementsArg),
    /// Evolve heat-map shooter weights against a placement pool
    EvolveWeights(#[clap(flatten)] EvolveWeightsArg),
    /// Print the header and best genomes of a saved snapshot
    InspectSnapshot(#[clap(flatten)] InspectSnapshotArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::EvolvePlacements(arg) => evolve_placements::run(&arg)?,
        Mode::EvolveWeights(arg) => evolve_weights::run(&arg)?,
        Mode::InspectSnapshot(arg) => inspect_snapshot::run(&arg)?,
    }
    Ok(())
}
