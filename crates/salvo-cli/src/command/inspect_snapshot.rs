use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context;
use salvo_evolve::{PlacementSnapshot, WeightSnapshot};
use salvo_shooter::Feature;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum SnapshotKind {
    #[default]
    Placement,
    Weight,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectSnapshotArg {
    /// Snapshot file to inspect
    path: PathBuf,
    #[arg(long, default_value = "placement")]
    kind: SnapshotKind,
}

pub(crate) fn run(arg: &InspectSnapshotArg) -> anyhow::Result<()> {
    let file = File::open(&arg.path)
        .with_context(|| format!("Failed to open snapshot: {}", arg.path.display()))?;
    let mut reader = BufReader::new(file);

    match arg.kind {
        SnapshotKind::Placement => {
            let snapshot = PlacementSnapshot::read_from(&mut reader)
                .with_context(|| format!("Failed to read snapshot: {}", arg.path.display()))?;
            println!("Placement snapshot: {}", arg.path.display());
            println!("  Generation: {}", snapshot.generation);
            println!("  Mutation rate: {}", snapshot.mutation_rate);
            println!("  Population: {}", snapshot.population.len());
            for (i, genome) in snapshot.population.iter().take(5).enumerate() {
                let means = genome.opponent_means();
                println!(
                    "  {i:2}: fitness = {:8.3}, shots vs random/parity/mc = {:.1}/{:.1}/{:.1}",
                    genome.fitness(),
                    means.random,
                    means.parity,
                    means.monte_carlo
                );
            }
        }
        SnapshotKind::Weight => {
            let snapshot = WeightSnapshot::read_from(&mut reader)
                .with_context(|| format!("Failed to read snapshot: {}", arg.path.display()))?;
            println!("Weight snapshot: {}", arg.path.display());
            println!("  Generation: {}", snapshot.generation);
            println!("  Mutation rate: {}", snapshot.mutation_rate);
            println!("  Population: {}", snapshot.population.len());
            if let Some(best) = snapshot.population.first() {
                println!("  Best fitness: {:.3}", best.fitness());
                for (feature, weight) in Feature::ALL.iter().zip(best.weights()) {
                    println!("    {:>20}: {weight:8.4}", feature.name());
                }
            }
        }
    }

    Ok(())
}
