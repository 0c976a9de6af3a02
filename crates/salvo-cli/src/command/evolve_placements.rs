use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Utc;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use salvo_evolve::{
    EngineConfig, EvolutionEngine, PlacementBias, PlacementEvaluator, PlacementGenerator,
    PlacementGenome, PlacementOperators, PlacementSnapshot, SimulationConfig,
    evaluate_placements_parallel,
};

use crate::{
    model::{PlacementModel, PlacementRecord},
    util::Output,
};

const SNAPSHOT_INTERVAL: usize = 5;
const EXPORTED_PLACEMENTS: usize = 50;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvolvePlacementsArg {
    #[arg(long, default_value_t = 40)]
    population: usize,
    #[arg(long, default_value_t = 60)]
    generations: usize,
    #[arg(long, default_value_t = 0.8)]
    crossover_rate: f64,
    #[arg(long, default_value_t = 0.25)]
    mutation_rate: f64,
    #[arg(long, default_value_t = 3)]
    tournament: usize,
    #[arg(long, default_value_t = 2)]
    elite: usize,
    /// Stop early once the best fitness reaches this value
    #[arg(long, default_value_t = 95.0)]
    target_fitness: f64,
    /// Seed for a reproducible run (otherwise seeded from the OS)
    #[arg(long)]
    seed: Option<u64>,
    /// Save a resumable snapshot here every few generations
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Resume from the snapshot file instead of starting fresh
    #[arg(long)]
    resume: bool,
    /// Worker threads for evaluating the initial population
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Output file path for the exported model (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvolvePlacementsArg) -> anyhow::Result<()> {
    let mut rng = match arg.seed {
        Some(seed) => Pcg64Mcg::seed_from_u64(seed),
        None => Pcg64Mcg::from_os_rng(),
    };
    let mut eval_rng = Pcg64Mcg::seed_from_u64(rng.random());

    let config = EngineConfig {
        population_size: arg.population,
        crossover_rate: arg.crossover_rate,
        mutation_rate: arg.mutation_rate,
        tournament_size: arg.tournament,
        elite_count: arg.elite,
    };
    let mut engine = EvolutionEngine::new(config, PlacementOperators::default())
        .context("invalid engine configuration")?;
    let evaluator = PlacementEvaluator::new(SimulationConfig::default());
    let mut fitness_fn =
        |genome: &mut PlacementGenome| evaluator.evaluate(genome, &mut eval_rng);

    if arg.resume {
        let path = arg
            .snapshot
            .as_ref()
            .context("--resume requires --snapshot")?;
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
        let snapshot = PlacementSnapshot::read_from(&mut BufReader::new(file))
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        engine
            .resume_from(usize::try_from(snapshot.generation)?, snapshot.population)
            .context("snapshot population does not match the configured size")?;
        eprintln!("Resumed from generation {}", engine.generation());
    } else if arg.workers > 1 {
        let generator = PlacementGenerator::default();
        let mut population = generator.generate_population(arg.population, &mut rng);
        if population.len() < arg.population {
            eprintln!(
                "Unique-layout generation came up short ({} of {}); filling the rest unbiased",
                population.len(),
                arg.population
            );
            while population.len() < arg.population {
                population.push(generator.generate(PlacementBias::Unbiased, &mut rng));
            }
        }
        evaluate_placements_parallel(&mut population, &evaluator, arg.workers, &mut rng)?;
        engine.resume_from(0, population)?;
    } else {
        engine.initialize_population(&mut fitness_fn, &mut rng)?;
    }

    eprintln!(
        "Generation {}: best = {:.3}, average = {:.3}",
        engine.generation(),
        engine.best_fitness()?,
        engine.average_fitness()?
    );

    for generation in engine.generation() + 1..=arg.generations {
        let best_fitness = engine
            .evolve_one_generation(&mut fitness_fn, &mut rng)?
            .fitness();
        eprintln!(
            "Generation {generation}: best = {best_fitness:.3}, average = {:.3}, regenerated = {}",
            engine.average_fitness()?,
            engine.regenerated_count()
        );

        if let Some(path) = &arg.snapshot {
            if generation % SNAPSHOT_INTERVAL == 0 {
                save_snapshot(&engine, arg.mutation_rate, path)?;
            }
        }
        if best_fitness >= arg.target_fitness {
            eprintln!("Target fitness {} reached at generation {generation}", arg.target_fitness);
            break;
        }
    }

    if let Some(path) = &arg.snapshot {
        save_snapshot(&engine, arg.mutation_rate, path)?;
    }

    let top = engine.top_n(EXPORTED_PLACEMENTS)?;
    let model = PlacementModel {
        name: "placements".to_owned(),
        trained_at: Utc::now(),
        best_fitness: top[0].fitness(),
        placements: top.iter().map(placement_record).collect(),
    };
    Output::save_json(&model, arg.output.clone())?;

    eprintln!();
    eprintln!("Placement evolution completed");
    if let Some(path) = &arg.output {
        eprintln!("  Model: {}", path.display());
    }
    eprintln!("  Best fitness: {:.3}", model.best_fitness);
    eprintln!("  Exported layouts: {}", model.placements.len());
    eprintln!("  Regenerated individuals: {}", engine.regenerated_count());

    Ok(())
}

fn placement_record(genome: &PlacementGenome) -> PlacementRecord {
    let means = genome.opponent_means();
    PlacementRecord {
        genes: genome.genes().to_vec(),
        fitness: genome.fitness(),
        mean_shots: genome.mean_shots(),
        std_dev_shots: genome.std_dev_shots(),
        mean_shots_random: means.random,
        mean_shots_parity: means.parity,
        mean_shots_monte_carlo: means.monte_carlo,
    }
}

fn save_snapshot(
    engine: &EvolutionEngine<PlacementGenome, PlacementOperators>,
    mutation_rate: f64,
    path: &Path,
) -> anyhow::Result<()> {
    let snapshot = PlacementSnapshot {
        generation: u32::try_from(engine.generation()).context("generation out of range")?,
        mutation_rate,
        population: engine.population().to_vec(),
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create snapshot file: {}", path.display()))?;
    snapshot
        .write_to(&mut BufWriter::new(file))
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
    Ok(())
}
