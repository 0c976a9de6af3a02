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
    EngineConfig, EvolutionEngine, PlacementGenerator, PlacementPool, PlacementSnapshot,
    SigmaSchedule, WeightEvaluator, WeightGenome, WeightOperators, WeightSnapshot,
};
use salvo_shooter::Feature;

use crate::{model::WeightModel, util::Output};

const SNAPSHOT_INTERVAL: usize = 5;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvolveWeightsArg {
    /// Placement snapshot supplying the pool's elite bucket
    #[arg(long)]
    placements: PathBuf,
    #[arg(long, default_value_t = 30)]
    population: usize,
    #[arg(long, default_value_t = 100)]
    generations: usize,
    #[arg(long, default_value_t = 0.8)]
    crossover_rate: f64,
    #[arg(long, default_value_t = 0.3)]
    mutation_rate: f64,
    #[arg(long, default_value_t = 3)]
    tournament: usize,
    #[arg(long, default_value_t = 2)]
    elite: usize,
    /// Gaussian mutation sigma at generation zero
    #[arg(long, default_value_t = 0.5)]
    sigma_initial: f64,
    /// Sigma floor reached at the annealing horizon
    #[arg(long, default_value_t = 0.05)]
    sigma_floor: f64,
    #[arg(long, default_value_t = 100)]
    sigma_horizon: usize,
    /// Symmetric clamp for every weight
    #[arg(long, default_value_t = 5.0)]
    weight_bound: f64,
    /// Pool games per fitness evaluation
    #[arg(long, default_value_t = 30)]
    trials: u32,
    #[arg(long, default_value_t = 50)]
    pool_elite: usize,
    #[arg(long, default_value_t = 50)]
    pool_random: usize,
    #[arg(long, default_value_t = 0.7)]
    elite_probability: f64,
    /// Stop early once the best fitness reaches this value
    #[arg(long, default_value_t = -30.0)]
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
    /// Output file path for the exported model (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvolveWeightsArg) -> anyhow::Result<()> {
    let mut rng = match arg.seed {
        Some(seed) => Pcg64Mcg::seed_from_u64(seed),
        None => Pcg64Mcg::from_os_rng(),
    };
    let mut eval_rng = Pcg64Mcg::seed_from_u64(rng.random());

    let pool = build_pool(arg, &mut rng)?;
    let evaluator = WeightEvaluator {
        trials: arg.trials,
        shot_cap: 200,
    };

    let sigma = SigmaSchedule::new(arg.sigma_initial, arg.sigma_floor, arg.sigma_horizon)
        .context("invalid sigma schedule")?;
    let operators =
        WeightOperators::new(sigma, arg.weight_bound).context("invalid weight bound")?;
    let config = EngineConfig {
        population_size: arg.population,
        crossover_rate: arg.crossover_rate,
        mutation_rate: arg.mutation_rate,
        tournament_size: arg.tournament,
        elite_count: arg.elite,
    };
    let mut engine =
        EvolutionEngine::new(config, operators).context("invalid engine configuration")?;
    let mut fitness_fn =
        |genome: &mut WeightGenome| evaluator.evaluate(genome, &pool, &mut eval_rng);

    if arg.resume {
        let path = arg
            .snapshot
            .as_ref()
            .context("--resume requires --snapshot")?;
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
        let snapshot = WeightSnapshot::read_from(&mut BufReader::new(file))
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        engine
            .resume_from(usize::try_from(snapshot.generation)?, snapshot.population)
            .context("snapshot population does not match the configured size")?;
        eprintln!("Resumed from generation {}", engine.generation());
    } else {
        engine.initialize_population(&mut fitness_fn, &mut rng)?;
    }

    eprintln!(
        "Generation {}: best = {:.3}, average = {:.3}, sigma = {:.3}",
        engine.generation(),
        engine.best_fitness()?,
        engine.average_fitness()?,
        sigma.sigma_at(engine.generation())
    );

    for generation in engine.generation() + 1..=arg.generations {
        let best_fitness = engine
            .evolve_one_generation(&mut fitness_fn, &mut rng)?
            .fitness();
        eprintln!(
            "Generation {generation}: best = {best_fitness:.3}, average = {:.3}, sigma = {:.3}",
            engine.average_fitness()?,
            sigma.sigma_at(generation)
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

    let best = &engine.top_n(1)?[0];
    let model = WeightModel {
        name: "heat-map-weights".to_owned(),
        trained_at: Utc::now(),
        final_fitness: best.fitness(),
        mean_shots: best.mean_shots(),
        std_dev_shots: best.std_dev_shots(),
        feature_weights: Feature::ALL
            .iter()
            .zip(best.weights())
            .map(|(feature, weight)| (feature.name().to_owned(), *weight))
            .collect(),
    };
    Output::save_json(&model, arg.output.clone())?;

    eprintln!();
    eprintln!("Weight evolution completed");
    if let Some(path) = &arg.output {
        eprintln!("  Model: {}", path.display());
    }
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    eprintln!("  Mean shots to victory: {:.2}", model.mean_shots);
    eprintln!("  Weights: {} features", model.feature_weights.len());

    Ok(())
}

/// Loads the elite bucket from a placement snapshot and fills the random
/// bucket with freshly generated layouts.
fn build_pool(arg: &EvolveWeightsArg, rng: &mut Pcg64Mcg) -> anyhow::Result<PlacementPool> {
    let file = File::open(&arg.placements).with_context(|| {
        format!(
            "Failed to open placement snapshot: {}",
            arg.placements.display()
        )
    })?;
    let snapshot = PlacementSnapshot::read_from(&mut BufReader::new(file)).with_context(|| {
        format!(
            "Failed to read placement snapshot: {}",
            arg.placements.display()
        )
    })?;

    let mut elites = snapshot.population;
    anyhow::ensure!(
        !elites.is_empty(),
        "placement snapshot holds no layouts for the elite bucket"
    );
    elites.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
    let elite_size = arg.pool_elite.min(elites.len());
    if elite_size < arg.pool_elite {
        eprintln!(
            "Snapshot holds only {elite_size} layouts; shrinking the elite bucket from {}",
            arg.pool_elite
        );
    }
    elites.truncate(elite_size);

    let mut pool = PlacementPool::new(elite_size, arg.pool_random, arg.elite_probability)
        .context("invalid pool configuration")?;
    pool.set_elite(elites).context("elite bucket rejected")?;

    let generator = PlacementGenerator::default();
    let mut random_bucket = generator.generate_population(arg.pool_random, rng);
    while random_bucket.len() < arg.pool_random {
        random_bucket.push(generator.generate(salvo_evolve::PlacementBias::Unbiased, rng));
    }
    pool.set_random(random_bucket).context("random bucket rejected")?;

    Ok(pool)
}

fn save_snapshot(
    engine: &EvolutionEngine<WeightGenome, WeightOperators>,
    mutation_rate: f64,
    path: &Path,
) -> anyhow::Result<()> {
    let snapshot = WeightSnapshot {
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
