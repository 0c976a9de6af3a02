//! Simulation-driven fitness evaluation.
//!
//! Placement genomes are decoded to fleets and defended against the fixed
//! opponent panel; weight genomes are decoded to the heat-map shooter and
//! attack fleets drawn from a [`PlacementPool`]. Both evaluators write their
//! statistics back onto the genome and return the scalar fitness.
//!
//! Evaluation is deliberately strict about failure: an unpopulated pool or
//! a simulation that cannot complete propagates an [`EvalError`] which
//! aborts the evolution run, while a structurally invalid placement is not
//! an error at all: it gets the sentinel fitness and moves on.

use std::thread;

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use salvo_engine::InvalidFleetError;
use salvo_shooter::{Shooter, play_game};
use salvo_stats::descriptive::DescriptiveStats;

use crate::{
    chromosome::{OpponentMeans, PlacementGenome, WeightGenome},
    fitness,
    pool::{PlacementPool, PoolError},
};

/// Why a fitness evaluation could not produce a score.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvalError {
    #[display("placement pool cannot serve fleets: {_0}")]
    Pool(PoolError),
    #[display("simulation rejected a fleet: {_0}")]
    Simulation(InvalidFleetError),
    #[display("no simulated game finished within the shot cap")]
    NoCompletedGames,
}

/// Game counts and caps for placement evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub random_games: u32,
    pub parity_games: u32,
    pub monte_carlo_games: u32,
    pub monte_carlo_iterations: u32,
    pub shot_cap: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            random_games: 15,
            parity_games: 15,
            monte_carlo_games: 10,
            monte_carlo_iterations: 1000,
            shot_cap: 100,
        }
    }
}

/// Scores placement genomes by survivability against the opponent panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementEvaluator {
    config: SimulationConfig,
}

impl PlacementEvaluator {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Runs the configured games and writes mean/stddev and per-opponent
    /// means back onto the genome. An invalid genome short-circuits to the
    /// sentinel fitness without simulating.
    pub fn evaluate<R>(&self, genome: &mut PlacementGenome, rng: &mut R) -> Result<f64, EvalError>
    where
        R: Rng + ?Sized,
    {
        let fleet = match genome.decode() {
            Some(fleet) if fleet.is_valid() => fleet,
            _ => {
                genome.set_fitness(fitness::INVALID_PLACEMENT_FITNESS);
                return Ok(fitness::INVALID_PLACEMENT_FITNESS);
            }
        };

        let mut all_shots = Vec::new();
        let means = OpponentMeans {
            random: self.run_games(
                &fleet,
                Shooter::random(),
                self.config.random_games,
                &mut all_shots,
                rng,
            )?,
            parity: self.run_games(
                &fleet,
                Shooter::parity(),
                self.config.parity_games,
                &mut all_shots,
                rng,
            )?,
            monte_carlo: self.run_games(
                &fleet,
                Shooter::monte_carlo(self.config.monte_carlo_iterations),
                self.config.monte_carlo_games,
                &mut all_shots,
                rng,
            )?,
        };

        let stats =
            DescriptiveStats::new(all_shots.iter().copied()).ok_or(EvalError::NoCompletedGames)?;
        genome.set_mean_shots(stats.mean);
        genome.set_std_dev_shots(stats.std_dev);
        genome.set_opponent_means(means);

        let score = fitness::placement_fitness(means);
        genome.set_fitness(score);
        Ok(score)
    }

    fn run_games<R>(
        &self,
        fleet: &salvo_engine::Fleet,
        mut shooter: Shooter,
        games: u32,
        all_shots: &mut Vec<f64>,
        rng: &mut R,
    ) -> Result<f64, EvalError>
    where
        R: Rng + ?Sized,
    {
        if games == 0 {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for _ in 0..games {
            let outcome = play_game(fleet, &mut shooter, self.config.shot_cap, rng)?;
            let shots = f64::from(outcome.shots);
            total += shots;
            all_shots.push(shots);
        }
        Ok(total / f64::from(games))
    }
}

/// Scores weight genomes by attacking fleets sampled from the pool.
#[derive(Debug, Clone, Copy)]
pub struct WeightEvaluator {
    pub trials: u32,
    pub shot_cap: u32,
}

impl Default for WeightEvaluator {
    fn default() -> Self {
        Self {
            trials: 30,
            shot_cap: 200,
        }
    }
}

impl WeightEvaluator {
    /// Plays `trials` games against pool-sampled fleets and writes the
    /// mean/stddev back. Games that hit the shot cap are discarded; if none
    /// completes, the evaluation fails.
    ///
    /// The pool is an explicit collaborator of the call, not state of the
    /// evaluator, so the same evaluator can serve several runs.
    pub fn evaluate<R>(
        &self,
        genome: &mut WeightGenome,
        pool: &PlacementPool,
        rng: &mut R,
    ) -> Result<f64, EvalError>
    where
        R: Rng + ?Sized,
    {
        let heat = pool.elite_heat_map()?;

        let mut shots = Vec::new();
        for _ in 0..self.trials {
            let placement = pool.sample(rng)?;
            let Some(fleet) = placement.decode() else {
                continue;
            };
            if !fleet.is_valid() {
                continue;
            }

            let mut shooter = Shooter::weighted(*genome.weights(), heat);
            let outcome = play_game(&fleet, &mut shooter, self.shot_cap, rng)?;
            if outcome.fleet_sunk {
                shots.push(f64::from(outcome.shots));
            }
        }

        let stats = DescriptiveStats::new(shots).ok_or(EvalError::NoCompletedGames)?;
        genome.set_mean_shots(stats.mean);
        genome.set_std_dev_shots(stats.std_dev);

        let score = fitness::weight_fitness(stats.mean, stats.std_dev);
        genome.set_fitness(score);
        Ok(score)
    }
}

/// Evaluates a placement population on a fixed pool of worker threads.
///
/// The population is partitioned into disjoint chunks; each worker owns its
/// chunk exclusively and drives its own RNG, seeded deterministically from
/// the master RNG before the threads start. The scope join is the only
/// synchronization point.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn evaluate_placements_parallel<R>(
    genomes: &mut [PlacementGenome],
    evaluator: &PlacementEvaluator,
    workers: usize,
    rng: &mut R,
) -> Result<(), EvalError>
where
    R: Rng + ?Sized,
{
    if genomes.is_empty() {
        return Ok(());
    }
    let workers = workers.clamp(1, genomes.len());
    let chunk_size = genomes.len().div_ceil(workers);
    let seeds: Vec<u64> = genomes.chunks(chunk_size).map(|_| rng.random()).collect();

    let results: Vec<Result<(), EvalError>> = thread::scope(|scope| {
        let handles: Vec<_> = genomes
            .chunks_mut(chunk_size)
            .zip(seeds)
            .map(|(chunk, seed)| {
                scope.spawn(move || -> Result<(), EvalError> {
                    let mut worker_rng = Pcg64Mcg::seed_from_u64(seed);
                    for genome in chunk {
                        evaluator.evaluate(genome, &mut worker_rng)?;
                    }
                    Ok(())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("evaluation worker panicked"))
            .collect()
    });

    for result in results {
        result?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{PlacementBias, PlacementGenerator};
    use rand::SeedableRng as _;

    fn fast_config() -> SimulationConfig {
        SimulationConfig {
            random_games: 2,
            parity_games: 2,
            monte_carlo_games: 1,
            monte_carlo_iterations: 20,
            shot_cap: 100,
        }
    }

    #[test]
    fn invalid_placement_gets_the_sentinel() {
        let evaluator = PlacementEvaluator::new(fast_config());
        let mut genome = PlacementGenome::new([4; 30]);
        assert!(!genome.is_valid());

        let mut rng = Pcg64Mcg::seed_from_u64(31);
        let score = evaluator.evaluate(&mut genome, &mut rng).unwrap();
        assert_eq!(score, fitness::INVALID_PLACEMENT_FITNESS);
        assert_eq!(genome.fitness(), fitness::INVALID_PLACEMENT_FITNESS);
    }

    #[test]
    fn valid_placement_gets_simulated_statistics() {
        let evaluator = PlacementEvaluator::new(fast_config());
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(32);
        let mut genome = generator.generate(PlacementBias::Unbiased, &mut rng);

        let score = evaluator.evaluate(&mut genome, &mut rng).unwrap();
        assert_eq!(score, genome.fitness());
        assert!(genome.mean_shots() > 0.0);
        let means = genome.opponent_means();
        assert!(means.random > 0.0 && means.parity > 0.0 && means.monte_carlo > 0.0);
        // A 20-cell fleet needs at least 20 shots to sink.
        assert!(means.random >= 20.0);
    }

    #[test]
    fn parallel_evaluation_scores_every_genome() {
        let evaluator = PlacementEvaluator::new(fast_config());
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(33);
        let mut genomes = generator.generate_population(6, &mut rng);

        evaluate_placements_parallel(&mut genomes, &evaluator, 3, &mut rng).unwrap();
        for genome in &genomes {
            assert!(genome.mean_shots() > 0.0, "genome left unevaluated");
        }
    }
}
