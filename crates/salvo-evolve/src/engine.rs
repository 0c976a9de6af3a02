//! The generic generational evolution engine.
//!
//! One engine type serves both genome kinds; everything genome-specific
//! (initialization, crossover, mutation, validity restoration) comes in
//! through the [`VariationOperators`] seam. The engine owns the population
//! exclusively, keeps it sorted descending by fitness after every completed
//! generation, and guarantees the population size is exact at every
//! generation boundary.
//!
//! # Generational cycle
//!
//! 1. Clone the top `elite_count` genomes unchanged into the next
//!    population.
//! 2. Until the population size is reached: pick two parents by tournament
//!    selection (drawn with replacement), cross them over with probability
//!    `crossover_rate` (otherwise clone parent one), mutate with probability
//!    `mutation_rate`, restore validity, evaluate.
//! 3. Sort descending by fitness and advance the generation counter.
//!
//! Invalid offspring are never rejected or dropped; they are repaired or
//! regenerated by the operators, and every regeneration is counted on the
//! engine's observable `regenerated_count` metric. Fitness-evaluation
//! errors are not retried or suppressed: the first failure aborts the run
//! and propagates to the caller.

use rand::Rng;

use crate::{chromosome::Chromosome, evaluator::EvalError};

/// Engine parameters, validated at construction.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub population_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub elite_count: usize,
}

/// Rejected engine or operator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be positive")]
    NonPositivePopulation,
    #[display("crossover rate must be within [0, 1]")]
    CrossoverRateOutOfRange,
    #[display("mutation rate must be within [0, 1]")]
    MutationRateOutOfRange,
    #[display("tournament size must be within [1, population size]")]
    TournamentSizeOutOfRange,
    #[display("elite count must be within [0, population size]")]
    EliteCountOutOfRange,
    #[display("sigma schedule requires 0 <= floor <= initial")]
    SigmaScheduleInvalid,
    #[display("weight bound must be positive and finite")]
    WeightBoundInvalid,
}

/// Precondition violations on population queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PopulationError {
    #[display("operation requires a non-empty population")]
    Empty,
    #[display("expected a population of size {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Anything that can stop an evolution run.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvolveError {
    #[display("{_0}")]
    Population(PopulationError),
    #[display("fitness evaluation failed: {_0}")]
    Eval(EvalError),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::NonPositivePopulation);
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(ConfigError::CrossoverRateOutOfRange);
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRateOutOfRange);
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(ConfigError::TournamentSizeOutOfRange);
        }
        if self.elite_count > self.population_size {
            return Err(ConfigError::EliteCountOutOfRange);
        }
        Ok(())
    }
}

/// The genome-specific half of the engine.
pub trait VariationOperators<C: Chromosome> {
    /// Creates one new individual for population initialization.
    fn spawn<R>(&self, rng: &mut R) -> C
    where
        R: Rng + ?Sized;

    /// Creates a starting population. The default just repeats [`spawn`];
    /// implementations may override it (for example to deduplicate) and may
    /// return fewer individuals than requested; the engine tops the
    /// difference up with plain `spawn` calls.
    ///
    /// [`spawn`]: VariationOperators::spawn
    fn spawn_population<R>(&self, count: usize, rng: &mut R) -> Vec<C>
    where
        R: Rng + ?Sized,
    {
        (0..count).map(|_| self.spawn(rng)).collect()
    }

    fn crossover<R>(&self, a: &C, b: &C, rng: &mut R) -> C
    where
        R: Rng + ?Sized;

    /// Mutates in place. `generation` is the index of the generation the
    /// genome will join (drives annealing schedules).
    fn mutate<R>(&self, genome: &mut C, generation: usize, rng: &mut R)
    where
        R: Rng + ?Sized;

    /// Restores structural validity after crossover/mutation. Returns true
    /// when the genome had to be regenerated from scratch. The default is a
    /// no-op for genome kinds with no structural constraints.
    fn ensure_valid<R>(&self, _genome: &mut C, _rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        false
    }
}

/// Generational evolutionary search over one genome kind.
#[derive(Debug)]
pub struct EvolutionEngine<C, O> {
    config: EngineConfig,
    operators: O,
    population: Vec<C>,
    generation: usize,
    regenerated: u64,
}

impl<C, O> EvolutionEngine<C, O>
where
    C: Chromosome,
    O: VariationOperators<C>,
{
    /// Builds an engine, failing fast on inconsistent parameters.
    pub fn new(config: EngineConfig, operators: O) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            operators,
            population: Vec::new(),
            generation: 0,
            regenerated: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &[C] {
        &self.population
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// How many individuals had to be regenerated from scratch because
    /// repair could not fix them.
    #[must_use]
    pub fn regenerated_count(&self) -> u64 {
        self.regenerated
    }

    /// Spawns, validates, and evaluates a fresh generation-zero population.
    ///
    /// The fitness function must write the genome's fitness as a side
    /// effect; the engine sorts on it afterwards.
    pub fn initialize_population<F, R>(
        &mut self,
        fitness_fn: &mut F,
        rng: &mut R,
    ) -> Result<(), EvolveError>
    where
        F: FnMut(&mut C) -> Result<f64, EvalError>,
        R: Rng + ?Sized,
    {
        let mut population = self
            .operators
            .spawn_population(self.config.population_size, rng);
        // Operator batch generation may come up short (uniqueness budget);
        // the size invariant wins over uniqueness.
        while population.len() < self.config.population_size {
            population.push(self.operators.spawn(rng));
        }

        for genome in &mut population {
            if self.operators.ensure_valid(genome, rng) {
                self.regenerated += 1;
            }
            fitness_fn(genome)?;
        }

        sort_descending(&mut population);
        self.population = population;
        self.generation = 0;
        Ok(())
    }

    /// Replaces the engine state with a previously persisted population,
    /// e.g. from a snapshot.
    pub fn resume_from(
        &mut self,
        generation: usize,
        mut population: Vec<C>,
    ) -> Result<(), PopulationError> {
        if population.len() != self.config.population_size {
            return Err(PopulationError::SizeMismatch {
                expected: self.config.population_size,
                actual: population.len(),
            });
        }
        sort_descending(&mut population);
        self.population = population;
        self.generation = generation;
        Ok(())
    }

    /// Runs one full generation and returns the new best genome.
    pub fn evolve_one_generation<F, R>(
        &mut self,
        fitness_fn: &mut F,
        rng: &mut R,
    ) -> Result<&C, EvolveError>
    where
        F: FnMut(&mut C) -> Result<f64, EvalError>,
        R: Rng + ?Sized,
    {
        if self.population.is_empty() {
            return Err(PopulationError::Empty.into());
        }

        let next_generation = self.generation + 1;
        let mut next = Vec::with_capacity(self.config.population_size);
        next.extend(self.population[..self.config.elite_count].iter().cloned());

        while next.len() < self.config.population_size {
            let parent1 = tournament_select(&self.population, self.config.tournament_size, rng)?;
            let parent2 = tournament_select(&self.population, self.config.tournament_size, rng)?;

            let mut offspring = if rng.random_bool(self.config.crossover_rate) {
                self.operators.crossover(parent1, parent2, rng)
            } else {
                parent1.clone()
            };
            if rng.random_bool(self.config.mutation_rate) {
                self.operators.mutate(&mut offspring, next_generation, rng);
            }
            if self.operators.ensure_valid(&mut offspring, rng) {
                self.regenerated += 1;
            }
            fitness_fn(&mut offspring)?;
            next.push(offspring);
        }

        sort_descending(&mut next);
        self.population = next;
        self.generation = next_generation;
        Ok(&self.population[0])
    }

    /// The full run: initialize, evolve until the cap or until the best
    /// fitness reaches `target_fitness` (checked once per completed
    /// generation), and return the best genome seen across the whole run,
    /// which may come from an earlier generation than the last.
    pub fn evolve<F, R>(
        &mut self,
        max_generations: usize,
        target_fitness: f64,
        fitness_fn: &mut F,
        rng: &mut R,
    ) -> Result<C, EvolveError>
    where
        F: FnMut(&mut C) -> Result<f64, EvalError>,
        R: Rng + ?Sized,
    {
        self.initialize_population(fitness_fn, rng)?;
        let mut best = self
            .population
            .first()
            .cloned()
            .ok_or(PopulationError::Empty)?;

        for _ in 0..max_generations {
            if best.fitness() >= target_fitness {
                break;
            }
            let current = self.evolve_one_generation(fitness_fn, rng)?;
            if current.fitness() > best.fitness() {
                best = current.clone();
            }
        }
        Ok(best)
    }

    pub fn best_fitness(&self) -> Result<f64, PopulationError> {
        self.population
            .first()
            .map(Chromosome::fitness)
            .ok_or(PopulationError::Empty)
    }

    pub fn average_fitness(&self) -> Result<f64, PopulationError> {
        if self.population.is_empty() {
            return Err(PopulationError::Empty);
        }
        let sum: f64 = self.population.iter().map(Chromosome::fitness).sum();
        #[expect(clippy::cast_precision_loss)]
        let average = sum / self.population.len() as f64;
        Ok(average)
    }

    /// The `n` best genomes (fewer if the population is smaller).
    pub fn top_n(&self, n: usize) -> Result<&[C], PopulationError> {
        if self.population.is_empty() {
            return Err(PopulationError::Empty);
        }
        Ok(&self.population[..n.min(self.population.len())])
    }
}

fn sort_descending<C: Chromosome>(population: &mut [C]) {
    population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
}

/// Draws `size` candidates uniformly *with replacement* and returns the
/// fittest.
fn tournament_select<'a, C, R>(
    population: &'a [C],
    size: usize,
    rng: &mut R,
) -> Result<&'a C, PopulationError>
where
    C: Chromosome,
    R: Rng + ?Sized,
{
    if population.is_empty() {
        return Err(PopulationError::Empty);
    }
    let mut best = &population[rng.random_range(0..population.len())];
    for _ in 1..size {
        let candidate = &population[rng.random_range(0..population.len())];
        if candidate.fitness() > best.fitness() {
            best = candidate;
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    /// Minimal genome for exercising the engine machinery in isolation.
    #[derive(Debug, Clone, PartialEq)]
    struct Scalar {
        value: f64,
        fitness: f64,
    }

    impl Chromosome for Scalar {
        fn fitness(&self) -> f64 {
            self.fitness
        }
    }

    struct ScalarOps;

    impl VariationOperators<Scalar> for ScalarOps {
        fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Scalar {
            Scalar {
                value: rng.random_range(-10.0..10.0),
                fitness: 0.0,
            }
        }

        fn crossover<R: Rng + ?Sized>(&self, a: &Scalar, b: &Scalar, _rng: &mut R) -> Scalar {
            Scalar {
                value: f64::midpoint(a.value, b.value),
                fitness: 0.0,
            }
        }

        fn mutate<R: Rng + ?Sized>(&self, genome: &mut Scalar, _generation: usize, rng: &mut R) {
            genome.value += rng.random_range(-1.0..1.0);
        }
    }

    fn config(population_size: usize) -> EngineConfig {
        EngineConfig {
            population_size,
            crossover_rate: 0.8,
            mutation_rate: 0.3,
            tournament_size: 3,
            elite_count: 2,
        }
    }

    /// Fitness: closeness to zero.
    fn score(genome: &mut Scalar) -> Result<f64, EvalError> {
        genome.fitness = -genome.value.abs();
        Ok(genome.fitness)
    }

    #[test]
    fn inconsistent_configs_are_rejected() {
        let bad_population = EngineConfig {
            population_size: 0,
            ..config(10)
        };
        assert_eq!(
            EvolutionEngine::new(bad_population, ScalarOps).err(),
            Some(ConfigError::NonPositivePopulation)
        );

        let bad_rate = EngineConfig {
            crossover_rate: 1.5,
            ..config(10)
        };
        assert_eq!(
            EvolutionEngine::new(bad_rate, ScalarOps).err(),
            Some(ConfigError::CrossoverRateOutOfRange)
        );

        let bad_tournament = EngineConfig {
            tournament_size: 11,
            ..config(10)
        };
        assert_eq!(
            EvolutionEngine::new(bad_tournament, ScalarOps).err(),
            Some(ConfigError::TournamentSizeOutOfRange)
        );

        let bad_elite = EngineConfig {
            elite_count: 11,
            ..config(10)
        };
        assert_eq!(
            EvolutionEngine::new(bad_elite, ScalarOps).err(),
            Some(ConfigError::EliteCountOutOfRange)
        );
    }

    #[test]
    fn queries_on_an_empty_population_are_errors() {
        let engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
        assert_eq!(engine.best_fitness(), Err(PopulationError::Empty));
        assert_eq!(engine.average_fitness(), Err(PopulationError::Empty));
        assert_eq!(engine.top_n(3).err(), Some(PopulationError::Empty));
    }

    #[test]
    fn population_size_is_exact_after_every_generation() {
        let mut engine = EvolutionEngine::new(config(12), ScalarOps).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        engine
            .initialize_population(&mut score, &mut rng)
            .unwrap();
        assert_eq!(engine.population().len(), 12);

        for _ in 0..5 {
            engine.evolve_one_generation(&mut score, &mut rng).unwrap();
            assert_eq!(engine.population().len(), 12);
        }
        assert_eq!(engine.generation(), 5);
    }

    #[test]
    fn population_stays_sorted_descending() {
        let mut engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(6);
        engine
            .initialize_population(&mut score, &mut rng)
            .unwrap();
        engine.evolve_one_generation(&mut score, &mut rng).unwrap();

        let fitnesses: Vec<f64> = engine.population().iter().map(|g| g.fitness).collect();
        assert!(fitnesses.is_sorted_by(|a, b| a >= b));
        assert_eq!(engine.best_fitness().unwrap(), fitnesses[0]);
    }

    #[test]
    fn elites_carry_over_unchanged() {
        let mut engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        engine
            .initialize_population(&mut score, &mut rng)
            .unwrap();

        let elites: Vec<Scalar> = engine.population()[..2].to_vec();
        engine.evolve_one_generation(&mut score, &mut rng).unwrap();
        for elite in &elites {
            assert!(
                engine.population().contains(elite),
                "elite genome lost or altered across the generation"
            );
        }
    }

    #[test]
    fn identical_seeds_give_identical_runs() {
        let run = |seed: u64| {
            let mut engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
            let mut rng = Pcg64Mcg::seed_from_u64(seed);
            engine
                .initialize_population(&mut score, &mut rng)
                .unwrap();
            let mut history = vec![engine.population().to_vec()];
            for _ in 0..4 {
                engine.evolve_one_generation(&mut score, &mut rng).unwrap();
                history.push(engine.population().to_vec());
            }
            history
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn evolve_stops_early_on_target() {
        let mut engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(8);
        // Every fitness is <= 0, so a target of -100 stops immediately.
        engine
            .evolve(1000, -100.0, &mut score, &mut rng)
            .unwrap();
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn failing_evaluation_aborts_the_run() {
        let mut engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let mut failing =
            |_: &mut Scalar| -> Result<f64, EvalError> { Err(EvalError::NoCompletedGames) };
        assert!(matches!(
            engine.initialize_population(&mut failing, &mut rng),
            Err(EvolveError::Eval(EvalError::NoCompletedGames))
        ));
    }

    #[test]
    fn resume_requires_the_configured_size() {
        let mut engine = EvolutionEngine::new(config(10), ScalarOps).unwrap();
        let short = vec![
            Scalar {
                value: 0.0,
                fitness: 0.0
            };
            4
        ];
        assert_eq!(
            engine.resume_from(3, short).err(),
            Some(PopulationError::SizeMismatch {
                expected: 10,
                actual: 4
            })
        );
    }
}
