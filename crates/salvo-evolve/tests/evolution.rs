//! End-to-end runs of both evolutionary searches with real simulation-backed
//! fitness, scaled down to test-friendly game counts.

use rand::SeedableRng as _;
use rand_pcg::Pcg64Mcg;
use salvo_evolve::{
    EngineConfig, EvolutionEngine, PlacementEvaluator, PlacementGenerator, PlacementGenome,
    PlacementOperators, PlacementPool, SigmaSchedule, SimulationConfig, WeightEvaluator,
    WeightGenome, WeightOperators,
};

fn placement_config() -> EngineConfig {
    EngineConfig {
        population_size: 8,
        crossover_rate: 0.8,
        mutation_rate: 0.3,
        tournament_size: 2,
        elite_count: 2,
    }
}

fn fast_simulation() -> SimulationConfig {
    SimulationConfig {
        random_games: 2,
        parity_games: 2,
        monte_carlo_games: 1,
        monte_carlo_iterations: 20,
        shot_cap: 100,
    }
}

#[test]
fn placement_evolution_upholds_its_invariants() {
    let mut engine =
        EvolutionEngine::new(placement_config(), PlacementOperators::default()).unwrap();
    let evaluator = PlacementEvaluator::new(fast_simulation());
    let mut rng = Pcg64Mcg::seed_from_u64(1001);
    let mut eval_rng = Pcg64Mcg::seed_from_u64(2002);
    let mut fitness_fn =
        |genome: &mut PlacementGenome| evaluator.evaluate(genome, &mut eval_rng);

    engine
        .initialize_population(&mut fitness_fn, &mut rng)
        .unwrap();
    assert_eq!(engine.population().len(), 8);
    assert!(engine.population().iter().all(PlacementGenome::is_valid));

    let mut previous_best = engine.best_fitness().unwrap();
    for _ in 0..3 {
        engine.evolve_one_generation(&mut fitness_fn, &mut rng).unwrap();

        // Exact size, all valid, sorted descending.
        assert_eq!(engine.population().len(), 8);
        assert!(engine.population().iter().all(PlacementGenome::is_valid));
        let fitnesses: Vec<f64> = engine
            .population()
            .iter()
            .map(PlacementGenome::fitness)
            .collect();
        assert!(fitnesses.is_sorted_by(|a, b| a >= b));

        // Elitism makes the best fitness non-decreasing.
        let best = engine.best_fitness().unwrap();
        assert!(best >= previous_best);
        previous_best = best;

        // Simulated statistics were written back.
        for genome in engine.population() {
            assert!(genome.mean_shots() >= 20.0);
            assert!(genome.opponent_means().parity > 0.0);
        }
    }
}

#[test]
fn weight_evolution_runs_against_a_pool() {
    let generator = PlacementGenerator::default();
    let mut rng = Pcg64Mcg::seed_from_u64(3003);
    let mut pool = PlacementPool::new(3, 3, 0.7).unwrap();
    pool.set_elite(generator.generate_population(3, &mut rng))
        .unwrap();
    pool.set_random(generator.generate_population(3, &mut rng))
        .unwrap();

    let sigma = SigmaSchedule::new(0.5, 0.05, 10).unwrap();
    let operators = WeightOperators::new(sigma, 5.0).unwrap();
    let config = EngineConfig {
        population_size: 6,
        crossover_rate: 0.8,
        mutation_rate: 0.5,
        tournament_size: 2,
        elite_count: 1,
    };
    let mut engine = EvolutionEngine::new(config, operators).unwrap();
    let evaluator = WeightEvaluator {
        trials: 5,
        shot_cap: 200,
    };
    let mut eval_rng = Pcg64Mcg::seed_from_u64(4004);
    let mut fitness_fn =
        |genome: &mut WeightGenome| evaluator.evaluate(genome, &pool, &mut eval_rng);

    engine
        .initialize_population(&mut fitness_fn, &mut rng)
        .unwrap();
    engine.evolve_one_generation(&mut fitness_fn, &mut rng).unwrap();

    assert_eq!(engine.population().len(), 6);
    for genome in engine.population() {
        // A 20-cell fleet takes at least 20 shots, so fitness is at most -19.
        assert!(genome.mean_shots() >= 20.0);
        assert!(genome.fitness() <= -19.0);
        assert!(genome.fitness().is_finite());
        assert!(genome.weights().iter().all(|w| w.abs() <= 5.0));
    }
}

#[test]
fn weight_evaluation_fails_on_an_unready_pool() {
    let pool = PlacementPool::new(3, 3, 0.7).unwrap();
    let evaluator = WeightEvaluator::default();
    let mut genome = WeightGenome::new([0.1; 20]);
    let mut rng = Pcg64Mcg::seed_from_u64(5005);

    assert!(evaluator.evaluate(&mut genome, &pool, &mut rng).is_err());
}
