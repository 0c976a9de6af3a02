//! Variation operators for the two genome kinds.
//!
//! Placement genomes use discrete, ship-granular operators (ship-swap
//! crossover, three-tier positional mutation, repair-backed validity);
//! weight genomes use real-valued operators (single-alpha arithmetic blend,
//! annealed Gaussian noise with clamping). Both plug into the same
//! [`EvolutionEngine`](crate::engine::EvolutionEngine).

use rand::Rng;
use rand_distr::Normal;
use salvo_engine::{SHIP_COUNT, SHIP_LENGTHS};
use salvo_shooter::Feature;

use crate::{
    chromosome::{PlacementGenome, WEIGHT_GENES, WeightGenome},
    engine::{ConfigError, VariationOperators},
    generator::{PlacementBias, PlacementGenerator},
    repair::RepairOperator,
};

/// Operators for the placement-genome search.
#[derive(Debug, Clone, Default)]
pub struct PlacementOperators {
    generator: PlacementGenerator,
    repair: RepairOperator,
}

impl PlacementOperators {
    #[must_use]
    pub fn new(generator: PlacementGenerator, repair: RepairOperator) -> Self {
        Self { generator, repair }
    }
}

impl VariationOperators<PlacementGenome> for PlacementOperators {
    fn spawn<R>(&self, rng: &mut R) -> PlacementGenome
    where
        R: Rng + ?Sized,
    {
        self.generator.generate(PlacementBias::choose(rng), rng)
    }

    fn spawn_population<R>(&self, count: usize, rng: &mut R) -> Vec<PlacementGenome>
    where
        R: Rng + ?Sized,
    {
        self.generator.generate_population(count, rng)
    }

    /// Ship-swap crossover: the offspring starts as parent one, then 1-4
    /// randomly chosen ships take their gene triples from parent two.
    fn crossover<R>(&self, a: &PlacementGenome, b: &PlacementGenome, rng: &mut R) -> PlacementGenome
    where
        R: Rng + ?Sized,
    {
        let mut offspring = a.clone();
        let swaps = rng.random_range(1..=4);
        for _ in 0..swaps {
            let ship = rng.random_range(0..SHIP_COUNT);
            let (x, y, orientation) = b.ship(ship);
            offspring.set_ship(ship, x, y, orientation);
        }
        offspring
    }

    /// Three-tier mutation of exactly one randomly chosen ship:
    /// micro-shift (75%), orientation flip (20%), teleport (5%).
    fn mutate<R>(&self, genome: &mut PlacementGenome, _generation: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let ship = rng.random_range(0..SHIP_COUNT);
        let length = i32::from(SHIP_LENGTHS[ship]);
        let (x, y, orientation) = genome.ship(ship);

        let tier: f64 = rng.random_range(0.0..1.0);
        if tier < 0.75 {
            let dx = rng.random_range(-1..=1);
            let dy = rng.random_range(-1..=1);
            genome.set_ship(ship, (x + dx).clamp(0, 9), (y + dy).clamp(0, 9), orientation);
        } else if tier < 0.95 {
            genome.set_ship(ship, x, y, 1 - orientation);
        } else {
            let horizontal = rng.random_bool(0.5);
            let span = 10 - length;
            let new_x = rng.random_range(0..=if horizontal { span } else { 9 });
            let new_y = rng.random_range(0..=if horizontal { 9 } else { span });
            genome.set_ship(ship, new_x, new_y, i32::from(horizontal));
        }
    }

    fn ensure_valid<R>(&self, genome: &mut PlacementGenome, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        self.repair.repair(genome, rng).is_regenerated()
    }
}

/// Linear annealing schedule for the mutation standard deviation:
/// `sigma(g) = initial - (initial - floor) * clamp(g / horizon, 0, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct SigmaSchedule {
    initial: f64,
    floor: f64,
    horizon: usize,
}

impl SigmaSchedule {
    pub fn new(initial: f64, floor: f64, horizon: usize) -> Result<Self, ConfigError> {
        if !(initial.is_finite() && floor.is_finite()) || floor < 0.0 || floor > initial {
            return Err(ConfigError::SigmaScheduleInvalid);
        }
        Ok(Self {
            initial,
            floor,
            horizon: horizon.max(1),
        })
    }

    /// Sigma for the given generation; non-increasing, equal to the floor
    /// for every generation at or beyond the horizon.
    #[must_use]
    pub fn sigma_at(&self, generation: usize) -> f64 {
        #[expect(clippy::cast_precision_loss)]
        let progress = (generation as f64 / self.horizon as f64).clamp(0.0, 1.0);
        self.initial - (self.initial - self.floor) * progress
    }
}

/// Operators for the weight-genome search.
#[derive(Debug, Clone, Copy)]
pub struct WeightOperators {
    sigma: SigmaSchedule,
    weight_bound: f64,
}

impl WeightOperators {
    /// `weight_bound` is the symmetric clamp applied after mutation.
    pub fn new(sigma: SigmaSchedule, weight_bound: f64) -> Result<Self, ConfigError> {
        if !weight_bound.is_finite() || weight_bound <= 0.0 {
            return Err(ConfigError::WeightBoundInvalid);
        }
        Ok(Self {
            sigma,
            weight_bound,
        })
    }

    #[must_use]
    pub fn weight_bound(&self) -> f64 {
        self.weight_bound
    }
}

impl VariationOperators<WeightGenome> for WeightOperators {
    /// Draws each weight from its feature's initialization range.
    fn spawn<R>(&self, rng: &mut R) -> WeightGenome
    where
        R: Rng + ?Sized,
    {
        let mut weights = [0.0; WEIGHT_GENES];
        for (weight, feature) in weights.iter_mut().zip(Feature::ALL) {
            let (low, high) = feature.init_range();
            *weight = rng.random_range(low..high);
        }
        WeightGenome::new(weights)
    }

    /// Arithmetic blend with a single mixing coefficient for all genes:
    /// `child[i] = alpha * a[i] + (1 - alpha) * b[i]`, `alpha ~ U(0, 1)`.
    fn crossover<R>(&self, a: &WeightGenome, b: &WeightGenome, rng: &mut R) -> WeightGenome
    where
        R: Rng + ?Sized,
    {
        let alpha: f64 = rng.random_range(0.0..=1.0);
        let mut weights = [0.0; WEIGHT_GENES];
        for ((child, &wa), &wb) in weights.iter_mut().zip(a.weights()).zip(b.weights()) {
            *child = alpha * wa + (1.0 - alpha) * wb;
        }
        WeightGenome::new(weights)
    }

    /// Gaussian noise on every weight, annealed by generation, clamped to
    /// the symmetric bound.
    fn mutate<R>(&self, genome: &mut WeightGenome, generation: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let sigma = self.sigma.sigma_at(generation);
        let normal = Normal::new(0.0, sigma).unwrap();
        for weight in genome.weights_mut() {
            *weight = (*weight + rng.sample(normal)).clamp(-self.weight_bound, self.weight_bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    fn spaced_genome() -> PlacementGenome {
        PlacementGenome::new([
            0, 0, 1, 5, 0, 1, 0, 2, 1, 4, 2, 1, 7, 2, 1, 0, 4, 1, 3, 4, 1, 5, 4, 1, 7, 4, 1, 0,
            6, 1,
        ])
    }

    #[test]
    fn ship_swap_child_takes_each_ship_from_a_parent() {
        let ops = PlacementOperators::default();
        let mut rng = Pcg64Mcg::seed_from_u64(21);
        let a = spaced_genome();
        let b = {
            let mut genome = spaced_genome();
            for ship in 0..SHIP_COUNT {
                let (x, y, _) = genome.ship(ship);
                genome.set_ship(ship, x, y, 0);
            }
            genome
        };

        for _ in 0..20 {
            let child = ops.crossover(&a, &b, &mut rng);
            let mut from_b = 0;
            for ship in 0..SHIP_COUNT {
                let gene = child.ship(ship);
                assert!(gene == a.ship(ship) || gene == b.ship(ship));
                if gene == b.ship(ship) && gene != a.ship(ship) {
                    from_b += 1;
                }
            }
            assert!(from_b <= 4, "more than four ships swapped");
        }
    }

    #[test]
    fn crossover_offspring_may_be_invalid_and_repair_restores_it() {
        let ops = PlacementOperators::default();
        let a = spaced_genome();
        // Same layout shifted one row down: any partial mix collides.
        let mut b = spaced_genome();
        for ship in 0..SHIP_COUNT {
            let (x, y, o) = b.ship(ship);
            b.set_ship(ship, x, y + 1, o);
        }
        assert!(a.is_valid() && b.is_valid());

        let mut saw_invalid_offspring = false;
        for seed in 0..30u64 {
            let mut rng = Pcg64Mcg::seed_from_u64(seed);
            let mut child = ops.crossover(&a, &b, &mut rng);
            saw_invalid_offspring |= !child.is_valid();

            ops.ensure_valid(&mut child, &mut rng);
            assert!(child.is_valid(), "offspring left invalid (seed {seed})");
        }
        assert!(
            saw_invalid_offspring,
            "expected at least one colliding offspring from these parents"
        );
    }

    #[test]
    fn placement_mutation_touches_exactly_one_ship() {
        let ops = PlacementOperators::default();
        let mut rng = Pcg64Mcg::seed_from_u64(22);
        for _ in 0..50 {
            let original = spaced_genome();
            let mut mutated = original.clone();
            ops.mutate(&mut mutated, 1, &mut rng);

            let changed: Vec<usize> = (0..SHIP_COUNT)
                .filter(|&s| mutated.ship(s) != original.ship(s))
                .collect();
            assert!(changed.len() <= 1, "mutation touched {changed:?}");

            // Whatever the tier, genes stay in representable ranges.
            assert!(mutated.decode().is_some());
        }
    }

    #[test]
    fn sigma_anneals_linearly_to_the_floor() {
        let schedule = SigmaSchedule::new(0.5, 0.05, 100).unwrap();
        assert_eq!(schedule.sigma_at(0), 0.5);
        assert!((schedule.sigma_at(50) - 0.275).abs() < 1e-12);
        assert_eq!(schedule.sigma_at(100), 0.05);
        assert_eq!(schedule.sigma_at(250), 0.05);

        let mut previous = schedule.sigma_at(0);
        for generation in 1..=120 {
            let sigma = schedule.sigma_at(generation);
            assert!(sigma <= previous, "sigma increased at {generation}");
            previous = sigma;
        }
    }

    #[test]
    fn invalid_sigma_schedule_is_rejected() {
        assert!(SigmaSchedule::new(0.1, 0.5, 100).is_err());
        assert!(SigmaSchedule::new(0.5, -0.1, 100).is_err());
    }

    #[test]
    fn weight_crossover_blends_with_one_alpha() {
        let sigma = SigmaSchedule::new(0.5, 0.05, 100).unwrap();
        let ops = WeightOperators::new(sigma, 5.0).unwrap();
        let a = WeightGenome::new([1.0; WEIGHT_GENES]);
        let b = WeightGenome::new([3.0; WEIGHT_GENES]);
        let mut rng = Pcg64Mcg::seed_from_u64(23);

        let child = ops.crossover(&a, &b, &mut rng);
        let first = child.weights()[0];
        assert!((1.0..=3.0).contains(&first));
        // One alpha for every gene: all blended values are identical here.
        assert!(child.weights().iter().all(|&w| (w - first).abs() < 1e-12));
    }

    #[test]
    fn weight_mutation_respects_the_bound() {
        let sigma = SigmaSchedule::new(10.0, 10.0, 1).unwrap();
        let ops = WeightOperators::new(sigma, 2.0).unwrap();
        let mut genome = WeightGenome::new([1.5; WEIGHT_GENES]);
        let mut rng = Pcg64Mcg::seed_from_u64(24);

        for _ in 0..10 {
            ops.mutate(&mut genome, 1, &mut rng);
            assert!(genome.weights().iter().all(|w| w.abs() <= 2.0));
        }
    }

    #[test]
    fn spawned_weights_sit_in_their_init_ranges() {
        let sigma = SigmaSchedule::new(0.5, 0.05, 100).unwrap();
        let ops = WeightOperators::new(sigma, 5.0).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(25);

        for _ in 0..10 {
            let genome = ops.spawn(&mut rng);
            for (weight, feature) in genome.weights().iter().zip(Feature::ALL) {
                let (low, high) = feature.init_range();
                assert!(
                    (low..high).contains(weight),
                    "{} out of range: {weight}",
                    feature.name()
                );
            }
        }
    }
}
