//! The two-bucket placement pool coupling the two evolutionary runs.
//!
//! The weight-genome evaluator should train against a realistic, evolving
//! distribution of opponent layouts rather than a single fixed one. The
//! pool holds an "elite" bucket (hard-to-sink layouts exported from a prior
//! placement-evolution run, set wholesale) and a "random" bucket (valid but
//! unremarkable layouts, fed incrementally with FIFO eviction). Sampling
//! prefers the elite bucket with a configured probability.

use std::collections::VecDeque;

use rand::Rng;
use salvo_engine::GRID_SIZE;
use salvo_shooter::HeatMap;

use crate::chromosome::PlacementGenome;

/// Pool misconfiguration or misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PoolError {
    #[display("elite-selection probability must be within [0, 1]")]
    ProbabilityOutOfRange,
    #[display("pool bucket sizes must be positive")]
    EmptyBucketConfig,
    #[display("expected {expected} placements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[display("pool buckets are not populated to their configured sizes")]
    Unpopulated,
}

/// Two fixed-size buckets of placement genomes with probabilistic sampling.
#[derive(Debug, Clone)]
pub struct PlacementPool {
    elite: Vec<PlacementGenome>,
    random: VecDeque<PlacementGenome>,
    elite_size: usize,
    random_size: usize,
    elite_probability: f64,
}

impl Default for PlacementPool {
    fn default() -> Self {
        Self {
            elite: Vec::new(),
            random: VecDeque::new(),
            elite_size: 50,
            random_size: 50,
            elite_probability: 0.7,
        }
    }
}

impl PlacementPool {
    pub fn new(
        elite_size: usize,
        random_size: usize,
        elite_probability: f64,
    ) -> Result<Self, PoolError> {
        if elite_size == 0 || random_size == 0 {
            return Err(PoolError::EmptyBucketConfig);
        }
        if !(0.0..=1.0).contains(&elite_probability) {
            return Err(PoolError::ProbabilityOutOfRange);
        }
        Ok(Self {
            elite: Vec::new(),
            random: VecDeque::new(),
            elite_size,
            random_size,
            elite_probability,
        })
    }

    /// Replaces the elite bucket wholesale; the size must match exactly.
    pub fn set_elite(&mut self, placements: Vec<PlacementGenome>) -> Result<(), PoolError> {
        if placements.len() != self.elite_size {
            return Err(PoolError::SizeMismatch {
                expected: self.elite_size,
                actual: placements.len(),
            });
        }
        self.elite = placements;
        Ok(())
    }

    /// Replaces the random bucket wholesale; the size must match exactly.
    pub fn set_random(&mut self, placements: Vec<PlacementGenome>) -> Result<(), PoolError> {
        if placements.len() != self.random_size {
            return Err(PoolError::SizeMismatch {
                expected: self.random_size,
                actual: placements.len(),
            });
        }
        self.random = placements.into();
        Ok(())
    }

    /// Inserts into the random bucket, evicting the oldest entry when full.
    pub fn add_placement(&mut self, placement: PlacementGenome) {
        if self.random.len() >= self.random_size {
            self.random.pop_front();
        }
        self.random.push_back(placement);
    }

    #[must_use]
    pub fn elite(&self) -> &[PlacementGenome] {
        &self.elite
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elite.len() + self.random.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elite.is_empty() && self.random.is_empty()
    }

    /// Whether both buckets are filled to their configured sizes.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.elite.len() == self.elite_size && self.random.len() == self.random_size
    }

    /// Draws a placement: from the elite bucket with the configured
    /// probability, from the random bucket otherwise.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::Unpopulated`] unless both buckets are filled
    /// to their configured sizes.
    pub fn sample<R>(&self, rng: &mut R) -> Result<&PlacementGenome, PoolError>
    where
        R: Rng + ?Sized,
    {
        if !self.is_ready() {
            return Err(PoolError::Unpopulated);
        }
        if rng.random_bool(self.elite_probability) {
            Ok(&self.elite[rng.random_range(0..self.elite.len())])
        } else {
            Ok(&self.random[rng.random_range(0..self.random.len())])
        }
    }

    /// Per-cell occupancy fractions over the elite bucket, for the weighted
    /// shooter's heat feature.
    pub fn elite_heat_map(&self) -> Result<HeatMap, PoolError> {
        if self.elite.len() != self.elite_size {
            return Err(PoolError::Unpopulated);
        }
        let mut heat: HeatMap = [[0.0; GRID_SIZE as usize]; GRID_SIZE as usize];
        for genome in &self.elite {
            let Some(fleet) = genome.decode() else {
                continue;
            };
            for (x, y) in fleet.occupied_cells() {
                heat[y as usize][x as usize] += 1.0;
            }
        }
        #[expect(clippy::cast_precision_loss)]
        let count = self.elite.len() as f64;
        for row in &mut heat {
            for cell in row {
                *cell /= count;
            }
        }
        Ok(heat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PlacementGenerator;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    fn filled_pool(elite_size: usize, random_size: usize) -> PlacementPool {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(41);
        let mut pool = PlacementPool::new(elite_size, random_size, 0.7).unwrap();
        pool.set_elite(generator.generate_population(elite_size, &mut rng))
            .unwrap();
        pool.set_random(generator.generate_population(random_size, &mut rng))
            .unwrap();
        pool
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert_eq!(
            PlacementPool::new(0, 10, 0.7).err(),
            Some(PoolError::EmptyBucketConfig)
        );
        assert_eq!(
            PlacementPool::new(10, 10, 1.5).err(),
            Some(PoolError::ProbabilityOutOfRange)
        );
    }

    #[test]
    fn sampling_an_unpopulated_pool_fails() {
        let pool = PlacementPool::new(5, 5, 0.7).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        assert_eq!(pool.sample(&mut rng).err(), Some(PoolError::Unpopulated));
        assert_eq!(pool.elite_heat_map().err(), Some(PoolError::Unpopulated));
    }

    #[test]
    fn bucket_size_mismatch_is_rejected() {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(43);
        let mut pool = PlacementPool::new(5, 5, 0.7).unwrap();
        let short = generator.generate_population(3, &mut rng);
        assert_eq!(
            pool.set_elite(short).err(),
            Some(PoolError::SizeMismatch {
                expected: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn sampling_draws_from_both_buckets() {
        let pool = filled_pool(4, 4);
        let mut rng = Pcg64Mcg::seed_from_u64(44);
        let elite_genes: std::collections::HashSet<_> =
            pool.elite().iter().map(|g| *g.genes()).collect();

        let mut saw_elite = false;
        let mut saw_random = false;
        for _ in 0..200 {
            let sampled = pool.sample(&mut rng).unwrap();
            if elite_genes.contains(sampled.genes()) {
                saw_elite = true;
            } else {
                saw_random = true;
            }
        }
        assert!(saw_elite && saw_random);
    }

    #[test]
    fn add_placement_evicts_the_oldest() {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(45);
        let mut pool = PlacementPool::new(2, 2, 0.7).unwrap();
        let layouts = generator.generate_population(3, &mut rng);

        pool.add_placement(layouts[0].clone());
        pool.add_placement(layouts[1].clone());
        pool.add_placement(layouts[2].clone());

        assert_eq!(pool.random.len(), 2);
        assert_eq!(pool.random[0].genes(), layouts[1].genes());
        assert_eq!(pool.random[1].genes(), layouts[2].genes());
    }

    #[test]
    fn heat_map_is_an_occupancy_fraction() {
        let pool = filled_pool(3, 3);
        let heat = pool.elite_heat_map().unwrap();

        let total: f64 = heat.iter().flatten().sum();
        // Each elite layout occupies exactly 20 cells.
        assert!((total - 20.0).abs() < 1e-9);
        assert!(heat.iter().flatten().all(|&h| (0.0..=1.0).contains(&h)));
    }
}
