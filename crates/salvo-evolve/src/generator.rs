//! Constrained random generation of valid placement genomes.
//!
//! The generator is the one place in the system that produces layouts that
//! are valid *by construction*: ships are placed one at a time on an
//! occupancy grid, and only origins that clear the bounds, overlap, and
//! no-touch checks are accepted. Biased origin sampling (edges, corners,
//! center) seeds the population with the qualitatively different layout
//! families a human opponent would recognize, while the relaxation rules
//! keep generation from getting stuck when a bias paints the grid into a
//! corner.

use std::collections::HashSet;

use rand::Rng;
use salvo_engine::{GRID_SIZE, SHIP_LENGTHS};

use crate::{
    chromosome::{HORIZONTAL_GENE, PLACEMENT_GENES, PlacementGenome},
    grid::OccupancyGrid,
};

const MAX: i32 = GRID_SIZE as i32 - 1;

/// Origin-sampling bias for one generated layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementBias {
    /// Hug one of the four border lines.
    Edge,
    /// Sample from one of the four 2x2 corner regions.
    Corner,
    /// Sample near the grid center, tightened for the longest ships.
    Center,
    /// Any in-range origin.
    Unbiased,
}

impl PlacementBias {
    pub const ALL: [PlacementBias; 4] = [
        PlacementBias::Edge,
        PlacementBias::Corner,
        PlacementBias::Center,
        PlacementBias::Unbiased,
    ];

    /// Picks a bias uniformly at random.
    pub fn choose<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Produces placement genomes that always satisfy the placement rules.
#[derive(Debug, Clone)]
pub struct PlacementGenerator {
    max_tries: u32,
}

impl Default for PlacementGenerator {
    fn default() -> Self {
        Self::new(50)
    }
}

impl PlacementGenerator {
    /// `max_tries` is the per-ship origin-sampling budget.
    #[must_use]
    pub fn new(max_tries: u32) -> Self {
        Self { max_tries: max_tries.max(1) }
    }

    /// Generates one valid genome under the given bias.
    ///
    /// If any ship exhausts its try budget the whole layout restarts under
    /// [`PlacementBias::Unbiased`], which terminates with overwhelming
    /// probability (an unbiased standard fleet nearly always fits).
    pub fn generate<R>(&self, bias: PlacementBias, rng: &mut R) -> PlacementGenome
    where
        R: Rng + ?Sized,
    {
        let mut bias = bias;
        'restart: loop {
            let mut grid = OccupancyGrid::new();
            let mut genes = [0i32; PLACEMENT_GENES];
            let mut current_bias = bias;

            for (index, &length) in SHIP_LENGTHS.iter().enumerate() {
                let length = i32::from(length);
                let horizontal = rng.random_bool(0.5);
                let Some((x, y)) =
                    self.place_ship(length, horizontal, index, current_bias, &mut grid, rng)
                else {
                    bias = PlacementBias::Unbiased;
                    continue 'restart;
                };

                let base = index * 3;
                genes[base] = x;
                genes[base + 1] = y;
                genes[base + 2] = if horizontal { HORIZONTAL_GENE } else { 0 };

                // The bias loosens as the grid fills; later ships get more
                // freedom so the layout stays placeable.
                #[expect(clippy::cast_precision_loss)]
                let relax_probability = 0.1 + index as f64 * 0.05;
                if rng.random_bool(relax_probability) {
                    current_bias = PlacementBias::Unbiased;
                }
            }

            return PlacementGenome::new(genes);
        }
    }

    /// Generates up to `count` unique genomes under uniformly random biases.
    ///
    /// Uniqueness is keyed on the exact gene sequence. Both the biased and
    /// the unbiased fallback phase are bounded at `10 * count` attempts, so
    /// the result may be shorter than requested; callers are expected to
    /// observe the shortfall and top the population up themselves.
    pub fn generate_population<R>(&self, count: usize, rng: &mut R) -> Vec<PlacementGenome>
    where
        R: Rng + ?Sized,
    {
        let mut seen: HashSet<[i32; PLACEMENT_GENES]> = HashSet::new();
        let mut population = Vec::with_capacity(count);
        let attempt_budget = count.saturating_mul(10);

        let mut attempts = 0;
        while population.len() < count && attempts < attempt_budget {
            attempts += 1;
            let genome = self.generate(PlacementBias::choose(rng), rng);
            if seen.insert(*genome.genes()) {
                population.push(genome);
            }
        }

        // Biased layouts cluster, so uniqueness can stall; a second bounded
        // pass with unbiased sampling picks up the remainder.
        let mut attempts = 0;
        while population.len() < count && attempts < attempt_budget {
            attempts += 1;
            let genome = self.generate(PlacementBias::Unbiased, rng);
            if seen.insert(*genome.genes()) {
                population.push(genome);
            }
        }

        population
    }

    fn place_ship<R>(
        &self,
        length: i32,
        horizontal: bool,
        ship_index: usize,
        bias: PlacementBias,
        grid: &mut OccupancyGrid,
        rng: &mut R,
    ) -> Option<(i32, i32)>
    where
        R: Rng + ?Sized,
    {
        let mut bias = bias;
        for attempt in 0..self.max_tries {
            let (x, y) = sample_origin(bias, length, horizontal, ship_index, rng);
            if grid.fits(x, y, length, horizontal) {
                grid.mark(x, y, length, horizontal);
                return Some((x, y));
            }
            // Half the budget gone: drop the bias so the ship can still land.
            if attempt > self.max_tries / 2 {
                bias = PlacementBias::Unbiased;
            }
        }
        None
    }
}

fn sample_origin<R>(
    bias: PlacementBias,
    length: i32,
    horizontal: bool,
    ship_index: usize,
    rng: &mut R,
) -> (i32, i32)
where
    R: Rng + ?Sized,
{
    let span = i32::from(GRID_SIZE) - length;
    match bias {
        PlacementBias::Edge => {
            let along_x_max = if horizontal { span } else { MAX };
            let along_y_max = if horizontal { MAX } else { span };
            match rng.random_range(0..4) {
                0 => (rng.random_range(0..=along_x_max), 0),
                1 => (if horizontal { span } else { MAX }, rng.random_range(0..=along_y_max)),
                2 => (rng.random_range(0..=along_x_max), if horizontal { MAX } else { span }),
                _ => (0, rng.random_range(0..=along_y_max)),
            }
        }
        PlacementBias::Corner => {
            let low_x = rng.random_range(0..=1);
            let high_x = rng.random_range(MAX - 1..=MAX);
            let low_y = rng.random_range(0..=1);
            let high_y = rng.random_range(MAX - 1..=MAX);
            let (mut x, mut y) = match rng.random_range(0..4) {
                0 => (low_x, low_y),
                1 => (high_x, low_y),
                2 => (high_x, high_y),
                _ => (low_x, high_y),
            };
            if horizontal {
                x = x.min(span);
            } else {
                y = y.min(span);
            }
            (x, y)
        }
        PlacementBias::Center => {
            // The three longest ships aim at the 3..=6 block, the rest get
            // a slightly wider ring.
            let (lo, hi) = if ship_index < 3 { (3, 6) } else { (2, 7) };
            let x_hi = if horizontal { (hi - (length - 1)).max(lo) } else { hi };
            let y_hi = if horizontal { hi } else { (hi - (length - 1)).max(lo) };
            (rng.random_range(lo..=x_hi), rng.random_range(lo..=y_hi))
        }
        PlacementBias::Unbiased => {
            let x_max = if horizontal { span } else { MAX };
            let y_max = if horizontal { MAX } else { span };
            (rng.random_range(0..=x_max), rng.random_range(0..=y_max))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn every_bias_generates_valid_genomes() {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(17);
        for bias in PlacementBias::ALL {
            for _ in 0..25 {
                let genome = generator.generate(bias, &mut rng);
                assert!(genome.is_valid(), "invalid genome from {bias:?}");
            }
        }
    }

    #[test]
    fn generated_population_is_unique() {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(17);
        let population = generator.generate_population(30, &mut rng);
        assert_eq!(population.len(), 30);

        let mut seen = std::collections::HashSet::new();
        for genome in &population {
            assert!(genome.is_valid());
            assert!(seen.insert(*genome.genes()), "duplicate layout generated");
        }
    }

    #[test]
    fn corner_bias_keeps_long_ships_in_bounds() {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(99);
        for _ in 0..50 {
            let genome = generator.generate(PlacementBias::Corner, &mut rng);
            assert!(genome.is_valid());
        }
    }

    #[test]
    fn generation_is_deterministic_under_a_fixed_seed() {
        let generator = PlacementGenerator::default();
        let mut a = Pcg64Mcg::seed_from_u64(123);
        let mut b = Pcg64Mcg::seed_from_u64(123);
        let first = generator.generate(PlacementBias::Center, &mut a);
        let second = generator.generate(PlacementBias::Center, &mut b);
        assert_eq!(first.genes(), second.genes());
    }
}
