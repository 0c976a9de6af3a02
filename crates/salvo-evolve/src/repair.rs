//! Bounded randomized repair of invalid placement genomes.
//!
//! Crossover and mutation ignore the placement rules on purpose; this
//! operator is what lets the engine keep its contract that no invalid
//! genome is ever scored or retained. Repair is a bounded local search:
//! relocate one conflicting ship at a time within a small jitter of its
//! current position, and if the budget runs out, substitute a freshly
//! generated layout outright. The substitution fallback makes termination a
//! property of the code rather than of luck, and it is the event the
//! engine's regenerated-count metric observes.

use rand::Rng;
use salvo_engine::{SHIP_COUNT, SHIP_LENGTHS};

use crate::{
    chromosome::{HORIZONTAL_GENE, PlacementGenome},
    generator::{PlacementBias, PlacementGenerator},
    grid::HaloGrid,
};

/// How a genome left [`RepairOperator::repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The genome was valid on entry; nothing was touched.
    AlreadyValid,
    /// Local relocation fixed the conflicts.
    Repaired,
    /// Local repair was exhausted; the genes were replaced with a fresh
    /// generator layout.
    Regenerated,
}

impl RepairOutcome {
    #[must_use]
    pub fn is_regenerated(self) -> bool {
        self == RepairOutcome::Regenerated
    }
}

/// Repairs placement genomes in place; the genome is always valid afterward.
#[derive(Debug, Clone)]
pub struct RepairOperator {
    attempt_budget: u32,
    local_tries: u32,
    generator: PlacementGenerator,
}

impl Default for RepairOperator {
    fn default() -> Self {
        Self {
            attempt_budget: 50,
            local_tries: 30,
            generator: PlacementGenerator::default(),
        }
    }
}

impl RepairOperator {
    #[must_use]
    pub fn new(attempt_budget: u32, local_tries: u32, generator: PlacementGenerator) -> Self {
        Self {
            attempt_budget,
            local_tries,
            generator,
        }
    }

    /// Brings the genome back to validity.
    ///
    /// Up to `attempt_budget` times: pick a random ship, lift it off a
    /// counted occupancy/halo grid, and try `local_tries` placements within
    /// a +-2 jitter of its current origin (random orientation each try),
    /// then one fully random placement. If the genome is still invalid when
    /// the budget is spent, its genes are replaced with a fresh generator
    /// layout. Derived statistics are left alone; the next evaluation
    /// rewrites them.
    pub fn repair<R>(&self, genome: &mut PlacementGenome, rng: &mut R) -> RepairOutcome
    where
        R: Rng + ?Sized,
    {
        if genome.is_valid() {
            return RepairOutcome::AlreadyValid;
        }

        let mut halo = HaloGrid::new();
        for index in 0..SHIP_COUNT {
            let (x, y, orientation) = genome.ship(index);
            halo.stamp(
                x,
                y,
                i32::from(SHIP_LENGTHS[index]),
                orientation == HORIZONTAL_GENE,
                1,
            );
        }

        for _ in 0..self.attempt_budget {
            let index = rng.random_range(0..SHIP_COUNT);
            let (old_x, old_y, old_orientation) = genome.ship(index);
            let length = i32::from(SHIP_LENGTHS[index]);
            halo.stamp(old_x, old_y, length, old_orientation == HORIZONTAL_GENE, -1);

            if !self.relocate_ship(genome, index, length, &mut halo, rng) {
                // Nowhere to put it; restore the old position so the grid
                // stays consistent with the genes.
                halo.stamp(old_x, old_y, length, old_orientation == HORIZONTAL_GENE, 1);
                continue;
            }

            if genome.is_valid() {
                return RepairOutcome::Repaired;
            }
        }

        if genome.is_valid() {
            return RepairOutcome::Repaired;
        }

        let fresh = self.generator.generate(PlacementBias::choose(rng), rng);
        genome.set_genes(*fresh.genes());
        RepairOutcome::Regenerated
    }

    /// Tries to re-place one ship, first locally, then once fully at
    /// random. Marks the halo grid and updates the genes on success.
    fn relocate_ship<R>(
        &self,
        genome: &mut PlacementGenome,
        index: usize,
        length: i32,
        halo: &mut HaloGrid,
        rng: &mut R,
    ) -> bool
    where
        R: Rng + ?Sized,
    {
        let (old_x, old_y, _) = genome.ship(index);
        let span = 10 - length;

        for _ in 0..self.local_tries {
            let horizontal = rng.random_bool(0.5);
            let mut x = (old_x + rng.random_range(-2..=2)).clamp(0, 9);
            let mut y = (old_y + rng.random_range(-2..=2)).clamp(0, 9);
            if horizontal {
                x = x.min(span);
            } else {
                y = y.min(span);
            }
            if halo.is_clear(x, y, length, horizontal) {
                halo.stamp(x, y, length, horizontal, 1);
                genome.set_ship(index, x, y, i32::from(horizontal));
                return true;
            }
        }

        let horizontal = rng.random_bool(0.5);
        let x = rng.random_range(0..=if horizontal { span } else { 9 });
        let y = rng.random_range(0..=if horizontal { 9 } else { span });
        if halo.is_clear(x, y, length, horizontal) {
            halo.stamp(x, y, length, horizontal, 1);
            genome.set_ship(index, x, y, i32::from(horizontal));
            return true;
        }

        false
    }
}
