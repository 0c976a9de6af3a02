//! Genome representations for the two evolutionary searches.
//!
//! A [`PlacementGenome`] is 30 integers (`x`, `y`, orientation for each of
//! the ten standard ships, lengths fixed by position); a [`WeightGenome`] is
//! 20 bounded reals, one per cell feature. Both carry derived statistics
//! written back by the fitness evaluators.
//!
//! Validity of a placement genome is a *predicate*, not a construction-time
//! guarantee: crossover and mutation produce invalid gene combinations all
//! the time, and those genomes flow through repair before they are scored or
//! kept in a population.

use salvo_engine::{Fleet, GRID_SIZE, Orientation, SHIP_COUNT, SHIP_LENGTHS, Ship};
use salvo_shooter::{FEATURE_COUNT, Feature};

/// Genes per ship: x, y, orientation.
pub const GENES_PER_SHIP: usize = 3;

/// Total gene count of a placement genome.
pub const PLACEMENT_GENES: usize = SHIP_COUNT * GENES_PER_SHIP;

/// Total gene count of a weight genome, one weight per cell feature.
pub const WEIGHT_GENES: usize = FEATURE_COUNT;

/// Orientation gene value for a horizontal ship (0 is vertical).
pub const HORIZONTAL_GENE: i32 = 1;

/// Common surface the generic engine needs from a genome.
pub trait Chromosome: Clone {
    /// Last evaluated fitness (higher is better). Meaningful only after the
    /// fitness function has run.
    fn fitness(&self) -> f64;
}

/// Mean shots-to-sink observed against each opponent policy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpponentMeans {
    pub random: f64,
    pub parity: f64,
    pub monte_carlo: f64,
}

/// A candidate fleet layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementGenome {
    genes: [i32; PLACEMENT_GENES],
    fitness: f64,
    mean_shots: f64,
    std_dev_shots: f64,
    opponent_means: OpponentMeans,
}

/// Gene-vector length mismatch when rebuilding a genome from raw genes.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("expected {expected} genes, got {actual}")]
pub struct GeneCountError {
    pub expected: usize,
    pub actual: usize,
}

impl PlacementGenome {
    #[must_use]
    pub fn new(genes: [i32; PLACEMENT_GENES]) -> Self {
        Self {
            genes,
            fitness: 0.0,
            mean_shots: 0.0,
            std_dev_shots: 0.0,
            opponent_means: OpponentMeans::default(),
        }
    }

    #[must_use]
    pub fn genes(&self) -> &[i32; PLACEMENT_GENES] {
        &self.genes
    }

    /// Replaces the genes, keeping the derived statistics; they are
    /// rewritten at the next evaluation anyway.
    pub fn set_genes(&mut self, genes: [i32; PLACEMENT_GENES]) {
        self.genes = genes;
    }

    /// The `(x, y, orientation)` gene triple of one ship.
    #[must_use]
    pub fn ship(&self, index: usize) -> (i32, i32, i32) {
        let base = index * GENES_PER_SHIP;
        (self.genes[base], self.genes[base + 1], self.genes[base + 2])
    }

    pub fn set_ship(&mut self, index: usize, x: i32, y: i32, orientation: i32) {
        let base = index * GENES_PER_SHIP;
        self.genes[base] = x;
        self.genes[base + 1] = y;
        self.genes[base + 2] = orientation;
    }

    /// Decodes the genome into fleet geometry.
    ///
    /// Returns `None` when any gene is outside its representable range
    /// (coordinates off the grid, orientation not 0/1); an in-range genome
    /// whose ships overhang or collide still decodes and simply fails
    /// [`Fleet::is_valid`].
    #[must_use]
    pub fn decode(&self) -> Option<Fleet> {
        let mut fleet = Fleet::new();
        for (index, &length) in SHIP_LENGTHS.iter().enumerate() {
            let (x, y, orientation) = self.ship(index);
            if !(0..i32::from(GRID_SIZE)).contains(&x) || !(0..i32::from(GRID_SIZE)).contains(&y) {
                return None;
            }
            let orientation = match orientation {
                o if o == HORIZONTAL_GENE => Orientation::Horizontal,
                0 => Orientation::Vertical,
                _ => return None,
            };
            #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            fleet.add_ship(Ship::new(x as u8, y as u8, length, orientation));
        }
        Some(fleet)
    }

    /// The validity predicate: decodes and checks the placement rules.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.decode().is_some_and(|fleet| fleet.is_valid())
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    #[must_use]
    pub fn mean_shots(&self) -> f64 {
        self.mean_shots
    }

    pub fn set_mean_shots(&mut self, mean_shots: f64) {
        self.mean_shots = mean_shots;
    }

    #[must_use]
    pub fn std_dev_shots(&self) -> f64 {
        self.std_dev_shots
    }

    pub fn set_std_dev_shots(&mut self, std_dev_shots: f64) {
        self.std_dev_shots = std_dev_shots;
    }

    #[must_use]
    pub fn opponent_means(&self) -> OpponentMeans {
        self.opponent_means
    }

    pub fn set_opponent_means(&mut self, means: OpponentMeans) {
        self.opponent_means = means;
    }
}

impl TryFrom<&[i32]> for PlacementGenome {
    type Error = GeneCountError;

    fn try_from(genes: &[i32]) -> Result<Self, Self::Error> {
        let genes: [i32; PLACEMENT_GENES] = genes.try_into().map_err(|_| GeneCountError {
            expected: PLACEMENT_GENES,
            actual: genes.len(),
        })?;
        Ok(Self::new(genes))
    }
}

impl Chromosome for PlacementGenome {
    fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// A candidate weight vector for the heat-map shooter.
///
/// No structural validity constraint exists beyond the symmetric bound,
/// which the mutation operator enforces by clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightGenome {
    weights: [f64; WEIGHT_GENES],
    fitness: f64,
    mean_shots: f64,
    std_dev_shots: f64,
}

impl WeightGenome {
    #[must_use]
    pub fn new(weights: [f64; WEIGHT_GENES]) -> Self {
        Self {
            weights,
            fitness: 0.0,
            mean_shots: 0.0,
            std_dev_shots: 0.0,
        }
    }

    #[must_use]
    pub fn weights(&self) -> &[f64; WEIGHT_GENES] {
        &self.weights
    }

    pub(crate) fn weights_mut(&mut self) -> &mut [f64; WEIGHT_GENES] {
        &mut self.weights
    }

    /// The weight paired with a named feature.
    #[must_use]
    pub fn weight_of(&self, feature: Feature) -> f64 {
        let index = Feature::ALL
            .iter()
            .position(|&f| f == feature)
            .unwrap_or_default();
        self.weights[index]
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    #[must_use]
    pub fn mean_shots(&self) -> f64 {
        self.mean_shots
    }

    pub fn set_mean_shots(&mut self, mean_shots: f64) {
        self.mean_shots = mean_shots;
    }

    #[must_use]
    pub fn std_dev_shots(&self) -> f64 {
        self.std_dev_shots
    }

    pub fn set_std_dev_shots(&mut self, std_dev_shots: f64) {
        self.std_dev_shots = std_dev_shots;
    }
}

impl TryFrom<&[f64]> for WeightGenome {
    type Error = GeneCountError;

    fn try_from(weights: &[f64]) -> Result<Self, Self::Error> {
        let weights: [f64; WEIGHT_GENES] = weights.try_into().map_err(|_| GeneCountError {
            expected: WEIGHT_GENES,
            actual: weights.len(),
        })?;
        Ok(Self::new(weights))
    }
}

impl Chromosome for WeightGenome {
    fn fitness(&self) -> f64 {
        self.fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Genes of a layout with every ship horizontal and generously spaced.
    fn spaced_genes() -> [i32; PLACEMENT_GENES] {
        [
            0, 0, 1, // length 4
            5, 0, 1, // length 3
            0, 2, 1, // length 3
            4, 2, 1, // length 2
            7, 2, 1, // length 2
            0, 4, 1, // length 2
            3, 4, 1, // length 1
            5, 4, 1, // length 1
            7, 4, 1, // length 1
            0, 6, 1, // length 1
        ]
    }

    #[test]
    fn spaced_layout_is_valid() {
        assert!(PlacementGenome::new(spaced_genes()).is_valid());
    }

    #[test]
    fn overlapping_ships_fail_validation() {
        let mut genes = spaced_genes();
        // Move the second ship onto the first.
        genes[3] = 1;
        genes[4] = 0;
        assert!(!PlacementGenome::new(genes).is_valid());
    }

    #[test]
    fn out_of_range_genes_do_not_decode() {
        let mut genes = spaced_genes();
        genes[0] = -1;
        assert!(PlacementGenome::new(genes).decode().is_none());

        let mut genes = spaced_genes();
        genes[2] = 7;
        assert!(PlacementGenome::new(genes).decode().is_none());
    }

    #[test]
    fn overhanging_ship_decodes_but_is_invalid() {
        let mut genes = spaced_genes();
        // Length-4 ship starting at x=8 overhangs the right edge.
        genes[0] = 8;
        let genome = PlacementGenome::new(genes);
        assert!(genome.decode().is_some());
        assert!(!genome.is_valid());
    }

    #[test]
    fn gene_count_is_checked_on_rebuild() {
        let too_short = [0i32; 7];
        assert!(PlacementGenome::try_from(&too_short[..]).is_err());
        assert!(WeightGenome::try_from(&[0.0; 19][..]).is_err());
        assert!(WeightGenome::try_from(&[0.0; WEIGHT_GENES][..]).is_ok());
    }

    #[test]
    fn weight_lookup_follows_feature_order() {
        let mut weights = [0.0; WEIGHT_GENES];
        weights[0] = 0.25;
        let genome = WeightGenome::new(weights);
        assert_eq!(genome.weight_of(Feature::Heat), 0.25);
        assert_eq!(genome.weight_of(Feature::Parity), 0.0);
    }
}
