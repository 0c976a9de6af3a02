//! Bit-stable binary snapshots for resumable runs.
//!
//! The layout is fixed little-endian so snapshots written by one build are
//! readable by any other tool that speaks the format:
//!
//! ```text
//! u32  generation
//! f64  mutation rate
//! u64  population size
//! per genome:
//!     u64  gene count
//!     genes        (i32 each for placements, f64 each for weights)
//!     f64  fitness
//!     f64 x3       per-opponent mean shots (placement snapshots only)
//! ```

use std::io::{self, Read, Write};

use crate::chromosome::{
    OpponentMeans, PLACEMENT_GENES, PlacementGenome, WEIGHT_GENES, WeightGenome,
};

/// Snapshot serialization failures.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SnapshotError {
    #[display("snapshot I/O failed: {_0}")]
    Io(io::Error),
    #[display("expected {expected} genes per genome, got {actual}")]
    GeneCount { expected: usize, actual: usize },
    #[display("snapshot header is inconsistent")]
    Corrupt,
}

/// Persisted state of a placement-evolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSnapshot {
    pub generation: u32,
    pub mutation_rate: f64,
    pub population: Vec<PlacementGenome>,
}

impl PlacementSnapshot {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SnapshotError> {
        write_header(writer, self.generation, self.mutation_rate, self.population.len())?;
        for genome in &self.population {
            writer.write_all(&(PLACEMENT_GENES as u64).to_le_bytes())?;
            for gene in genome.genes() {
                writer.write_all(&gene.to_le_bytes())?;
            }
            writer.write_all(&genome.fitness().to_le_bytes())?;
            let means = genome.opponent_means();
            writer.write_all(&means.random.to_le_bytes())?;
            writer.write_all(&means.parity.to_le_bytes())?;
            writer.write_all(&means.monte_carlo.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, SnapshotError> {
        let (generation, mutation_rate, count) = read_header(reader)?;
        let mut population = Vec::with_capacity(count);
        for _ in 0..count {
            let gene_count = read_usize(reader)?;
            if gene_count != PLACEMENT_GENES {
                return Err(SnapshotError::GeneCount {
                    expected: PLACEMENT_GENES,
                    actual: gene_count,
                });
            }
            let mut genes = [0i32; PLACEMENT_GENES];
            for gene in &mut genes {
                *gene = read_i32(reader)?;
            }
            let mut genome = PlacementGenome::new(genes);
            genome.set_fitness(read_f64(reader)?);
            genome.set_opponent_means(OpponentMeans {
                random: read_f64(reader)?,
                parity: read_f64(reader)?,
                monte_carlo: read_f64(reader)?,
            });
            population.push(genome);
        }
        Ok(Self {
            generation,
            mutation_rate,
            population,
        })
    }
}

/// Persisted state of a weight-evolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSnapshot {
    pub generation: u32,
    pub mutation_rate: f64,
    pub population: Vec<WeightGenome>,
}

impl WeightSnapshot {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SnapshotError> {
        write_header(writer, self.generation, self.mutation_rate, self.population.len())?;
        for genome in &self.population {
            writer.write_all(&(WEIGHT_GENES as u64).to_le_bytes())?;
            for weight in genome.weights() {
                writer.write_all(&weight.to_le_bytes())?;
            }
            writer.write_all(&genome.fitness().to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, SnapshotError> {
        let (generation, mutation_rate, count) = read_header(reader)?;
        let mut population = Vec::with_capacity(count);
        for _ in 0..count {
            let gene_count = read_usize(reader)?;
            if gene_count != WEIGHT_GENES {
                return Err(SnapshotError::GeneCount {
                    expected: WEIGHT_GENES,
                    actual: gene_count,
                });
            }
            let mut weights = [0.0f64; WEIGHT_GENES];
            for weight in &mut weights {
                *weight = read_f64(reader)?;
            }
            let mut genome = WeightGenome::new(weights);
            genome.set_fitness(read_f64(reader)?);
            population.push(genome);
        }
        Ok(Self {
            generation,
            mutation_rate,
            population,
        })
    }
}

fn write_header<W: Write>(
    writer: &mut W,
    generation: u32,
    mutation_rate: f64,
    population_size: usize,
) -> Result<(), SnapshotError> {
    writer.write_all(&generation.to_le_bytes())?;
    writer.write_all(&mutation_rate.to_le_bytes())?;
    writer.write_all(&(population_size as u64).to_le_bytes())?;
    Ok(())
}

fn read_header<R: Read>(reader: &mut R) -> Result<(u32, f64, usize), SnapshotError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    let generation = u32::from_le_bytes(buf);
    let mutation_rate = read_f64(reader)?;
    let count = read_usize(reader)?;
    Ok((generation, mutation_rate, count))
}

fn read_usize<R: Read>(reader: &mut R) -> Result<usize, SnapshotError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    usize::try_from(u64::from_le_bytes(buf)).map_err(|_| SnapshotError::Corrupt)
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, SnapshotError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64, SnapshotError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PlacementGenerator;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn placement_snapshot_round_trips() {
        let generator = PlacementGenerator::default();
        let mut rng = Pcg64Mcg::seed_from_u64(51);
        let mut population = generator.generate_population(5, &mut rng);
        for (i, genome) in population.iter_mut().enumerate() {
            #[expect(clippy::cast_precision_loss)]
            genome.set_fitness(60.0 + i as f64);
            genome.set_opponent_means(OpponentMeans {
                random: 80.0,
                parity: 55.5,
                monte_carlo: 47.25,
            });
        }
        let snapshot = PlacementSnapshot {
            generation: 12,
            mutation_rate: 0.25,
            population,
        };

        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes).unwrap();
        let loaded = PlacementSnapshot::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.generation, 12);
        assert_eq!(loaded.mutation_rate, 0.25);
        assert_eq!(loaded.population.len(), 5);
        for (original, loaded) in snapshot.population.iter().zip(&loaded.population) {
            assert_eq!(original.genes(), loaded.genes());
            assert_eq!(original.fitness(), loaded.fitness());
            assert_eq!(original.opponent_means(), loaded.opponent_means());
        }
    }

    #[test]
    fn weight_snapshot_round_trips() {
        let mut genome = WeightGenome::new([0.5; WEIGHT_GENES]);
        genome.set_fitness(-49.5);
        let snapshot = WeightSnapshot {
            generation: 3,
            mutation_rate: 0.3,
            population: vec![genome],
        };

        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes).unwrap();
        let loaded = WeightSnapshot::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn byte_layout_is_stable() {
        let snapshot = WeightSnapshot {
            generation: 1,
            mutation_rate: 0.5,
            population: Vec::new(),
        };
        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes).unwrap();
        // u32 generation + f64 rate + u64 count, all little-endian.
        assert_eq!(bytes.len(), 4 + 8 + 8);
        assert_eq!(&bytes[..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..12], &0.5f64.to_le_bytes());
        assert_eq!(&bytes[12..], &0u64.to_le_bytes());
    }

    #[test]
    fn truncated_snapshot_is_an_error() {
        let mut genome = WeightGenome::new([0.5; WEIGHT_GENES]);
        genome.set_fitness(-49.5);
        let snapshot = WeightSnapshot {
            generation: 3,
            mutation_rate: 0.3,
            population: vec![genome],
        };
        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(WeightSnapshot::read_from(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn wrong_gene_count_is_an_error() {
        // A weight snapshot read as a placement snapshot trips the
        // gene-count check (20 != 30).
        let mut genome = WeightGenome::new([0.0; WEIGHT_GENES]);
        genome.set_fitness(0.0);
        let snapshot = WeightSnapshot {
            generation: 0,
            mutation_rate: 0.1,
            population: vec![genome],
        };
        let mut bytes = Vec::new();
        snapshot.write_to(&mut bytes).unwrap();
        assert!(matches!(
            PlacementSnapshot::read_from(&mut bytes.as_slice()),
            Err(SnapshotError::GeneCount {
                expected: PLACEMENT_GENES,
                actual: WEIGHT_GENES
            })
        ));
    }
}
