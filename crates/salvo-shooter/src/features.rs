//! The named cell features scored by the weighted shooter.
//!
//! Each candidate cell is described by a 20-dimensional feature vector; the
//! shooter's weight genome assigns one weight per feature and fires at the
//! cell with the highest weighted sum. Features are computed from public
//! information only: the shot history, the board's shot states, and an
//! occupancy heat map supplied by the caller (the fraction of reference
//! placements in which each cell holds a ship).
//!
//! Feature values are kept in roughly comparable ranges (most are fractions
//! or indicator values) so that the weight bounds used during evolution mean
//! the same thing for every feature.

use rand::Rng;
use salvo_engine::{Board, GRID_SIZE, ShotResult};

/// Grid side length as a `usize`, for indexing.
pub(crate) const GRID: usize = GRID_SIZE as usize;

/// Number of cell features (and of weight-genome genes).
pub const FEATURE_COUNT: usize = 20;

/// Per-cell occupancy fractions derived from a set of reference placements.
pub type HeatMap = [[f64; GRID]; GRID];

/// One entry of a shooter's shot history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotRecord {
    pub x: u8,
    pub y: u8,
    pub result: ShotResult,
}

/// The closed set of cell features, in weight-genome gene order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Fraction of reference placements in which the cell holds a ship.
    Heat,
    /// A 4-neighbor of the cell holds a hit.
    HitNeighbor,
    /// A diagonal neighbor of the cell holds a hit.
    DiagHitNeighbor,
    /// Checkerboard parity of the cell.
    Parity,
    /// Proximity to the nearest hit, `1 / (1 + distance)`.
    DistLastHit,
    /// Fraction of misses in the radius-2 neighborhood.
    MissCluster,
    /// Fraction of untried cells in the cell's row.
    RowFree,
    /// Fraction of untried cells in the cell's column.
    ColFree,
    /// Proximity to the grid center.
    CenterBias,
    /// Cell lies on the border.
    EdgeBias,
    /// Cell lies in a corner.
    Corner,
    /// A length-4 ship could start at this cell.
    FitLength4,
    /// A length-3 ship could start at this cell.
    FitLength3,
    /// A length-2 ship could start at this cell.
    FitLength2,
    /// A length-1 ship could occupy this cell.
    FitLength1,
    /// A recent miss lies within distance 2 of the cell.
    RecentMissPenalty,
    /// Age-discounted influence of nearby hits.
    TimeDecayHit,
    /// Age-discounted influence of nearby misses.
    TimeDecayMiss,
    /// Uniform noise for tie-breaking.
    RandomNoise,
    /// Parity flipped by the shot counter.
    IterationParityFlip,
}

impl Feature {
    /// All features in gene order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Heat,
        Feature::HitNeighbor,
        Feature::DiagHitNeighbor,
        Feature::Parity,
        Feature::DistLastHit,
        Feature::MissCluster,
        Feature::RowFree,
        Feature::ColFree,
        Feature::CenterBias,
        Feature::EdgeBias,
        Feature::Corner,
        Feature::FitLength4,
        Feature::FitLength3,
        Feature::FitLength2,
        Feature::FitLength1,
        Feature::RecentMissPenalty,
        Feature::TimeDecayHit,
        Feature::TimeDecayMiss,
        Feature::RandomNoise,
        Feature::IterationParityFlip,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Feature::Heat => "Heat",
            Feature::HitNeighbor => "HitNeighbor",
            Feature::DiagHitNeighbor => "DiagHitNeighbor",
            Feature::Parity => "Parity",
            Feature::DistLastHit => "DistLastHit",
            Feature::MissCluster => "MissCluster",
            Feature::RowFree => "RowFree",
            Feature::ColFree => "ColFree",
            Feature::CenterBias => "CenterBias",
            Feature::EdgeBias => "EdgeBias",
            Feature::Corner => "Corner",
            Feature::FitLength4 => "FitLength4",
            Feature::FitLength3 => "FitLength3",
            Feature::FitLength2 => "FitLength2",
            Feature::FitLength1 => "FitLength1",
            Feature::RecentMissPenalty => "RecentMissPenalty",
            Feature::TimeDecayHit => "TimeDecayHit",
            Feature::TimeDecayMiss => "TimeDecayMiss",
            Feature::RandomNoise => "RandomNoise",
            Feature::IterationParityFlip => "IterationParityFlip",
        }
    }

    /// Weight-genome initialization range for this feature.
    ///
    /// The ranges encode a weak prior on each feature's usefulness (for
    /// example, hit-adjacency starts positive and miss-density starts
    /// negative); evolution is free to move weights anywhere within the
    /// configured symmetric bound afterwards.
    #[must_use]
    pub fn init_range(self) -> (f64, f64) {
        match self {
            Feature::Heat => (0.0, 1.0),
            Feature::HitNeighbor => (1.0, 3.0),
            Feature::DiagHitNeighbor => (0.5, 2.0),
            Feature::Parity => (-1.0, 1.0),
            Feature::DistLastHit => (0.0, 2.0),
            Feature::MissCluster => (-2.0, 0.0),
            Feature::RowFree => (0.0, 1.0),
            Feature::ColFree => (0.0, 1.0),
            Feature::CenterBias => (-1.0, 1.0),
            Feature::EdgeBias => (-1.0, 1.0),
            Feature::Corner => (-1.0, 1.0),
            Feature::FitLength4 => (0.0, 2.0),
            Feature::FitLength3 => (0.0, 1.5),
            Feature::FitLength2 => (0.0, 1.0),
            Feature::FitLength1 => (-0.5, 0.5),
            Feature::RecentMissPenalty => (-2.0, 0.0),
            Feature::TimeDecayHit => (-1.0, 1.0),
            Feature::TimeDecayMiss => (-1.0, 1.0),
            Feature::RandomNoise => (0.0, 0.2),
            Feature::IterationParityFlip => (-0.5, 0.5),
        }
    }
}

/// Everything needed to compute a cell's feature vector.
pub struct FeatureContext<'a> {
    pub board: &'a Board,
    pub history: &'a [ShotRecord],
    pub heat: &'a HeatMap,
    /// Number of shots already fired this game.
    pub iteration: usize,
}

const ORTHOGONAL: [(i16, i16); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i16, i16); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

fn in_grid(x: i16, y: i16) -> bool {
    (0..GRID as i16).contains(&x) && (0..GRID as i16).contains(&y)
}

fn distance(ax: u8, ay: u8, bx: u8, by: u8) -> f64 {
    let dx = f64::from(ax) - f64::from(bx);
    let dy = f64::from(ay) - f64::from(by);
    dx.hypot(dy)
}

impl FeatureContext<'_> {
    /// Computes the full feature vector for one cell.
    pub fn feature_vector<R>(&self, x: u8, y: u8, rng: &mut R) -> [f64; FEATURE_COUNT]
    where
        R: Rng + ?Sized,
    {
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, feature) in values.iter_mut().zip(Feature::ALL) {
            *slot = match feature {
                Feature::Heat => self.heat_at(x, y),
                Feature::HitNeighbor => self.neighbor_hit(x, y, &ORTHOGONAL),
                Feature::DiagHitNeighbor => self.neighbor_hit(x, y, &DIAGONAL),
                Feature::Parity => f64::from((x + y) % 2),
                Feature::DistLastHit => self.dist_last_hit(x, y),
                Feature::MissCluster => self.miss_cluster(x, y),
                Feature::RowFree => self.row_free(y),
                Feature::ColFree => self.col_free(x),
                Feature::CenterBias => center_bias(x, y),
                Feature::EdgeBias => f64::from(u8::from(is_edge(x, y))),
                Feature::Corner => f64::from(u8::from(is_corner(x, y))),
                Feature::FitLength4 => self.fit_length(x, y, 4),
                Feature::FitLength3 => self.fit_length(x, y, 3),
                Feature::FitLength2 => self.fit_length(x, y, 2),
                Feature::FitLength1 => self.fit_length(x, y, 1),
                Feature::RecentMissPenalty => self.recent_miss_penalty(x, y),
                Feature::TimeDecayHit => self.time_decay(x, y, true),
                Feature::TimeDecayMiss => self.time_decay(x, y, false),
                Feature::RandomNoise => rng.random_range(0.0..0.1),
                Feature::IterationParityFlip => {
                    f64::from(u8::from((usize::from(x + y) + self.iteration) % 2 == 1))
                }
            };
        }
        values
    }

    fn heat_at(&self, x: u8, y: u8) -> f64 {
        // Before the first shot every cell is treated as equally likely.
        if self.history.is_empty() {
            0.5
        } else {
            self.heat[y as usize][x as usize]
        }
    }

    fn neighbor_hit(&self, x: u8, y: u8, offsets: &[(i16, i16)]) -> f64 {
        for &(dx, dy) in offsets {
            let nx = i16::from(x) + dx;
            let ny = i16::from(y) + dy;
            if !in_grid(nx, ny) {
                continue;
            }
            #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let (nx, ny) = (nx as u8, ny as u8);
            if self
                .history
                .iter()
                .any(|r| r.x == nx && r.y == ny && r.result.is_hit())
            {
                return 1.0;
            }
        }
        0.0
    }

    fn dist_last_hit(&self, x: u8, y: u8) -> f64 {
        let mut min_dist = 100.0_f64;
        for record in self.history {
            if record.result.is_hit() {
                min_dist = min_dist.min(distance(x, y, record.x, record.y));
            }
        }
        1.0 / (1.0 + min_dist)
    }

    fn miss_cluster(&self, x: u8, y: u8) -> f64 {
        let mut miss_count = 0u32;
        let mut total = 0u32;
        for dy in -2..=2i16 {
            for dx in -2..=2i16 {
                let nx = i16::from(x) + dx;
                let ny = i16::from(y) + dy;
                if !in_grid(nx, ny) {
                    continue;
                }
                total += 1;
                #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let (nx, ny) = (nx as u8, ny as u8);
                if self
                    .history
                    .iter()
                    .any(|r| r.x == nx && r.y == ny && r.result == ShotResult::Miss)
                {
                    miss_count += 1;
                }
            }
        }
        f64::from(miss_count) / f64::from(total)
    }

    #[expect(clippy::cast_precision_loss)]
    fn row_free(&self, y: u8) -> f64 {
        let free = (0..GRID_SIZE)
            .filter(|&x| !self.board.was_shot_at(x, y))
            .count();
        free as f64 / GRID as f64
    }

    #[expect(clippy::cast_precision_loss)]
    fn col_free(&self, x: u8) -> f64 {
        let free = (0..GRID_SIZE)
            .filter(|&y| !self.board.was_shot_at(x, y))
            .count();
        free as f64 / GRID as f64
    }

    fn fit_length(&self, x: u8, y: u8, length: u8) -> f64 {
        let horizontal = (0..length).all(|i| {
            let cx = x + i;
            cx < GRID_SIZE && !self.board.was_shot_at(cx, y)
        });
        let vertical = (0..length).all(|i| {
            let cy = y + i;
            cy < GRID_SIZE && !self.board.was_shot_at(x, cy)
        });
        f64::from(u8::from(horizontal || vertical))
    }

    fn recent_miss_penalty(&self, x: u8, y: u8) -> f64 {
        let recent = self.history.len().saturating_sub(5);
        let miss_nearby = self.history[recent..].iter().any(|r| {
            r.result == ShotResult::Miss && distance(x, y, r.x, r.y) <= 2.0
        });
        f64::from(u8::from(miss_nearby))
    }

    fn time_decay(&self, x: u8, y: u8, hits: bool) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss)]
        let len = self.history.len() as f64;
        let mut max_influence = 0.0_f64;
        for (i, record) in self.history.iter().enumerate() {
            if record.result.is_hit() != hits {
                continue;
            }
            let dist = distance(x, y, record.x, record.y);
            #[expect(clippy::cast_precision_loss)]
            let age = i as f64 / len;
            max_influence = max_influence.max((-dist).exp() * (1.0 - age));
        }
        max_influence
    }
}

fn center_bias(x: u8, y: u8) -> f64 {
    const CENTER: f64 = 4.5;
    // sqrt(50) is the largest possible distance from the center.
    const MAX_DIST: f64 = 7.07;
    let dist = (f64::from(x) - CENTER).hypot(f64::from(y) - CENTER);
    1.0 - dist / MAX_DIST
}

fn is_edge(x: u8, y: u8) -> bool {
    x == 0 || x == GRID_SIZE - 1 || y == 0 || y == GRID_SIZE - 1
}

fn is_corner(x: u8, y: u8) -> bool {
    (x == 0 || x == GRID_SIZE - 1) && (y == 0 || y == GRID_SIZE - 1)
}
