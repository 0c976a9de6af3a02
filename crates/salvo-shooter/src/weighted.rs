use rand::Rng;
use salvo_engine::{Board, ShotResult};

use crate::features::{FEATURE_COUNT, FeatureContext, HeatMap, ShotRecord};
use crate::random::untried_cells;

/// Heat-map shooter driven by an evolved weight vector.
///
/// Every untried cell gets a score: the dot product of the weight vector and
/// the cell's feature vector. The shooter fires at the highest-scoring cell.
#[derive(Debug, Clone)]
pub struct WeightedShooter {
    weights: [f64; FEATURE_COUNT],
    heat: HeatMap,
    history: Vec<ShotRecord>,
}

impl WeightedShooter {
    #[must_use]
    pub fn new(weights: [f64; FEATURE_COUNT], heat: HeatMap) -> Self {
        Self {
            weights,
            heat,
            history: Vec::new(),
        }
    }

    pub fn next_shot<R>(&mut self, board: &Board, rng: &mut R) -> Option<(u8, u8)>
    where
        R: Rng + ?Sized,
    {
        let context = FeatureContext {
            board,
            history: &self.history,
            heat: &self.heat,
            iteration: self.history.len(),
        };

        let mut best: Option<((u8, u8), f64)> = None;
        for (x, y) in untried_cells(board) {
            let features = context.feature_vector(x, y, rng);
            let score: f64 = self
                .weights
                .iter()
                .zip(features)
                .map(|(w, f)| w * f)
                .sum();
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some(((x, y), score));
            }
        }
        best.map(|(cell, _)| cell)
    }

    pub fn notify_result(&mut self, x: u8, y: u8, result: ShotResult, _board: &Board) {
        self.history.push(ShotRecord { x, y, result });
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
