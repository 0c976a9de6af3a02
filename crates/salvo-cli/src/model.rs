use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exported result of a placement-evolution run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacementModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub best_fitness: f64,
    pub placements: Vec<PlacementRecord>,
}

/// One exported fleet layout with its evaluation statistics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacementRecord {
    pub genes: Vec<i32>,
    pub fitness: f64,
    pub mean_shots: f64,
    pub std_dev_shots: f64,
    pub mean_shots_random: f64,
    pub mean_shots_parity: f64,
    pub mean_shots_monte_carlo: f64,
}

/// Exported result of a weight-evolution run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeightModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f64,
    pub mean_shots: f64,
    pub std_dev_shots: f64,
    pub feature_weights: BTreeMap<String, f64>,
}
