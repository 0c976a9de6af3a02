//! Fitness formulas for both genome kinds.
//!
//! Both searches sort descending, so higher is always better. A placement's
//! fitness is the importance-weighted mean of the shots each opponent needed
//! to sink it (a hardy layout forces more shots). A weight genome's fitness
//! is the negated mean shots it needed to win, plus a small stability bonus
//! for low variance.

use crate::chromosome::OpponentMeans;

/// Importance weight of the random opponent's mean.
pub const OPPONENT_WEIGHT_RANDOM: f64 = 0.20;
/// Importance weight of the parity opponent's mean.
pub const OPPONENT_WEIGHT_PARITY: f64 = 0.40;
/// Importance weight of the Monte Carlo opponent's mean.
pub const OPPONENT_WEIGHT_MONTE_CARLO: f64 = 0.40;

/// Sentinel fitness assigned to placements that fail validation.
pub const INVALID_PLACEMENT_FITNESS: f64 = -1000.0;

/// Stability-bonus factor in the weight-genome fitness.
pub const STABILITY_BONUS: f64 = 0.1;

/// Weighted mean shots-to-sink across the opponent panel.
#[must_use]
pub fn placement_fitness(means: OpponentMeans) -> f64 {
    OPPONENT_WEIGHT_RANDOM * means.random
        + OPPONENT_WEIGHT_PARITY * means.parity
        + OPPONENT_WEIGHT_MONTE_CARLO * means.monte_carlo
}

/// `-mean + 0.1 * std_dev`: fewer shots win, with a small reward for
/// consistent performance.
#[must_use]
pub fn weight_fitness(mean_shots: f64, std_dev_shots: f64) -> f64 {
    -mean_shots + STABILITY_BONUS * std_dev_shots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_fitness_weights_the_three_means() {
        let means = OpponentMeans {
            random: 80.0,
            parity: 60.0,
            monte_carlo: 50.0,
        };
        let expected = 0.20 * 80.0 + 0.40 * 60.0 + 0.40 * 50.0;
        assert!((placement_fitness(means) - expected).abs() < 1e-12);
    }

    /// Pins the sign convention: mean 50, stddev 5 must give -49.5.
    #[test]
    fn weight_fitness_sign_convention() {
        assert!((weight_fitness(50.0, 5.0) - (-49.5)).abs() < 1e-12);
    }

    #[test]
    fn fewer_shots_score_higher() {
        assert!(weight_fitness(40.0, 5.0) > weight_fitness(50.0, 5.0));
    }
}
