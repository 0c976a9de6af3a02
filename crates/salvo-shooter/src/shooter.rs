use rand::Rng;
use salvo_engine::{Board, ShotResult};

use crate::{
    features::{FEATURE_COUNT, HeatMap},
    monte_carlo::MonteCarloShooter,
    parity::ParityShooter,
    random::RandomShooter,
    weighted::WeightedShooter,
};

/// The closed set of opponent shooting policies.
///
/// The evolutionary core never needs to add shooter kinds at evaluation
/// time, so the capability is a tagged variant rather than an open trait
/// hierarchy. Each variant implements the same four operations: propose the
/// next shot, learn the result, reset for a new game, and name itself.
#[derive(Debug, Clone)]
pub enum Shooter {
    Random(RandomShooter),
    Parity(ParityShooter),
    MonteCarlo(MonteCarloShooter),
    Weighted(WeightedShooter),
}

impl Shooter {
    #[must_use]
    pub fn random() -> Self {
        Shooter::Random(RandomShooter::new())
    }

    #[must_use]
    pub fn parity() -> Self {
        Shooter::Parity(ParityShooter::new())
    }

    #[must_use]
    pub fn monte_carlo(iterations: u32) -> Self {
        Shooter::MonteCarlo(MonteCarloShooter::new(iterations))
    }

    #[must_use]
    pub fn weighted(weights: [f64; FEATURE_COUNT], heat: HeatMap) -> Self {
        Shooter::Weighted(WeightedShooter::new(weights, heat))
    }

    /// Proposes the next shot, or `None` when no untried cell remains.
    pub fn next_shot<R>(&mut self, board: &Board, rng: &mut R) -> Option<(u8, u8)>
    where
        R: Rng + ?Sized,
    {
        match self {
            Shooter::Random(s) => s.next_shot(board, rng),
            Shooter::Parity(s) => s.next_shot(board, rng),
            Shooter::MonteCarlo(s) => s.next_shot(board, rng),
            Shooter::Weighted(s) => s.next_shot(board, rng),
        }
    }

    /// Reports the outcome of the last shot back to the policy.
    pub fn notify_result(&mut self, x: u8, y: u8, result: ShotResult, board: &Board) {
        match self {
            Shooter::Random(s) => s.notify_result(x, y, result, board),
            Shooter::Parity(s) => s.notify_result(x, y, result, board),
            Shooter::MonteCarlo(s) => s.notify_result(x, y, result, board),
            Shooter::Weighted(s) => s.notify_result(x, y, result, board),
        }
    }

    /// Clears per-game state so the policy can start a fresh game.
    pub fn reset(&mut self) {
        match self {
            Shooter::Random(s) => s.reset(),
            Shooter::Parity(s) => s.reset(),
            Shooter::MonteCarlo(s) => s.reset(),
            Shooter::Weighted(s) => s.reset(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Shooter::Random(_) => "random",
            Shooter::Parity(_) => "parity",
            Shooter::MonteCarlo(_) => "monte-carlo",
            Shooter::Weighted(_) => "weighted",
        }
    }
}
