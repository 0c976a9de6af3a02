use std::collections::VecDeque;

use rand::{Rng, seq::IndexedRandom as _};
use salvo_engine::{Board, GRID_SIZE, ShotResult};

/// Baseline shooter: uniform random fire over untried cells, with a simple
/// finishing queue once a ship has been hit.
#[derive(Debug, Clone, Default)]
pub struct RandomShooter {
    target_queue: VecDeque<(u8, u8)>,
}

impl RandomShooter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_shot<R>(&mut self, board: &Board, rng: &mut R) -> Option<(u8, u8)>
    where
        R: Rng + ?Sized,
    {
        while let Some((x, y)) = self.target_queue.pop_front() {
            if !board.was_shot_at(x, y) {
                return Some((x, y));
            }
        }

        let candidates: Vec<(u8, u8)> = untried_cells(board).collect();
        candidates.choose(rng).copied()
    }

    pub fn notify_result(&mut self, x: u8, y: u8, result: ShotResult, _board: &Board) {
        match result {
            ShotResult::Hit => {
                for (nx, ny) in orthogonal_neighbors(x, y) {
                    self.target_queue.push_back((nx, ny));
                }
            }
            ShotResult::Sunk => self.target_queue.clear(),
            ShotResult::Miss => {}
        }
    }

    pub fn reset(&mut self) {
        self.target_queue.clear();
    }
}

pub(crate) fn untried_cells(board: &Board) -> impl Iterator<Item = (u8, u8)> + '_ {
    (0..GRID_SIZE)
        .flat_map(|y| (0..GRID_SIZE).map(move |x| (x, y)))
        .filter(|&(x, y)| !board.was_shot_at(x, y))
}

pub(crate) fn orthogonal_neighbors(x: u8, y: u8) -> impl Iterator<Item = (u8, u8)> {
    [(-1i16, 0i16), (1, 0), (0, -1), (0, 1)]
        .into_iter()
        .filter_map(move |(dx, dy)| {
            let nx = i16::from(x) + dx;
            let ny = i16::from(y) + dy;
            let in_grid = (0..i16::from(GRID_SIZE)).contains(&nx)
                && (0..i16::from(GRID_SIZE)).contains(&ny);
            #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let neighbor = (nx as u8, ny as u8);
            in_grid.then_some(neighbor)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn never_repeats_a_cell() {
        let mut board = Board::new();
        let mut shooter = RandomShooter::new();
        let mut rng = Pcg64Mcg::seed_from_u64(11);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let (x, y) = shooter.next_shot(&board, &mut rng).unwrap();
            assert!(seen.insert((x, y)), "cell ({x},{y}) fired at twice");
            let result = board.shoot(x, y);
            shooter.notify_result(x, y, result, &board);
        }
        assert!(shooter.next_shot(&board, &mut rng).is_none());
    }

    #[test]
    fn hit_enqueues_neighbors() {
        let board = Board::new();
        let mut shooter = RandomShooter::new();
        shooter.notify_result(4, 4, ShotResult::Hit, &board);
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        let (x, y) = shooter.next_shot(&board, &mut rng).unwrap();
        assert!(
            [(3, 4), (5, 4), (4, 3), (4, 5)].contains(&(x, y)),
            "expected a neighbor of the hit, got ({x},{y})"
        );
    }
}
