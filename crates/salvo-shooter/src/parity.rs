use std::collections::{HashSet, VecDeque};

use rand::{Rng, seq::IndexedRandom as _};
use salvo_engine::{Board, ShotResult};

use crate::random::{orthogonal_neighbors, untried_cells};

/// Hunt-target shooter with checkerboard hunting.
///
/// In hunt mode it fires only at cells of one checkerboard color (enough to
/// find every ship of length >= 2 and, eventually, the singletons too once
/// that color runs out). After a hit it switches to target mode: it infers
/// the ship's orientation from collinear hits and extends the line at both
/// ends. Cells adjacent to sunk ships are excluded permanently, since the
/// no-touch rule guarantees they are empty.
#[derive(Debug, Clone, Default)]
pub struct ParityShooter {
    open_hits: Vec<(u8, u8)>,
    target_queue: VecDeque<(u8, u8)>,
    excluded: HashSet<(u8, u8)>,
}

impl ParityShooter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_shot<R>(&mut self, board: &Board, rng: &mut R) -> Option<(u8, u8)>
    where
        R: Rng + ?Sized,
    {
        while let Some((x, y)) = self.target_queue.pop_front() {
            if !board.was_shot_at(x, y) && !self.excluded.contains(&(x, y)) {
                return Some((x, y));
            }
        }

        let available: Vec<(u8, u8)> = untried_cells(board)
            .filter(|cell| !self.excluded.contains(cell))
            .collect();
        let preferred: Vec<(u8, u8)> = available
            .iter()
            .copied()
            .filter(|&(x, y)| (x + y) % 2 == 0)
            .collect();

        if let Some(&cell) = preferred.choose(rng) {
            return Some(cell);
        }
        if let Some(&cell) = available.choose(rng) {
            return Some(cell);
        }
        // Exclusions may be stale when two ships sat unusually close; fall
        // back to any untried cell rather than give up the game.
        untried_cells(board).collect::<Vec<_>>().choose(rng).copied()
    }

    pub fn notify_result(&mut self, x: u8, y: u8, result: ShotResult, _board: &Board) {
        match result {
            ShotResult::Hit => {
                self.open_hits.push((x, y));
                self.rebuild_target_queue();
            }
            ShotResult::Sunk => {
                self.open_hits.push((x, y));
                self.exclude_halo_of_open_hits();
                self.open_hits.clear();
                self.target_queue.clear();
            }
            ShotResult::Miss => {}
        }
    }

    pub fn reset(&mut self) {
        self.open_hits.clear();
        self.target_queue.clear();
        self.excluded.clear();
    }

    /// Rebuilds the finishing queue from the current open hits, preferring
    /// the two line extensions once the orientation is known.
    fn rebuild_target_queue(&mut self) {
        self.target_queue.clear();

        let (&(first_x, first_y), rest) = match self.open_hits.split_first() {
            Some(split) => split,
            None => return,
        };
        let horizontal = !rest.is_empty() && rest.iter().all(|&(_, y)| y == first_y);
        let vertical = !rest.is_empty() && rest.iter().all(|&(x, _)| x == first_x);

        if horizontal {
            let min_x = self.open_hits.iter().map(|&(x, _)| x).min().unwrap_or(first_x);
            let max_x = self.open_hits.iter().map(|&(x, _)| x).max().unwrap_or(first_x);
            if min_x > 0 {
                self.target_queue.push_back((min_x - 1, first_y));
            }
            if max_x + 1 < salvo_engine::GRID_SIZE {
                self.target_queue.push_back((max_x + 1, first_y));
            }
        } else if vertical {
            let min_y = self.open_hits.iter().map(|&(_, y)| y).min().unwrap_or(first_y);
            let max_y = self.open_hits.iter().map(|&(_, y)| y).max().unwrap_or(first_y);
            if min_y > 0 {
                self.target_queue.push_back((first_x, min_y - 1));
            }
            if max_y + 1 < salvo_engine::GRID_SIZE {
                self.target_queue.push_back((first_x, max_y + 1));
            }
        } else {
            for &(hx, hy) in &self.open_hits {
                for neighbor in orthogonal_neighbors(hx, hy) {
                    self.target_queue.push_back(neighbor);
                }
            }
        }
    }

    fn exclude_halo_of_open_hits(&mut self) {
        for &(x, y) in &self.open_hits {
            for dy in -1..=1i16 {
                for dx in -1..=1i16 {
                    let nx = i16::from(x) + dx;
                    let ny = i16::from(y) + dy;
                    if (0..i16::from(salvo_engine::GRID_SIZE)).contains(&nx)
                        && (0..i16::from(salvo_engine::GRID_SIZE)).contains(&ny)
                    {
                        #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                        self.excluded.insert((nx as u8, ny as u8));
                    }
                }
            }
        }
    }
}
