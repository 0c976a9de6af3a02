use std::collections::{HashSet, VecDeque};

use rand::{Rng, seq::IndexedRandom as _};
use salvo_engine::{Board, CellState, GRID_SIZE, ShotResult};

use crate::{
    features::GRID,
    random::{orthogonal_neighbors, untried_cells},
};

/// Per-sample placement tries before a remaining ship is skipped.
const PLACEMENT_TRIES: u32 = 20;

/// Probabilistic shooter: samples hypothetical placements of the remaining
/// ships consistent with everything observed so far, accumulates per-cell
/// occupancy counts, and fires at the most frequently occupied untried cell.
///
/// When an un-sunk hit is open, sampling is unnecessary: the shooter drops
/// into the same line-extension targeting as the parity shooter until the
/// ship goes down.
#[derive(Debug, Clone)]
pub struct MonteCarloShooter {
    iterations: u32,
    open_hits: Vec<(u8, u8)>,
    target_queue: VecDeque<(u8, u8)>,
}

impl MonteCarloShooter {
    #[must_use]
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            open_hits: Vec::new(),
            target_queue: VecDeque::new(),
        }
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

        let counts = self.sample_occupancy(board, rng);
        let best = untried_cells(board)
            .max_by_key(|&(x, y)| counts[y as usize][x as usize]);
        match best {
            Some(cell) if counts[cell.1 as usize][cell.0 as usize] > 0 => Some(cell),
            // No sample fit anywhere useful; fall back to a uniform pick.
            _ => untried_cells(board).collect::<Vec<_>>().choose(rng).copied(),
        }
    }

    pub fn notify_result(&mut self, x: u8, y: u8, result: ShotResult, _board: &Board) {
        match result {
            ShotResult::Hit => {
                self.open_hits.push((x, y));
                self.rebuild_target_queue();
            }
            ShotResult::Sunk => {
                self.open_hits.clear();
                self.target_queue.clear();
            }
            ShotResult::Miss => {}
        }
    }

    pub fn reset(&mut self) {
        self.open_hits.clear();
        self.target_queue.clear();
    }

    /// Accumulates occupancy counts over `iterations` sampled placements of
    /// the remaining ships. A sampled ship may not cover a miss, a sunk
    /// cell, or the no-touch halo of a sunk ship, and sampled ships keep the
    /// no-touch rule among themselves. Ships that cannot be placed within
    /// the try budget are skipped for that sample.
    fn sample_occupancy<R>(&self, board: &Board, rng: &mut R) -> [[u32; GRID]; GRID]
    where
        R: Rng + ?Sized,
    {
        let mut remaining = board.remaining_ship_lengths();
        remaining.sort_unstable_by(|a, b| b.cmp(a));
        let blocked = blocked_cells(board);

        let mut counts = [[0u32; GRID]; GRID];
        for _ in 0..self.iterations {
            let mut occupied = [[false; GRID]; GRID];
            for &len in &remaining {
                for _ in 0..PLACEMENT_TRIES {
                    let horizontal = rng.random_bool(0.5);
                    let (max_x, max_y) = if horizontal {
                        (GRID_SIZE - len, GRID_SIZE - 1)
                    } else {
                        (GRID_SIZE - 1, GRID_SIZE - len)
                    };
                    let x = rng.random_range(0..=max_x);
                    let y = rng.random_range(0..=max_y);

                    if !fits(x, y, len, horizontal, &blocked, &occupied) {
                        continue;
                    }
                    for i in 0..len {
                        let (cx, cy) = if horizontal { (x + i, y) } else { (x, y + i) };
                        occupied[cy as usize][cx as usize] = true;
                        if !board.was_shot_at(cx, cy) {
                            counts[cy as usize][cx as usize] += 1;
                        }
                    }
                    break;
                }
            }
        }
        counts
    }

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
            if max_x + 1 < GRID_SIZE {
                self.target_queue.push_back((max_x + 1, first_y));
            }
        } else if vertical {
            let min_y = self.open_hits.iter().map(|&(_, y)| y).min().unwrap_or(first_y);
            let max_y = self.open_hits.iter().map(|&(_, y)| y).max().unwrap_or(first_y);
            if min_y > 0 {
                self.target_queue.push_back((first_x, min_y - 1));
            }
            if max_y + 1 < GRID_SIZE {
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
}

fn fits(
    x: u8,
    y: u8,
    len: u8,
    horizontal: bool,
    blocked: &HashSet<(u8, u8)>,
    occupied: &[[bool; GRID]; GRID],
) -> bool {
    for i in 0..len {
        let (cx, cy) = if horizontal { (x + i, y) } else { (x, y + i) };
        if blocked.contains(&(cx, cy)) {
            return false;
        }
        // No-touch rule against the other ships of this sample.
        for dy in -1..=1i16 {
            for dx in -1..=1i16 {
                let nx = i16::from(cx) + dx;
                let ny = i16::from(cy) + dy;
                if (0..GRID as i16).contains(&nx) && (0..GRID as i16).contains(&ny) {
                    #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    if occupied[ny as usize][nx as usize] {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// Cells that cannot hold a remaining ship: shot cells plus the no-touch
/// halo around sunk ships.
fn blocked_cells(board: &Board) -> HashSet<(u8, u8)> {
    let mut blocked = HashSet::new();
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            if board.was_shot_at(x, y) {
                blocked.insert((x, y));
            }
            if board.cell(x, y) == CellState::Sunk {
                for dy in -1..=1i16 {
                    for dx in -1..=1i16 {
                        let nx = i16::from(x) + dx;
                        let ny = i16::from(y) + dy;
                        if (0..GRID as i16).contains(&nx) && (0..GRID as i16).contains(&ny) {
                            #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                            blocked.insert((nx as u8, ny as u8));
                        }
                    }
                }
            }
        }
    }
    blocked
}
