//! Scratch occupancy grids shared by the generator and the repair operator.

use salvo_engine::GRID_SIZE;

pub(crate) const GRID: usize = GRID_SIZE as usize;
const MAX: i32 = GRID_SIZE as i32 - 1;

fn cell(x: i32, y: i32, step: i32, horizontal: bool) -> (i32, i32) {
    if horizontal {
        (x + step, y)
    } else {
        (x, y + step)
    }
}

fn on_grid(x: i32, y: i32) -> bool {
    (0..=MAX).contains(&x) && (0..=MAX).contains(&y)
}

/// Cell-occupancy grid for incremental fleet construction.
///
/// Only ship cells are marked; the fit check enforces the no-touch rule by
/// also refusing cells whose 8-neighborhood holds a mark.
#[derive(Debug, Clone)]
pub(crate) struct OccupancyGrid {
    cells: [[bool; GRID]; GRID],
}

impl OccupancyGrid {
    pub(crate) fn new() -> Self {
        Self {
            cells: [[false; GRID]; GRID],
        }
    }

    /// Whether a ship fits: fully in bounds, every cell free, and no cell
    /// adjacent to an occupied one.
    pub(crate) fn fits(&self, x: i32, y: i32, length: i32, horizontal: bool) -> bool {
        let (tail_x, tail_y) = cell(x, y, length - 1, horizontal);
        if !on_grid(x, y) || !on_grid(tail_x, tail_y) {
            return false;
        }
        for step in 0..length {
            let (cx, cy) = cell(x, y, step, horizontal);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (cx + dx, cy + dy);
                    #[expect(clippy::cast_sign_loss)]
                    if on_grid(nx, ny) && self.cells[ny as usize][nx as usize] {
                        return false;
                    }
                }
            }
        }
        true
    }

    pub(crate) fn mark(&mut self, x: i32, y: i32, length: i32, horizontal: bool) {
        for step in 0..length {
            let (cx, cy) = cell(x, y, step, horizontal);
            if on_grid(cx, cy) {
                #[expect(clippy::cast_sign_loss)]
                {
                    self.cells[cy as usize][cx as usize] = true;
                }
            }
        }
    }
}

/// Counted halo grid used by repair.
///
/// Every ship stamps its cells *and* their 8-neighborhoods, so a cell with a
/// zero count is both unoccupied and clear of every other ship's halo.
/// Counts make unstamping exact when halos overlap.
#[derive(Debug, Clone)]
pub(crate) struct HaloGrid {
    counts: [[i32; GRID]; GRID],
}

impl HaloGrid {
    pub(crate) fn new() -> Self {
        Self {
            counts: [[0; GRID]; GRID],
        }
    }

    /// Adds (`delta = 1`) or removes (`delta = -1`) a ship's footprint and
    /// halo. Cells falling off the grid are skipped, which keeps stamping
    /// total even for corrupt gene values.
    pub(crate) fn stamp(&mut self, x: i32, y: i32, length: i32, horizontal: bool, delta: i32) {
        for step in 0..length {
            let (cx, cy) = cell(x, y, step, horizontal);
            if !on_grid(cx, cy) {
                continue;
            }
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if on_grid(nx, ny) {
                        #[expect(clippy::cast_sign_loss)]
                        {
                            self.counts[ny as usize][nx as usize] += delta;
                        }
                    }
                }
            }
        }
    }

    /// Whether a ship can sit here: fully in bounds with a zero count under
    /// every cell.
    pub(crate) fn is_clear(&self, x: i32, y: i32, length: i32, horizontal: bool) -> bool {
        let (tail_x, tail_y) = cell(x, y, length - 1, horizontal);
        if !on_grid(x, y) || !on_grid(tail_x, tail_y) {
            return false;
        }
        (0..length).all(|step| {
            let (cx, cy) = cell(x, y, step, horizontal);
            #[expect(clippy::cast_sign_loss)]
            let count = self.counts[cy as usize][cx as usize];
            count == 0
        })
    }
}
