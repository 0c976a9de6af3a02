use arrayvec::ArrayVec;

use crate::GRID_SIZE;

/// Orientation of a ship on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A single ship: a line segment of 1-4 cells on the grid.
///
/// The origin `(x, y)` is the leftmost cell of a horizontal ship or the
/// topmost cell of a vertical one. A ship may describe an out-of-bounds
/// segment (its origin is always on the grid, but the tail may stick out);
/// [`Ship::is_within_bounds`] distinguishes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    x: u8,
    y: u8,
    length: u8,
    orientation: Orientation,
}

impl Ship {
    /// Longest ship length in the standard fleet.
    pub const MAX_LENGTH: usize = 4;

    /// Creates a ship at the given origin.
    ///
    /// # Panics
    ///
    /// Panics if the origin is off the grid or the length is not 1-4.
    #[must_use]
    pub fn new(x: u8, y: u8, length: u8, orientation: Orientation) -> Self {
        assert!(x < GRID_SIZE && y < GRID_SIZE, "ship origin must be on the grid");
        assert!(
            (1..=Self::MAX_LENGTH as u8).contains(&length),
            "ship length must be 1-4"
        );
        Self {
            x,
            y,
            length,
            orientation,
        }
    }

    #[must_use]
    pub fn x(&self) -> u8 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> u8 {
        self.y
    }

    #[must_use]
    pub fn length(&self) -> u8 {
        self.length
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    /// Returns the cells occupied by this ship, including any that fall
    /// outside the grid.
    #[must_use]
    pub fn cells(&self) -> ArrayVec<(u8, u8), { Ship::MAX_LENGTH }> {
        let mut cells = ArrayVec::new();
        for i in 0..self.length {
            match self.orientation {
                Orientation::Horizontal => cells.push((self.x + i, self.y)),
                Orientation::Vertical => cells.push((self.x, self.y + i)),
            }
        }
        cells
    }

    /// Returns whether the whole segment lies on the grid.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        match self.orientation {
            Orientation::Horizontal => self.x + self.length <= GRID_SIZE,
            Orientation::Vertical => self.y + self.length <= GRID_SIZE,
        }
    }

    /// Returns whether this ship occupies the given cell.
    #[must_use]
    pub fn occupies(&self, x: u8, y: u8) -> bool {
        self.cells().contains(&(x, y))
    }

    /// Returns whether this ship shares a cell with `other`.
    #[must_use]
    pub fn intersects(&self, other: &Ship) -> bool {
        let other_cells = other.cells();
        self.cells().iter().any(|c| other_cells.contains(c))
    }

    /// Returns whether any cell of this ship is within Chebyshev distance 1
    /// of any cell of `other` (the no-touch rule; shared cells count too).
    #[must_use]
    pub fn touches(&self, other: &Ship) -> bool {
        let other_cells = other.cells();
        self.cells().iter().any(|&(ax, ay)| {
            other_cells.iter().any(|&(bx, by)| {
                let dx = i16::from(ax).abs_diff(i16::from(bx));
                let dy = i16::from(ay).abs_diff(i16::from(by));
                dx.max(dy) <= 1
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_of_horizontal_ship() {
        let ship = Ship::new(2, 5, 3, Orientation::Horizontal);
        assert_eq!(ship.cells().as_slice(), &[(2, 5), (3, 5), (4, 5)]);
    }

    #[test]
    fn cells_of_vertical_ship() {
        let ship = Ship::new(7, 1, 4, Orientation::Vertical);
        assert_eq!(ship.cells().as_slice(), &[(7, 1), (7, 2), (7, 3), (7, 4)]);
    }

    #[test]
    fn bounds_check_catches_overhang() {
        assert!(Ship::new(6, 0, 4, Orientation::Horizontal).is_within_bounds());
        assert!(!Ship::new(7, 0, 4, Orientation::Horizontal).is_within_bounds());
        assert!(!Ship::new(0, 8, 3, Orientation::Vertical).is_within_bounds());
    }

    #[test]
    fn intersect_and_touch() {
        let a = Ship::new(0, 0, 4, Orientation::Horizontal);
        let overlapping = Ship::new(2, 0, 3, Orientation::Vertical);
        let diagonal_neighbor = Ship::new(4, 1, 2, Orientation::Horizontal);
        let clear = Ship::new(0, 2, 3, Orientation::Horizontal);

        assert!(a.intersects(&overlapping));
        assert!(a.touches(&overlapping));
        assert!(!a.intersects(&diagonal_neighbor));
        assert!(a.touches(&diagonal_neighbor));
        assert!(!a.intersects(&clear));
        assert!(!a.touches(&clear));
    }
}
