use crate::ship::Ship;

/// Number of ships in the standard fleet.
pub const SHIP_COUNT: usize = 10;

/// Ship lengths of the standard fleet, in canonical order.
pub const SHIP_LENGTHS: [u8; SHIP_COUNT] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];

/// An ordered collection of ships forming one side's layout.
///
/// A fleet is just geometry; whether it obeys the placement rules is a
/// property queried through [`Fleet::is_valid`], not an invariant of the
/// type. Crossover and mutation routinely produce fleets that fail it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleet {
    ships: Vec<Ship>,
}

impl Fleet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ships(ships: Vec<Ship>) -> Self {
        Self { ships }
    }

    pub fn add_ship(&mut self, ship: Ship) {
        self.ships.push(ship);
    }

    #[must_use]
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Validity predicate: every ship in bounds, no pair overlapping or
    /// Chebyshev-adjacent.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.ships.iter().any(|s| !s.is_within_bounds()) {
            return false;
        }
        for (i, a) in self.ships.iter().enumerate() {
            for b in &self.ships[i + 1..] {
                if a.intersects(b) || a.touches(b) {
                    return false;
                }
            }
        }
        true
    }

    /// Returns whether any ship occupies the given cell.
    #[must_use]
    pub fn has_ship_at(&self, x: u8, y: u8) -> bool {
        self.ships.iter().any(|s| s.occupies(x, y))
    }

    /// All cells occupied by the fleet's ships.
    #[must_use]
    pub fn occupied_cells(&self) -> Vec<(u8, u8)> {
        self.ships.iter().flat_map(|s| s.cells()).collect()
    }
}
