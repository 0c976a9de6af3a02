pub use self::{board::*, fleet::*, ship::*};

pub mod board;
pub mod fleet;
pub mod ship;

/// Side length of the square game grid.
pub const GRID_SIZE: u8 = 10;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("fleet violates placement rules and cannot be placed on a board")]
pub struct InvalidFleetError;
