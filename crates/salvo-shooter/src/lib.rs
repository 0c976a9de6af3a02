pub use self::{
    features::*, monte_carlo::*, parity::*, random::*, shooter::*, simulate::*, weighted::*,
};

pub mod features;
pub mod monte_carlo;
pub mod parity;
pub mod random;
pub mod shooter;
pub mod simulate;
pub mod weighted;
