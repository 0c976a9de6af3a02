//! Evolutionary search for naval-combat decision artifacts.
//!
//! Two independent artifacts are evolved with the same generational engine:
//!
//! - a **placement genome** (30 integers: origin and orientation for each of
//!   the ten standard ships), scored by how long the layout survives against
//!   a panel of opponent shooting policies, and
//! - a **weight genome** (20 bounded reals, one per cell feature), scoring
//!   the heat-map shooter and evolved to minimize shots-to-victory against a
//!   pool of opponent layouts.
//!
//! The crate is built around a few tightly coupled pieces: the chromosome
//! model ([`chromosome`]), a constrained generator that only ever produces
//! rule-abiding layouts ([`generator`]), a repair operator that brings the
//! routinely-invalid offspring of crossover and mutation back into line
//! ([`repair`]), the generic generational engine ([`engine`]) with one
//! variation-operator set per genome kind ([`operators`]), the simulation
//! driven fitness evaluators ([`evaluator`]), and the two-bucket placement
//! pool coupling the two evolutionary runs ([`pool`]).
//!
//! There is no global random source anywhere: every operation that needs
//! randomness takes `&mut R where R: rand::Rng + ?Sized`, so a run seeded
//! with the same [`rand_pcg::Pcg64Mcg`] state reproduces its populations
//! generation by generation.

pub use self::{
    chromosome::*, engine::*, evaluator::*, generator::*, operators::*, pool::*, repair::*,
    snapshot::*,
};

pub mod chromosome;
pub mod engine;
pub mod evaluator;
pub mod fitness;
pub mod generator;
mod grid;
pub mod operators;
pub mod pool;
pub mod repair;
pub mod snapshot;
