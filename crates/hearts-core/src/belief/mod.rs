//! Belief tracking over hidden cards and world sampling.
//!
//! - `hard`: deterministic constraints (known cards, monotone voids, hand
//!   counts) and the probability matrix (`Belief`).
//! - `soft`: behavior-driven likelihood adjustments layered on top of the
//!   hard constraints.
//! - `sampler`: draws concrete worlds consistent with a belief.

mod hard;
mod sampler;
pub mod soft;

pub use hard::{Belief, BeliefLevel, SuitMask};
pub use sampler::{sample_world, SampledWorld, SamplingError, SAMPLE_ATTEMPTS};
