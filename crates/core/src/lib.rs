//! Crafting simulation rules. Keep this crate free of IO and platform concerns.

pub mod action_set;
pub mod actions;
pub mod availability;
pub mod effects;
pub mod error;
pub mod input;
pub mod rng;
pub mod simulator;
pub mod state;

pub use action_set::*;
pub use actions::*;
pub use availability::*;
pub use effects::*;
pub use error::*;
pub use input::*;
pub use rng::*;
pub use simulator::*;
pub use state::*;
