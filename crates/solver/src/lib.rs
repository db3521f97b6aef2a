//! Seeded stepwise tree search over the crafting simulator, with a background
//! task handle for callers that poll instead of block.

mod config;
mod error;
mod mcts;
mod objective;
mod task;
mod trace;

pub use config::*;
pub use error::*;
pub use mcts::*;
pub use objective::*;
pub use task::*;
pub use trace::*;
