use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of success/failure decisions for probabilistic actions.
///
/// A roll source belongs to exactly one branch of a simulation; nothing in the
/// core shares one between states.
pub trait SuccessRoll {
    /// Returns whether an action with `success_rate` percent succeeds.
    fn roll(&mut self, success_rate: u8) -> bool;
}

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_percent(&mut self) -> u8 {
        self.rng.gen_range(0..100)
    }
}

impl SuccessRoll for RngState {
    fn roll(&mut self, success_rate: u8) -> bool {
        if success_rate >= 100 {
            return true;
        }
        self.next_percent() < success_rate
    }
}

/// Replays a fixed list of decisions. Once exhausted every roll succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedRolls {
    decisions: VecDeque<bool>,
}

impl ScriptedRolls {
    pub fn new(decisions: impl IntoIterator<Item = bool>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.decisions.len()
    }
}

impl SuccessRoll for ScriptedRolls {
    fn roll(&mut self, _success_rate: u8) -> bool {
        self.decisions.pop_front().unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysSucceed;

impl SuccessRoll for AlwaysSucceed {
    fn roll(&mut self, _success_rate: u8) -> bool {
        true
    }
}
