use crate::ObjectiveWeights;
use craftsim_core::{ActionPool, ActionType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub seed: u64,
    pub max_steps: u32,
    pub iterations_per_step: u32,
    pub exploration_c: f64,
    /// Share of a child's best score blended into its mean during selection.
    pub max_score_weight: f64,
    /// Expand from the recommended tier; when false only the legal tier is used.
    pub strict_actions: bool,
    pub action_pool: Vec<ActionType>,
    pub weights: ObjectiveWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: 0xC0FFEE,
            max_steps: 30,
            iterations_per_step: 3000,
            exploration_c: 1.414,
            max_score_weight: 0.1,
            strict_actions: true,
            action_pool: ActionType::ALL.to_vec(),
            weights: ObjectiveWeights::default(),
        }
    }
}

impl SolverConfig {
    pub fn pool(&self) -> ActionPool {
        ActionPool::new(self.action_pool.iter().copied())
    }
}
