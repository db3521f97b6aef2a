use craftsim_core::{CompletionState, SimulationState};
use serde::{Deserialize, Serialize};

/// Relative weight of each resource in a finished craft's score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveWeights {
    pub progress: f64,
    pub quality: f64,
    pub durability: f64,
    pub cp: f64,
    pub fewer_steps: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            progress: 20.0,
            quality: 80.0,
            durability: 0.0,
            cp: 0.0,
            fewer_steps: 1.0,
        }
    }
}

impl ObjectiveWeights {
    fn total(&self) -> f64 {
        self.progress + self.quality + self.durability + self.cp + self.fewer_steps
    }

    /// Score in `[0, 1]`. Only successful crafts earn anything.
    pub fn reward(&self, state: &SimulationState, completion: CompletionState, max_steps: u32) -> f64 {
        if completion != CompletionState::Succeeded {
            return 0.0;
        }
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }

        let recipe = &state.input.recipe;
        let progress = ratio(state.progress, recipe.max_progress);
        let quality = ratio(state.quality, recipe.max_quality);
        let durability = ratio(state.durability, recipe.max_durability);
        let cp = ratio(state.cp, state.input.max_cp());
        let steps = if max_steps == 0 {
            0.0
        } else {
            1.0 - ratio(state.step, max_steps)
        };

        (self.progress * progress
            + self.quality * quality
            + self.durability * durability
            + self.cp * cp
            + self.fewer_steps * steps)
            / total
    }
}

fn ratio(value: u32, max: u32) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (value as f64 / max as f64).clamp(0.0, 1.0)
}
