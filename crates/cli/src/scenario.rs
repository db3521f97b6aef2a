use anyhow::{Context, Result};
use craftsim_core::{CharacterStats, Recipe, SimulationInput, SimulationState};
use craftsim_solver::SolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A craft to solve, as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub stats: CharacterStats,
    pub recipe: Recipe,
    #[serde(default)]
    pub starting_quality: u32,
    /// Optional solver overrides; command-line flags win over these.
    #[serde(default)]
    pub solver: Option<SolverConfig>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn initial_state(&self) -> Result<SimulationState> {
        let input = SimulationInput::new(
            self.stats.clone(),
            self.recipe.clone(),
            self.starting_quality,
        )
        .context("building simulation input")?;
        Ok(SimulationState::new(Arc::new(input)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_scenario() {
        let raw = r#"{
            "stats": {
                "level": 90, "craftsmanship": 3000, "control": 3000, "cp": 500,
                "can_use_manipulation": true, "is_specialist": false
            },
            "recipe": {
                "class_job_level": 80, "is_expert": false,
                "max_progress": 2000, "max_quality": 5000, "max_durability": 70,
                "progress_divider": 100, "quality_divider": 100,
                "progress_modifier": 100, "quality_modifier": 100
            }
        }"#;
        let scenario: Scenario = serde_json::from_str(raw).expect("parse");
        assert_eq!(scenario.starting_quality, 0);
        assert!(scenario.solver.is_none());
        let state = scenario.initial_state().expect("state");
        assert_eq!(state.durability, 70);
        assert_eq!(state.cp, 500);
    }
}
