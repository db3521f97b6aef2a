use crate::SimulationError;
use serde::{Deserialize, Serialize};

fn default_modifier() -> u32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipe {
    pub class_job_level: u8,
    #[serde(default)]
    pub is_expert: bool,
    pub max_progress: u32,
    pub max_quality: u32,
    pub max_durability: u32,
    pub progress_divider: u32,
    pub quality_divider: u32,
    #[serde(default = "default_modifier")]
    pub progress_modifier: u32,
    #[serde(default = "default_modifier")]
    pub quality_modifier: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterStats {
    pub level: u8,
    pub craftsmanship: u32,
    pub control: u32,
    pub cp: u32,
    #[serde(default)]
    pub can_use_manipulation: bool,
    #[serde(default)]
    pub is_specialist: bool,
}

/// Everything that stays fixed for one craft attempt. Deserializing goes
/// through [`SimulationInput::new`], so derived gains are always recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "InputSpec")]
pub struct SimulationInput {
    pub stats: CharacterStats,
    pub recipe: Recipe,
    pub starting_quality: u32,
    base_progress_gain: u32,
    base_quality_gain: u32,
}

#[derive(Deserialize)]
struct InputSpec {
    stats: CharacterStats,
    recipe: Recipe,
    #[serde(default)]
    starting_quality: u32,
}

impl TryFrom<InputSpec> for SimulationInput {
    type Error = SimulationError;

    fn try_from(spec: InputSpec) -> Result<Self, Self::Error> {
        Self::new(spec.stats, spec.recipe, spec.starting_quality)
    }
}

impl SimulationInput {
    pub fn new(
        stats: CharacterStats,
        recipe: Recipe,
        starting_quality: u32,
    ) -> Result<Self, SimulationError> {
        validate(&stats, &recipe, starting_quality)?;

        let scaled = stats.level <= recipe.class_job_level;

        let mut progress =
            f64::from(stats.craftsmanship) * 10.0 / f64::from(recipe.progress_divider) + 2.0;
        if scaled {
            progress *= f64::from(recipe.progress_modifier) / 100.0;
        }

        let mut quality =
            f64::from(stats.control) * 10.0 / f64::from(recipe.quality_divider) + 35.0;
        if scaled {
            quality *= f64::from(recipe.quality_modifier) / 100.0;
        }

        Ok(Self {
            stats,
            recipe,
            starting_quality,
            base_progress_gain: progress as u32,
            base_quality_gain: quality as u32,
        })
    }

    pub fn base_progress_gain(&self) -> u32 {
        self.base_progress_gain
    }

    pub fn base_quality_gain(&self) -> u32 {
        self.base_quality_gain
    }

    pub fn max_cp(&self) -> u32 {
        self.stats.cp
    }

    /// Recipes at or above the crafter's level are treated as difficult by the
    /// recommendation heuristics.
    pub fn is_difficult(&self) -> bool {
        self.recipe.class_job_level >= self.stats.level
    }
}

fn validate(
    stats: &CharacterStats,
    recipe: &Recipe,
    starting_quality: u32,
) -> Result<(), SimulationError> {
    if recipe.max_progress == 0 {
        return Err(SimulationError::InvalidInput(
            "recipe max progress must be positive".to_string(),
        ));
    }
    if recipe.max_quality == 0 {
        return Err(SimulationError::InvalidInput(
            "recipe max quality must be positive".to_string(),
        ));
    }
    if recipe.max_durability == 0 {
        return Err(SimulationError::InvalidInput(
            "recipe max durability must be positive".to_string(),
        ));
    }
    if recipe.progress_divider == 0 || recipe.quality_divider == 0 {
        return Err(SimulationError::InvalidInput(
            "recipe dividers must be positive".to_string(),
        ));
    }
    if starting_quality > recipe.max_quality {
        return Err(SimulationError::InvalidInput(format!(
            "starting quality {starting_quality} exceeds max quality {}",
            recipe.max_quality
        )));
    }
    if stats.level == 0 {
        return Err(SimulationError::InvalidInput(
            "character level must be positive".to_string(),
        ));
    }
    Ok(())
}
