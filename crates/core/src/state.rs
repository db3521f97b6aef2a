use crate::{EffectTable, EffectType, SimulationInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const INNER_QUIET_MAX: u8 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CompletionState {
    Incomplete,
    Succeeded,
    Failed,
    MaxStepsReached,
}

impl CompletionState {
    pub fn is_terminal(self) -> bool {
        self != CompletionState::Incomplete
    }
}

/// Combo stages and once-per-craft bookkeeping carried between steps.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionStates {
    /// 0: no combo, 1: Basic Touch was last, 2: Standard Touch followed Basic Touch.
    pub touch_combo: u8,
    pub observed: bool,
    pub used_heart_and_soul: bool,
    pub used_quick_innovation: bool,
    pub used_trained_perfection: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub input: Arc<SimulationInput>,
    pub step: u32,
    pub cp: u32,
    pub durability: u32,
    pub progress: u32,
    pub quality: u32,
    pub effects: EffectTable,
    pub combo: ActionStates,
}

impl SimulationState {
    pub fn new(input: Arc<SimulationInput>) -> Self {
        Self {
            step: 0,
            cp: input.stats.cp,
            durability: input.recipe.max_durability,
            progress: 0,
            quality: input.starting_quality,
            effects: EffectTable::new(),
            combo: ActionStates::default(),
            input,
        }
    }

    pub fn is_first_step(&self) -> bool {
        self.step == 0
    }

    pub fn has_effect(&self, kind: EffectType) -> bool {
        self.effects.has(kind)
    }

    pub fn inner_quiet(&self) -> u8 {
        self.effects.strength(EffectType::InnerQuiet)
    }

    pub fn progress_remaining(&self) -> u32 {
        self.input.recipe.max_progress.saturating_sub(self.progress)
    }

    /// Progress an action of `efficiency` percent would add right now.
    pub fn progress_gain(&self, efficiency: u32) -> u32 {
        let mut buff = 100u64;
        if self.effects.has(EffectType::MuscleMemory) {
            buff += 100;
        }
        if self.effects.has(EffectType::Veneration) {
            buff += 50;
        }
        let gain = u64::from(self.input.base_progress_gain()) * u64::from(efficiency) * buff
            / 10_000;
        u32::try_from(gain).unwrap_or(u32::MAX)
    }

    /// Quality an action of `efficiency` percent would add right now.
    pub fn quality_gain(&self, efficiency: u32) -> u32 {
        let mut buff = 100u64;
        if self.effects.has(EffectType::GreatStrides) {
            buff += 100;
        }
        if self.effects.has(EffectType::Innovation) {
            buff += 50;
        }
        let inner_quiet = 100 + 10 * u64::from(self.inner_quiet());
        let gain = u64::from(self.input.base_quality_gain())
            * u64::from(efficiency)
            * buff
            * inner_quiet
            / 1_000_000;
        u32::try_from(gain).unwrap_or(u32::MAX)
    }

    /// Durability an action with `base` cost would spend, before Trained Perfection.
    /// Waste Not halves the cost, rounding in the crafter's favour.
    pub fn durability_cost(&self, base: u32) -> u32 {
        if self.effects.has(EffectType::WasteNot) || self.effects.has(EffectType::WasteNot2) {
            base / 2
        } else {
            base
        }
    }

    pub(crate) fn increase_progress(&mut self, amount: u32) {
        self.progress = self
            .progress
            .saturating_add(amount)
            .min(self.input.recipe.max_progress);
        self.effects.remove(EffectType::MuscleMemory);
    }

    pub(crate) fn increase_quality(&mut self, amount: u32) {
        self.quality = self
            .quality
            .saturating_add(amount)
            .min(self.input.recipe.max_quality);
        if self.input.stats.level >= 11 {
            self.effects
                .strengthen(EffectType::InnerQuiet, 1, INNER_QUIET_MAX);
        }
        self.effects.remove(EffectType::GreatStrides);
    }

    pub(crate) fn restore_durability(&mut self, amount: u32) {
        self.durability = self
            .durability
            .saturating_add(amount)
            .min(self.input.recipe.max_durability);
    }

    pub(crate) fn restore_cp(&mut self, amount: u32) {
        self.cp = self.cp.saturating_add(amount).min(self.input.max_cp());
    }
}
