//! Two-tier action filtering used to keep the solver's branching factor small.
//!
//! The legal tier admits every action that is certain to succeed and still
//! useful. The recommended tier prunes moves an experienced crafter would not
//! consider in the current state; it is always a subset of the legal tier.

use crate::{
    ActionCategory, ActionDescriptor, ActionSet, ActionType, EffectType, SimulationState,
    Simulator,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Tier {
    Legal,
    Recommended,
}

pub fn could_use_action(state: &SimulationState, descriptor: &ActionDescriptor) -> bool {
    if descriptor.success_rate(state) != 100 {
        return false;
    }

    if state.quality >= state.input.recipe.max_quality && descriptor.increases_quality {
        return false;
    }

    descriptor.could_use(state)
}

pub fn should_use_action(state: &SimulationState, descriptor: &ActionDescriptor) -> bool {
    let action = descriptor.action;
    let input = &state.input;
    let recipe = &input.recipe;
    let effects = &state.effects;

    if descriptor.success_rate(state) != 100 {
        return false;
    }

    if state.quality >= recipe.max_quality && descriptor.increases_quality {
        return false;
    }

    if action == ActionType::TrainedEye {
        return descriptor.could_use(state);
    }

    let is_difficult = input.is_difficult();

    // Muscle Memory is for progress; spending it on quality wastes the buff.
    if is_difficult && effects.has(EffectType::MuscleMemory) && descriptor.increases_quality {
        return false;
    }

    if state.is_first_step()
        && input.stats.level >= 69
        && is_difficult
        && descriptor.category != ActionCategory::FirstTurn
        && state.cp >= 6
    {
        return false;
    }

    if state.combo.touch_combo != 0
        && matches!(
            action,
            ActionType::StandardTouchCombo
                | ActionType::AdvancedTouchCombo
                | ActionType::RefinedTouchCombo
        )
    {
        return false;
    }

    if state.combo.observed && action == ActionType::ObservedAdvancedTouchCombo {
        return false;
    }

    if action == ActionType::Observe && state.cp < 25 {
        return false;
    }

    if effects.has(EffectType::Veneration)
        && !descriptor.increases_progress
        && descriptor.increases_quality
    {
        return false;
    }

    let durability_cost = state.durability_cost(descriptor.durability_cost);

    if !descriptor.increases_progress && durability_cost >= state.durability {
        return false;
    }

    if effects.has(EffectType::TrainedPerfection) && durability_cost < 10 {
        return false;
    }

    if descriptor.increases_progress {
        let gain = state.progress_gain(descriptor.efficiency(state).progress);
        let would_finish = state.progress.saturating_add(gain) >= recipe.max_progress;

        if would_finish {
            if state.quality < recipe.max_quality / 5 {
                return false;
            }
        } else if effects.has(EffectType::Innovation) && !descriptor.increases_quality {
            return false;
        }
    }

    if action == ActionType::ByregotsBlessing && state.inner_quiet() <= 1 {
        return false;
    }

    if matches!(action, ActionType::WasteNot | ActionType::WasteNot2)
        && (effects.has(EffectType::WasteNot) || effects.has(EffectType::WasteNot2))
    {
        return false;
    }

    let missing_durability = recipe.max_durability.saturating_sub(state.durability);

    if action == ActionType::MastersMend && missing_durability < 25 {
        return false;
    }

    if action == ActionType::ImmaculateMend && missing_durability < 45 {
        return false;
    }

    if action == ActionType::RefinedTouch && state.combo.touch_combo != 1 {
        return false;
    }

    if action == ActionType::QuickInnovation
        && state.quality.saturating_sub(input.starting_quality) < recipe.max_quality / 2
    {
        return false;
    }

    if action == ActionType::Manipulation && effects.has(EffectType::Manipulation) {
        return false;
    }

    if action == ActionType::GreatStrides && effects.has(EffectType::GreatStrides) {
        return false;
    }

    if matches!(action, ActionType::Veneration | ActionType::Innovation)
        && (effects.duration(EffectType::Veneration) > 1
            || effects.duration(EffectType::Innovation) > 1)
    {
        return false;
    }

    descriptor.could_use(state)
}

/// The actions a search may consider, deduplicated and in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPool {
    actions: Vec<ActionType>,
}

impl Default for ActionPool {
    fn default() -> Self {
        Self::new(ActionType::ALL)
    }
}

impl ActionPool {
    pub fn new(actions: impl IntoIterator<Item = ActionType>) -> Self {
        let mut actions: Vec<ActionType> = actions.into_iter().collect();
        actions.sort_unstable();
        actions.dedup();
        Self { actions }
    }

    /// Drops actions the crafter of `state` can never use.
    pub fn filtered_for(mut self, state: &SimulationState) -> Self {
        self.actions
            .retain(|action| action.descriptor().is_possible(&state.input));
        self
    }

    pub fn actions(&self) -> &[ActionType] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn available(&self, simulator: &Simulator, state: &SimulationState, tier: Tier) -> ActionSet {
        if simulator.completion(state).is_terminal() {
            return ActionSet::new();
        }

        let mut set = ActionSet::new();
        match tier {
            Tier::Legal => {
                for action in &self.actions {
                    if could_use_action(state, action.descriptor()) {
                        set.add(*action);
                    }
                }
            }
            Tier::Recommended => {
                for action in &self.actions {
                    if should_use_action(state, action.descriptor()) {
                        set.add(*action);
                    }
                }
                if set.contains(ActionType::TrainedEye) {
                    set = ActionSet::single(ActionType::TrainedEye);
                }
            }
        }
        set
    }

    pub fn legal(&self, simulator: &Simulator, state: &SimulationState) -> ActionSet {
        self.available(simulator, state, Tier::Legal)
    }

    pub fn recommended(&self, simulator: &Simulator, state: &SimulationState) -> ActionSet {
        self.available(simulator, state, Tier::Recommended)
    }

    /// Recommended actions, or the legal ones when nothing is recommended.
    pub fn candidates(&self, simulator: &Simulator, state: &SimulationState) -> ActionSet {
        let recommended = self.recommended(simulator, state);
        if recommended.is_empty() {
            self.legal(simulator, state)
        } else {
            recommended
        }
    }
}
