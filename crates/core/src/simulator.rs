use crate::{
    ActionDescriptor, ActionType, CompletionState, EffectType, SimulationError, SimulationState,
    SuccessRoll,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_STEPS: u32 = 100;

const MANIPULATION_REPAIR: u32 = 5;

/// Applies actions to states. Holds only the step budget; every state it
/// produces is a fresh copy, so branches never share mutable data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Simulator {
    pub max_steps: u32,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl Simulator {
    pub fn new(max_steps: u32) -> Self {
        Self { max_steps }
    }

    pub fn unbounded() -> Self {
        Self {
            max_steps: u32::MAX,
        }
    }

    pub fn completion(&self, state: &SimulationState) -> CompletionState {
        if state.progress >= state.input.recipe.max_progress {
            CompletionState::Succeeded
        } else if state.durability == 0 {
            CompletionState::Failed
        } else if state.step >= self.max_steps {
            CompletionState::MaxStepsReached
        } else {
            CompletionState::Incomplete
        }
    }

    pub fn check(&self, state: &SimulationState, action: ActionType) -> Result<(), SimulationError> {
        let completion = self.completion(state);
        if completion.is_terminal() {
            return Err(SimulationError::AlreadyComplete(completion));
        }
        action
            .descriptor()
            .check(state)
            .map_err(|reason| SimulationError::ActionUnavailable { action, reason })
    }

    /// Applies `action`, drawing success for uncertain actions from `rolls`.
    pub fn execute<R>(
        &self,
        state: &SimulationState,
        action: ActionType,
        rolls: &mut R,
    ) -> Result<(SimulationState, CompletionState), SimulationError>
    where
        R: SuccessRoll + ?Sized,
    {
        self.apply(state, action, &mut |rate| rolls.roll(rate))
    }

    /// Deterministic variant: `success` decides every uncertain roll. Actions
    /// with a 100% success rate always succeed.
    pub fn execute_with(
        &self,
        state: &SimulationState,
        action: ActionType,
        success: bool,
    ) -> Result<(SimulationState, CompletionState), SimulationError> {
        self.apply(state, action, &mut |_| success)
    }

    /// Applies `actions` in order, stopping early once the craft is finished.
    pub fn replay<R>(
        &self,
        state: &SimulationState,
        actions: &[ActionType],
        rolls: &mut R,
    ) -> Result<(SimulationState, CompletionState), SimulationError>
    where
        R: SuccessRoll + ?Sized,
    {
        let mut current = state.clone();
        let mut completion = self.completion(&current);
        for action in actions {
            if completion.is_terminal() {
                break;
            }
            let (next, verdict) = self.execute(&current, *action, rolls)?;
            current = next;
            completion = verdict;
        }
        Ok((current, completion))
    }

    fn apply(
        &self,
        state: &SimulationState,
        action: ActionType,
        roll: &mut dyn FnMut(u8) -> bool,
    ) -> Result<(SimulationState, CompletionState), SimulationError> {
        if let Err(err) = self.check(state, action) {
            log::debug!("rejected {action:?} at step {}: {err}", state.step);
            return Err(err);
        }

        let descriptor = action.descriptor();
        if descriptor.parts.is_empty() {
            let next = step_part(state, descriptor, roll);
            let completion = self.completion(&next);
            return Ok((next, completion));
        }

        let mut current = state.clone();
        let mut completion = CompletionState::Incomplete;
        for part in descriptor.parts {
            current = step_part(&current, part.descriptor(), roll);
            completion = self.completion(&current);
            if completion.is_terminal() {
                break;
            }
        }
        Ok((current, completion))
    }
}

/// Resolves a single, already validated, non-combo action.
pub(crate) fn step_part(
    before: &SimulationState,
    descriptor: &ActionDescriptor,
    roll: &mut dyn FnMut(u8) -> bool,
) -> SimulationState {
    let mut next = before.clone();

    next.cp = next.cp.saturating_sub(descriptor.cp_cost(before));

    let mut durability_cost = before.durability_cost(descriptor.durability_cost);
    if durability_cost > 0 && next.effects.has(EffectType::TrainedPerfection) {
        next.effects.remove(EffectType::TrainedPerfection);
        durability_cost = 0;
    }
    next.durability = next.durability.saturating_sub(durability_cost);

    let rate = descriptor.success_rate(before);
    if rate >= 100 || roll(rate) {
        descriptor.use_success(before, &mut next);
    }

    if next.durability > 0
        && next.progress < next.input.recipe.max_progress
        && next.effects.has(EffectType::Manipulation)
        && !next.effects.is_fresh(EffectType::Manipulation)
    {
        next.restore_durability(MANIPULATION_REPAIR);
    }

    next.effects.tick();
    next.step = next.step.saturating_add(1);

    next.combo.touch_combo = match descriptor.action {
        ActionType::BasicTouch => 1,
        ActionType::StandardTouch if before.combo.touch_combo == 1 => 2,
        _ => 0,
    };
    next.combo.observed = descriptor.action == ActionType::Observe;

    next
}

/// A combo is usable when each part is usable in turn and no part before the
/// last one finishes or breaks the craft.
pub(crate) fn check_combo(state: &SimulationState, parts: &[ActionType]) -> Result<(), String> {
    let mut current = state.clone();
    for (idx, part) in parts.iter().enumerate() {
        let descriptor = part.descriptor();
        descriptor
            .check(&current)
            .map_err(|reason| format!("combo part {part:?}: {reason}"))?;
        if idx + 1 == parts.len() {
            break;
        }
        current = step_part(&current, descriptor, &mut |_| true);
        if current.progress >= current.input.recipe.max_progress || current.durability == 0 {
            return Err(format!("combo would end the craft at {part:?}"));
        }
    }
    Ok(())
}
