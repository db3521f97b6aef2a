use crate::{
    simulator, EffectType, SimulationInput, SimulationState, INDEFINITE, INNER_QUIET_MAX,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionType {
    BasicSynthesis,
    BasicTouch,
    MastersMend,
    HastyTouch,
    RapidSynthesis,
    Observe,
    TricksOfTheTrade,
    WasteNot,
    Veneration,
    StandardTouch,
    GreatStrides,
    Innovation,
    WasteNot2,
    ByregotsBlessing,
    PreciseTouch,
    MuscleMemory,
    CarefulSynthesis,
    Manipulation,
    PrudentTouch,
    AdvancedTouch,
    Reflect,
    PreparatoryTouch,
    Groundwork,
    DelicateSynthesis,
    IntensiveSynthesis,
    TrainedEye,
    HeartAndSoul,
    PrudentSynthesis,
    TrainedFinesse,
    RefinedTouch,
    DaringTouch,
    QuickInnovation,
    ImmaculateMend,
    TrainedPerfection,
    StandardTouchCombo,
    AdvancedTouchCombo,
    ObservedAdvancedTouchCombo,
    RefinedTouchCombo,
}

impl ActionType {
    pub const COUNT: usize = 38;

    pub const ALL: [ActionType; Self::COUNT] = [
        ActionType::BasicSynthesis,
        ActionType::BasicTouch,
        ActionType::MastersMend,
        ActionType::HastyTouch,
        ActionType::RapidSynthesis,
        ActionType::Observe,
        ActionType::TricksOfTheTrade,
        ActionType::WasteNot,
        ActionType::Veneration,
        ActionType::StandardTouch,
        ActionType::GreatStrides,
        ActionType::Innovation,
        ActionType::WasteNot2,
        ActionType::ByregotsBlessing,
        ActionType::PreciseTouch,
        ActionType::MuscleMemory,
        ActionType::CarefulSynthesis,
        ActionType::Manipulation,
        ActionType::PrudentTouch,
        ActionType::AdvancedTouch,
        ActionType::Reflect,
        ActionType::PreparatoryTouch,
        ActionType::Groundwork,
        ActionType::DelicateSynthesis,
        ActionType::IntensiveSynthesis,
        ActionType::TrainedEye,
        ActionType::HeartAndSoul,
        ActionType::PrudentSynthesis,
        ActionType::TrainedFinesse,
        ActionType::RefinedTouch,
        ActionType::DaringTouch,
        ActionType::QuickInnovation,
        ActionType::ImmaculateMend,
        ActionType::TrainedPerfection,
        ActionType::StandardTouchCombo,
        ActionType::AdvancedTouchCombo,
        ActionType::ObservedAdvancedTouchCombo,
        ActionType::RefinedTouchCombo,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn descriptor(self) -> &'static ActionDescriptor {
        &CATALOG[self.index()]
    }

    pub fn is_combo(self) -> bool {
        self.descriptor().category == ActionCategory::Combo
    }

    pub fn stable_key(self) -> String {
        format!("{self:?}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    FirstTurn,
    Synthesis,
    Quality,
    Durability,
    Buffs,
    Other,
    Combo,
}

/// Effect installed by a buff action, with the effects it displaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuffTemplate {
    pub effect: EffectType,
    pub duration: u8,
    pub strength: u8,
    pub conflicts: &'static [EffectType],
}

/// Progress and quality multipliers in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Efficiency {
    pub progress: u32,
    pub quality: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub action: ActionType,
    pub category: ActionCategory,
    pub level: u8,
    pub cp_cost: u32,
    pub durability_cost: u32,
    pub increases_progress: bool,
    pub increases_quality: bool,
    pub success_rate: u8,
    pub buff: Option<BuffTemplate>,
    pub parts: &'static [ActionType],
}

const fn base(
    action: ActionType,
    category: ActionCategory,
    level: u8,
    cp_cost: u32,
    durability_cost: u32,
) -> ActionDescriptor {
    ActionDescriptor {
        action,
        category,
        level,
        cp_cost,
        durability_cost,
        increases_progress: false,
        increases_quality: false,
        success_rate: 100,
        buff: None,
        parts: &[],
    }
}

const fn synthesis(action: ActionType, level: u8, cp_cost: u32, durability_cost: u32) -> ActionDescriptor {
    ActionDescriptor {
        increases_progress: true,
        ..base(action, ActionCategory::Synthesis, level, cp_cost, durability_cost)
    }
}

const fn touch(action: ActionType, level: u8, cp_cost: u32, durability_cost: u32) -> ActionDescriptor {
    ActionDescriptor {
        increases_quality: true,
        ..base(action, ActionCategory::Quality, level, cp_cost, durability_cost)
    }
}

const fn buff(
    action: ActionType,
    level: u8,
    cp_cost: u32,
    effect: EffectType,
    duration: u8,
    conflicts: &'static [EffectType],
) -> ActionDescriptor {
    ActionDescriptor {
        buff: Some(BuffTemplate {
            effect,
            duration,
            strength: 0,
            conflicts,
        }),
        ..base(action, ActionCategory::Buffs, level, cp_cost, 0)
    }
}

const fn combo(
    action: ActionType,
    level: u8,
    cp_cost: u32,
    durability_cost: u32,
    parts: &'static [ActionType],
) -> ActionDescriptor {
    ActionDescriptor {
        increases_quality: true,
        parts,
        ..base(action, ActionCategory::Combo, level, cp_cost, durability_cost)
    }
}

static CATALOG: [ActionDescriptor; ActionType::COUNT] = [
    synthesis(ActionType::BasicSynthesis, 1, 0, 10),
    touch(ActionType::BasicTouch, 5, 18, 10),
    base(ActionType::MastersMend, ActionCategory::Durability, 7, 88, 0),
    ActionDescriptor {
        success_rate: 60,
        ..touch(ActionType::HastyTouch, 9, 0, 10)
    },
    ActionDescriptor {
        success_rate: 50,
        ..synthesis(ActionType::RapidSynthesis, 9, 0, 10)
    },
    base(ActionType::Observe, ActionCategory::Other, 13, 7, 0),
    base(ActionType::TricksOfTheTrade, ActionCategory::Other, 13, 0, 0),
    buff(ActionType::WasteNot, 15, 56, EffectType::WasteNot, 4, &[EffectType::WasteNot2]),
    buff(ActionType::Veneration, 15, 18, EffectType::Veneration, 4, &[]),
    touch(ActionType::StandardTouch, 18, 32, 10),
    buff(ActionType::GreatStrides, 21, 32, EffectType::GreatStrides, 3, &[]),
    buff(ActionType::Innovation, 26, 18, EffectType::Innovation, 4, &[]),
    buff(ActionType::WasteNot2, 47, 98, EffectType::WasteNot2, 8, &[EffectType::WasteNot]),
    touch(ActionType::ByregotsBlessing, 50, 24, 10),
    touch(ActionType::PreciseTouch, 53, 18, 10),
    ActionDescriptor {
        category: ActionCategory::FirstTurn,
        ..synthesis(ActionType::MuscleMemory, 54, 6, 10)
    },
    synthesis(ActionType::CarefulSynthesis, 62, 7, 10),
    buff(ActionType::Manipulation, 65, 96, EffectType::Manipulation, 8, &[]),
    touch(ActionType::PrudentTouch, 66, 25, 5),
    touch(ActionType::AdvancedTouch, 68, 46, 10),
    ActionDescriptor {
        category: ActionCategory::FirstTurn,
        ..touch(ActionType::Reflect, 69, 6, 10)
    },
    touch(ActionType::PreparatoryTouch, 71, 40, 20),
    synthesis(ActionType::Groundwork, 72, 18, 20),
    ActionDescriptor {
        increases_quality: true,
        ..synthesis(ActionType::DelicateSynthesis, 76, 32, 10)
    },
    synthesis(ActionType::IntensiveSynthesis, 78, 6, 10),
    ActionDescriptor {
        increases_quality: true,
        ..base(ActionType::TrainedEye, ActionCategory::FirstTurn, 80, 250, 0)
    },
    base(ActionType::HeartAndSoul, ActionCategory::Other, 86, 0, 0),
    synthesis(ActionType::PrudentSynthesis, 88, 18, 5),
    touch(ActionType::TrainedFinesse, 90, 32, 0),
    touch(ActionType::RefinedTouch, 92, 24, 10),
    ActionDescriptor {
        success_rate: 60,
        ..touch(ActionType::DaringTouch, 96, 0, 10)
    },
    base(ActionType::QuickInnovation, ActionCategory::Other, 96, 0, 0),
    base(ActionType::ImmaculateMend, ActionCategory::Durability, 98, 112, 0),
    base(ActionType::TrainedPerfection, ActionCategory::Other, 100, 0, 0),
    combo(
        ActionType::StandardTouchCombo,
        18,
        36,
        20,
        &[ActionType::BasicTouch, ActionType::StandardTouch],
    ),
    combo(
        ActionType::AdvancedTouchCombo,
        68,
        54,
        30,
        &[
            ActionType::BasicTouch,
            ActionType::StandardTouch,
            ActionType::AdvancedTouch,
        ],
    ),
    combo(
        ActionType::ObservedAdvancedTouchCombo,
        68,
        25,
        10,
        &[ActionType::Observe, ActionType::AdvancedTouch],
    ),
    combo(
        ActionType::RefinedTouchCombo,
        92,
        42,
        20,
        &[ActionType::BasicTouch, ActionType::RefinedTouch],
    ),
];

const COMBO_TOUCH_CP: u32 = 18;

impl ActionDescriptor {
    pub fn cp_cost(&self, state: &SimulationState) -> u32 {
        match self.action {
            ActionType::StandardTouch if state.combo.touch_combo == 1 => COMBO_TOUCH_CP,
            ActionType::AdvancedTouch
                if state.combo.touch_combo == 2 || state.combo.observed =>
            {
                COMBO_TOUCH_CP
            }
            _ => self.cp_cost,
        }
    }

    pub fn efficiency(&self, state: &SimulationState) -> Efficiency {
        let level = state.input.stats.level;
        match self.action {
            ActionType::BasicSynthesis => progress(if level >= 31 { 120 } else { 100 }),
            ActionType::RapidSynthesis => progress(if level >= 63 { 500 } else { 250 }),
            ActionType::CarefulSynthesis => progress(if level >= 82 { 180 } else { 150 }),
            ActionType::MuscleMemory => progress(300),
            ActionType::IntensiveSynthesis => progress(400),
            ActionType::PrudentSynthesis => progress(180),
            ActionType::Groundwork => {
                let full = if level >= 86 { 360 } else { 300 };
                // TODO: check whether Waste Not's discounted cost should be compared here instead.
                if state.durability < self.durability_cost {
                    progress(full / 2)
                } else {
                    progress(full)
                }
            }
            ActionType::DelicateSynthesis => Efficiency {
                progress: if level >= 94 { 150 } else { 100 },
                quality: 100,
            },
            ActionType::BasicTouch
            | ActionType::HastyTouch
            | ActionType::PrudentTouch
            | ActionType::TrainedFinesse
            | ActionType::RefinedTouch => quality(100),
            ActionType::StandardTouch => quality(125),
            ActionType::AdvancedTouch | ActionType::PreciseTouch | ActionType::DaringTouch => {
                quality(150)
            }
            ActionType::PreparatoryTouch => quality(200),
            ActionType::Reflect => quality(300),
            ActionType::ByregotsBlessing => quality(100 + 20 * u32::from(state.inner_quiet())),
            _ => Efficiency::default(),
        }
    }

    pub fn success_rate(&self, _state: &SimulationState) -> u8 {
        self.success_rate.min(100)
    }

    /// Whether the crafter could ever use this action in a craft of `input`,
    /// independent of resources and step-specific conditions.
    pub fn is_possible(&self, input: &SimulationInput) -> bool {
        if self.category == ActionCategory::Combo {
            return self
                .parts
                .iter()
                .all(|part| part.descriptor().is_possible(input));
        }
        if input.stats.level < self.level {
            return false;
        }
        match self.action {
            ActionType::Manipulation => input.stats.can_use_manipulation,
            ActionType::HeartAndSoul | ActionType::QuickInnovation => input.stats.is_specialist,
            _ => true,
        }
    }

    pub fn could_use(&self, state: &SimulationState) -> bool {
        self.check(state).is_ok()
    }

    /// Structural legality. `Err` names the first unmet requirement.
    pub fn check(&self, state: &SimulationState) -> Result<(), String> {
        if !self.is_possible(&state.input) {
            return Err(format!(
                "requires level {} or a crafter trait that is missing",
                self.level
            ));
        }
        if self.category == ActionCategory::Combo {
            return simulator::check_combo(state, self.parts);
        }
        let cost = self.cp_cost(state);
        if state.cp < cost {
            return Err(format!("needs {cost} CP, have {}", state.cp));
        }
        if self.requirement_met(state) {
            Ok(())
        } else {
            Err("action-specific requirement not met".to_string())
        }
    }

    fn requirement_met(&self, state: &SimulationState) -> bool {
        let effects = &state.effects;
        match self.action {
            ActionType::TricksOfTheTrade
            | ActionType::PreciseTouch
            | ActionType::IntensiveSynthesis => effects.has(EffectType::HeartAndSoul),
            ActionType::ByregotsBlessing => state.inner_quiet() > 0,
            ActionType::MuscleMemory | ActionType::Reflect => state.is_first_step(),
            ActionType::PrudentTouch | ActionType::PrudentSynthesis => {
                !effects.has(EffectType::WasteNot) && !effects.has(EffectType::WasteNot2)
            }
            ActionType::TrainedEye => {
                let input = &state.input;
                state.is_first_step()
                    && !input.recipe.is_expert
                    && u32::from(input.stats.level) >= u32::from(input.recipe.class_job_level) + 10
            }
            ActionType::HeartAndSoul => !state.combo.used_heart_and_soul,
            ActionType::TrainedFinesse => state.inner_quiet() == INNER_QUIET_MAX,
            ActionType::DaringTouch => effects.has(EffectType::Expedience),
            ActionType::QuickInnovation => {
                !state.combo.used_quick_innovation && !effects.has(EffectType::Innovation)
            }
            ActionType::TrainedPerfection => !state.combo.used_trained_perfection,
            _ => true,
        }
    }

    /// Applies the action's successful outcome. Gains are read from `before`,
    /// the state as it was when the action was chosen; mutations go to `next`.
    pub(crate) fn use_success(&self, before: &SimulationState, next: &mut SimulationState) {
        if let Some(template) = self.buff {
            for conflict in template.conflicts {
                next.effects.remove(*conflict);
            }
            next.effects
                .add(template.effect, template.duration, template.strength);
            return;
        }

        let efficiency = self.efficiency(before);
        if self.increases_progress && efficiency.progress > 0 {
            next.increase_progress(before.progress_gain(efficiency.progress));
        }
        if self.increases_quality && efficiency.quality > 0 {
            next.increase_quality(before.quality_gain(efficiency.quality));
        }

        match self.action {
            ActionType::MastersMend => next.restore_durability(30),
            ActionType::ImmaculateMend => {
                next.durability = next.input.recipe.max_durability;
            }
            ActionType::HastyTouch => next.effects.add(EffectType::Expedience, 1, 0),
            ActionType::TricksOfTheTrade => {
                next.effects.remove(EffectType::HeartAndSoul);
                next.restore_cp(20);
            }
            ActionType::PreciseTouch | ActionType::IntensiveSynthesis => {
                next.effects.remove(EffectType::HeartAndSoul);
                if self.action == ActionType::PreciseTouch {
                    extra_inner_quiet(next);
                }
            }
            ActionType::Reflect | ActionType::PreparatoryTouch => extra_inner_quiet(next),
            ActionType::RefinedTouch if before.combo.touch_combo == 1 => extra_inner_quiet(next),
            ActionType::ByregotsBlessing => next.effects.remove(EffectType::InnerQuiet),
            ActionType::MuscleMemory => next.effects.add(EffectType::MuscleMemory, 5, 0),
            ActionType::TrainedEye => {
                next.quality = next.input.recipe.max_quality;
            }
            ActionType::HeartAndSoul => {
                next.effects.add(EffectType::HeartAndSoul, INDEFINITE, 0);
                next.combo.used_heart_and_soul = true;
            }
            ActionType::QuickInnovation => {
                next.effects.add(EffectType::Innovation, 1, 0);
                next.combo.used_quick_innovation = true;
            }
            ActionType::TrainedPerfection => {
                next.effects.add(EffectType::TrainedPerfection, INDEFINITE, 0);
                next.combo.used_trained_perfection = true;
            }
            _ => {}
        }
    }
}

const fn progress(percent: u32) -> Efficiency {
    Efficiency {
        progress: percent,
        quality: 0,
    }
}

const fn quality(percent: u32) -> Efficiency {
    Efficiency {
        progress: 0,
        quality: percent,
    }
}

fn extra_inner_quiet(next: &mut SimulationState) {
    if next.input.stats.level >= 11 {
        next.effects
            .strengthen(EffectType::InnerQuiet, 1, INNER_QUIET_MAX);
    }
}
