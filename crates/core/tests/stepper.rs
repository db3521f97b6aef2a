use craftsim_core::{
    ActionType, CharacterStats, CompletionState, EffectType, Recipe, RngState, ScriptedRolls,
    SimulationError, SimulationInput, SimulationState, Simulator,
};
use proptest::prelude::*;
use std::sync::Arc;

fn recipe() -> Recipe {
    Recipe {
        class_job_level: 10,
        is_expert: false,
        max_progress: 1000,
        max_quality: 2000,
        max_durability: 40,
        progress_divider: 50,
        quality_divider: 40,
        progress_modifier: 100,
        quality_modifier: 100,
    }
}

fn stats(level: u8, cp: u32) -> CharacterStats {
    CharacterStats {
        level,
        craftsmanship: 490,
        control: 400,
        cp,
        can_use_manipulation: true,
        is_specialist: true,
    }
}

fn start(level: u8, cp: u32) -> SimulationState {
    let input = SimulationInput::new(stats(level, cp), recipe(), 0).expect("valid input");
    SimulationState::new(Arc::new(input))
}

fn apply(sim: &Simulator, state: &SimulationState, action: ActionType) -> SimulationState {
    sim.execute_with(state, action, true)
        .unwrap_or_else(|err| panic!("{action:?} rejected: {err}"))
        .0
}

fn apply_all(sim: &Simulator, state: &SimulationState, actions: &[ActionType]) -> SimulationState {
    actions
        .iter()
        .fold(state.clone(), |current, action| apply(sim, &current, *action))
}

#[test]
fn base_gains_follow_stats() {
    let state = start(30, 200);
    assert_eq!(state.input.base_progress_gain(), 100);
    assert_eq!(state.input.base_quality_gain(), 135);
}

#[test]
fn scenario_a_single_progress_action() {
    let sim = Simulator::default();
    let state = start(30, 200);
    let (next, completion) = sim
        .execute_with(&state, ActionType::BasicSynthesis, true)
        .expect("basic synthesis");
    assert_eq!(next.progress, 100);
    assert_eq!(next.quality, 0);
    assert_eq!(next.durability, 30);
    assert_eq!(next.cp, 200);
    assert_eq!(next.step, 1);
    assert_eq!(completion, CompletionState::Incomplete);
}

#[test]
fn scenario_b_durability_runs_out() {
    let sim = Simulator::default();
    let mut state = start(30, 200);
    state.durability = 5;
    let (next, completion) = sim
        .execute_with(&state, ActionType::BasicSynthesis, true)
        .expect("action is still legal with low durability");
    assert_eq!(next.durability, 0);
    assert_eq!(next.progress, 100);
    assert_eq!(completion, CompletionState::Failed);

    let err = sim
        .execute_with(&next, ActionType::BasicSynthesis, true)
        .expect_err("terminal state accepts nothing");
    assert_eq!(err, SimulationError::AlreadyComplete(CompletionState::Failed));
}

#[test]
fn scenario_c_step_budget_exhausted() {
    let sim = Simulator::new(3);
    let state = start(30, 200);
    let mut current = state;
    let mut completion = CompletionState::Incomplete;
    for _ in 0..3 {
        let (next, verdict) = sim
            .execute_with(&current, ActionType::Observe, true)
            .expect("observe");
        current = next;
        completion = verdict;
    }
    assert_eq!(completion, CompletionState::MaxStepsReached);
    assert!(current.durability > 0);
    assert!(current.cp > 0);
    assert!(sim
        .execute_with(&current, ActionType::Observe, true)
        .is_err());
}

#[test]
fn finishing_progress_succeeds() {
    let sim = Simulator::default();
    let mut state = start(30, 200);
    state.progress = 950;
    let (next, completion) = sim
        .execute_with(&state, ActionType::BasicSynthesis, true)
        .expect("finish");
    assert_eq!(next.progress, 1000);
    assert_eq!(completion, CompletionState::Succeeded);
}

#[test]
fn success_wins_over_exhausted_durability() {
    let sim = Simulator::default();
    let mut state = start(30, 200);
    state.progress = 950;
    state.durability = 10;
    let (next, completion) = sim
        .execute_with(&state, ActionType::BasicSynthesis, true)
        .expect("finish");
    assert_eq!(next.durability, 0);
    assert_eq!(completion, CompletionState::Succeeded);
}

#[test]
fn illegal_actions_leave_state_untouched() {
    let sim = Simulator::default();
    let state = start(30, 200);
    let snapshot = state.clone();
    let err = sim
        .execute_with(&state, ActionType::MuscleMemory, true)
        .expect_err("level 54 action at level 30");
    assert!(matches!(
        err,
        SimulationError::ActionUnavailable {
            action: ActionType::MuscleMemory,
            ..
        }
    ));
    assert_eq!(state, snapshot);

    let mut broke = start(30, 200);
    broke.cp = 10;
    let err = sim
        .execute_with(&broke, ActionType::BasicTouch, true)
        .expect_err("not enough CP");
    assert!(matches!(err, SimulationError::ActionUnavailable { .. }));
}

macro_rules! buff_duration_case {
    ($name:ident, $action:expr, $effect:expr, $duration:expr) => {
        #[test]
        fn $name() {
            let sim = Simulator::default();
            let state = start(90, 900);
            let mut current = apply(&sim, &state, $action);
            assert_eq!(current.effects.duration($effect), $duration);
            for elapsed in 0..$duration {
                assert!(
                    current.effects.has($effect),
                    "missing after {elapsed} subsequent steps"
                );
                current = apply(&sim, &current, ActionType::Observe);
            }
            assert!(!current.effects.has($effect));
        }
    };
}

buff_duration_case!(veneration_lasts_four, ActionType::Veneration, EffectType::Veneration, 4);
buff_duration_case!(innovation_lasts_four, ActionType::Innovation, EffectType::Innovation, 4);
buff_duration_case!(great_strides_lasts_three, ActionType::GreatStrides, EffectType::GreatStrides, 3);
buff_duration_case!(waste_not_lasts_four, ActionType::WasteNot, EffectType::WasteNot, 4);
buff_duration_case!(waste_not2_lasts_eight, ActionType::WasteNot2, EffectType::WasteNot2, 8);
buff_duration_case!(manipulation_lasts_eight, ActionType::Manipulation, EffectType::Manipulation, 8);

#[test]
fn veneration_boosts_progress() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let plain = apply(&sim, &state, ActionType::BasicSynthesis);
    assert_eq!(plain.progress, 120);

    let boosted = apply_all(&sim, &state, &[ActionType::Veneration, ActionType::BasicSynthesis]);
    assert_eq!(boosted.progress, 180);
}

#[test]
fn waste_not_halves_durability_cost() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let next = apply_all(&sim, &state, &[ActionType::WasteNot, ActionType::BasicSynthesis]);
    assert_eq!(next.durability, 35);
}

#[test]
fn waste_not_variants_displace_each_other() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let next = apply_all(&sim, &state, &[ActionType::WasteNot, ActionType::WasteNot2]);
    assert!(next.effects.has(EffectType::WasteNot2));
    assert!(!next.effects.has(EffectType::WasteNot));
}

#[test]
fn trained_perfection_absorbs_one_cost() {
    let sim = Simulator::default();
    let state = start(100, 600);
    let next = apply_all(&sim, &state, &[ActionType::TrainedPerfection, ActionType::Groundwork]);
    assert_eq!(next.durability, 40);
    assert!(!next.effects.has(EffectType::TrainedPerfection));
    assert!(next.combo.used_trained_perfection);
    assert!(sim
        .execute_with(&next, ActionType::TrainedPerfection, true)
        .is_err());
}

#[test]
fn manipulation_repairs_after_its_own_step() {
    let sim = Simulator::default();
    let mut state = start(90, 600);
    state.durability = 30;
    let applied = apply(&sim, &state, ActionType::Manipulation);
    assert_eq!(applied.durability, 30);
    let next = apply(&sim, &applied, ActionType::BasicSynthesis);
    assert_eq!(next.durability, 25);
}

#[test]
fn inner_quiet_stacks_and_is_consumed() {
    let sim = Simulator::default();
    let state = start(90, 900);
    let touched = apply(&sim, &state, ActionType::BasicTouch);
    assert_eq!(touched.quality, 135);
    assert_eq!(touched.inner_quiet(), 1);

    let prepared = apply(&sim, &touched, ActionType::PreparatoryTouch);
    assert_eq!(prepared.inner_quiet(), 3);

    let blessed = apply(&sim, &prepared, ActionType::ByregotsBlessing);
    assert_eq!(blessed.inner_quiet(), 0);
    assert!(blessed.quality > prepared.quality);
}

#[test]
fn touch_combo_discounts_cp() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let next = apply_all(
        &sim,
        &state,
        &[
            ActionType::BasicTouch,
            ActionType::StandardTouch,
            ActionType::AdvancedTouch,
        ],
    );
    assert_eq!(next.cp, 600 - 18 * 3);

    let observed = apply_all(&sim, &state, &[ActionType::Observe, ActionType::AdvancedTouch]);
    assert_eq!(observed.cp, 600 - 7 - 18);

    let broken = apply_all(&sim, &state, &[ActionType::BasicTouch, ActionType::Observe]);
    assert_eq!(broken.combo.touch_combo, 0);
    assert!(broken.combo.observed);
}

#[test]
fn combo_action_matches_its_parts() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let combined = apply(&sim, &state, ActionType::AdvancedTouchCombo);
    let manual = apply_all(
        &sim,
        &state,
        &[
            ActionType::BasicTouch,
            ActionType::StandardTouch,
            ActionType::AdvancedTouch,
        ],
    );
    assert_eq!(combined, manual);
    assert_eq!(combined.step, 3);
}

#[test]
fn combo_rejected_when_a_part_would_break_the_item() {
    let sim = Simulator::default();
    let mut state = start(90, 600);
    state.durability = 10;
    assert!(sim
        .execute_with(&state, ActionType::StandardTouchCombo, true)
        .is_err());
}

#[test]
fn groundwork_halves_when_durability_is_short() {
    let sim = Simulator::default();
    let mut state = start(90, 600);
    state.durability = 15;
    let (next, completion) = sim
        .execute_with(&state, ActionType::Groundwork, true)
        .expect("groundwork");
    assert_eq!(next.progress, 180);
    assert_eq!(completion, CompletionState::Failed);
}

#[test]
fn first_step_actions_expire() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let next = apply(&sim, &state, ActionType::Observe);
    assert!(sim.execute_with(&next, ActionType::MuscleMemory, true).is_err());
    assert!(sim.execute_with(&next, ActionType::Reflect, true).is_err());
}

#[test]
fn muscle_memory_is_spent_on_progress() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let opened = apply(&sim, &state, ActionType::MuscleMemory);
    assert_eq!(opened.progress, 300);
    assert_eq!(opened.effects.duration(EffectType::MuscleMemory), 5);
    let next = apply(&sim, &opened, ActionType::BasicSynthesis);
    assert_eq!(next.progress, 300 + 240);
    assert!(!next.effects.has(EffectType::MuscleMemory));
}

#[test]
fn trained_eye_maxes_quality() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let next = apply(&sim, &state, ActionType::TrainedEye);
    assert_eq!(next.quality, 2000);
    assert_eq!(next.cp, 350);
}

#[test]
fn heart_and_soul_unlocks_tricks() {
    let sim = Simulator::default();
    let mut state = start(90, 600);
    state.cp = 500;
    assert!(sim
        .execute_with(&state, ActionType::TricksOfTheTrade, true)
        .is_err());
    let next = apply_all(
        &sim,
        &state,
        &[ActionType::HeartAndSoul, ActionType::TricksOfTheTrade],
    );
    assert_eq!(next.cp, 520);
    assert!(!next.effects.has(EffectType::HeartAndSoul));
    assert!(sim.execute_with(&next, ActionType::HeartAndSoul, true).is_err());
}

#[test]
fn failed_roll_still_pays_costs() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let (next, _) = sim
        .execute_with(&state, ActionType::HastyTouch, false)
        .expect("hasty touch");
    assert_eq!(next.quality, 0);
    assert_eq!(next.durability, 30);
    assert!(!next.effects.has(EffectType::Expedience));
}

#[test]
fn expedience_enables_daring_touch_for_one_step() {
    let sim = Simulator::default();
    let state = start(100, 600);
    let hasty = apply(&sim, &state, ActionType::HastyTouch);
    assert!(hasty.effects.has(EffectType::Expedience));
    assert!(sim.check(&hasty, ActionType::DaringTouch).is_ok());
    let later = apply(&sim, &hasty, ActionType::Observe);
    assert!(sim.check(&later, ActionType::DaringTouch).is_err());
}

#[test]
fn scripted_replay_is_reproducible() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let actions = [
        ActionType::HastyTouch,
        ActionType::HastyTouch,
        ActionType::RapidSynthesis,
        ActionType::BasicTouch,
    ];
    let decisions = [false, true, true];
    let (first, _) = sim
        .replay(&state, &actions, &mut ScriptedRolls::new(decisions))
        .expect("replay");
    let (second, _) = sim
        .replay(&state, &actions, &mut ScriptedRolls::new(decisions))
        .expect("replay");
    assert_eq!(first, second);
    assert_eq!(first.progress, 500);
}

#[test]
fn seeded_rng_is_reproducible() {
    let sim = Simulator::default();
    let state = start(90, 600);
    let actions = [ActionType::RapidSynthesis; 4];
    let (first, _) = sim
        .replay(&state, &actions, &mut RngState::from_seed(42))
        .expect("replay");
    let (second, _) = sim
        .replay(&state, &actions, &mut RngState::from_seed(42))
        .expect("replay");
    assert_eq!(first, second);
}

#[test]
fn invalid_recipe_is_rejected() {
    let mut bad = recipe();
    bad.max_progress = 0;
    assert!(SimulationInput::new(stats(90, 600), bad, 0).is_err());
    assert!(SimulationInput::new(stats(90, 600), recipe(), 2001).is_err());
}

#[test]
fn huge_gains_saturate_instead_of_wrapping() {
    let mut big = recipe();
    big.max_progress = 4_000_000_000;
    big.progress_divider = 1;
    let mut crafter = stats(90, 600);
    crafter.craftsmanship = 100_000_000;
    let input = SimulationInput::new(crafter, big, 0).expect("valid input");
    assert_eq!(input.base_progress_gain(), 1_000_000_002);

    let sim = Simulator::default();
    let state = SimulationState::new(Arc::new(input));
    let state = apply_all(&sim, &state, &[ActionType::MuscleMemory, ActionType::Veneration]);
    assert_eq!(state.progress, 3_000_000_006);
    assert!(state.progress_gain(180) > state.progress_remaining());

    let (end, completion) = sim
        .execute_with(&state, ActionType::CarefulSynthesis, true)
        .expect("careful synthesis");
    assert_eq!(end.progress, 4_000_000_000);
    assert_eq!(completion, CompletionState::Succeeded);
}

#[test]
fn deserialized_input_is_validated_and_recomputed() {
    let mut bad = recipe();
    bad.max_progress = 0;
    let body = serde_json::json!({
        "stats": stats(90, 600),
        "recipe": bad,
        "starting_quality": 0,
    });
    assert!(serde_json::from_value::<SimulationInput>(body).is_err());

    let expected = SimulationInput::new(stats(90, 600), recipe(), 0).expect("valid input");
    let mut forged = serde_json::to_value(&expected).expect("serialize");
    forged["base_progress_gain"] = serde_json::json!(999_999);
    let parsed: SimulationInput = serde_json::from_value(forged).expect("deserialize");
    assert_eq!(parsed, expected);
}

proptest! {
    #[test]
    fn prop_random_play_keeps_invariants(
        level in 1u8..=100,
        picks in proptest::collection::vec((0usize..64, any::<bool>()), 1..40)
    ) {
        let sim = Simulator::new(30);
        let mut state = start(level, 600);
        for (pick, success) in picks {
            let usable: Vec<ActionType> = ActionType::ALL
                .iter()
                .copied()
                .filter(|action| sim.check(&state, *action).is_ok())
                .collect();
            if usable.is_empty() {
                break;
            }
            let action = usable[pick % usable.len()];
            let (next, completion) = sim.execute_with(&state, action, success).expect("usable");

            let recipe = &next.input.recipe;
            prop_assert!(next.durability <= recipe.max_durability);
            prop_assert!(next.progress <= recipe.max_progress);
            prop_assert!(next.quality <= recipe.max_quality);
            prop_assert!(next.cp <= next.input.stats.cp);
            prop_assert!(next.step > state.step);
            prop_assert_eq!(completion, sim.completion(&next));

            state = next;
            if completion.is_terminal() {
                prop_assert!(sim.execute_with(&state, ActionType::BasicSynthesis, true).is_err());
                break;
            }
        }
    }
}
