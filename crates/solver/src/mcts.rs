use crate::{
    SolveStatus, SolverConfig, SolverError, SolverResult, StateSummary, StepRecord,
    StepSearchStats, SummaryStats,
};
use craftsim_core::{
    ActionPool, ActionSet, ActionType, CompletionState, SimulationState, Simulator, Tier,
};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// A candidate macro together with the state it ends in.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPath {
    pub actions: Vec<ActionType>,
    pub state: SimulationState,
    pub completion: CompletionState,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<usize>,
    action: Option<ActionType>,
    state: SimulationState,
    completion: CompletionState,
    visits: u32,
    value_sum: f64,
    max_score: f64,
    children: Vec<usize>,
    unexpanded: Vec<ActionType>,
}

impl Node {
    fn new(
        parent: Option<usize>,
        action: Option<ActionType>,
        state: SimulationState,
        completion: CompletionState,
        unexpanded: Vec<ActionType>,
    ) -> Self {
        Self {
            parent,
            action,
            state,
            completion,
            visits: 0,
            value_sum: 0.0,
            max_score: 0.0,
            children: Vec::new(),
            unexpanded,
        }
    }

    fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self(
            seed.wrapping_mul(0x9E3779B97F4A7C15)
                .wrapping_add(0xD1B54A32D192ED03),
        )
    }

    fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 7;
        self.0 ^= self.0 >> 9;
        self.0 ^= self.0 << 8;
        self.0
    }

    fn gen_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            (self.next_u64() as usize) % len
        }
    }
}

/// Keeps the best finishing path and, as a fallback, the path with the most
/// progress among those that did not finish.
#[derive(Debug, Clone)]
struct BestTracker {
    completed: Option<BestPath>,
    fallback: BestPath,
}

impl BestTracker {
    fn new(start: &SimulationState, completion: CompletionState) -> Self {
        Self {
            completed: None,
            fallback: BestPath {
                actions: Vec::new(),
                state: start.clone(),
                completion,
            },
        }
    }

    fn best(&self) -> &BestPath {
        self.completed.as_ref().unwrap_or(&self.fallback)
    }

    /// Returns true when the overall best path changed.
    fn consider(
        &mut self,
        actions: &[ActionType],
        state: &SimulationState,
        completion: CompletionState,
    ) -> bool {
        if completion == CompletionState::Succeeded {
            let better = match &self.completed {
                None => true,
                Some(current) => {
                    compare_completed(state, actions, &current.state, &current.actions)
                        == CmpOrdering::Greater
                }
            };
            if better {
                self.completed = Some(BestPath {
                    actions: actions.to_vec(),
                    state: state.clone(),
                    completion,
                });
            }
            return better;
        }

        let better = compare_fallback(state, actions, &self.fallback.state, &self.fallback.actions)
            == CmpOrdering::Greater;
        if better {
            self.fallback = BestPath {
                actions: actions.to_vec(),
                state: state.clone(),
                completion,
            };
        }
        better && self.completed.is_none()
    }
}

/// Greater means `a` is preferred: higher quality, then fewer steps, then the
/// sequence that comes first in catalog order.
fn compare_completed(
    a: &SimulationState,
    a_actions: &[ActionType],
    b: &SimulationState,
    b_actions: &[ActionType],
) -> CmpOrdering {
    a.quality
        .cmp(&b.quality)
        .then_with(|| b.step.cmp(&a.step))
        .then_with(|| b_actions.cmp(a_actions))
}

fn compare_fallback(
    a: &SimulationState,
    a_actions: &[ActionType],
    b: &SimulationState,
    b_actions: &[ActionType],
) -> CmpOrdering {
    a.progress
        .cmp(&b.progress)
        .then_with(|| a.quality.cmp(&b.quality))
        .then_with(|| b.step.cmp(&a.step))
        .then_with(|| b_actions.cmp(a_actions))
}

/// Rejects states no search can start from: empty maxima or pools already
/// outside their bounds.
pub fn validate_start(state: &SimulationState) -> Result<(), SolverError> {
    let recipe = &state.input.recipe;
    if recipe.max_progress == 0 || recipe.max_quality == 0 || recipe.max_durability == 0 {
        return Err(SolverError::InvalidStart(format!(
            "recipe maxima must be positive (progress {}, quality {}, durability {})",
            recipe.max_progress, recipe.max_quality, recipe.max_durability
        )));
    }
    if state.durability > recipe.max_durability {
        return Err(SolverError::InvalidStart(format!(
            "durability {} exceeds maximum {}",
            state.durability, recipe.max_durability
        )));
    }
    if state.cp > state.input.max_cp() {
        return Err(SolverError::InvalidStart(format!(
            "cp {} exceeds maximum {}",
            state.cp,
            state.input.max_cp()
        )));
    }
    if state.quality > recipe.max_quality {
        return Err(SolverError::InvalidStart(format!(
            "quality {} exceeds maximum {}",
            state.quality, recipe.max_quality
        )));
    }
    Ok(())
}

/// Stepwise Monte-Carlo tree search over the action catalog.
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
    simulator: Simulator,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        let simulator = Simulator::new(config.max_steps);
        Self { config, simulator }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Runs to completion without cancellation or progress reports.
    pub fn solve(&self, start: &SimulationState) -> Result<SolverResult, SolverError> {
        let cancel = AtomicBool::new(false);
        self.solve_with(start, &cancel, |_| {})
    }

    /// Runs the search, reporting every improvement of the best path to
    /// `observer` and stopping between iterations once `cancel` is set.
    pub fn solve_with<F>(
        &self,
        start: &SimulationState,
        cancel: &AtomicBool,
        mut observer: F,
    ) -> Result<SolverResult, SolverError>
    where
        F: FnMut(&BestPath),
    {
        validate_start(start)?;
        let started_at = Instant::now();
        let sim = &self.simulator;
        let pool = self.config.pool().filtered_for(start);
        let mut rng = SimpleRng::new(self.config.seed);

        let mut current = start.clone();
        let mut completion = sim.completion(&current);
        let mut tracker = BestTracker::new(start, completion);
        let mut committed: Vec<ActionType> = Vec::new();
        let mut records: Vec<StepRecord> = Vec::new();
        let mut total_iterations: u64 = 0;
        let mut cancelled = false;

        log::info!(
            "solver start: pool={} max_steps={} iterations_per_step={}",
            pool.len(),
            sim.max_steps,
            self.config.iterations_per_step
        );

        while !completion.is_terminal() {
            if cancel.load(Ordering::Acquire) {
                cancelled = true;
                break;
            }

            let root_actions = self.expansion_set(&pool, &current);
            if root_actions.is_empty() {
                log::debug!("no usable action at step {}", current.step);
                break;
            }

            let step_started = Instant::now();
            let single = if root_actions.len() == 1 {
                root_actions.nth(0)
            } else {
                None
            };
            let (action, mut stats) = if let Some(only) = single {
                (
                    only,
                    StepSearchStats {
                        iterations: 0,
                        elapsed_ms: 0,
                        root_children: 1,
                        selected_visits: 0,
                        selected_value: 0.0,
                    },
                )
            } else {
                let outcome = self.search_step(
                    &pool,
                    &current,
                    &committed,
                    &mut rng,
                    &mut tracker,
                    cancel,
                    &mut observer,
                )?;
                total_iterations = total_iterations.saturating_add(outcome.stats.iterations as u64);
                if outcome.cancelled {
                    cancelled = true;
                    break;
                }
                match outcome.action {
                    Some(action) => (action, outcome.stats),
                    None => break,
                }
            };
            stats.elapsed_ms = step_started.elapsed().as_millis() as u64;

            let (next, verdict) = sim.execute_with(&current, action, true)?;
            log::debug!(
                "commit step {}: {:?} -> progress {} quality {} durability {}",
                current.step,
                action,
                next.progress,
                next.quality,
                next.durability
            );
            records.push(StepRecord {
                step: current.step,
                action,
                before: StateSummary::of(&current),
                after: StateSummary::of(&next),
                completion_after: verdict,
                search: stats,
            });
            committed.push(action);
            current = next;
            completion = verdict;

            if tracker.consider(&committed, &current, completion) {
                observer(tracker.best());
            }
        }

        let best = tracker.best().clone();
        let status = if cancelled {
            SolveStatus::Cancelled
        } else if best.completion == CompletionState::Succeeded {
            SolveStatus::Completed
        } else {
            SolveStatus::BestEffort
        };
        log::info!(
            "solver finished: status={status:?} actions={} quality={} iterations={total_iterations}",
            best.actions.len(),
            best.state.quality
        );

        Ok(SolverResult {
            status,
            completion: best.completion,
            final_summary: StateSummary::of(&best.state),
            actions: best.actions,
            final_state: Some(best.state),
            summary: SummaryStats {
                steps: records.len() as u32,
                total_iterations,
                wall_time_ms: started_at.elapsed().as_millis() as u64,
            },
            steps: records,
        })
    }

    fn expansion_set(&self, pool: &ActionPool, state: &SimulationState) -> ActionSet {
        if self.config.strict_actions {
            pool.candidates(&self.simulator, state)
        } else {
            pool.available(&self.simulator, state, Tier::Legal)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search_step<F>(
        &self,
        pool: &ActionPool,
        root_state: &SimulationState,
        committed: &[ActionType],
        rng: &mut SimpleRng,
        tracker: &mut BestTracker,
        cancel: &AtomicBool,
        observer: &mut F,
    ) -> Result<StepOutcome, SolverError>
    where
        F: FnMut(&BestPath),
    {
        let sim = &self.simulator;
        let root_completion = sim.completion(root_state);
        let root_actions = self.expansion_set(pool, root_state).to_vec();
        let mut nodes = vec![Node::new(
            None,
            None,
            root_state.clone(),
            root_completion,
            root_actions,
        )];
        let mut iterations = 0u32;
        let mut cancelled = false;
        let mut path: Vec<ActionType> = committed.to_vec();

        while iterations < self.config.iterations_per_step {
            if cancel.load(Ordering::Acquire) {
                cancelled = true;
                break;
            }
            path.truncate(committed.len());

            let mut node_idx = 0usize;
            loop {
                if nodes[node_idx].completion.is_terminal() {
                    break;
                }
                if !nodes[node_idx].unexpanded.is_empty() {
                    let pick = rng.gen_index(nodes[node_idx].unexpanded.len());
                    let action = nodes[node_idx].unexpanded.remove(pick);
                    let (state, completion) =
                        sim.execute_with(&nodes[node_idx].state, action, true)?;
                    let unexpanded = if completion.is_terminal() {
                        Vec::new()
                    } else {
                        self.expansion_set(pool, &state).to_vec()
                    };
                    let child_idx = nodes.len();
                    nodes.push(Node::new(
                        Some(node_idx),
                        Some(action),
                        state,
                        completion,
                        unexpanded,
                    ));
                    nodes[node_idx].children.push(child_idx);
                    path.push(action);
                    node_idx = child_idx;
                    break;
                }
                if nodes[node_idx].children.is_empty() {
                    break;
                }
                node_idx = self.select_child(&nodes, node_idx);
                if let Some(action) = nodes[node_idx].action {
                    path.push(action);
                }
            }

            let (end_state, end_completion) = self.rollout(
                pool,
                &nodes[node_idx].state,
                nodes[node_idx].completion,
                &mut path,
                rng,
            )?;
            let reward = self
                .config
                .weights
                .reward(&end_state, end_completion, sim.max_steps);
            if tracker.consider(&path, &end_state, end_completion) {
                observer(tracker.best());
            }

            let mut walk = Some(node_idx);
            while let Some(idx) = walk {
                let node = &mut nodes[idx];
                node.visits = node.visits.saturating_add(1);
                node.value_sum += reward;
                if reward > node.max_score {
                    node.max_score = reward;
                }
                walk = node.parent;
            }
            iterations = iterations.saturating_add(1);
        }

        let mut best: Option<usize> = None;
        for child_idx in nodes[0].children.iter().copied() {
            let replace = match best {
                None => true,
                Some(current) => {
                    let (a, b) = (&nodes[child_idx], &nodes[current]);
                    a.visits > b.visits
                        || (a.visits == b.visits && a.mean() > b.mean())
                        || (a.visits == b.visits && a.mean() == b.mean() && a.action < b.action)
                }
            };
            if replace {
                best = Some(child_idx);
            }
        }

        let stats = StepSearchStats {
            iterations,
            elapsed_ms: 0,
            root_children: nodes[0].children.len(),
            selected_visits: best.map(|idx| nodes[idx].visits).unwrap_or(0),
            selected_value: best.map(|idx| nodes[idx].mean()).unwrap_or(0.0),
        };
        Ok(StepOutcome {
            action: best.and_then(|idx| nodes[idx].action),
            stats,
            cancelled,
        })
    }

    fn select_child(&self, nodes: &[Node], parent: usize) -> usize {
        let parent_visits = nodes[parent].visits.max(1) as f64;
        let weight = self.config.max_score_weight.clamp(0.0, 1.0);
        let mut best = nodes[parent].children[0];
        let mut best_score = f64::NEG_INFINITY;
        for child_idx in nodes[parent].children.iter().copied() {
            let child = &nodes[child_idx];
            let score = if child.visits == 0 {
                f64::INFINITY
            } else {
                let exploit = (1.0 - weight) * child.mean() + weight * child.max_score;
                let explore = self.config.exploration_c
                    * (parent_visits.ln() / child.visits as f64).sqrt();
                exploit + explore
            };
            let earlier = child.action < nodes[best].action;
            if score > best_score || (score == best_score && earlier) {
                best_score = score;
                best = child_idx;
            }
        }
        best
    }

    /// Plays random candidate actions until the craft ends or nothing is usable.
    fn rollout(
        &self,
        pool: &ActionPool,
        state: &SimulationState,
        completion: CompletionState,
        path: &mut Vec<ActionType>,
        rng: &mut SimpleRng,
    ) -> Result<(SimulationState, CompletionState), SolverError> {
        let mut state = state.clone();
        let mut completion = completion;
        while !completion.is_terminal() {
            let options = self.expansion_set(pool, &state);
            let Some(action) = options.nth(rng.gen_index(options.len())) else {
                break;
            };
            let (next, verdict) = self.simulator.execute_with(&state, action, true)?;
            path.push(action);
            state = next;
            completion = verdict;
        }
        Ok((state, completion))
    }
}

struct StepOutcome {
    action: Option<ActionType>,
    stats: StepSearchStats,
    cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftsim_core::{CharacterStats, Recipe, SimulationInput};
    use std::sync::Arc;

    fn start() -> SimulationState {
        let stats = CharacterStats {
            level: 90,
            craftsmanship: 3000,
            control: 3000,
            cp: 500,
            can_use_manipulation: true,
            is_specialist: false,
        };
        let recipe = Recipe {
            class_job_level: 80,
            is_expert: false,
            max_progress: 1000,
            max_quality: 4000,
            max_durability: 60,
            progress_divider: 100,
            quality_divider: 100,
            progress_modifier: 100,
            quality_modifier: 100,
        };
        let input = SimulationInput::new(stats, recipe, 0).expect("valid input");
        SimulationState::new(Arc::new(input))
    }

    fn ended(base: &SimulationState, steps: u32, progress: u32, quality: u32) -> SimulationState {
        let mut state = base.clone();
        state.step = steps;
        state.progress = progress;
        state.quality = quality;
        state
    }

    #[test]
    fn finished_path_beats_richer_unfinished_path() {
        let base = start();
        let mut tracker = BestTracker::new(&base, CompletionState::Incomplete);

        let finished = [ActionType::BasicSynthesis; 5];
        assert!(tracker.consider(
            &finished,
            &ended(&base, 5, 1000, 1500),
            CompletionState::Succeeded
        ));

        let richer = [ActionType::BasicTouch; 4];
        assert!(!tracker.consider(
            &richer,
            &ended(&base, 4, 900, 2000),
            CompletionState::MaxStepsReached
        ));
        assert_eq!(tracker.best().actions, finished.to_vec());
        assert_eq!(tracker.best().completion, CompletionState::Succeeded);
    }

    #[test]
    fn equal_quality_prefers_fewer_steps() {
        let base = start();
        let mut tracker = BestTracker::new(&base, CompletionState::Incomplete);
        tracker.consider(
            &[ActionType::BasicSynthesis; 5],
            &ended(&base, 5, 1000, 2000),
            CompletionState::Succeeded,
        );
        let shorter = [ActionType::CarefulSynthesis; 3];
        assert!(tracker.consider(
            &shorter,
            &ended(&base, 3, 1000, 2000),
            CompletionState::Succeeded
        ));
        assert_eq!(tracker.best().actions, shorter.to_vec());

        assert!(!tracker.consider(
            &[ActionType::BasicSynthesis; 4],
            &ended(&base, 4, 1000, 2000),
            CompletionState::Succeeded
        ));
        assert_eq!(tracker.best().actions, shorter.to_vec());
    }

    #[test]
    fn catalog_order_breaks_remaining_ties() {
        let base = start();
        let mut tracker = BestTracker::new(&base, CompletionState::Incomplete);
        let later = [ActionType::Veneration, ActionType::CarefulSynthesis];
        let earlier = [ActionType::BasicSynthesis, ActionType::CarefulSynthesis];
        assert!(ActionType::BasicSynthesis < ActionType::Veneration);

        tracker.consider(&later, &ended(&base, 2, 1000, 800), CompletionState::Succeeded);
        assert!(tracker.consider(
            &earlier,
            &ended(&base, 2, 1000, 800),
            CompletionState::Succeeded
        ));
        assert_eq!(tracker.best().actions, earlier.to_vec());
        assert!(!tracker.consider(&later, &ended(&base, 2, 1000, 800), CompletionState::Succeeded));
    }

    #[test]
    fn unfinished_paths_rank_by_progress_until_something_finishes() {
        let base = start();
        let mut tracker = BestTracker::new(&base, CompletionState::Incomplete);
        assert!(tracker.consider(
            &[ActionType::BasicTouch],
            &ended(&base, 1, 0, 300),
            CompletionState::Failed
        ));
        assert!(tracker.consider(
            &[ActionType::BasicSynthesis],
            &ended(&base, 1, 400, 0),
            CompletionState::MaxStepsReached
        ));
        assert_eq!(tracker.best().actions, vec![ActionType::BasicSynthesis]);

        tracker.consider(
            &[ActionType::BasicSynthesis; 3],
            &ended(&base, 3, 1000, 0),
            CompletionState::Succeeded,
        );
        assert!(!tracker.consider(
            &[ActionType::BasicSynthesis; 2],
            &ended(&base, 2, 900, 0),
            CompletionState::MaxStepsReached
        ));
        assert_eq!(tracker.best().completion, CompletionState::Succeeded);
    }
}
