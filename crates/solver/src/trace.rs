use crate::SolverError;
use craftsim_core::{ActionType, CompletionState, SimulationState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SolveStatus {
    /// A sequence that finishes the craft was found.
    Completed,
    /// Nothing finished the craft; the sequence with the most progress is reported.
    BestEffort,
    Cancelled,
}

/// Serializable view of a simulation state's resource pools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSummary {
    pub step: u32,
    pub progress: u32,
    pub max_progress: u32,
    pub quality: u32,
    pub max_quality: u32,
    pub durability: u32,
    pub max_durability: u32,
    pub cp: u32,
    pub max_cp: u32,
}

impl StateSummary {
    pub fn of(state: &SimulationState) -> Self {
        let recipe = &state.input.recipe;
        Self {
            step: state.step,
            progress: state.progress,
            max_progress: recipe.max_progress,
            quality: state.quality,
            max_quality: recipe.max_quality,
            durability: state.durability,
            max_durability: recipe.max_durability,
            cp: state.cp,
            max_cp: state.input.max_cp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepSearchStats {
    pub iterations: u32,
    pub elapsed_ms: u64,
    pub root_children: usize,
    pub selected_visits: u32,
    pub selected_value: f64,
}

/// One committed move of the stepwise search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    pub step: u32,
    pub action: ActionType,
    pub before: StateSummary,
    pub after: StateSummary,
    pub completion_after: CompletionState,
    pub search: StepSearchStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub steps: u32,
    pub total_iterations: u64,
    pub wall_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverResult {
    pub status: SolveStatus,
    /// Best sequence found, which may extend past the committed steps.
    pub actions: Vec<ActionType>,
    pub completion: CompletionState,
    pub final_summary: StateSummary,
    #[serde(skip)]
    pub final_state: Option<SimulationState>,
    pub steps: Vec<StepRecord>,
    pub summary: SummaryStats,
}

impl SolverResult {
    /// The macro with combo entries replaced by their parts, in the order a
    /// crafter would press them.
    pub fn expanded_actions(&self) -> Vec<ActionType> {
        self.actions
            .iter()
            .flat_map(|action| {
                let parts = action.descriptor().parts;
                if parts.is_empty() {
                    vec![*action]
                } else {
                    parts.to_vec()
                }
            })
            .collect()
    }

    pub fn to_text_report(&self) -> String {
        let fin = &self.final_summary;
        let mut lines = vec![
            format!("status: {}", status_label(self.status)),
            format!("completion: {:?}", self.completion),
            format!(
                "final: progress={}/{} quality={}/{} durability={}/{} cp={}/{} steps={}",
                fin.progress,
                fin.max_progress,
                fin.quality,
                fin.max_quality,
                fin.durability,
                fin.max_durability,
                fin.cp,
                fin.max_cp,
                fin.step
            ),
            format!(
                "summary: committed={} iterations={} wall_ms={}",
                self.summary.steps, self.summary.total_iterations, self.summary.wall_time_ms
            ),
            String::new(),
            "macro:".to_string(),
        ];
        if self.actions.is_empty() {
            lines.push("  (none)".to_string());
        }
        for (idx, action) in self.actions.iter().enumerate() {
            lines.push(format!("  {:>3}. {}", idx + 1, action.stable_key()));
        }
        lines.push(String::new());
        lines.push("search:".to_string());
        for step in &self.steps {
            lines.push(format!(
                "  step {:>3} | {}",
                step.step,
                step.action.stable_key()
            ));
            lines.push(format!(
                "    progress {} -> {} quality {} -> {} durability {} -> {} cp {} -> {}",
                step.before.progress,
                step.after.progress,
                step.before.quality,
                step.after.quality,
                step.before.durability,
                step.after.durability,
                step.before.cp,
                step.after.cp
            ));
            lines.push(format!(
                "    iterations={} elapsed={}ms children={} pick_visits={} pick_value={:.3}",
                step.search.iterations,
                step.search.elapsed_ms,
                step.search.root_children,
                step.search.selected_visits,
                step.search.selected_value
            ));
        }
        lines.join("\n")
    }
}

fn status_label(status: SolveStatus) -> &'static str {
    match status {
        SolveStatus::Completed => "Completed",
        SolveStatus::BestEffort => "BestEffort (no finishing sequence found)",
        SolveStatus::Cancelled => "Cancelled",
    }
}

pub fn write_json(path: &Path, result: &SolverResult) -> Result<(), SolverError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(result)?;
    fs::write(path, body)?;
    Ok(())
}

pub fn write_text(path: &Path, result: &SolverResult) -> Result<(), SolverError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, result.to_text_report())?;
    Ok(())
}
