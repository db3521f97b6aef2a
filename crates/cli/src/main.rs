use anyhow::{bail, Context, Result};
use clap::Parser;
use craftsim_core::{RngState, SimulationState, Simulator};
use craftsim_solver::{write_json, write_text, SolverConfig, SolverHandle, SolverResult};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

mod scenario;

use scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "craftsim", author, version, about, long_about = None)]
struct Args {
    /// Scenario JSON with stats, recipe and starting quality
    scenario: PathBuf,

    /// Step budget for the craft
    #[arg(long)]
    max_steps: Option<u32>,

    /// Search iterations before each committed step
    #[arg(long)]
    iterations: Option<u32>,

    /// Search seed
    #[arg(long)]
    seed: Option<u64>,

    /// Expand from every legal action instead of the recommended ones
    #[arg(long)]
    no_prune: bool,

    /// Replay the macro with random rolls from this seed
    #[arg(long)]
    replay_seed: Option<u64>,

    /// Write the full search trace as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a readable report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let scenario = Scenario::load(&args.scenario)?;
    let state = scenario.initial_state()?;

    let mut config = scenario.solver.clone().unwrap_or_default();
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    if let Some(iterations) = args.iterations {
        config.iterations_per_step = iterations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_prune {
        config.strict_actions = false;
    }

    log::info!(
        "base gains: progress {} quality {}",
        state.input.base_progress_gain(),
        state.input.base_quality_gain()
    );

    let result = solve_in_background(state.clone(), config.clone())?;

    print_result(&result);

    if let Some(seed) = args.replay_seed {
        let mut rolls = RngState::from_seed(seed);
        let (end, completion) = Simulator::new(config.max_steps)
            .replay(&state, &result.actions, &mut rolls)
            .context("replaying macro")?;
        println!(
            "replay seed {seed}: {completion:?} progress {}/{} quality {}/{}",
            end.progress,
            end.input.recipe.max_progress,
            end.quality,
            end.input.recipe.max_quality
        );
    }

    if let Some(path) = args.output.as_ref() {
        write_json(path, &result).with_context(|| format!("writing {}", path.display()))?;
        log::info!("trace written to {}", path.display());
    }
    if let Some(path) = args.report.as_ref() {
        write_text(path, &result).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

/// Polls the background search the way an overlay would, printing each
/// improvement until the search finishes.
fn solve_in_background(state: SimulationState, config: SolverConfig) -> Result<SolverResult> {
    let handle = SolverHandle::start(state, config).context("starting solver thread")?;
    let mut last: Option<(usize, u32)> = None;
    loop {
        let snapshot = handle.poll();
        if let Some(state) = snapshot.state.as_ref() {
            let current = (snapshot.actions.len(), state.quality);
            if last != Some(current) {
                log::info!(
                    "best so far: {} actions, progress {} quality {}",
                    current.0,
                    state.progress,
                    current.1
                );
                last = Some(current);
            }
        }
        if let Some(err) = snapshot.error {
            bail!("solver failed: {err}");
        }
        if snapshot.is_complete {
            return snapshot
                .result
                .context("solver finished without a result");
        }
        thread::sleep(Duration::from_millis(50));
    }
}

fn print_result(result: &SolverResult) {
    println!("status: {:?} ({:?})", result.status, result.completion);
    let fin = &result.final_summary;
    println!(
        "progress {}/{} quality {}/{} durability {}/{} cp {}/{}",
        fin.progress,
        fin.max_progress,
        fin.quality,
        fin.max_quality,
        fin.durability,
        fin.max_durability,
        fin.cp,
        fin.max_cp
    );
    println!(
        "iterations: {} wall: {}ms",
        result.summary.total_iterations, result.summary.wall_time_ms
    );
    for (idx, action) in result.expanded_actions().iter().enumerate() {
        println!("{:>3}. {}", idx + 1, action.stable_key());
    }
}
