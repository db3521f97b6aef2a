//! Background solving with a polled single-slot result.

use crate::{BestPath, Solver, SolverConfig, SolverError, SolverResult};
use craftsim_core::{ActionType, CompletionState, SimulationState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// What a reader sees when polling a running search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverSnapshot {
    pub actions: Vec<ActionType>,
    pub state: Option<SimulationState>,
    pub completion: Option<CompletionState>,
    pub is_complete: bool,
    pub cancelled: bool,
    pub error: Option<String>,
    /// Full result, present once the search has finished on its own.
    pub result: Option<SolverResult>,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<SolverSnapshot>,
    cancel: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SolverSnapshot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, best: &BestPath) {
        let mut slot = self.lock();
        if self.cancel.load(Ordering::Acquire) {
            return;
        }
        slot.actions = best.actions.clone();
        slot.state = Some(best.state.clone());
        slot.completion = Some(best.completion);
    }

    fn finish(&self, outcome: Result<SolverResult, SolverError>) {
        let mut slot = self.lock();
        if self.cancel.load(Ordering::Acquire) {
            return;
        }
        match outcome {
            Ok(result) => {
                slot.actions = result.actions.clone();
                slot.completion = Some(result.completion);
                slot.state = result.final_state.clone();
                slot.result = Some(result);
            }
            Err(err) => {
                log::warn!("solver failed: {err}");
                slot.error = Some(err.to_string());
            }
        }
        slot.is_complete = true;
    }
}

/// A search running on its own thread. Dropping the handle cancels the search
/// and waits for the thread to exit.
#[derive(Debug)]
pub struct SolverHandle {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SolverHandle {
    pub fn start(state: SimulationState, config: SolverConfig) -> Result<Self, SolverError> {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("craftsim-solver".to_string())
            .spawn(move || {
                let solver = Solver::new(config);
                let outcome = solver.solve_with(&state, &worker_shared.cancel, |best| {
                    worker_shared.publish(best)
                });
                worker_shared.finish(outcome);
            })?;
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Copies the current best result. Holds the slot lock only for the copy.
    pub fn poll(&self) -> SolverSnapshot {
        self.shared.lock().clone()
    }

    /// Stops the search at its next iteration boundary. Nothing the search
    /// produces afterwards reaches the slot.
    pub fn cancel(&self) {
        let mut slot = self.shared.lock();
        self.shared.cancel.store(true, Ordering::Release);
        slot.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Blocks until the search thread exits and returns the final snapshot.
    pub fn wait(mut self) -> Result<SolverSnapshot, SolverError> {
        self.join_worker()?;
        Ok(self.poll())
    }

    fn join_worker(&mut self) -> Result<(), SolverError> {
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| SolverError::Thread("solver thread panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for SolverHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.cancel();
            if let Err(err) = self.join_worker() {
                log::warn!("{err}");
            }
        }
    }
}

/// Owns at most one search; starting a new one retires the previous search
/// first so its late results can never replace the new ones.
#[derive(Debug, Default)]
pub struct SolverDriver {
    current: Option<SolverHandle>,
    generation: u64,
}

impl SolverDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart(&mut self, state: SimulationState, config: SolverConfig) -> Result<u64, SolverError> {
        if let Some(previous) = self.current.take() {
            previous.cancel();
            drop(previous);
        }
        self.current = Some(SolverHandle::start(state, config)?);
        self.generation = self.generation.wrapping_add(1);
        log::debug!("solver generation {}", self.generation);
        Ok(self.generation)
    }

    pub fn poll(&self) -> Option<SolverSnapshot> {
        self.current.as_ref().map(SolverHandle::poll)
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&self) -> Option<&SolverHandle> {
        self.current.as_ref()
    }
}
