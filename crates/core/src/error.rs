use crate::{ActionType, CompletionState};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("invalid simulation input: {0}")]
    InvalidInput(String),
    #[error("action {action:?} cannot be used: {reason}")]
    ActionUnavailable { action: ActionType, reason: String },
    #[error("craft already finished ({0:?})")]
    AlreadyComplete(CompletionState),
}
