use craftsim_core::SimulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid starting state: {0}")]
    InvalidStart(String),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("solver thread error: {0}")]
    Thread(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("serialize error: {0}")]
    Serialize(String),
}

impl From<std::io::Error> for SolverError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for SolverError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}
