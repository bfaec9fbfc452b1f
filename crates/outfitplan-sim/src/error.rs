use outfitplan_core::ModelError;
use outfitplan_solvers::SolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// The policy picked an action that is illegal in the current state.
    /// A policy produced by the solvers never does this.
    #[error("Policy violated the model: {0}")]
    InvalidAction(ModelError),
    #[error("Policy has no action for reachable state {0}")]
    MissingAction(String),
    #[error("Episode did not reach a terminal state within {0} steps")]
    NoTermination(usize),
    #[error("Model has no start state")]
    EmptyStart,
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Report serialisation failed: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
