use outfitplan_core::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid solver config: {0}")]
    InvalidConfig(String),
    #[error("Transition from {from} leads to state {to} outside the state space")]
    UnknownSuccessor { from: String, to: String },
    #[error("Non-terminal state {0} has no legal actions")]
    NoActions(String),
}

pub type Result<T> = std::result::Result<T, SolveError>;
