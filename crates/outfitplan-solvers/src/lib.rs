#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Dynamic-programming solvers for outfitplan models.
//!
//! Both solvers are generic over [`Mdp`]; they tabulate the model once and
//! then sweep dense arrays. Neither mutates the model.
//!
//! ```no_run
//! use outfitplan_core::PlanConfig;
//! use outfitplan_solvers::{solve, Method};
//!
//! let cfg = PlanConfig::default();
//! let model = cfg.category_model().unwrap();
//! let solution = solve(&model, Method::ValueIteration, &cfg.solver).unwrap();
//! assert!(solution.converged);
//! ```

pub mod error;
pub mod policy;
pub mod policy_iteration;
mod table;
pub mod value_iteration;

use outfitplan_core::{Mdp, SolverConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

pub use error::{Result, SolveError};
pub use policy::{Policy, ValueFunction};
pub use policy_iteration::{policy_iteration, policy_iteration_from, Evaluation, PolicyIterationRun};
pub use value_iteration::value_iteration;

/// Output of a solver run.
#[derive(Debug, Clone)]
pub struct Solution<S: Eq + Hash, A> {
    pub policy: Policy<S, A>,
    pub values: ValueFunction<S>,
    /// `false` when an iteration cap was hit; the result is then best-effort.
    pub converged: bool,
    /// Sweeps for value iteration, improvement rounds for policy iteration.
    pub iterations: usize,
}

/// Which solver to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    ValueIteration,
    PolicyIteration,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::ValueIteration, Method::PolicyIteration];

    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Method::ValueIteration => "vi",
            Method::PolicyIteration => "pi",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::ValueIteration => f.write_str("value iteration"),
            Method::PolicyIteration => f.write_str("policy iteration"),
        }
    }
}

impl FromStr for Method {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" | "value-iteration" | "value_iteration" => Ok(Method::ValueIteration),
            "pi" | "policy-iteration" | "policy_iteration" => Ok(Method::PolicyIteration),
            other => Err(SolveError::InvalidConfig(format!("unknown method '{other}'"))),
        }
    }
}

/// Solves `model` with the chosen method.
pub fn solve<M: Mdp>(
    model: &M,
    method: Method,
    config: &SolverConfig,
) -> Result<Solution<M::State, M::Action>> {
    match method {
        Method::ValueIteration => value_iteration(model, config),
        Method::PolicyIteration => policy_iteration(model, config),
    }
}

pub(crate) fn check_config(config: &SolverConfig) -> Result<()> {
    config.validate().map_err(SolveError::InvalidConfig)
}
