#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Simulation and evaluation of outfit policies.
//!
//! [`simulate`] rolls a policy out over many independent weeks and
//! [`evaluate`] runs both solvers on one model and compares the results.

pub mod error;
pub mod evaluate;
pub mod rng;
pub mod simulate;
pub mod stats;

pub use error::{Result, SimError};
pub use evaluate::{evaluate, expected_start_value, MethodReport, ModelReport};
pub use simulate::{
    run_episode, sample_week, simulate, Episode, MaybeSend, MaybeSync, SimulationReport, Step,
    WeekEntry,
};
pub use stats::{OutfitCounts, RewardStatistics};
