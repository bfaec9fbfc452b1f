#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Core types for outfitplan: the MDP contract and the two outfit models.
//!
//! Both [`CategoryMdp`] and [`WardrobeMdp`] implement [`Mdp`], so the solvers
//! and the simulator run unmodified against either of them.

pub mod category;
pub mod config;
pub mod error;
pub mod reward;
pub mod telemetry;
pub mod wardrobe;
pub mod weather;

use std::fmt::Debug;
use std::hash::Hash;

pub use category::{Category, CategoryId, CategoryMdp, CategoryState, Recent, MAX_WINDOW};
pub use config::{PlanConfig, SimulationConfig, SolverConfig, WeatherConfig};
pub use error::{ModelError, Result};
pub use reward::RewardWeights;
pub use wardrobe::{Outfit, OutfitId, OutfitSet, WardrobeMdp, WardrobeState, MAX_POOL_SIZE};
pub use weather::{StartDistribution, WeatherId, WeatherModel, PROBABILITY_TOLERANCE};

/// Number of days an outfit is chosen for. Day `HORIZON_DAYS` is terminal.
pub const HORIZON_DAYS: u8 = 7;

/// A finite Markov decision process.
pub trait Mdp {
    type State: Copy + Eq + Hash + Debug;
    type Action: Copy + Eq + Debug;

    /// Every reachable state, terminal ones included.
    fn states(&self) -> Vec<Self::State>;

    /// Legal actions in ascending index order; empty only for terminal states.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Successor states with their probabilities. Empty for terminal states.
    fn transition(
        &self,
        state: &Self::State,
        action: Self::Action,
    ) -> impl Iterator<Item = (Self::State, f64)> + '_;

    fn reward(&self, state: &Self::State, action: Self::Action, next: &Self::State) -> f64;

    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Distribution over day-0 states.
    fn start_states(&self) -> Vec<(Self::State, f64)>;

    fn is_legal(&self, state: &Self::State, action: Self::Action) -> bool {
        self.actions(state).contains(&action)
    }
}

/// How well one day's choice went, independent of the numeric reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Assessment {
    pub suits_weather: bool,
    pub repeated: bool,
}

/// Outfit-specific view on a model, used for reporting.
pub trait OutfitModel: Mdp {
    fn weather_model(&self) -> &WeatherModel;
    fn day(&self, state: &Self::State) -> u8;
    fn weather(&self, state: &Self::State) -> WeatherId;
    fn action_name(&self, action: Self::Action) -> &str;
    /// Display names of what the state remembers as already worn.
    fn worn(&self, state: &Self::State) -> Vec<&str>;
    fn assess(&self, state: &Self::State, action: Self::Action) -> Assessment;
}

/// Checks that every legal (state, action) pair has a proper successor
/// distribution and a finite reward.
///
/// Models call this from their constructors so a malformed model never
/// reaches a solver.
pub fn validate_model<M: Mdp>(model: &M) -> Result<()> {
    let start_sum: f64 = model.start_states().iter().map(|(_, p)| p).sum();
    if (start_sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ModelError::Malformed(format!(
            "start distribution sums to {start_sum}"
        )));
    }
    for state in model.states() {
        if model.is_terminal(&state) {
            continue;
        }
        let actions = model.actions(&state);
        if actions.is_empty() {
            return Err(ModelError::Malformed(format!(
                "non-terminal state {state:?} has no legal actions"
            )));
        }
        for action in actions {
            let mut sum = 0.0;
            for (next, p) in model.transition(&state, action) {
                if !p.is_finite() || p < 0.0 {
                    return Err(ModelError::Malformed(format!(
                        "invalid probability {p} for {state:?} --{action:?}--> {next:?}"
                    )));
                }
                let r = model.reward(&state, action, &next);
                if !r.is_finite() {
                    return Err(ModelError::Malformed(format!(
                        "reward for {state:?} --{action:?}--> {next:?} is {r}"
                    )));
                }
                sum += p;
            }
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(ModelError::Malformed(format!(
                    "transition from {state:?} under {action:?} sums to {sum}"
                )));
            }
        }
    }
    Ok(())
}
