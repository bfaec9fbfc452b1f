//! Dense tabulation of a model, shared by both solvers.
//!
//! States get arena indices once; every legal (state, action) pair stores
//! its successors as `(index, probability, reward)` so sweeps never touch
//! the model again.

use crate::error::{Result, SolveError};
use crate::policy::{Policy, ValueFunction};
use outfitplan_core::Mdp;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Outcome {
    pub next: usize,
    pub probability: f64,
    pub reward: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Choice<A> {
    pub action: A,
    pub outcomes: Vec<Outcome>,
}

pub(crate) struct ModelTable<M: Mdp> {
    pub states: Vec<M::State>,
    /// Legal actions per state in the model's order; empty for terminal states.
    pub choices: Vec<Vec<Choice<M::Action>>>,
}

impl<M: Mdp> ModelTable<M> {
    pub fn build(model: &M) -> Result<Self> {
        let states = model.states();
        let index: HashMap<M::State, usize> =
            states.iter().enumerate().map(|(i, s)| (*s, i)).collect();

        let mut choices = Vec::with_capacity(states.len());
        for state in &states {
            if model.is_terminal(state) {
                choices.push(Vec::new());
                continue;
            }
            let actions = model.actions(state);
            if actions.is_empty() {
                return Err(SolveError::NoActions(format!("{state:?}")));
            }
            let mut row = Vec::with_capacity(actions.len());
            for action in actions {
                let mut outcomes = Vec::new();
                for (next, probability) in model.transition(state, action) {
                    let Some(&next_idx) = index.get(&next) else {
                        return Err(SolveError::UnknownSuccessor {
                            from: format!("{state:?}"),
                            to: format!("{next:?}"),
                        });
                    };
                    outcomes.push(Outcome {
                        next: next_idx,
                        probability,
                        reward: model.reward(state, action, &next),
                    });
                }
                row.push(Choice { action, outcomes });
            }
            choices.push(row);
        }

        Ok(Self { states, choices })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// One-step lookahead: `sum p * (r + gamma * V(next))`.
    pub fn q(choice: &Choice<M::Action>, values: &[f64], gamma: f64) -> f64 {
        choice
            .outcomes
            .iter()
            .map(|o| o.probability * (o.reward + gamma * values[o.next]))
            .sum()
    }

    /// Best choice index and its value; the first maximiser wins ties.
    /// `None` for terminal states.
    pub fn greedy(&self, state: usize, values: &[f64], gamma: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, choice) in self.choices[state].iter().enumerate() {
            let q = Self::q(choice, values, gamma);
            if best.map_or(true, |(_, b)| q > b) {
                best = Some((i, q));
            }
        }
        best
    }

    pub fn value_function(&self, values: &[f64]) -> ValueFunction<M::State> {
        self.states.iter().copied().zip(values.iter().copied()).collect()
    }

    pub fn policy(&self, picks: &[Option<usize>]) -> Policy<M::State, M::Action> {
        self.states
            .iter()
            .zip(&self.choices)
            .zip(picks)
            .filter_map(|((s, row), pick)| pick.map(|i| (*s, row[i].action)))
            .collect()
    }
}

/// Largest absolute per-state change between two sweeps.
pub(crate) fn max_change(old: &[f64], new: &[f64]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
