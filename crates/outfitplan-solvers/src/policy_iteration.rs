//! Policy iteration: alternate iterative policy evaluation and greedy
//! improvement until no state changes its action.

use crate::error::{Result, SolveError};
use crate::policy::{Policy, ValueFunction};
use crate::table::{max_change, ModelTable};
use crate::{check_config, Solution};
use outfitplan_core::{telemetry, Mdp, ModelError, SolverConfig};

/// An incumbent action is only replaced by one that beats it by more than this.
const IMPROVEMENT_MARGIN: f64 = 1e-12;

/// Result of evaluating one policy.
#[derive(Debug, Clone)]
pub struct Evaluation<S: Eq + std::hash::Hash> {
    pub values: ValueFunction<S>,
    /// Sweeps of the Bellman expectation update.
    pub sweeps: usize,
    pub converged: bool,
    /// States whose action changed in the improvement step that followed.
    pub changed: usize,
}

/// Full trace of a policy iteration run.
#[derive(Debug, Clone)]
pub struct PolicyIterationRun<S: Eq + std::hash::Hash, A> {
    pub solution: Solution<S, A>,
    /// One entry per evaluation, in order.
    pub evaluations: Vec<Evaluation<S>>,
}

/// Policy iteration from the default initial policy (first legal action).
pub fn policy_iteration<M: Mdp>(
    model: &M,
    config: &SolverConfig,
) -> Result<Solution<M::State, M::Action>> {
    policy_iteration_from(model, config, None).map(|run| run.solution)
}

/// Policy iteration from an optional initial policy.
///
/// States the initial policy does not cover start with their first legal
/// action. An initial action that is illegal in its state is an error.
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(skip_all, fields(gamma = config.gamma, tolerance = config.tolerance))
)]
pub fn policy_iteration_from<M: Mdp>(
    model: &M,
    config: &SolverConfig,
    initial: Option<&Policy<M::State, M::Action>>,
) -> Result<PolicyIterationRun<M::State, M::Action>> {
    check_config(config)?;
    let table = ModelTable::build(model)?;
    let gamma = config.gamma;

    let mut picks = initial_picks(&table, initial)?;
    let mut values = vec![0.0; table.len()];
    let mut evaluations = Vec::new();
    let mut rounds = 0;
    let mut stable = false;
    let mut last_eval_converged = false;

    while rounds < config.max_iterations {
        rounds += 1;

        let (evaluated, sweeps, eval_converged) = evaluate(&table, &picks, values, config);
        values = evaluated;
        last_eval_converged = eval_converged;
        if !eval_converged {
            telemetry::warn(&format!(
                "policy evaluation in round {rounds} stopped after {sweeps} sweeps without reaching tolerance {}",
                config.tolerance
            ));
        }

        let mut changed = 0;
        for (s, pick) in picks.iter_mut().enumerate() {
            let Some(current) = *pick else { continue };
            let Some((best, best_q)) = table.greedy(s, &values, gamma) else {
                continue;
            };
            let current_q = ModelTable::<M>::q(&table.choices[s][current], &values, gamma);
            if best != current && best_q > current_q + IMPROVEMENT_MARGIN {
                *pick = Some(best);
                changed += 1;
            }
        }
        telemetry::debug(&format!(
            "policy iteration round {rounds}: {sweeps} evaluation sweeps, {changed} actions changed"
        ));

        evaluations.push(Evaluation {
            values: table.value_function(&values),
            sweeps,
            converged: eval_converged,
            changed,
        });

        if changed == 0 {
            stable = true;
            break;
        }
    }
    if !stable {
        telemetry::warn(&format!(
            "policy iteration hit the cap of {rounds} improvement rounds before the policy settled"
        ));
    }

    Ok(PolicyIterationRun {
        solution: Solution {
            policy: table.policy(&picks),
            values: table.value_function(&values),
            converged: stable && last_eval_converged,
            iterations: rounds,
        },
        evaluations,
    })
}

fn initial_picks<M: Mdp>(
    table: &ModelTable<M>,
    initial: Option<&Policy<M::State, M::Action>>,
) -> Result<Vec<Option<usize>>> {
    table
        .states
        .iter()
        .zip(&table.choices)
        .map(|(state, row)| {
            if row.is_empty() {
                return Ok(None);
            }
            match initial.and_then(|p| p.action(state)) {
                None => Ok(Some(0)),
                Some(action) => row
                    .iter()
                    .position(|c| c.action == action)
                    .map(Some)
                    .ok_or_else(|| {
                        SolveError::Model(ModelError::InvalidAction {
                            state: format!("{state:?}"),
                            action: format!("{action:?}"),
                        })
                    }),
            }
        })
        .collect()
}

/// Iterates the Bellman expectation update for a fixed policy, warm-started
/// from `values`. Returns the values, the sweeps used and whether the
/// tolerance was reached.
fn evaluate<M: Mdp>(
    table: &ModelTable<M>,
    picks: &[Option<usize>],
    mut values: Vec<f64>,
    config: &SolverConfig,
) -> (Vec<f64>, usize, bool) {
    for sweep in 1..=config.max_iterations {
        let next: Vec<f64> = picks
            .iter()
            .enumerate()
            .map(|(s, pick)| {
                pick.map_or(0.0, |i| {
                    ModelTable::<M>::q(&table.choices[s][i], &values, config.gamma)
                })
            })
            .collect();
        let delta = max_change(&values, &next);
        values = next;
        if delta < config.tolerance {
            return (values, sweep, true);
        }
    }
    (values, config.max_iterations, false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::Chain;

    #[test]
    fn improves_from_the_default_policy() {
        let model = Chain::new(vec![1.0, 3.0, 2.0]);
        let run = policy_iteration_from(&model, &SolverConfig::default(), None).unwrap();
        assert!(run.solution.converged);
        assert_eq!(run.solution.policy.action(&0), Some(1));
        assert_eq!(run.solution.policy.action(&1), Some(1));
        // first round switches both states, second round finds nothing to change
        assert_eq!(run.evaluations.len(), 2);
        assert_eq!(run.evaluations[0].changed, 2);
        assert_eq!(run.evaluations[1].changed, 0);
    }

    #[test]
    fn starts_from_a_given_policy() {
        let model = Chain::new(vec![1.0, 3.0]);
        let initial: Policy<u8, u8> = [(0, 1), (1, 1)].into_iter().collect();
        let run = policy_iteration_from(&model, &SolverConfig::default(), Some(&initial)).unwrap();
        assert_eq!(run.evaluations.len(), 1);
        assert_eq!(run.solution.iterations, 1);
    }

    #[test]
    fn illegal_initial_action_is_rejected() {
        let model = Chain::new(vec![1.0, 3.0]);
        let initial: Policy<u8, u8> = [(0, 7)].into_iter().collect();
        let err = policy_iteration_from(&model, &SolverConfig::default(), Some(&initial))
            .unwrap_err();
        assert!(matches!(
            err,
            SolveError::Model(ModelError::InvalidAction { .. })
        ));
    }

    #[test]
    fn evaluation_cap_degrades_but_continues() {
        let model = Chain::new(vec![1.0, 3.0]);
        let config = SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        };
        let run = policy_iteration_from(&model, &config, None).unwrap();
        assert!(!run.solution.converged);
        assert!(!run.evaluations[0].converged);
        assert_eq!(run.solution.policy.len(), 2);
    }
}
