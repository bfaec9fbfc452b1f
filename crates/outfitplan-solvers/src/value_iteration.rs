//! Value iteration: synchronous Bellman-optimality sweeps until the largest
//! per-state change drops below the tolerance.

use crate::error::Result;
use crate::table::{max_change, ModelTable};
use crate::{check_config, Solution};
use outfitplan_core::{telemetry, Mdp, SolverConfig};

/// Computes the optimal value function and its greedy policy.
///
/// Hitting `max_iterations` is not an error: the result carries
/// `converged == false` and the best values found so far.
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(skip_all, fields(gamma = config.gamma, tolerance = config.tolerance))
)]
pub fn value_iteration<M: Mdp>(
    model: &M,
    config: &SolverConfig,
) -> Result<Solution<M::State, M::Action>> {
    check_config(config)?;
    let table = ModelTable::build(model)?;
    let gamma = config.gamma;

    let mut values = vec![0.0; table.len()];
    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iterations {
        iterations += 1;
        let next: Vec<f64> = (0..table.len())
            .map(|s| table.greedy(s, &values, gamma).map_or(0.0, |(_, q)| q))
            .collect();
        let delta = max_change(&values, &next);
        values = next;
        telemetry::debug(&format!("value iteration sweep {iterations}: delta {delta:.3e}"));
        if delta < config.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        telemetry::warn(&format!(
            "value iteration stopped after {iterations} sweeps without reaching tolerance {}",
            config.tolerance
        ));
    }

    let picks: Vec<Option<usize>> = (0..table.len())
        .map(|s| table.greedy(s, &values, gamma).map(|(i, _)| i))
        .collect();

    Ok(Solution {
        policy: table.policy(&picks),
        values: table.value_function(&values),
        converged,
        iterations,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::Chain;

    #[test]
    fn picks_the_better_arm_on_a_two_step_chain() {
        let model = Chain::new(vec![1.0, 3.0]);
        let solution = value_iteration(&model, &SolverConfig::default()).unwrap();
        assert!(solution.converged);
        assert_eq!(solution.policy.action(&0), Some(1));
        // two decisions, each worth 3, second one discounted
        let v0 = solution.values.value(&0).unwrap();
        assert!((v0 - (3.0 + 0.95 * 3.0)).abs() < 1e-9);
        assert_eq!(solution.values.value(&2), Some(0.0));
    }

    #[test]
    fn ties_go_to_the_lowest_action() {
        let model = Chain::new(vec![2.0, 2.0, 2.0]);
        let solution = value_iteration(&model, &SolverConfig::default()).unwrap();
        assert_eq!(solution.policy.action(&0), Some(0));
        assert_eq!(solution.policy.action(&1), Some(0));
    }

    #[test]
    fn iteration_cap_is_reported_not_fatal() {
        let model = Chain::new(vec![1.0, 2.0]);
        let config = SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        };
        let solution = value_iteration(&model, &config).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.policy.len(), 2);
    }

    #[test]
    fn rejects_invalid_discount() {
        let model = Chain::new(vec![1.0]);
        let config = SolverConfig {
            gamma: 1.5,
            ..SolverConfig::default()
        };
        assert!(value_iteration(&model, &config).is_err());
    }
}
