//! Evaluation harness: both solvers on one model, each policy simulated,
//! and a JSON report that cross-checks them.

use crate::error::Result;
use crate::simulate::{sample_week, simulate, MaybeSend, MaybeSync, WeekEntry};
use outfitplan_core::{telemetry, Mdp, OutfitModel, SimulationConfig, SolverConfig};
use outfitplan_solvers::{solve, Method, Solution};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Results of one solver on one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodReport {
    pub method: Method,
    pub converged: bool,
    pub iterations: usize,
    /// Expected discounted return from the start distribution.
    pub expected_start_value: f64,
    pub mean_reward: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min_reward: f64,
    pub max_reward: f64,
    pub mismatches: usize,
    pub repeats: usize,
    pub average_days_dressed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: String,
    pub generated_at: String,
    pub states: usize,
    pub episodes: usize,
    pub seed: u64,
    pub methods: Vec<MethodReport>,
    /// Largest per-state difference between the two value functions.
    pub max_value_gap: f64,
    /// States on which the two policies pick different actions.
    pub policy_disagreements: usize,
    /// One week played with the value-iteration policy.
    pub sample_week: Vec<WeekEntry>,
}

impl ModelReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn method(&self, method: Method) -> Option<&MethodReport> {
        self.methods.iter().find(|m| m.method == method)
    }
}

/// Solves `model` with value and policy iteration, simulates both policies
/// with the same seed and compares them.
pub fn evaluate<M>(
    name: &str,
    model: &M,
    solver: &SolverConfig,
    simulation: &SimulationConfig,
) -> Result<ModelReport>
where
    M: OutfitModel + MaybeSync,
    M::State: MaybeSend + MaybeSync,
    M::Action: MaybeSend + MaybeSync,
{
    let vi = solve(model, Method::ValueIteration, solver)?;
    let pi = solve(model, Method::PolicyIteration, solver)?;

    let methods = vec![
        method_report(model, Method::ValueIteration, &vi, simulation)?,
        method_report(model, Method::PolicyIteration, &pi, simulation)?,
    ];

    let states = model.states();
    let max_value_gap = vi.values.max_abs_diff(&pi.values);
    let policy_disagreements = states
        .iter()
        .filter(|s| vi.policy.action(s) != pi.policy.action(s))
        .count();
    if policy_disagreements > 0 {
        telemetry::debug(&format!(
            "{name}: policies disagree on {policy_disagreements} states (value gap {max_value_gap:.2e})"
        ));
    }

    Ok(ModelReport {
        model: name.to_string(),
        generated_at: rfc3339_now(),
        states: states.len(),
        episodes: simulation.episodes,
        seed: simulation.seed,
        methods,
        max_value_gap,
        policy_disagreements,
        sample_week: sample_week(model, &vi.policy, simulation.seed)?,
    })
}

fn method_report<M>(
    model: &M,
    method: Method,
    solution: &Solution<M::State, M::Action>,
    simulation: &SimulationConfig,
) -> Result<MethodReport>
where
    M: OutfitModel + MaybeSync,
    M::State: MaybeSend + MaybeSync,
    M::Action: MaybeSend + MaybeSync,
{
    let report = simulate(model, &solution.policy, simulation)?;
    let stats = &report.statistics;
    Ok(MethodReport {
        method,
        converged: solution.converged,
        iterations: solution.iterations,
        expected_start_value: expected_start_value(model, solution),
        mean_reward: stats.mean,
        variance: stats.variance,
        std_dev: stats.std_dev(),
        min_reward: stats.min,
        max_reward: stats.max,
        mismatches: report.counts.mismatches,
        repeats: report.counts.repeats,
        average_days_dressed: report.counts.average_days_dressed(stats.episodes),
    })
}

/// `sum p(s0) * V(s0)` over the model's start distribution.
pub fn expected_start_value<M: Mdp>(model: &M, solution: &Solution<M::State, M::Action>) -> f64 {
    model
        .start_states()
        .iter()
        .map(|(s, p)| p * solution.values.value(s).unwrap_or(0.0))
        .sum()
}

fn rfc3339_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use outfitplan_core::PlanConfig;

    fn small_run() -> SimulationConfig {
        SimulationConfig {
            episodes: 50,
            seed: 9,
        }
    }

    #[test]
    fn category_report_agrees_between_methods() {
        let cfg = PlanConfig::default();
        let model = cfg.category_model().unwrap();
        let report = evaluate("category", &model, &cfg.solver, &small_run()).unwrap();
        assert_eq!(report.methods.len(), 2);
        assert!(report.methods.iter().all(|m| m.converged));
        assert!(report.max_value_gap < 1e-2, "gap {}", report.max_value_gap);
        assert_eq!(report.sample_week.len(), 7);
        assert!(report.method(Method::PolicyIteration).is_some());
    }

    #[test]
    fn wardrobe_report_dresses_every_day() {
        let cfg = PlanConfig::default();
        let model = cfg.wardrobe_model().unwrap();
        let report = evaluate("wardrobe", &model, &cfg.solver, &small_run()).unwrap();
        for method in &report.methods {
            assert!((method.average_days_dressed - 7.0).abs() < 1e-12);
        }
    }

    #[test]
    fn report_serialises_with_timestamp() {
        let cfg = PlanConfig::default();
        let model = cfg.category_model().unwrap();
        let report = evaluate("category", &model, &cfg.solver, &small_run()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["model"], "category");
        assert_eq!(json["methods"][0]["method"], "value_iteration");
        let stamp = json["generated_at"].as_str().unwrap();
        assert!(stamp.contains('T') && stamp.ends_with('Z'), "{stamp}");
    }
}
