//! Monte-Carlo rollouts of a fixed policy.

use crate::error::{Result, SimError};
use crate::rng::{episode_rng, sample};
use crate::stats::{OutfitCounts, RewardStatistics};
use outfitplan_core::{telemetry, Assessment, ModelError, OutfitModel, SimulationConfig, HORIZON_DAYS};
use outfitplan_solvers::Policy;
use rand::Rng;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// `Sync` when episodes run on the rayon pool, no bound otherwise.
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> MaybeSync for T {}
#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSync for T {}

/// `Send` when episodes run on the rayon pool, no bound otherwise.
#[cfg(feature = "parallel")]
pub trait MaybeSend: Send {}
#[cfg(feature = "parallel")]
impl<T: Send + ?Sized> MaybeSend for T {}
#[cfg(not(feature = "parallel"))]
pub trait MaybeSend {}
#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSend for T {}

/// One day of an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<S, A> {
    pub state: S,
    pub action: A,
    pub reward: f64,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode<S, A> {
    pub steps: Vec<Step<S, A>>,
    /// Undiscounted sum of the step rewards.
    pub total_reward: f64,
}

impl<S, A> Episode<S, A> {
    #[must_use]
    pub fn counts(&self) -> OutfitCounts {
        let mut counts = OutfitCounts::default();
        for step in &self.steps {
            counts.days_dressed += 1;
            if !step.assessment.suits_weather {
                counts.mismatches += 1;
            }
            if step.assessment.repeated {
                counts.repeats += 1;
            }
        }
        counts
    }
}

/// Aggregate of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport<S, A> {
    pub episode_rewards: Vec<f64>,
    /// The first episode, kept in full.
    pub sample_trajectory: Vec<Step<S, A>>,
    pub statistics: RewardStatistics,
    pub counts: OutfitCounts,
}

/// Plays one week under `policy`.
///
/// An action the model does not allow in the current state is fatal and
/// reported as [`SimError::InvalidAction`].
pub fn run_episode<M, R>(
    model: &M,
    policy: &Policy<M::State, M::Action>,
    rng: &mut R,
) -> Result<Episode<M::State, M::Action>>
where
    M: OutfitModel,
    R: Rng + ?Sized,
{
    let start = model.start_states();
    let mut state = sample(&start, rng).ok_or(SimError::EmptyStart)?;
    let mut steps = Vec::with_capacity(usize::from(HORIZON_DAYS));
    let mut total_reward = 0.0;

    while !model.is_terminal(&state) {
        if steps.len() >= usize::from(HORIZON_DAYS) {
            return Err(SimError::NoTermination(steps.len()));
        }
        let action = policy
            .action(&state)
            .ok_or_else(|| SimError::MissingAction(format!("{state:?}")))?;
        if !model.is_legal(&state, action) {
            return Err(SimError::InvalidAction(ModelError::InvalidAction {
                state: format!("{state:?}"),
                action: format!("{action:?}"),
            }));
        }
        let successors: Vec<_> = model.transition(&state, action).collect();
        let next = sample(&successors, rng)
            .ok_or_else(|| SimError::MissingAction(format!("{state:?} has no successor")))?;
        let reward = model.reward(&state, action, &next);
        total_reward += reward;
        steps.push(Step {
            state,
            action,
            reward,
            assessment: model.assess(&state, action),
        });
        state = next;
    }

    Ok(Episode {
        steps,
        total_reward,
    })
}

/// Plays `config.episodes` independent weeks.
///
/// Episode `i` draws from its own generator seeded with `(config.seed, i)`,
/// so the report is the same whether or not the `parallel` feature is on.
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(skip_all, fields(episodes = config.episodes, seed = config.seed))
)]
pub fn simulate<M>(
    model: &M,
    policy: &Policy<M::State, M::Action>,
    config: &SimulationConfig,
) -> Result<SimulationReport<M::State, M::Action>>
where
    M: OutfitModel + MaybeSync,
    M::State: MaybeSend + MaybeSync,
    M::Action: MaybeSend + MaybeSync,
{
    let play = |episode: usize| {
        let mut rng = episode_rng(config.seed, episode as u64);
        run_episode(model, policy, &mut rng)
    };

    #[cfg(feature = "parallel")]
    let episodes: Vec<Episode<M::State, M::Action>> = (0..config.episodes)
        .into_par_iter()
        .map(play)
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let episodes: Vec<Episode<M::State, M::Action>> =
        (0..config.episodes).map(play).collect::<Result<_>>()?;

    let episode_rewards: Vec<f64> = episodes.iter().map(|e| e.total_reward).collect();
    let mut counts = OutfitCounts::default();
    for episode in &episodes {
        counts.merge(&episode.counts());
    }
    let statistics = RewardStatistics::from_rewards(&episode_rewards);
    let sample_trajectory = episodes
        .into_iter()
        .next()
        .map(|e| e.steps)
        .unwrap_or_default();

    telemetry::debug(&format!(
        "simulated {} episodes: mean reward {:.3}, {} mismatches, {} repeats",
        statistics.episodes, statistics.mean, counts.mismatches, counts.repeats
    ));

    Ok(SimulationReport {
        episode_rewards,
        sample_trajectory,
        statistics,
        counts,
    })
}

/// One line of a printed week plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekEntry {
    pub day: u8,
    pub weather: String,
    pub choice: String,
    pub reward: f64,
    pub mismatch: bool,
    pub repeated: bool,
}

/// Plays a single seeded week and renders it with display names.
pub fn sample_week<M: OutfitModel>(
    model: &M,
    policy: &Policy<M::State, M::Action>,
    seed: u64,
) -> Result<Vec<WeekEntry>> {
    let mut rng = episode_rng(seed, 0);
    let episode = run_episode(model, policy, &mut rng)?;
    let weather = model.weather_model();
    Ok(episode
        .steps
        .iter()
        .map(|step| WeekEntry {
            day: model.day(&step.state),
            weather: weather.name(model.weather(&step.state)).to_string(),
            choice: model.action_name(step.action).to_string(),
            reward: step.reward,
            mismatch: !step.assessment.suits_weather,
            repeated: step.assessment.repeated,
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use outfitplan_core::{Mdp, PlanConfig};
    use outfitplan_solvers::{value_iteration, Policy};

    #[test]
    fn week_has_seven_days_in_order() {
        let cfg = PlanConfig::default();
        let model = cfg.category_model().unwrap();
        let solution = value_iteration(&model, &cfg.solver).unwrap();
        let mut rng = episode_rng(3, 0);
        let episode = run_episode(&model, &solution.policy, &mut rng).unwrap();
        assert_eq!(episode.steps.len(), usize::from(HORIZON_DAYS));
        for (day, step) in episode.steps.iter().enumerate() {
            assert_eq!(usize::from(step.state.day), day);
        }
        let sum: f64 = episode.steps.iter().map(|s| s.reward).sum();
        assert!((sum - episode.total_reward).abs() < 1e-12);
    }

    #[test]
    fn empty_policy_is_reported() {
        let model = PlanConfig::default().category_model().unwrap();
        let policy = Policy::new();
        let mut rng = episode_rng(0, 0);
        let err = run_episode(&model, &policy, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::MissingAction(_)));
    }

    #[test]
    fn depleted_outfit_is_an_invalid_action() {
        let model = PlanConfig::default().wardrobe_model().unwrap();
        // always pick outfit 0, which is gone after the first day
        let policy: Policy<_, _> = model
            .states()
            .into_iter()
            .filter(|s| !model.is_terminal(s))
            .map(|s| (s, outfitplan_core::OutfitId(0)))
            .collect();
        let mut rng = episode_rng(0, 0);
        let err = run_episode(&model, &policy, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidAction(ModelError::InvalidAction { .. })
        ));
    }

    #[test]
    fn sample_week_uses_display_names() {
        let cfg = PlanConfig::default();
        let model = cfg.wardrobe_model().unwrap();
        let solution = value_iteration(&model, &cfg.solver).unwrap();
        let week = sample_week(&model, &solution.policy, 11).unwrap();
        assert_eq!(week.len(), 7);
        assert!(week.iter().all(|e| cfg.outfits.iter().any(|o| o.name == e.choice)));
        assert!(week
            .iter()
            .all(|e| cfg.weather.conditions.contains(&e.weather)));
        let mut worn: Vec<_> = week.iter().map(|e| e.choice.clone()).collect();
        worn.sort();
        worn.dedup();
        assert_eq!(worn.len(), 7);
    }
}
