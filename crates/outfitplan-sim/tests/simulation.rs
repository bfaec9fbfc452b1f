//! Seeded rollouts of solved policies.

use outfitplan_core::{Mdp, OutfitModel, PlanConfig, SimulationConfig, StartDistribution};
use outfitplan_sim::rng::episode_rng;
use outfitplan_sim::{run_episode, simulate, SimError};
use outfitplan_solvers::{solve, Method};

fn run(episodes: usize, seed: u64) -> SimulationConfig {
    SimulationConfig { episodes, seed }
}

#[test]
fn fixed_seed_reproduces_the_mean() {
    let cfg = PlanConfig::default();
    let model = cfg.category_model().unwrap();
    let solution = solve(&model, Method::ValueIteration, &cfg.solver).unwrap();

    let a = simulate(&model, &solution.policy, &run(500, 17)).unwrap();
    let b = simulate(&model, &solution.policy, &run(500, 17)).unwrap();
    assert_eq!(a.episode_rewards, b.episode_rewards);
    assert_eq!(a.statistics.mean.to_bits(), b.statistics.mean.to_bits());
    assert_eq!(a.sample_trajectory, b.sample_trajectory);

    let c = simulate(&model, &solution.policy, &run(500, 18)).unwrap();
    assert_ne!(a.episode_rewards, c.episode_rewards);
}

#[test]
fn solved_wardrobe_policies_never_pick_a_depleted_outfit() {
    let cfg = PlanConfig::default();
    let model = cfg.wardrobe_model().unwrap();
    for method in Method::ALL {
        let solution = solve(&model, method, &cfg.solver).unwrap();
        for seed in 0..5 {
            let report = simulate(&model, &solution.policy, &run(200, seed));
            assert!(
                !matches!(report, Err(SimError::InvalidAction(_))),
                "{method} produced an invalid action"
            );
            let report = report.unwrap();
            assert_eq!(report.statistics.episodes, 200);
            assert_eq!(report.counts.days_dressed, 200 * 7);
        }
    }
}

#[test]
fn episodes_match_a_sequential_replay() {
    let cfg = PlanConfig::default();
    let model = cfg.wardrobe_model().unwrap();
    let solution = solve(&model, Method::ValueIteration, &cfg.solver).unwrap();
    let (episodes, seed) = (64, 23);

    let replayed: Vec<f64> = (0..episodes)
        .map(|i| {
            run_episode(&model, &solution.policy, &mut episode_rng(seed, i))
                .unwrap()
                .total_reward
        })
        .collect();
    let report = simulate(&model, &solution.policy, &run(episodes as usize, seed)).unwrap();
    assert_eq!(report.episode_rewards, replayed);
}

#[test]
fn last_day_wears_the_only_outfit_left() {
    let cfg = PlanConfig::default();
    let model = cfg.wardrobe_model().unwrap();
    let solution = solve(&model, Method::PolicyIteration, &cfg.solver).unwrap();

    for seed in 0..5 {
        for episode in 0..60 {
            let week = run_episode(&model, &solution.policy, &mut episode_rng(seed, episode)).unwrap();
            assert_eq!(week.steps.len(), 7);
            let last = week.steps.last().unwrap();
            assert_eq!(last.state.day, 6);
            assert_eq!(last.state.remaining.len(), 1);
            assert!(
                last.state.remaining.contains(last.action),
                "seed {seed} episode {episode} wore {:?}",
                last.action
            );
        }
    }
}

#[test]
fn trajectory_covers_a_full_week() {
    let cfg = PlanConfig::default();
    let model = cfg.category_model().unwrap();
    let solution = solve(&model, Method::ValueIteration, &cfg.solver).unwrap();
    let report = simulate(&model, &solution.policy, &run(10, 1)).unwrap();
    assert_eq!(report.sample_trajectory.len(), 7);
    let total: f64 = report.sample_trajectory.iter().map(|s| s.reward).sum();
    assert!((total - report.episode_rewards[0]).abs() < 1e-12);
    for step in &report.sample_trajectory {
        assert!(model.is_legal(&step.state, step.action));
    }
}

#[test]
fn fixed_start_weather_is_respected() {
    let mut cfg = PlanConfig::default();
    cfg.weather.start = StartDistribution::Fixed {
        weather: "Rainy".to_string(),
    };
    let model = cfg.category_model().unwrap();
    let solution = solve(&model, Method::ValueIteration, &cfg.solver).unwrap();
    let rainy = model.weather_model().id_of("Rainy").unwrap();
    for seed in 0..20 {
        let report = simulate(&model, &solution.policy, &run(1, seed)).unwrap();
        assert_eq!(report.sample_trajectory[0].state.weather, rainy);
    }
}

#[test]
fn zero_episodes_is_an_empty_report() {
    let cfg = PlanConfig::default();
    let model = cfg.category_model().unwrap();
    let solution = solve(&model, Method::ValueIteration, &cfg.solver).unwrap();
    let report = simulate(&model, &solution.policy, &run(0, 0)).unwrap();
    assert!(report.episode_rewards.is_empty());
    assert!(report.sample_trajectory.is_empty());
    assert_eq!(report.statistics.episodes, 0);
}
