//! Concrete weekly scenarios with known answers.

use outfitplan_core::category::Category;
use outfitplan_core::{
    CategoryState, Mdp, OutfitModel, PlanConfig, SolverConfig, WeatherConfig, HORIZON_DAYS,
};
use outfitplan_solvers::{solve, value_iteration, Method};

fn three_weather_config() -> PlanConfig {
    let category = |name: &str, suits: &str| Category {
        name: name.to_string(),
        suits: vec![suits.to_string()],
    };
    PlanConfig {
        weather: WeatherConfig {
            conditions: vec!["Sunny".into(), "Rainy".into(), "Cold".into()],
            transitions: vec![
                vec![0.6, 0.3, 0.1],
                vec![0.3, 0.5, 0.2],
                vec![0.3, 0.2, 0.5],
            ],
            ..WeatherConfig::default()
        },
        categories: vec![
            category("Light", "Sunny"),
            category("Rain-Ready", "Rainy"),
            category("Warm", "Cold"),
        ],
        solver: SolverConfig {
            gamma: 0.9,
            tolerance: 1e-4,
            max_iterations: 1000,
        },
        ..PlanConfig::default()
    }
}

#[test]
fn category_policy_reacts_to_weather() {
    let cfg = three_weather_config();
    let model = cfg.category_model().expect("model");
    let solution = value_iteration(&model, &cfg.solver).expect("solve");
    assert!(solution.converged);
    assert!(solution.iterations < 500);

    let weather = model.weather_model();
    let sunny = weather.id_of("Sunny").expect("sunny");
    let rainy = weather.id_of("Rainy").expect("rainy");

    let differs = model
        .states()
        .into_iter()
        .filter(|s| s.weather == sunny && !model.is_terminal(s))
        .any(|s| {
            let rainy_state = CategoryState {
                weather: rainy,
                ..s
            };
            solution.policy.action(&s) != solution.policy.action(&rainy_state)
        });
    assert!(differs, "policy ignores the weather");

    // On day 0 the comfortable category wins outright.
    let start = |w| CategoryState {
        day: 0,
        weather: w,
        recent: outfitplan_core::Recent::EMPTY,
    };
    assert_eq!(
        solution.policy.action(&start(sunny)),
        model.category_id("Light")
    );
    assert_eq!(
        solution.policy.action(&start(rainy)),
        model.category_id("Rain-Ready")
    );
}

#[test]
fn last_day_of_a_seven_piece_wardrobe_has_one_choice() {
    let cfg = PlanConfig::default();
    let model = cfg.wardrobe_model().expect("model");
    assert_eq!(model.pool_size(), usize::from(HORIZON_DAYS));

    for method in Method::ALL {
        let solution = solve(&model, method, &cfg.solver).expect("solve");
        let last_day: Vec<_> = model
            .states()
            .into_iter()
            .filter(|s| s.day == HORIZON_DAYS - 1)
            .collect();
        assert!(!last_day.is_empty());
        for state in last_day {
            let actions = model.actions(&state);
            assert_eq!(actions.len(), 1);
            assert_eq!(solution.policy.action(&state), Some(actions[0]));
        }
    }
}
