//! Solves the default wardrobe and prints one sampled week.
//!
//! Usage: `cargo run -p outfitplan-sim --example weekly_plan -- [seed]`

use outfitplan_core::PlanConfig;
use outfitplan_sim::sample_week;
use outfitplan_solvers::{solve, Method};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seed = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 0,
    };

    let cfg = PlanConfig::default();
    let model = cfg.wardrobe_model()?;
    let solution = solve(&model, Method::ValueIteration, &cfg.solver)?;

    let mut total = 0.0;
    for entry in sample_week(&model, &solution.policy, seed)? {
        let flag = if entry.mismatch { "  (mismatch)" } else { "" };
        println!(
            "day {}\t{:<6}\t{:<22}\t{:+.1}{flag}",
            entry.day + 1,
            entry.weather,
            entry.choice,
            entry.reward
        );
        total += entry.reward;
    }
    println!("week total: {total:.1}");
    Ok(())
}
