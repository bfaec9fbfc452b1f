//! CLI for outfitplan.
//!
//! Loads a plan configuration, solves the category and wardrobe models and
//! reports policies, simulated weeks and the evaluation of both solvers.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use outfitplan_core::{OutfitModel, PlanConfig};
use outfitplan_sim::{evaluate, sample_week, MaybeSend, MaybeSync, ModelReport, WeekEntry};
use outfitplan_solvers::{solve, Method, Solution};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-run overrides applied on top of the configuration file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Discount factor in (0, 1]
    #[arg(long, global = true)]
    gamma: Option<f64>,

    /// Convergence threshold on the largest value change
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Cap on solver sweeps and improvement rounds
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Number of simulated weeks
    #[arg(long, global = true)]
    episodes: Option<usize>,

    /// Seed for the weather sampler
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve with both methods, simulate both policies and print a JSON report
    Evaluate {
        /// Only evaluate this model (default: both)
        #[arg(long, value_enum)]
        model: Option<ModelKind>,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Solve one model and print its policy
    Solve {
        #[arg(long, value_enum, default_value_t = ModelKind::Category)]
        model: ModelKind,

        /// vi | pi
        #[arg(long, default_value = "vi")]
        method: Method,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Play one sampled week with a solved policy
    Week {
        #[arg(long, value_enum, default_value_t = ModelKind::Wardrobe)]
        model: ModelKind,

        #[arg(long, default_value = "vi")]
        method: Method,

        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModelKind {
    Category,
    Wardrobe,
}

impl ModelKind {
    fn name(self) -> &'static str {
        match self {
            ModelKind::Category => "category",
            ModelKind::Wardrobe => "wardrobe",
        }
    }
}

/// One line of a printed policy.
#[derive(Serialize, Debug)]
struct PolicyRow {
    day: u8,
    weather: String,
    worn: Vec<String>,
    choice: String,
    value: f64,
}

#[derive(Serialize, Debug)]
struct PolicyReport {
    model: &'static str,
    method: Method,
    converged: bool,
    iterations: usize,
    rows: Vec<PolicyRow>,
}

fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<PlanConfig> {
    let mut cfg = match path {
        Some(p) => PlanConfig::load(p)
            .with_context(|| format!("Failed to load configuration from {}", p.display()))?,
        None => PlanConfig::default(),
    };
    if let Some(gamma) = overrides.gamma {
        cfg.solver.gamma = gamma;
    }
    if let Some(tolerance) = overrides.tolerance {
        cfg.solver.tolerance = tolerance;
    }
    if let Some(max_iterations) = overrides.max_iterations {
        cfg.solver.max_iterations = max_iterations;
    }
    if let Some(episodes) = overrides.episodes {
        cfg.simulation.episodes = episodes;
    }
    if let Some(seed) = overrides.seed {
        cfg.simulation.seed = seed;
    }
    cfg.validate_solver()
        .context("Invalid solver settings")?;
    Ok(cfg)
}

fn policy_rows<M: OutfitModel>(model: &M, solution: &Solution<M::State, M::Action>) -> Vec<PolicyRow> {
    let weather = model.weather_model();
    model
        .states()
        .into_iter()
        .filter_map(|state| {
            let action = solution.policy.action(&state)?;
            Some(PolicyRow {
                day: model.day(&state),
                weather: weather.name(model.weather(&state)).to_string(),
                worn: model.worn(&state).into_iter().map(str::to_string).collect(),
                choice: model.action_name(action).to_string(),
                value: solution.values.value(&state).unwrap_or(0.0),
            })
        })
        .collect()
}

fn run_solve<M: OutfitModel>(
    kind: ModelKind,
    model: &M,
    method: Method,
    cfg: &PlanConfig,
    json: bool,
) -> Result<()> {
    let solution = solve(model, method, &cfg.solver)
        .with_context(|| format!("Solving the {} model with {method} failed", kind.name()))?;
    let report = PolicyReport {
        model: kind.name(),
        method,
        converged: solution.converged,
        iterations: solution.iterations,
        rows: policy_rows(model, &solution),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} model, {method}: {} after {} iterations",
        report.model,
        if report.converged { "converged" } else { "NOT converged" },
        report.iterations
    );
    for row in &report.rows {
        let worn = if row.worn.is_empty() {
            "-".to_string()
        } else {
            row.worn.join(", ")
        };
        println!(
            "day {}\t{:<6}\t[{worn}]\t-> {}\t({:.3})",
            row.day + 1,
            row.weather,
            row.choice,
            row.value
        );
    }
    Ok(())
}

fn run_week<M: OutfitModel>(
    kind: ModelKind,
    model: &M,
    method: Method,
    cfg: &PlanConfig,
    json: bool,
) -> Result<()> {
    let solution = solve(model, method, &cfg.solver)
        .with_context(|| format!("Solving the {} model with {method} failed", kind.name()))?;
    let week: Vec<WeekEntry> = sample_week(model, &solution.policy, cfg.simulation.seed)
        .context("Simulating the week failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&week)?);
        return Ok(());
    }

    let mut total = 0.0;
    for entry in &week {
        let mut notes = Vec::new();
        if entry.mismatch {
            notes.push("mismatch");
        }
        if entry.repeated {
            notes.push("repeat");
        }
        println!(
            "day {}\t{:<6}\t{:<22}\t{:+.1}\t{}",
            entry.day + 1,
            entry.weather,
            entry.choice,
            entry.reward,
            notes.join(", ")
        );
        total += entry.reward;
    }
    println!("week total: {total:.1}");
    Ok(())
}

fn run_evaluate<M>(kind: ModelKind, model: &M, cfg: &PlanConfig) -> Result<ModelReport>
where
    M: OutfitModel + MaybeSync,
    M::State: MaybeSend + MaybeSync,
    M::Action: MaybeSend + MaybeSync,
{
    let report = evaluate(kind.name(), model, &cfg.solver, &cfg.simulation)
        .with_context(|| format!("Evaluating the {} model failed", kind.name()))?;
    for method in &report.methods {
        eprintln!(
            "{}: {} mean weekly reward {:.2} (sd {:.2}), {} mismatches{}",
            kind.name(),
            method.method,
            method.mean_reward,
            method.std_dev,
            method.mismatches,
            if method.converged { "" } else { " [not converged]" }
        );
    }
    Ok(report)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(file, value)?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref(), &cli.overrides)?;

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        Commands::Solve {
            model,
            method,
            json,
        } => match model {
            ModelKind::Category => {
                let m = cfg.category_model().context("Invalid category model")?;
                run_solve(model, &m, method, &cfg, json)?;
            }
            ModelKind::Wardrobe => {
                let m = cfg.wardrobe_model().context("Invalid wardrobe model")?;
                run_solve(model, &m, method, &cfg, json)?;
            }
        },
        Commands::Week {
            model,
            method,
            json,
        } => match model {
            ModelKind::Category => {
                let m = cfg.category_model().context("Invalid category model")?;
                run_week(model, &m, method, &cfg, json)?;
            }
            ModelKind::Wardrobe => {
                let m = cfg.wardrobe_model().context("Invalid wardrobe model")?;
                run_week(model, &m, method, &cfg, json)?;
            }
        },
        Commands::Evaluate { model, output } => {
            let kinds = match model {
                Some(kind) => vec![kind],
                None => vec![ModelKind::Category, ModelKind::Wardrobe],
            };
            let mut reports = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let report = match kind {
                    ModelKind::Category => {
                        let m = cfg.category_model().context("Invalid category model")?;
                        run_evaluate(kind, &m, &cfg)?
                    }
                    ModelKind::Wardrobe => {
                        let m = cfg.wardrobe_model().context("Invalid wardrobe model")?;
                        run_evaluate(kind, &m, &cfg)?
                    }
                };
                reports.push(report);
            }
            write_json(&reports, output.as_deref())?;
        }
    }

    Ok(())
}
