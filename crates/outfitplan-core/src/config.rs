//! Configuration for a planning run.
//!
//! Every field has a default, so a partial JSON file only overrides what it
//! names. The defaults describe a four-condition weather chain, five outfit
//! categories and a seven-piece wardrobe.

use crate::category::{Category, CategoryMdp};
use crate::error::{ModelError, Result};
use crate::reward::RewardWeights;
use crate::wardrobe::{Outfit, WardrobeMdp};
use crate::weather::{StartDistribution, WeatherModel};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Weather chain as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub conditions: Vec<String>,
    /// Row `i` gives the next-day distribution when today is `conditions[i]`.
    pub transitions: Vec<Vec<f64>>,
    pub start: StartDistribution,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            conditions: strings(&["Cold", "Mild", "Hot", "Rainy"]),
            transitions: vec![
                vec![0.6, 0.2, 0.1, 0.1],
                vec![0.2, 0.5, 0.2, 0.1],
                vec![0.1, 0.3, 0.5, 0.1],
                vec![0.2, 0.2, 0.1, 0.5],
            ],
            start: StartDistribution::Uniform,
        }
    }
}

impl WeatherConfig {
    pub fn build(&self) -> Result<WeatherModel> {
        WeatherModel::new(self.conditions.clone(), self.transitions.clone())
    }
}

/// Solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Discount factor, in (0, 1].
    pub gamma: f64,
    /// Convergence threshold on the largest per-state value change.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            tolerance: 1e-4,
            max_iterations: 1000,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(format!("gamma must be in (0, 1], got {}", self.gamma));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            ));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub episodes: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            seed: 0,
        }
    }
}

/// Complete configuration of a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub weather: WeatherConfig,
    pub categories: Vec<Category>,
    pub category_rewards: RewardWeights,
    pub outfits: Vec<Outfit>,
    pub wardrobe_rewards: RewardWeights,
    pub solver: SolverConfig,
    pub simulation: SimulationConfig,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            categories: vec![
                category("Warm", &["Cold"]),
                category("Light", &["Mild", "Hot"]),
                category("Casual", &["Mild", "Hot"]),
                category("Formal", &["Cold", "Mild"]),
                category("Rain-Ready", &["Rainy"]),
            ],
            category_rewards: RewardWeights::default(),
            outfits: vec![
                outfit("Pink Raincoat Fit", "Rain-Ready", &["Cold", "Rainy"]),
                outfit("Cozy Sweater & Jeans", "Warm", &["Cold", "Mild"]),
                outfit("Sundress", "Light", &["Mild", "Hot"]),
                outfit("Casual Tee & Shorts", "Casual", &["Mild", "Hot"]),
                outfit("Business Dress", "Formal", &["Mild"]),
                outfit("Hoodie & Leggings", "Casual", &["Cold", "Mild"]),
                outfit("Black Blazer Set", "Formal", &["Mild"]),
            ],
            wardrobe_rewards: RewardWeights::comfort_only(),
            solver: SolverConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl PlanConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Builds the validated category model.
    pub fn category_model(&self) -> Result<CategoryMdp> {
        CategoryMdp::new(
            self.weather.build()?,
            &self.categories,
            self.category_rewards.clone(),
            &self.weather.start,
        )
    }

    /// Builds the validated wardrobe model.
    pub fn wardrobe_model(&self) -> Result<WardrobeMdp> {
        WardrobeMdp::new(
            self.weather.build()?,
            self.outfits.clone(),
            self.wardrobe_rewards.clone(),
            &self.weather.start,
        )
    }

    /// Checks the solver section; model sections are checked by the factories.
    pub fn validate_solver(&self) -> Result<()> {
        self.solver.validate().map_err(ModelError::Malformed)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn category(name: &str, suits: &[&str]) -> Category {
    Category {
        name: name.to_string(),
        suits: strings(suits),
    }
}

fn outfit(name: &str, category: &str, suits: &[&str]) -> Outfit {
    Outfit {
        name: name.to_string(),
        category: category.to_string(),
        suits: strings(suits),
    }
}
