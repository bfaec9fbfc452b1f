//! The weather process: a fixed, fully observed Markov chain over a finite
//! set of named conditions.
//!
//! Transition probabilities depend only on the current condition, never on
//! the day or on what was worn.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allowed deviation of a probability row from 1.0.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

const STATIONARY_MAX_STEPS: usize = 10_000;
const STATIONARY_TOLERANCE: f64 = 1e-12;

/// Index of a weather condition within a [`WeatherModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeatherId(pub u8);

impl WeatherId {
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for WeatherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// How the first day's weather is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StartDistribution {
    /// Every condition equally likely.
    #[default]
    Uniform,
    /// The long-run distribution of the chain.
    Stationary,
    /// Always the named condition.
    Fixed { weather: String },
}

/// Validated weather chain.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherModel {
    names: Vec<String>,
    matrix: Vec<Vec<f64>>,
}

impl WeatherModel {
    /// Builds the chain, failing fast when the matrix is not row-stochastic.
    pub fn new(names: Vec<String>, matrix: Vec<Vec<f64>>) -> Result<Self> {
        if names.is_empty() {
            return Err(ModelError::malformed("no weather conditions"));
        }
        if names.len() > usize::from(u8::MAX) {
            return Err(ModelError::malformed(format!(
                "too many weather conditions: {}",
                names.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ModelError::malformed(format!(
                    "duplicate weather condition '{name}'"
                )));
            }
        }
        if matrix.len() != names.len() {
            return Err(ModelError::malformed(format!(
                "weather matrix has {} rows for {} conditions",
                matrix.len(),
                names.len()
            )));
        }
        for (from, row) in matrix.iter().enumerate() {
            if row.len() != names.len() {
                return Err(ModelError::malformed(format!(
                    "weather matrix row '{}' has {} entries, expected {}",
                    names[from],
                    row.len(),
                    names.len()
                )));
            }
            if let Some(p) = row.iter().find(|p| !p.is_finite() || **p < 0.0) {
                return Err(ModelError::malformed(format!(
                    "weather matrix row '{}' contains invalid probability {p}",
                    names[from]
                )));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                return Err(ModelError::malformed(format!(
                    "weather matrix row '{}' sums to {sum}, expected 1",
                    names[from]
                )));
            }
        }
        Ok(Self { names, matrix })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn name(&self, id: WeatherId) -> &str {
        &self.names[id.index()]
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Looks a condition up by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<WeatherId> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| u8::try_from(i).ok())
            .map(WeatherId)
    }

    /// All conditions in index order.
    pub fn ids(&self) -> impl Iterator<Item = WeatherId> + '_ {
        (0..self.names.len()).filter_map(|i| u8::try_from(i).ok().map(WeatherId))
    }

    #[must_use]
    pub fn probability(&self, from: WeatherId, to: WeatherId) -> f64 {
        self.matrix[from.index()][to.index()]
    }

    /// Successor conditions with non-zero probability, in index order.
    pub fn successors(&self, from: WeatherId) -> impl Iterator<Item = (WeatherId, f64)> + '_ {
        self.ids()
            .map(move |to| (to, self.probability(from, to)))
            .filter(|(_, p)| *p > 0.0)
    }

    /// Long-run distribution, computed by power iteration from uniform.
    ///
    /// Periodic chains do not settle; the last iterate is returned then.
    #[must_use]
    pub fn stationary(&self) -> Vec<f64> {
        let n = self.len();
        #[allow(clippy::cast_precision_loss)]
        let mut dist = vec![1.0 / n as f64; n];
        for _ in 0..STATIONARY_MAX_STEPS {
            let mut next = vec![0.0; n];
            for (from, p_from) in dist.iter().enumerate() {
                for (to, p) in self.matrix[from].iter().enumerate() {
                    next[to] += p_from * p;
                }
            }
            let delta = next
                .iter()
                .zip(&dist)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            dist = next;
            if delta < STATIONARY_TOLERANCE {
                break;
            }
        }
        dist
    }

    /// Resolves a start distribution into per-condition probabilities.
    pub fn start_probabilities(&self, start: &StartDistribution) -> Result<Vec<f64>> {
        match start {
            StartDistribution::Uniform => {
                #[allow(clippy::cast_precision_loss)]
                let p = 1.0 / self.len() as f64;
                Ok(vec![p; self.len()])
            }
            StartDistribution::Stationary => Ok(self.stationary()),
            StartDistribution::Fixed { weather } => {
                let id = self.id_of(weather).ok_or_else(|| {
                    ModelError::malformed(format!("unknown start weather '{weather}'"))
                })?;
                let mut probs = vec![0.0; self.len()];
                probs[id.index()] = 1.0;
                Ok(probs)
            }
        }
    }

    /// Resolves weather names to ids, rejecting unknown names.
    pub fn resolve(&self, names: &[String], owner: &str) -> Result<Vec<WeatherId>> {
        names
            .iter()
            .map(|name| {
                self.id_of(name).ok_or_else(|| {
                    ModelError::malformed(format!("'{owner}' refers to unknown weather '{name}'"))
                })
            })
            .collect()
    }
}
