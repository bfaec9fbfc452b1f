use crate::error::{ModelError, Result};
use crate::HORIZON_DAYS;
use serde::{Deserialize, Serialize};

/// Reward shaping weights shared by both outfit models.
///
/// A step earns `comfort` when the outfit suits the weather and loses
/// `mismatch_penalty` otherwise; it earns `variety` when the category was not
/// worn recently and loses `repeat_penalty` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub comfort: f64,
    pub mismatch_penalty: f64,
    pub variety: f64,
    pub repeat_penalty: f64,
    /// How many previous days count as "recent".
    ///
    /// `0` disables repetition tracking entirely. The category model clamps
    /// larger values to [`MAX_WINDOW`](crate::MAX_WINDOW). The wardrobe only
    /// remembers which outfits are left, so it accepts `0` or any value of at
    /// least `MAX_WINDOW` (the whole week) and rejects everything in between.
    pub repetition_window: u8,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            comfort: 5.0,
            mismatch_penalty: 6.0,
            variety: 2.0,
            repeat_penalty: 3.0,
            repetition_window: 1,
        }
    }
}

impl RewardWeights {
    /// Weights used for the finite wardrobe: comfort only, with repeats
    /// counted over the whole week.
    #[must_use]
    pub fn comfort_only() -> Self {
        Self {
            variety: 0.0,
            repeat_penalty: 0.0,
            repetition_window: HORIZON_DAYS - 1,
            ..Self::default()
        }
    }

    /// Rejects weights that would make the reward unbounded.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("comfort", self.comfort),
            ("mismatch_penalty", self.mismatch_penalty),
            ("variety", self.variety),
            ("repeat_penalty", self.repeat_penalty),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ModelError::malformed(format!(
                    "reward weight '{name}' is not finite: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Reward for one day.
    #[must_use]
    pub fn score(&self, suits_weather: bool, repeated: bool) -> f64 {
        let comfort = if suits_weather {
            self.comfort
        } else {
            -self.mismatch_penalty
        };
        let variety = if repeated {
            -self.repeat_penalty
        } else {
            self.variety
        };
        comfort + variety
    }

    /// Largest absolute reward a single step can produce.
    #[must_use]
    pub fn bound(&self) -> f64 {
        self.comfort.abs().max(self.mismatch_penalty.abs())
            + self.variety.abs().max(self.repeat_penalty.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn score_combines_comfort_and_variety() {
        let w = RewardWeights::default();
        assert_eq!(w.score(true, false), 7.0);
        assert_eq!(w.score(true, true), 2.0);
        assert_eq!(w.score(false, false), -4.0);
        assert_eq!(w.score(false, true), -9.0);
        assert_eq!(w.bound(), 9.0);
    }

    #[test]
    fn infinite_weight_is_malformed() {
        let w = RewardWeights {
            comfort: f64::INFINITY,
            ..RewardWeights::default()
        };
        assert!(w.validate().is_err());
    }
}
