use serde::{Deserialize, Serialize};

/// Summary of per-episode rewards.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardStatistics {
    pub episodes: usize,
    pub mean: f64,
    /// Sample variance (n - 1 denominator); 0 for fewer than two episodes.
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl RewardStatistics {
    /// Welford's single-pass mean and variance.
    #[must_use]
    pub fn from_rewards(rewards: &[f64]) -> Self {
        if rewards.is_empty() {
            return Self::default();
        }
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (i, r) in rewards.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let n = (i + 1) as f64;
            let delta = r - mean;
            mean += delta / n;
            m2 += delta * (r - mean);
            min = min.min(*r);
            max = max.max(*r);
        }
        #[allow(clippy::cast_precision_loss)]
        let variance = if rewards.len() > 1 {
            m2 / (rewards.len() - 1) as f64
        } else {
            0.0
        };
        Self {
            episodes: rewards.len(),
            mean,
            variance,
            min,
            max,
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Standard error of the mean.
    #[must_use]
    pub fn std_error(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            (self.variance / self.episodes as f64).sqrt()
        }
    }
}

/// Outfit-level counters accumulated over a simulation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitCounts {
    /// Days on which the outfit did not suit the weather.
    pub mismatches: usize,
    /// Days on which a category was repeated.
    pub repeats: usize,
    /// Days on which an outfit was worn.
    pub days_dressed: usize,
}

impl OutfitCounts {
    pub fn merge(&mut self, other: &OutfitCounts) {
        self.mismatches += other.mismatches;
        self.repeats += other.repeats;
        self.days_dressed += other.days_dressed;
    }

    #[must_use]
    pub fn average_days_dressed(&self, episodes: usize) -> f64 {
        if episodes == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.days_dressed as f64 / episodes as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_match_closed_form() {
        let stats = RewardStatistics::from_rewards(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.episodes, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // sum of squared deviations is 32
        assert!((stats.variance - 32.0 / 7.0).abs() < 1e-12);
        assert!((stats.min - 2.0).abs() < 1e-12);
        assert!((stats.max - 9.0).abs() < 1e-12);
    }

    #[test]
    fn statistics_handle_empty_and_single() {
        let empty = RewardStatistics::from_rewards(&[]);
        assert_eq!(empty.episodes, 0);
        assert!(empty.std_error().abs() < f64::EPSILON);

        let single = RewardStatistics::from_rewards(&[3.5]);
        assert!((single.mean - 3.5).abs() < 1e-12);
        assert!(single.variance.abs() < f64::EPSILON);
    }

    #[test]
    fn counts_merge_and_average() {
        let mut total = OutfitCounts::default();
        total.merge(&OutfitCounts {
            mismatches: 1,
            repeats: 2,
            days_dressed: 7,
        });
        total.merge(&OutfitCounts {
            mismatches: 0,
            repeats: 1,
            days_dressed: 7,
        });
        assert_eq!(total.mismatches, 1);
        assert_eq!(total.repeats, 3);
        assert!((total.average_days_dressed(2) - 7.0).abs() < 1e-12);
    }
}
