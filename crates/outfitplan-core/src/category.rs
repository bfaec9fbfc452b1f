//! Category model: each day one outfit category is chosen, and categories
//! can be worn again on later days.
//!
//! State is `(day, weather, recent)`, where `recent` holds the categories worn
//! within the repetition window. With a window of `0` the state collapses to
//! `(day, weather)`.

use crate::error::{ModelError, Result};
use crate::reward::RewardWeights;
use crate::weather::{StartDistribution, WeatherId, WeatherModel};
use crate::{validate_model, Assessment, Mdp, OutfitModel, HORIZON_DAYS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest useful repetition window: every earlier day of the week.
pub const MAX_WINDOW: usize = HORIZON_DAYS as usize - 1;

/// Upper bound on the enumerated state space.
const MAX_STATES: usize = 1 << 22;

/// Index of an outfit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub u8);

impl CategoryId {
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Configured outfit category and the weather it suits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub suits: Vec<String>,
}

/// Categories worn on the previous days, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Recent {
    len: u8,
    slots: [u8; MAX_WINDOW],
}

impl Recent {
    pub const EMPTY: Recent = Recent {
        len: 0,
        slots: [0; MAX_WINDOW],
    };

    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn contains(&self, category: CategoryId) -> bool {
        self.iter().any(|c| c == category)
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.slots[..self.len()].iter().copied().map(CategoryId)
    }

    /// History after wearing `category`, truncated to `window` entries.
    #[must_use]
    pub fn push(&self, category: CategoryId, window: usize) -> Self {
        let window = window.min(MAX_WINDOW);
        if window == 0 {
            return Self::EMPTY;
        }
        let mut slots = [0; MAX_WINDOW];
        slots[0] = category.0;
        let kept = self.len().min(window - 1);
        slots[1..=kept].copy_from_slice(&self.slots[..kept]);
        Self {
            // kept < MAX_WINDOW, so this fits
            len: (kept + 1) as u8,
            slots,
        }
    }

    /// Every history of exactly `len` entries over `categories` categories.
    fn all(categories: u8, len: usize) -> Vec<Self> {
        let mut out = vec![Self::EMPTY];
        for _ in 0..len.min(MAX_WINDOW) {
            let mut grown = Vec::with_capacity(out.len() * usize::from(categories));
            for prefix in &out {
                for c in 0..categories {
                    let mut next = *prefix;
                    next.slots[prefix.len()] = c;
                    next.len += 1;
                    grown.push(next);
                }
            }
            out = grown;
        }
        out
    }
}

/// State of the category model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryState {
    pub day: u8,
    pub weather: WeatherId,
    pub recent: Recent,
}

/// Category-based outfit MDP.
#[derive(Debug, Clone)]
pub struct CategoryMdp {
    weather: WeatherModel,
    names: Vec<String>,
    /// `suits[category][weather]`
    suits: Vec<Vec<bool>>,
    weights: RewardWeights,
    window: usize,
    start: Vec<f64>,
}

impl CategoryMdp {
    pub fn new(
        weather: WeatherModel,
        categories: &[Category],
        weights: RewardWeights,
        start: &StartDistribution,
    ) -> Result<Self> {
        if categories.is_empty() {
            return Err(ModelError::malformed("no outfit categories"));
        }
        if categories.len() > usize::from(u8::MAX) {
            return Err(ModelError::malformed(format!(
                "too many outfit categories: {}",
                categories.len()
            )));
        }
        weights.validate()?;

        let mut suits = Vec::with_capacity(categories.len());
        for category in categories {
            let mut row = vec![false; weather.len()];
            for id in weather.resolve(&category.suits, &category.name)? {
                row[id.index()] = true;
            }
            suits.push(row);
        }

        let window = usize::from(weights.repetition_window).min(MAX_WINDOW);
        let model = Self {
            start: weather.start_probabilities(start)?,
            weather,
            names: categories.iter().map(|c| c.name.clone()).collect(),
            suits,
            weights,
            window,
        };
        let count = model.state_count();
        if count > MAX_STATES {
            return Err(ModelError::malformed(format!(
                "category model would have {count} states (limit {MAX_STATES})"
            )));
        }
        validate_model(&model)?;
        Ok(model)
    }

    #[must_use]
    pub fn category_count(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn category_name(&self, id: CategoryId) -> &str {
        &self.names[id.index()]
    }

    #[must_use]
    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| u8::try_from(i).ok())
            .map(CategoryId)
    }

    #[must_use]
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn suits(&self, category: CategoryId, weather: WeatherId) -> bool {
        self.suits[category.index()][weather.index()]
    }

    fn category_ids(&self) -> impl Iterator<Item = CategoryId> {
        // category_count <= u8::MAX, checked in new()
        (0..self.names.len() as u8).map(CategoryId)
    }

    fn state_count(&self) -> usize {
        let per_day = |day: usize| {
            (0..day.min(self.window)).fold(self.weather.len(), |acc, _| {
                acc.saturating_mul(self.names.len())
            })
        };
        (0..=usize::from(HORIZON_DAYS))
            .map(per_day)
            .fold(0usize, usize::saturating_add)
    }
}

impl Mdp for CategoryMdp {
    type State = CategoryState;
    type Action = CategoryId;

    fn states(&self) -> Vec<CategoryState> {
        let mut states = Vec::new();
        for day in 0..=HORIZON_DAYS {
            let histories = Recent::all(self.names.len() as u8, usize::from(day).min(self.window));
            for weather in self.weather.ids() {
                for recent in &histories {
                    states.push(CategoryState {
                        day,
                        weather,
                        recent: *recent,
                    });
                }
            }
        }
        states
    }

    fn actions(&self, state: &CategoryState) -> Vec<CategoryId> {
        if self.is_terminal(state) {
            return Vec::new();
        }
        self.category_ids().collect()
    }

    fn transition(
        &self,
        state: &CategoryState,
        action: CategoryId,
    ) -> impl Iterator<Item = (CategoryState, f64)> + '_ {
        let live = !self.is_terminal(state);
        let day = state.day + 1;
        let recent = state.recent.push(action, self.window);
        self.weather
            .successors(state.weather)
            .filter(move |_| live)
            .map(move |(weather, p)| {
                (
                    CategoryState {
                        day,
                        weather,
                        recent,
                    },
                    p,
                )
            })
    }

    fn reward(&self, state: &CategoryState, action: CategoryId, _next: &CategoryState) -> f64 {
        let a = self.assess(state, action);
        self.weights.score(a.suits_weather, a.repeated)
    }

    fn is_terminal(&self, state: &CategoryState) -> bool {
        state.day >= HORIZON_DAYS
    }

    fn start_states(&self) -> Vec<(CategoryState, f64)> {
        self.weather
            .ids()
            .map(|weather| {
                (
                    CategoryState {
                        day: 0,
                        weather,
                        recent: Recent::EMPTY,
                    },
                    self.start[weather.index()],
                )
            })
            .filter(|(_, p)| *p > 0.0)
            .collect()
    }

    fn is_legal(&self, state: &CategoryState, action: CategoryId) -> bool {
        !self.is_terminal(state) && action.index() < self.names.len()
    }
}

impl OutfitModel for CategoryMdp {
    fn weather_model(&self) -> &WeatherModel {
        &self.weather
    }

    fn day(&self, state: &CategoryState) -> u8 {
        state.day
    }

    fn weather(&self, state: &CategoryState) -> WeatherId {
        state.weather
    }

    fn action_name(&self, action: CategoryId) -> &str {
        self.category_name(action)
    }

    fn worn(&self, state: &CategoryState) -> Vec<&str> {
        state.recent.iter().map(|c| self.category_name(c)).collect()
    }

    fn assess(&self, state: &CategoryState, action: CategoryId) -> Assessment {
        Assessment {
            suits_weather: self.suits(action, state.weather),
            repeated: state.recent.contains(action),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn model(window: u8) -> CategoryMdp {
        let weather = WeatherModel::new(
            vec!["Sunny".into(), "Rainy".into()],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
        )
        .unwrap();
        let categories = vec![
            Category {
                name: "Light".into(),
                suits: vec!["Sunny".into()],
            },
            Category {
                name: "Rain-Ready".into(),
                suits: vec!["Rainy".into()],
            },
        ];
        let weights = RewardWeights {
            repetition_window: window,
            ..RewardWeights::default()
        };
        CategoryMdp::new(weather, &categories, weights, &StartDistribution::Uniform).unwrap()
    }

    #[test]
    fn recent_push_keeps_window() {
        let r = Recent::EMPTY
            .push(CategoryId(1), 2)
            .push(CategoryId(2), 2)
            .push(CategoryId(3), 2);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![CategoryId(3), CategoryId(2)]);
        assert!(!r.contains(CategoryId(1)));
        assert!(Recent::EMPTY.push(CategoryId(1), 0).is_empty());
    }

    #[test]
    fn zero_window_state_is_day_and_weather() {
        let m = model(0);
        // 8 days (terminal included) x 2 weather conditions
        assert_eq!(m.states().len(), 16);
    }

    #[test]
    fn window_one_tracks_previous_category() {
        let m = model(1);
        // day 0: 2 states, days 1..=7: 2 weather x 2 previous categories
        assert_eq!(m.states().len(), 2 + 7 * 4);
        let s = CategoryState {
            day: 3,
            weather: WeatherId(0),
            recent: Recent::EMPTY.push(CategoryId(0), 1),
        };
        let next: Vec<_> = m.transition(&s, CategoryId(1)).collect();
        assert_eq!(next.len(), 2);
        assert!(next.iter().all(|(n, _)| n.day == 4));
        assert!(next
            .iter()
            .all(|(n, _)| n.recent.iter().collect::<Vec<_>>() == vec![CategoryId(1)]));
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn reward_penalises_mismatch_and_repeats() {
        let m = model(1);
        let s = CategoryState {
            day: 1,
            weather: WeatherId(1),
            recent: Recent::EMPTY.push(CategoryId(1), 1),
        };
        let next = s;
        // Rain-Ready on a rainy day, worn yesterday: 5 - 3
        assert_eq!(m.reward(&s, CategoryId(1), &next), 2.0);
        // Light on a rainy day, fresh: -6 + 2
        assert_eq!(m.reward(&s, CategoryId(0), &next), -4.0);
    }

    #[test]
    fn terminal_states_have_no_actions_or_successors() {
        let m = model(1);
        let s = CategoryState {
            day: HORIZON_DAYS,
            weather: WeatherId(0),
            recent: Recent::EMPTY.push(CategoryId(0), 1),
        };
        assert!(m.is_terminal(&s));
        assert!(m.actions(&s).is_empty());
        assert_eq!(m.transition(&s, CategoryId(0)).count(), 0);
    }

    #[test]
    fn unknown_weather_in_category_is_malformed() {
        let weather =
            WeatherModel::new(vec!["Sunny".into()], vec![vec![1.0]]).expect("valid chain");
        let categories = vec![Category {
            name: "Light".into(),
            suits: vec!["Snow".into()],
        }];
        let err = CategoryMdp::new(
            weather,
            &categories,
            RewardWeights::default(),
            &StartDistribution::Uniform,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));
    }
}
