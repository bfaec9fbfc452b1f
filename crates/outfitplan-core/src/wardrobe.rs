//! Finite-wardrobe model: a fixed pool of concrete outfits, each worn at most
//! once per week.
//!
//! State is `(day, weather, remaining)`. Only states whose remaining set has
//! exactly `pool - day` outfits are enumerated.

use crate::error::{ModelError, Result};
use crate::reward::RewardWeights;
use crate::category::MAX_WINDOW;
use crate::weather::{StartDistribution, WeatherId, WeatherModel};
use crate::{validate_model, Assessment, Mdp, OutfitModel, HORIZON_DAYS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest pool the bitset state supports.
pub const MAX_POOL_SIZE: usize = 20;

/// Index of an outfit in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutfitId(pub u8);

impl OutfitId {
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for OutfitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

/// A concrete outfit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    pub name: String,
    pub category: String,
    /// Weather conditions this outfit is comfortable in.
    #[serde(default)]
    pub suits: Vec<String>,
}

/// Immutable set of outfits, one bit per pool index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OutfitSet(u32);

impl OutfitSet {
    pub const EMPTY: OutfitSet = OutfitSet(0);

    /// Set holding the first `pool` outfits.
    #[must_use]
    pub fn full(pool: usize) -> Self {
        let pool = pool.min(MAX_POOL_SIZE);
        Self(((1u64 << pool) - 1) as u32)
    }

    #[must_use]
    pub fn contains(self, outfit: OutfitId) -> bool {
        outfit.index() < 32 && self.0 & (1u32 << outfit.0) != 0
    }

    #[must_use]
    pub fn without(self, outfit: OutfitId) -> Self {
        if outfit.index() >= 32 {
            return self;
        }
        Self(self.0 & !(1u32 << outfit.0))
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in ascending index order.
    pub fn iter(self) -> impl Iterator<Item = OutfitId> {
        (0u8..32)
            .filter(move |i| self.0 & (1u32 << *i) != 0)
            .map(OutfitId)
    }

    /// Outfits of a `pool`-sized wardrobe that are not in this set.
    #[must_use]
    pub fn complement(self, pool: usize) -> Self {
        Self(Self::full(pool).0 & !self.0)
    }

    /// All subsets of a `pool`-sized wardrobe with exactly `size` members,
    /// in ascending bit-pattern order.
    #[must_use]
    pub fn subsets(pool: usize, size: usize) -> Vec<Self> {
        let pool = pool.min(MAX_POOL_SIZE);
        if size > pool {
            return Vec::new();
        }
        if size == 0 {
            return vec![Self::EMPTY];
        }
        let limit = 1u64 << pool;
        let mut bits = (1u64 << size) - 1;
        let mut out = Vec::new();
        while bits < limit {
            out.push(Self(bits as u32));
            // next pattern with the same popcount
            let low = bits & bits.wrapping_neg();
            let ripple = bits + low;
            bits = (((ripple ^ bits) >> 2) / low) | ripple;
        }
        out
    }
}

impl fmt::Debug for OutfitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|o| o.0)).finish()
    }
}

/// State of the wardrobe model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WardrobeState {
    pub day: u8,
    pub weather: WeatherId,
    pub remaining: OutfitSet,
}

/// Finite-wardrobe outfit MDP (no replacement within a week).
#[derive(Debug, Clone)]
pub struct WardrobeMdp {
    weather: WeatherModel,
    outfits: Vec<Outfit>,
    /// `suits[outfit][weather]`
    suits: Vec<Vec<bool>>,
    /// Dense category index per outfit.
    category_of: Vec<usize>,
    weights: RewardWeights,
    /// Off when `repetition_window` is 0.
    track_repeats: bool,
    start: Vec<f64>,
}

impl WardrobeMdp {
    pub fn new(
        weather: WeatherModel,
        outfits: Vec<Outfit>,
        weights: RewardWeights,
        start: &StartDistribution,
    ) -> Result<Self> {
        let horizon = usize::from(HORIZON_DAYS);
        if outfits.len() < horizon {
            return Err(ModelError::malformed(format!(
                "wardrobe has {} outfits, needs at least {horizon} for a week",
                outfits.len()
            )));
        }
        if outfits.len() > MAX_POOL_SIZE {
            return Err(ModelError::malformed(format!(
                "wardrobe has {} outfits, at most {MAX_POOL_SIZE} are supported",
                outfits.len()
            )));
        }
        weights.validate()?;
        let track_repeats = match usize::from(weights.repetition_window) {
            0 => false,
            w if w >= MAX_WINDOW => true,
            w => {
                return Err(ModelError::malformed(format!(
                    "wardrobe repetition_window is {w}; use 0 to disable repeats or \
                     {MAX_WINDOW} or more for the whole week"
                )));
            }
        };

        let mut suits = Vec::with_capacity(outfits.len());
        let mut categories: Vec<&str> = Vec::new();
        let mut category_of = Vec::with_capacity(outfits.len());
        for outfit in &outfits {
            let mut row = vec![false; weather.len()];
            for id in weather.resolve(&outfit.suits, &outfit.name)? {
                row[id.index()] = true;
            }
            suits.push(row);
            let idx = match categories.iter().position(|c| *c == outfit.category) {
                Some(idx) => idx,
                None => {
                    categories.push(&outfit.category);
                    categories.len() - 1
                }
            };
            category_of.push(idx);
        }

        let model = Self {
            start: weather.start_probabilities(start)?,
            weather,
            outfits,
            suits,
            category_of,
            weights,
            track_repeats,
        };
        validate_model(&model)?;
        Ok(model)
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.outfits.len()
    }

    #[must_use]
    pub fn outfit(&self, id: OutfitId) -> &Outfit {
        &self.outfits[id.index()]
    }

    #[must_use]
    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }

    #[must_use]
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    #[must_use]
    pub fn full_wardrobe(&self) -> OutfitSet {
        OutfitSet::full(self.outfits.len())
    }

    #[must_use]
    pub fn suits(&self, outfit: OutfitId, weather: WeatherId) -> bool {
        self.suits[outfit.index()][weather.index()]
    }

    /// Whether an outfit of the same category was already worn this week.
    fn category_worn(&self, remaining: OutfitSet, outfit: OutfitId) -> bool {
        let category = self.category_of[outfit.index()];
        remaining
            .complement(self.outfits.len())
            .iter()
            .any(|worn| self.category_of[worn.index()] == category)
    }
}

impl Mdp for WardrobeMdp {
    type State = WardrobeState;
    type Action = OutfitId;

    fn states(&self) -> Vec<WardrobeState> {
        let pool = self.outfits.len();
        let mut states = Vec::new();
        for day in 0..=HORIZON_DAYS {
            for remaining in OutfitSet::subsets(pool, pool - usize::from(day)) {
                for weather in self.weather.ids() {
                    states.push(WardrobeState {
                        day,
                        weather,
                        remaining,
                    });
                }
            }
        }
        states
    }

    fn actions(&self, state: &WardrobeState) -> Vec<OutfitId> {
        if self.is_terminal(state) {
            return Vec::new();
        }
        state.remaining.iter().collect()
    }

    fn transition(
        &self,
        state: &WardrobeState,
        action: OutfitId,
    ) -> impl Iterator<Item = (WardrobeState, f64)> + '_ {
        let live = self.is_legal(state, action);
        let day = state.day + 1;
        let remaining = state.remaining.without(action);
        self.weather
            .successors(state.weather)
            .filter(move |_| live)
            .map(move |(weather, p)| {
                (
                    WardrobeState {
                        day,
                        weather,
                        remaining,
                    },
                    p,
                )
            })
    }

    fn reward(&self, state: &WardrobeState, action: OutfitId, _next: &WardrobeState) -> f64 {
        let a = self.assess(state, action);
        self.weights.score(a.suits_weather, a.repeated)
    }

    fn is_terminal(&self, state: &WardrobeState) -> bool {
        state.day >= HORIZON_DAYS
    }

    fn start_states(&self) -> Vec<(WardrobeState, f64)> {
        let remaining = self.full_wardrobe();
        self.weather
            .ids()
            .map(|weather| {
                (
                    WardrobeState {
                        day: 0,
                        weather,
                        remaining,
                    },
                    self.start[weather.index()],
                )
            })
            .filter(|(_, p)| *p > 0.0)
            .collect()
    }

    fn is_legal(&self, state: &WardrobeState, action: OutfitId) -> bool {
        !self.is_terminal(state) && state.remaining.contains(action)
    }
}

impl OutfitModel for WardrobeMdp {
    fn weather_model(&self) -> &WeatherModel {
        &self.weather
    }

    fn day(&self, state: &WardrobeState) -> u8 {
        state.day
    }

    fn weather(&self, state: &WardrobeState) -> WeatherId {
        state.weather
    }

    fn action_name(&self, action: OutfitId) -> &str {
        &self.outfit(action).name
    }

    fn worn(&self, state: &WardrobeState) -> Vec<&str> {
        state
            .remaining
            .complement(self.pool_size())
            .iter()
            .map(|o| self.outfit(o).name.as_str())
            .collect()
    }

    fn assess(&self, state: &WardrobeState, action: OutfitId) -> Assessment {
        Assessment {
            suits_weather: self.suits(action, state.weather),
            repeated: self.track_repeats && self.category_worn(state.remaining, action),
        }
    }
}
