use std::collections::HashMap;
use std::hash::Hash;

/// Deterministic mapping from non-terminal states to actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy<S: Eq + Hash, A> {
    actions: HashMap<S, A>,
}

impl<S: Eq + Hash, A: Copy> Policy<S, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn insert(&mut self, state: S, action: A) {
        self.actions.insert(state, action);
    }

    /// Action chosen in `state`; `None` for terminal or unknown states.
    #[must_use]
    pub fn action(&self, state: &S) -> Option<A> {
        self.actions.get(state).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &A)> {
        self.actions.iter()
    }
}

impl<S: Eq + Hash, A: Copy> Default for Policy<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Eq + Hash, A> FromIterator<(S, A)> for Policy<S, A> {
    fn from_iter<I: IntoIterator<Item = (S, A)>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

/// Expected cumulative reward per state.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFunction<S: Eq + Hash> {
    values: HashMap<S, f64>,
}

impl<S: Eq + Hash> ValueFunction<S> {
    #[must_use]
    pub fn value(&self, state: &S) -> Option<f64> {
        self.values.get(state).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> {
        self.values.iter().map(|(s, v)| (s, *v))
    }

    /// Largest absolute difference over the states both functions know.
    /// States missing from `other` count as infinitely far off.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.values
            .iter()
            .map(|(s, v)| other.value(s).map_or(f64::INFINITY, |o| (v - o).abs()))
            .fold(0.0, f64::max)
    }
}

impl<S: Eq + Hash> FromIterator<(S, f64)> for ValueFunction<S> {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
