//! Active filter selection.
//!
//! A [`PredicateStore`] maps dimension keys to [`Predicate`]s. A dimension
//! with an empty selection, an unbounded range or a blank query is never
//! stored: "no predicate" and "predicate matching everything" are the same
//! state.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::value::FacetValue;

/// Inclusive numeric range; an absent bound is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    /// Creates a range, dropping NaN bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Range {
            min: min.filter(|m| !m.is_nan()),
            max: max.filter(|m| !m.is_nan()),
        }
    }

    /// Returns `true` if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Returns `true` if `n` lies within the bounds.
    pub fn contains(&self, n: f64) -> bool {
        self.min.map_or(true, |m| n >= m) && self.max.map_or(true, |m| n <= m)
    }
}

/// One dimension's active selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Selected option values, matched with OR.
    Values { values: BTreeSet<FacetValue> },
    /// Numeric bounds.
    Range(Range),
    /// Lower-cased substring query.
    Text { query: String },
}

impl Predicate {
    /// Badge count shown next to the dimension title.
    pub fn badge(&self) -> usize {
        match self {
            Predicate::Values { values } => values.len(),
            Predicate::Range(_) | Predicate::Text { .. } => 1,
        }
    }

    /// Selected values, empty for range and text predicates.
    pub fn values(&self) -> Option<&BTreeSet<FacetValue>> {
        match self {
            Predicate::Values { values } => Some(values),
            _ => None,
        }
    }
}

/// Mapping from dimension key to its active predicate.
///
/// ```
/// use vitrine_seeker::PredicateStore;
///
/// let mut store = PredicateStore::new();
/// store.toggle("quality", "3");
/// assert!(store.is_active());
/// store.toggle("quality", "3");
/// assert!(!store.is_active());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredicateStore {
    predicates: BTreeMap<String, Predicate>,
}

impl PredicateStore {
    pub fn new() -> Self {
        PredicateStore::default()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Selects `value` if unselected, otherwise deselects it.
    ///
    /// Returns `true` if the value ends up selected. Removing the last value
    /// clears the dimension. A range or text predicate on the dimension is
    /// replaced by the new selection.
    pub fn toggle(&mut self, dimension: &str, value: impl Into<FacetValue>) -> bool {
        let value = value.into();
        if self.contains(dimension, &value) {
            self.deselect(dimension, &value);
            false
        } else {
            self.select(dimension, value);
            true
        }
    }

    /// Adds `value` to the dimension's selection.
    pub fn select(&mut self, dimension: &str, value: impl Into<FacetValue>) {
        let value = value.into();
        match self.predicates.get_mut(dimension) {
            Some(Predicate::Values { values }) => {
                values.insert(value);
            }
            _ => {
                self.predicates.insert(
                    dimension.to_string(),
                    Predicate::Values {
                        values: BTreeSet::from([value]),
                    },
                );
            }
        }
    }

    /// Removes `value` from the dimension's selection, if present.
    pub fn deselect(&mut self, dimension: &str, value: &FacetValue) {
        if let Some(Predicate::Values { values }) = self.predicates.get_mut(dimension) {
            values.remove(value);
            if values.is_empty() {
                self.predicates.remove(dimension);
            }
        }
    }

    /// Replaces the dimension's selection wholesale. An empty set clears it.
    pub fn set_values<I, V>(&mut self, dimension: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<FacetValue>,
    {
        let values: BTreeSet<FacetValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.predicates.remove(dimension);
        } else {
            self.predicates
                .insert(dimension.to_string(), Predicate::Values { values });
        }
    }

    /// Sets numeric bounds. Both bounds absent clears the dimension.
    pub fn set_range(&mut self, dimension: &str, min: Option<f64>, max: Option<f64>) {
        let range = Range::new(min, max);
        if range.is_unbounded() {
            self.predicates.remove(dimension);
        } else {
            self.predicates
                .insert(dimension.to_string(), Predicate::Range(range));
        }
    }

    /// Sets a free-text query. A blank query clears the dimension.
    pub fn set_text(&mut self, dimension: &str, query: &str) {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            self.predicates.remove(dimension);
        } else {
            self.predicates
                .insert(dimension.to_string(), Predicate::Text { query });
        }
    }

    /// Removes the dimension's predicate. Returns `true` if one was set.
    pub fn clear(&mut self, dimension: &str) -> bool {
        self.predicates.remove(dimension).is_some()
    }

    /// Removes every predicate.
    pub fn clear_all(&mut self) {
        self.predicates.clear();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns `true` if any dimension has a predicate.
    pub fn is_active(&self) -> bool {
        !self.predicates.is_empty()
    }

    pub fn get(&self, dimension: &str) -> Option<&Predicate> {
        self.predicates.get(dimension)
    }

    /// Returns `true` if `value` is selected on `dimension`.
    pub fn contains(&self, dimension: &str, value: &FacetValue) -> bool {
        matches!(
            self.predicates.get(dimension),
            Some(Predicate::Values { values }) if values.contains(value)
        )
    }

    /// Selected values of a dimension, empty if it has none.
    pub fn selected(&self, dimension: &str) -> impl Iterator<Item = &FacetValue> {
        self.predicates
            .get(dimension)
            .and_then(Predicate::values)
            .into_iter()
            .flatten()
    }

    /// Iterates over `(dimension, predicate)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.predicates.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
