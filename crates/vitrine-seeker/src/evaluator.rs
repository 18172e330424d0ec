//! Item membership against a predicate store.
//!
//! Semantics are AND across dimensions and OR within one dimension. Evaluation
//! is pure: items are only read.

use std::collections::BTreeSet;

use tracing::trace;

use crate::dimension::{Dimension, DimensionKind, DimensionSet};
use crate::item::Facetable;
use crate::predicate::{Predicate, PredicateStore};
use crate::value::FacetValue;

/// Evaluates items against a [`PredicateStore`] for one dimension set.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'d> {
    dimensions: &'d DimensionSet,
}

impl<'d> Evaluator<'d> {
    pub fn new(dimensions: &'d DimensionSet) -> Self {
        Evaluator { dimensions }
    }

    /// Returns `true` if the item satisfies every predicate except the one on
    /// `exclude`.
    ///
    /// Predicates for dimensions outside the set, or whose kind does not fit
    /// the dimension, are ignored.
    pub fn matches<T: Facetable + ?Sized>(
        &self,
        item: &T,
        store: &PredicateStore,
        exclude: Option<&str>,
    ) -> bool {
        store
            .iter()
            .filter(|(key, _)| Some(*key) != exclude)
            .all(|(key, predicate)| self.satisfies(item, key, predicate))
    }

    /// Returns `true` if the item satisfies the predicate stored for
    /// `dimension`, or if there is none.
    pub fn matches_dimension<T: Facetable + ?Sized>(
        &self,
        item: &T,
        store: &PredicateStore,
        dimension: &str,
    ) -> bool {
        match store.get(dimension) {
            Some(predicate) => self.satisfies(item, dimension, predicate),
            None => true,
        }
    }

    /// Items matching every predicate, in input order.
    pub fn filter<'a, T: Facetable>(
        &self,
        items: &'a [T],
        store: &PredicateStore,
    ) -> Vec<&'a T> {
        if !store.is_active() {
            return items.iter().collect();
        }
        items
            .iter()
            .filter(|item| self.matches(*item, store, None))
            .collect()
    }

    /// Number of items matching every predicate.
    pub fn count<T: Facetable>(&self, items: &[T], store: &PredicateStore) -> usize {
        if !store.is_active() {
            return items.len();
        }
        items
            .iter()
            .filter(|item| self.matches(*item, store, None))
            .count()
    }

    fn satisfies<T: Facetable + ?Sized>(&self, item: &T, key: &str, predicate: &Predicate) -> bool {
        let Some(dimension) = self.dimensions.get(key) else {
            trace!(dimension = key, "ignoring predicate for unknown dimension");
            return true;
        };
        match (dimension.kind(), predicate) {
            (kind, Predicate::Values { values }) if kind.is_selectable() => {
                selected_any(dimension, item, values)
            }
            (DimensionKind::NumericRange(_), Predicate::Range(range)) => dimension
                .number_of(item)
                .is_some_and(|n| range.contains(n)),
            (DimensionKind::Text(_), Predicate::Text { query }) => {
                dimension.text_matches(item, query)
            }
            (kind, _) => {
                trace!(
                    dimension = key,
                    kind = kind.as_str(),
                    "ignoring predicate of mismatched kind"
                );
                true
            }
        }
    }
}

fn selected_any<T: Facetable + ?Sized>(
    dimension: &Dimension,
    item: &T,
    values: &BTreeSet<FacetValue>,
) -> bool {
    match dimension.kind() {
        DimensionKind::Bucketed(_) => values
            .iter()
            .filter_map(|id| dimension.bucket(id))
            .any(|bucket| bucket.matches(item)),
        _ => dimension
            .keys_of(item)
            .iter()
            .any(|key| values.contains(key)),
    }
}
