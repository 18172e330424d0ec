//! Self-contained filter engine over one item collection.

use std::fmt;

use serde::Serialize;

use crate::counter::{FacetCounter, Recount};
use crate::dimension::DimensionSet;
use crate::evaluator::Evaluator;
use crate::extract::Extractor;
use crate::facet::FacetSet;
use crate::item::Facetable;
use crate::predicate::{Predicate, PredicateStore};
use crate::value::FacetValue;

/// Which part of a predicate an [`ActiveTag`] stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TagKind {
    Value(FacetValue),
    Min,
    Max,
    Text,
}

/// One entry of the active-filter bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveTag {
    pub dimension: String,
    pub kind: TagKind,
    pub label: String,
}

/// Items, dimensions and predicates of one activation.
///
/// Items and dimensions are fixed at construction. Every mutation recounts the
/// facets before returning.
///
/// ```
/// use vitrine_seeker::{Dimension, DimensionSet, FacetEngine, Record, Source};
///
/// let dims = DimensionSet::new(vec![
///     Dimension::multi_valued("quality", "Quality", Source::field("q")),
/// ]).unwrap();
/// let items = vec![
///     Record::new("1").with("q", vec![2, 3]),
///     Record::new("2").with("q", vec![3]),
///     Record::new("3").with("q", vec![4]),
/// ];
///
/// let mut engine = FacetEngine::new(items, dims);
/// engine.toggle("quality", "3");
/// assert_eq!(engine.matched_ids(), vec!["1", "2"]);
/// ```
pub struct FacetEngine<T> {
    items: Vec<T>,
    dimensions: DimensionSet,
    baseline: FacetSet,
    store: PredicateStore,
    current: Recount,
}

impl<T: Facetable> FacetEngine<T> {
    /// Extracts the baseline facets with the default extractor.
    pub fn new(items: Vec<T>, dimensions: DimensionSet) -> Self {
        Self::with_extractor(items, dimensions, Extractor::default())
    }

    pub fn with_extractor(items: Vec<T>, dimensions: DimensionSet, extractor: Extractor) -> Self {
        let baseline = extractor.extract(&items, &dimensions);
        let current = Recount {
            facets: baseline.clone(),
            matched: items.len(),
            total: items.len(),
        };
        FacetEngine {
            items,
            dimensions,
            baseline,
            store: PredicateStore::new(),
            current,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Toggles an option. Returns `true` if it ends up selected.
    pub fn toggle(&mut self, dimension: &str, value: impl Into<FacetValue>) -> bool {
        let selected = self.store.toggle(dimension, value);
        self.recount();
        selected
    }

    pub fn set_values<I, V>(&mut self, dimension: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<FacetValue>,
    {
        self.store.set_values(dimension, values);
        self.recount();
    }

    pub fn set_range(&mut self, dimension: &str, min: Option<f64>, max: Option<f64>) {
        self.store.set_range(dimension, min, max);
        self.recount();
    }

    pub fn set_text(&mut self, dimension: &str, query: &str) {
        self.store.set_text(dimension, query);
        self.recount();
    }

    pub fn clear(&mut self, dimension: &str) {
        if self.store.clear(dimension) {
            self.recount();
        }
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.recount();
    }

    /// Replaces the predicate store wholesale, e.g. after pulling native state.
    pub fn replace_store(&mut self, store: PredicateStore) {
        self.store = store;
        self.recount();
    }

    /// Removes the selection an active tag stands for.
    pub fn remove_tag(&mut self, tag: &ActiveTag) {
        let dimension = tag.dimension.as_str();
        match &tag.kind {
            TagKind::Value(value) => self.store.deselect(dimension, value),
            TagKind::Min | TagKind::Max => {
                if let Some(Predicate::Range(range)) = self.store.get(dimension) {
                    let range = *range;
                    if tag.kind == TagKind::Min {
                        self.store.set_range(dimension, None, range.max);
                    } else {
                        self.store.set_range(dimension, range.min, None);
                    }
                }
            }
            TagKind::Text => {
                self.store.clear(dimension);
            }
        }
        self.recount();
    }

    /// Recounts against the current predicates. Labels are resolved again,
    /// so names that arrived since the last change show up.
    pub fn recount(&mut self) {
        self.current =
            FacetCounter::new(&self.dimensions).recompute(&self.items, &self.store, &self.baseline);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_active(&self) -> bool {
        self.store.is_active()
    }

    pub fn store(&self) -> &PredicateStore {
        &self.store
    }

    pub fn dimensions(&self) -> &DimensionSet {
        &self.dimensions
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Facets as extracted, before any filtering.
    pub fn baseline(&self) -> &FacetSet {
        &self.baseline
    }

    /// Facets with counts relative to the current predicates.
    pub fn facets(&self) -> &FacetSet {
        &self.current.facets
    }

    /// Number of items matching every predicate.
    pub fn matched(&self) -> usize {
        self.current.matched
    }

    pub fn total(&self) -> usize {
        self.current.total
    }

    /// Items matching every predicate, in collection order.
    pub fn filtered(&self) -> Vec<&T> {
        Evaluator::new(&self.dimensions).filter(&self.items, &self.store)
    }

    pub fn matched_ids(&self) -> Vec<String> {
        self.filtered()
            .into_iter()
            .map(|item| item.facet_id().into_owned())
            .collect()
    }

    /// Active selections, in dimension declaration order.
    pub fn active_tags(&self) -> Vec<ActiveTag> {
        let mut tags = Vec::new();
        for dimension in self.dimensions.iter() {
            let key = dimension.key();
            let Some(predicate) = self.store.get(key) else {
                continue;
            };
            match predicate {
                Predicate::Values { values } => {
                    tags.extend(values.iter().map(|value| ActiveTag {
                        dimension: key.to_string(),
                        kind: TagKind::Value(value.clone()),
                        label: dimension.label_for(value),
                    }));
                }
                Predicate::Range(range) => {
                    if let Some(min) = range.min {
                        tags.push(ActiveTag {
                            dimension: key.to_string(),
                            kind: TagKind::Min,
                            label: format!("{} ≥ {}", dimension.label(), min),
                        });
                    }
                    if let Some(max) = range.max {
                        tags.push(ActiveTag {
                            dimension: key.to_string(),
                            kind: TagKind::Max,
                            label: format!("{} ≤ {}", dimension.label(), max),
                        });
                    }
                }
                Predicate::Text { query } => tags.push(ActiveTag {
                    dimension: key.to_string(),
                    kind: TagKind::Text,
                    label: format!("\"{query}\""),
                }),
            }
        }
        tags
    }
}

impl<T> fmt::Debug for FacetEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetEngine")
            .field("items", &self.items.len())
            .field("dimensions", &self.dimensions.len())
            .field("store", &self.store)
            .field("matched", &self.current.matched)
            .finish()
    }
}
