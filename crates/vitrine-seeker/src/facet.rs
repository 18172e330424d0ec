//! Facet descriptors handed to the filter panel.

use serde::Serialize;

use crate::value::FacetValue;

/// One selectable option of a dimension.
///
/// `count` is relative to every other active predicate once the engine is
/// active; before that it is the unfiltered count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOption {
    pub dimension: String,
    pub value: FacetValue,
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

impl FacetOption {
    pub fn new(
        dimension: impl Into<String>,
        value: FacetValue,
        label: impl Into<String>,
        count: usize,
    ) -> Self {
        FacetOption {
            dimension: dimension.into(),
            value,
            label: label.into(),
            count,
            selected: false,
        }
    }

    /// Returns `true` if picking this option would leave no results.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// What the panel renders for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacetBody {
    Options {
        options: Vec<FacetOption>,
        hide_counts: bool,
    },
    Range {
        min: f64,
        max: f64,
    },
    Search,
}

/// One dimension's entry in a [`FacetSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    pub key: String,
    pub label: String,
    pub body: FacetBody,
    /// Badge count: selected values, or 1 for an active range or search.
    pub selected: usize,
}

impl Facet {
    /// Discrete options, empty for range and search facets.
    pub fn options(&self) -> &[FacetOption] {
        match &self.body {
            FacetBody::Options { options, .. } => options,
            _ => &[],
        }
    }

    /// Looks up an option by value.
    pub fn option(&self, value: &FacetValue) -> Option<&FacetOption> {
        self.options().iter().find(|o| &o.value == value)
    }

    /// Range bounds, for range facets.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self.body {
            FacetBody::Range { min, max } => Some((min, max)),
            _ => None,
        }
    }
}

/// Facets in dimension declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FacetSet {
    facets: Vec<Facet>,
}

impl FacetSet {
    pub fn new(facets: Vec<Facet>) -> Self {
        FacetSet { facets }
    }

    pub fn get(&self, key: &str) -> Option<&Facet> {
        self.facets.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Shorthand for `get(dimension)?.option(value)`.
    pub fn option(&self, dimension: &str, value: &FacetValue) -> Option<&FacetOption> {
        self.get(dimension)?.option(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Facet> {
        self.facets.iter_mut()
    }
}

impl IntoIterator for FacetSet {
    type Item = Facet;
    type IntoIter = std::vec::IntoIter<Facet>;

    fn into_iter(self) -> Self::IntoIter {
        self.facets.into_iter()
    }
}
