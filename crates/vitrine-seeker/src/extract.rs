//! Attribute extraction: the unfiltered facet set of an item collection.

use std::collections::HashMap;

use tracing::debug;

use crate::dimension::{Dimension, DimensionKind, DimensionSet};
use crate::facet::{Facet, FacetBody, FacetOption, FacetSet};
use crate::item::Facetable;
use crate::value::FacetValue;

/// Default minimum number of distinct values for a dimension to be offered.
pub const DEFAULT_MIN_DISTINCT: usize = 2;

/// Builds the baseline [`FacetSet`] from a raw collection.
///
/// Dimensions with too few distinct values, or with no readable data at all,
/// are omitted rather than reported as errors.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    min_distinct: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor {
            min_distinct: DEFAULT_MIN_DISTINCT,
        }
    }
}

impl Extractor {
    pub fn new() -> Self {
        Extractor::default()
    }

    /// Sets the minimum distinct-value threshold for every dimension that
    /// does not override it.
    pub fn min_distinct(mut self, n: usize) -> Self {
        self.min_distinct = n;
        self
    }

    /// Extracts one facet per dimension that has enough data.
    pub fn extract<T: Facetable>(&self, items: &[T], dimensions: &DimensionSet) -> FacetSet {
        let facets = dimensions
            .iter()
            .filter_map(|dimension| self.extract_one(items, dimension))
            .collect();
        FacetSet::new(facets)
    }

    fn extract_one<T: Facetable>(&self, items: &[T], dimension: &Dimension) -> Option<Facet> {
        let threshold = dimension.min_distinct_override().unwrap_or(self.min_distinct);
        let body = match dimension.kind() {
            DimensionKind::Discrete(_) | DimensionKind::MultiValued(_) => {
                let tally = tally(items, dimension);
                if tally.len() < threshold {
                    debug!(
                        dimension = dimension.key(),
                        distinct = tally.len(),
                        threshold,
                        "omitting dimension with too few values"
                    );
                    return None;
                }
                let mut options: Vec<FacetOption> = tally
                    .into_iter()
                    .map(|(value, count)| {
                        let label = dimension.label_for(&value);
                        FacetOption::new(dimension.key(), value, label, count)
                    })
                    .collect();
                dimension.option_order().sort(&mut options);
                FacetBody::Options {
                    options,
                    hide_counts: dimension.counts_hidden(),
                }
            }
            DimensionKind::Bucketed(buckets) => {
                let mut options: Vec<FacetOption> = buckets
                    .iter()
                    .map(|bucket| {
                        let count = items.iter().filter(|item| bucket.matches(*item)).count();
                        FacetOption::new(dimension.key(), bucket.id.clone(), bucket.label.clone(), count)
                    })
                    .filter(|option| option.count > 0)
                    .collect();
                if options.len() < threshold {
                    debug!(
                        dimension = dimension.key(),
                        buckets = options.len(),
                        threshold,
                        "omitting bucketed dimension with too few populated buckets"
                    );
                    return None;
                }
                dimension.option_order().sort(&mut options);
                FacetBody::Options {
                    options,
                    hide_counts: dimension.counts_hidden(),
                }
            }
            DimensionKind::NumericRange(_) => {
                let numbers: Vec<f64> = items
                    .iter()
                    .filter_map(|item| dimension.bound_of(item))
                    .filter(|n| n.is_finite())
                    .collect();
                let mut distinct = numbers.clone();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup();
                if distinct.is_empty() || distinct.len() < threshold {
                    debug!(
                        dimension = dimension.key(),
                        distinct = distinct.len(),
                        "omitting range dimension without spread"
                    );
                    return None;
                }
                let min = distinct[0].floor();
                let max = distinct[distinct.len() - 1].ceil();
                FacetBody::Range { min, max }
            }
            DimensionKind::Text(_) => {
                if !items.iter().any(|item| dimension.has_text(item)) {
                    debug!(dimension = dimension.key(), "omitting text dimension without text");
                    return None;
                }
                FacetBody::Search
            }
        };
        Some(Facet {
            key: dimension.key().to_string(),
            label: dimension.label().to_string(),
            body,
            selected: 0,
        })
    }
}

/// Counts items per option key, in first-seen order.
///
/// An item contributes once to every distinct key it carries.
pub(crate) fn tally<'a, T, I>(items: I, dimension: &Dimension) -> Vec<(FacetValue, usize)>
where
    T: Facetable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut index: HashMap<FacetValue, usize> = HashMap::new();
    let mut counts: Vec<(FacetValue, usize)> = Vec::new();
    for item in items {
        for key in dimension.keys_of(item) {
            match index.get(&key) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(key.clone(), counts.len());
                    counts.push((key, 1));
                }
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{Bucket, BucketRule, Labels, Source};
    use crate::item::Record;

    fn stock() -> Vec<Record> {
        vec![
            Record::new("1").with("q", vec![2, 3]).with("p", 4.2).with("lang", 1),
            Record::new("2").with("q", vec![3]).with("p", 15.0).with("lang", 1),
            Record::new("3").with("q", vec![4]).with("p", 25.7).with("lang", 1),
        ]
    }

    #[test]
    fn multi_valued_counts_every_value() {
        let dims = DimensionSet::new(vec![Dimension::multi_valued(
            "quality",
            "Quality",
            Source::field("q"),
        )
        .labels(Labels::new().table([("2", "NM")]).prefix("Q"))])
        .unwrap();
        let facets = Extractor::new().extract(&stock(), &dims);
        let quality = facets.get("quality").unwrap();
        let summary: Vec<(&str, &str, usize)> = quality
            .options()
            .iter()
            .map(|o| (o.value.as_str(), o.label.as_str(), o.count))
            .collect();
        assert_eq!(summary, vec![("2", "NM", 1), ("3", "Q3", 2), ("4", "Q4", 1)]);
    }

    #[test]
    fn single_value_dimensions_are_omitted() {
        let dims = DimensionSet::new(vec![
            Dimension::discrete("lang", "Language", Source::field("lang")),
            Dimension::discrete("absent", "Absent", Source::field("nope")),
        ])
        .unwrap();
        let facets = Extractor::new().extract(&stock(), &dims);
        assert!(facets.is_empty());

        let lenient = Extractor::new().min_distinct(1).extract(&stock(), &dims);
        assert!(lenient.contains("lang"));
        assert!(!lenient.contains("absent"));
    }

    #[test]
    fn range_reports_rounded_extremes() {
        let dims = DimensionSet::new(vec![Dimension::numeric_range(
            "price",
            "Price",
            Source::field("p"),
        )])
        .unwrap();
        let facets = Extractor::new().extract(&stock(), &dims);
        assert_eq!(facets.get("price").and_then(Facet::range), Some((4.0, 26.0)));
    }

    #[test]
    fn zero_count_buckets_are_dropped() {
        let dims = DimensionSet::new(vec![Dimension::bucketed(
            "qty",
            "Quantity",
            vec![
                Bucket::new("4", "x4", Source::field("n"), BucketRule::DivisibleBy(4)),
                Bucket::new("3", "x3", Source::field("n"), BucketRule::DivisibleBy(3)),
                Bucket::new("2", "x2", Source::field("n"), BucketRule::DivisibleBy(2)),
            ],
        )])
        .unwrap();
        let items = vec![Record::new("a").with("n", 4), Record::new("b").with("n", 2)];
        let facets = Extractor::new().extract(&items, &dims);
        let values: Vec<&str> = facets
            .get("qty")
            .unwrap()
            .options()
            .iter()
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(values, vec!["4", "2"]);
    }

    #[test]
    fn text_facet_needs_some_text() {
        let dims = DimensionSet::new(vec![Dimension::text(
            "search",
            "Search",
            vec![Source::field("name")],
        )])
        .unwrap();
        assert!(Extractor::new().extract(&stock(), &dims).is_empty());

        let named = vec![Record::new("1").with("name", "Island")];
        let facets = Extractor::new().extract(&named, &dims);
        assert_eq!(facets.get("search").map(|f| &f.body), Some(&FacetBody::Search));
    }

    #[test]
    fn tally_counts_item_once_per_key() {
        let dim = Dimension::multi_valued("q", "Q", Source::field("q"));
        let items = vec![Record::new("1").with("q", vec![2, 2, 3])];
        assert_eq!(
            tally(&items, &dim),
            vec![(FacetValue::from("2"), 1), (FacetValue::from("3"), 1)]
        );
    }
}
