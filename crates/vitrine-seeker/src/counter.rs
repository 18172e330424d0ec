//! Cross-filter facet counts.
//!
//! For every dimension D the counter counts D's options over the items that
//! match all predicates except D's own, so an option's count reads "results if
//! I also pick this". Dimensions without a predicate share the global match
//! set, which is computed once per recompute.

use std::collections::HashMap;

use crate::dimension::DimensionSet;
use crate::evaluator::Evaluator;
use crate::extract::tally;
use crate::facet::{FacetBody, FacetSet};
use crate::item::Facetable;
use crate::ordering::OptionOrder;
use crate::predicate::PredicateStore;
use crate::value::FacetValue;

/// Result of one recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct Recount {
    pub facets: FacetSet,
    /// Items matching every predicate.
    pub matched: usize,
    /// Items in the collection.
    pub total: usize,
}

/// Recomputes option counts against a predicate store.
#[derive(Debug, Clone, Copy)]
pub struct FacetCounter<'d> {
    dimensions: &'d DimensionSet,
}

impl<'d> FacetCounter<'d> {
    pub fn new(dimensions: &'d DimensionSet) -> Self {
        FacetCounter { dimensions }
    }

    /// Recounts every option of `baseline` and marks selections.
    ///
    /// The set of options is taken from `baseline`. Counts, selection flags,
    /// badges and labels are refreshed.
    pub fn recompute<T: Facetable>(
        &self,
        items: &[T],
        store: &PredicateStore,
        baseline: &FacetSet,
    ) -> Recount {
        let eval = Evaluator::new(self.dimensions);
        let global: Vec<&T> = eval.filter(items, store);
        let matched = global.len();

        let mut facets = baseline.clone();
        for facet in facets.iter_mut() {
            facet.selected = store.get(&facet.key).map_or(0, |p| p.badge());
            let FacetBody::Options { options, .. } = &mut facet.body else {
                continue;
            };
            let Some(dimension) = self.dimensions.get(&facet.key) else {
                continue;
            };
            let counts: HashMap<FacetValue, usize> = if store.get(&facet.key).is_some() {
                let others = items
                    .iter()
                    .filter(|item| eval.matches(*item, store, Some(&facet.key)));
                tally(others, dimension).into_iter().collect()
            } else {
                tally(global.iter().copied(), dimension).into_iter().collect()
            };
            for option in options.iter_mut() {
                option.count = counts.get(&option.value).copied().unwrap_or(0);
                option.selected = store.contains(&facet.key, &option.value);
                option.label = dimension.label_for(&option.value);
            }
            // Labels can resolve late; label order has to follow them.
            if matches!(dimension.option_order(), OptionOrder::Label) {
                dimension.option_order().sort(options);
            }
        }

        Recount {
            facets,
            matched,
            total: items.len(),
        }
    }

    /// Number of items matching every predicate.
    pub fn global_count<T: Facetable>(&self, items: &[T], store: &PredicateStore) -> usize {
        Evaluator::new(self.dimensions).count(items, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{Dimension, Source};
    use crate::extract::Extractor;
    use crate::item::Record;

    fn setup() -> (Vec<Record>, DimensionSet) {
        let items = vec![
            Record::new("1").with("q", vec![2, 3]).with("uf", "SP"),
            Record::new("2").with("q", vec![3]).with("uf", "RJ"),
            Record::new("3").with("q", vec![4]).with("uf", "SP"),
        ];
        let dims = DimensionSet::new(vec![
            Dimension::multi_valued("quality", "Quality", Source::field("q")),
            Dimension::discrete("uf", "State", Source::field("uf")),
        ])
        .unwrap();
        (items, dims)
    }

    fn count(recount: &Recount, dim: &str, value: &str) -> usize {
        recount
            .facets
            .option(dim, &FacetValue::from(value))
            .map_or(usize::MAX, |o| o.count)
    }

    #[test]
    fn own_dimension_is_excluded() {
        let (items, dims) = setup();
        let baseline = Extractor::new().extract(&items, &dims);
        let mut store = PredicateStore::new();
        store.toggle("quality", "3");

        let recount = FacetCounter::new(&dims).recompute(&items, &store, &baseline);
        assert_eq!(recount.matched, 2);
        assert_eq!(recount.total, 3);
        assert_eq!(count(&recount, "quality", "2"), 1);
        assert_eq!(count(&recount, "quality", "3"), 2);
        assert_eq!(count(&recount, "quality", "4"), 1);

        // uf has no predicate: counted over the two matching items.
        assert_eq!(count(&recount, "uf", "SP"), 1);
        assert_eq!(count(&recount, "uf", "RJ"), 1);
    }

    #[test]
    fn selection_flags_and_badges() {
        let (items, dims) = setup();
        let baseline = Extractor::new().extract(&items, &dims);
        let mut store = PredicateStore::new();
        store.toggle("uf", "SP");
        store.toggle("uf", "RJ");

        let recount = FacetCounter::new(&dims).recompute(&items, &store, &baseline);
        let uf = recount.facets.get("uf").unwrap();
        assert_eq!(uf.selected, 2);
        assert!(uf.options().iter().all(|o| o.selected));
        assert_eq!(recount.facets.get("quality").map(|f| f.selected), Some(0));
    }

    #[test]
    fn options_can_drop_to_zero() {
        let (items, dims) = setup();
        let baseline = Extractor::new().extract(&items, &dims);
        let mut store = PredicateStore::new();
        store.toggle("uf", "RJ");

        let recount = FacetCounter::new(&dims).recompute(&items, &store, &baseline);
        assert_eq!(count(&recount, "quality", "4"), 0);
        assert!(recount
            .facets
            .option("quality", &"4".into())
            .is_some_and(|o| o.is_empty()));
        assert_eq!(FacetCounter::new(&dims).global_count(&items, &store), 1);
    }

    #[test]
    fn labels_are_resolved_on_each_recount() {
        use crate::dimension::Labels;
        use std::cell::RefCell;
        use std::collections::BTreeMap;
        use std::rc::Rc;

        let names: Rc<RefCell<BTreeMap<String, String>>> = Rc::default();
        let lookup = names.clone();
        let items = vec![
            Record::new("1").with("ed", "10"),
            Record::new("2").with("ed", "20"),
        ];
        let dims = DimensionSet::new(vec![Dimension::discrete("ed", "Edition", Source::field("ed"))
            .labels(Labels::new().formatter(move |id| {
                lookup
                    .borrow()
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("Ed.{id}"))
            }))
            .order(OptionOrder::Label)])
        .unwrap();
        let baseline = Extractor::new().extract(&items, &dims);
        let labels = |facets: &FacetSet| -> Vec<String> {
            facets.get("ed").unwrap().options().iter().map(|o| o.label.clone()).collect()
        };
        assert_eq!(labels(&baseline), ["Ed.10", "Ed.20"]);

        names.borrow_mut().insert("20".into(), "Alpha".into());
        let recount = FacetCounter::new(&dims).recompute(&items, &PredicateStore::new(), &baseline);
        assert_eq!(labels(&recount.facets), ["Alpha", "Ed.10"]);
    }

    #[test]
    fn inactive_store_restores_baseline_counts() {
        let (items, dims) = setup();
        let baseline = Extractor::new().extract(&items, &dims);
        let recount =
            FacetCounter::new(&dims).recompute(&items, &PredicateStore::new(), &baseline);
        assert_eq!(recount.facets, baseline);
    }
}
