//! Property-based tests for the facet engine using proptest.

use proptest::prelude::*;
use vitrine_seeker::{
    Bucket, BucketRule, Dimension, DimensionSet, Evaluator, Extractor, FacetEngine, FacetValue,
    PredicateStore, Record, Source,
};

// ============================================================================
// Test helpers
// ============================================================================

const STATES: [&str; 3] = ["SP", "RJ", "MG"];

fn dimensions() -> DimensionSet {
    DimensionSet::new(vec![
        Dimension::multi_valued("quality", "Quality", Source::field("q")),
        Dimension::discrete("uf", "State", Source::field("uf")),
        Dimension::numeric_range("price", "Price", Source::field("p")),
        Dimension::bucketed(
            "qty",
            "Quantity",
            vec![
                Bucket::new("4", "x4", Source::field("n"), BucketRule::DivisibleBy(4)),
                Bucket::new("3", "x3", Source::field("n"), BucketRule::DivisibleBy(3)),
                Bucket::new("2", "x2", Source::field("n"), BucketRule::DivisibleBy(2)),
            ],
        ),
    ])
    .unwrap()
}

fn offer_strategy() -> impl Strategy<Value = (Vec<i64>, usize, i64, i64)> {
    (
        prop::collection::vec(1i64..6, 0..4),
        0usize..STATES.len(),
        0i64..50,
        0i64..20,
    )
}

fn build(raw: Vec<(Vec<i64>, usize, i64, i64)>) -> Vec<Record> {
    raw.into_iter()
        .enumerate()
        .map(|(i, (q, uf, p, n))| {
            Record::new(i.to_string())
                .with("q", q)
                .with("uf", STATES[uf])
                .with("p", p)
                .with("n", n)
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Action {
    Quality(i64),
    State(usize),
    Qty(u8),
    Price(Option<i64>, Option<i64>),
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1i64..6).prop_map(Action::Quality),
        (0usize..STATES.len()).prop_map(Action::State),
        prop::sample::select(vec![2u8, 3, 4]).prop_map(Action::Qty),
        (prop::option::of(0i64..50), prop::option::of(0i64..50))
            .prop_map(|(a, b)| Action::Price(a, b)),
    ]
}

fn apply(store: &mut PredicateStore, action: &Action) {
    match action {
        Action::Quality(q) => {
            store.toggle("quality", *q);
        }
        Action::State(uf) => {
            store.toggle("uf", STATES[*uf]);
        }
        Action::Qty(n) => {
            store.toggle("qty", *n as u32);
        }
        Action::Price(min, max) => {
            store.set_range("price", min.map(|m| m as f64), max.map(|m| m as f64));
        }
    }
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Recounted options equal a from-scratch count that ignores their own dimension.
    #[test]
    fn facet_counts_match_direct_computation(
        raw in prop::collection::vec(offer_strategy(), 0..40),
        actions in prop::collection::vec(action_strategy(), 0..8),
    ) {
        let items = build(raw);
        let mut engine = FacetEngine::with_extractor(
            items.clone(),
            dimensions(),
            Extractor::new().min_distinct(1),
        );
        let mut store = PredicateStore::new();
        for action in &actions {
            apply(&mut store, action);
        }
        engine.replace_store(store.clone());

        let dims = dimensions();
        let eval = Evaluator::new(&dims);
        for facet in engine.facets().iter() {
            let dimension = dims.get(&facet.key).unwrap();
            for option in facet.options() {
                let direct = items
                    .iter()
                    .filter(|item| eval.matches(*item, &store, Some(&facet.key)))
                    .filter(|item| dimension.keys_of(*item).contains(&option.value))
                    .count();
                prop_assert_eq!(option.count, direct, "{}={}", facet.key, option.value);
            }
        }
        prop_assert_eq!(engine.matched(), eval.count(&items, &store));
    }

    /// Two active dimensions combine with AND.
    #[test]
    fn dimensions_combine_with_and(
        raw in prop::collection::vec(offer_strategy(), 1..30),
        quality in 1i64..6,
        uf in 0usize..STATES.len(),
    ) {
        let items = build(raw);
        let dims = dimensions();
        let eval = Evaluator::new(&dims);
        let mut store = PredicateStore::new();
        store.toggle("quality", quality);
        store.toggle("uf", STATES[uf]);

        for item in &items {
            prop_assert_eq!(
                eval.matches(item, &store, None),
                eval.matches_dimension(item, &store, "quality")
                    && eval.matches_dimension(item, &store, "uf")
            );
        }
    }

    /// Two values on one multi-valued dimension combine with OR.
    #[test]
    fn values_combine_with_or(
        raw in prop::collection::vec(offer_strategy(), 1..30),
        a in 1i64..6,
        b in 1i64..6,
    ) {
        let items = build(raw);
        let dims = dimensions();
        let eval = Evaluator::new(&dims);
        let mut store = PredicateStore::new();
        store.select("quality", a);
        store.select("quality", b);

        let dimension = dims.get("quality").unwrap();
        for item in &items {
            let keys = dimension.keys_of(item);
            let expected = keys.contains(&FacetValue::from(a)) || keys.contains(&FacetValue::from(b));
            prop_assert_eq!(eval.matches(item, &store, None), expected);
        }
    }

    /// Toggling the same value twice restores the store exactly.
    #[test]
    fn toggle_twice_is_identity(
        actions in prop::collection::vec(action_strategy(), 0..8),
        quality in 1i64..6,
    ) {
        let mut store = PredicateStore::new();
        for action in &actions {
            apply(&mut store, action);
        }
        let before = store.clone();
        store.toggle("quality", quality);
        store.toggle("quality", quality);
        prop_assert_eq!(store, before);
    }

    /// An empty store matches every item.
    #[test]
    fn empty_store_matches_all(raw in prop::collection::vec(offer_strategy(), 0..30)) {
        let items = build(raw);
        let dims = dimensions();
        let eval = Evaluator::new(&dims);
        let store = PredicateStore::new();
        prop_assert!(items.iter().all(|item| eval.matches(item, &store, None)));
        prop_assert_eq!(eval.count(&items, &store), items.len());
    }

    /// Excluding a dimension makes its predicate irrelevant.
    #[test]
    fn excluded_dimension_is_never_consulted(
        raw in prop::collection::vec(offer_strategy(), 1..30),
        actions in prop::collection::vec(action_strategy(), 0..6),
        uf_a in 0usize..STATES.len(),
        uf_b in 0usize..STATES.len(),
    ) {
        let items = build(raw);
        let dims = dimensions();
        let eval = Evaluator::new(&dims);

        let mut with_a = PredicateStore::new();
        for action in &actions {
            apply(&mut with_a, action);
        }
        let mut with_b = with_a.clone();
        with_a.set_values("uf", [STATES[uf_a]]);
        with_b.set_values("uf", [STATES[uf_b]]);
        let mut without = with_a.clone();
        without.clear("uf");

        for item in &items {
            let expected = eval.matches(item, &without, None);
            prop_assert_eq!(eval.matches(item, &with_a, Some("uf")), expected);
            prop_assert_eq!(eval.matches(item, &with_b, Some("uf")), expected);
        }
    }
}

// ============================================================================
// Additional edge case tests
// ============================================================================

#[test]
fn empty_collection_has_no_facets() {
    let engine = FacetEngine::new(Vec::<Record>::new(), dimensions());
    assert!(engine.facets().is_empty());
    assert_eq!(engine.matched(), 0);
    assert!(engine.matched_ids().is_empty());
}

#[test]
fn overlapping_buckets_count_the_item_in_each() {
    let items = vec![Record::new("a").with("n", 12), Record::new("b").with("n", 5)];
    let engine = FacetEngine::new(items, dimensions());
    let qty = engine.facets().get("qty");
    // 12 is divisible by 2, 3 and 4; 5 by none, so only one item backs the facet.
    assert!(qty.is_some_and(|f| f.options().len() == 3 && f.options().iter().all(|o| o.count == 1)));
}
