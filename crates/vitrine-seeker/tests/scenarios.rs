//! End-to-end filtering scenarios over small fixed collections.

use vitrine_seeker::{
    Bucket, BucketRule, Dimension, DimensionSet, FacetEngine, FacetValue, JoinTable, Labels,
    OptionOrder, Record, Source,
};

fn count(engine: &FacetEngine<Record>, dimension: &str, value: &str) -> Option<usize> {
    engine
        .facets()
        .option(dimension, &FacetValue::from(value))
        .map(|o| o.count)
}

#[test]
fn multi_valued_quality_selection() {
    let dims = DimensionSet::new(vec![Dimension::multi_valued(
        "quality",
        "Quality",
        Source::field("quality"),
    )])
    .unwrap();
    let items = vec![
        Record::new("1").with("quality", vec![2, 3]),
        Record::new("2").with("quality", vec![3]),
        Record::new("3").with("quality", vec![4]),
    ];
    let mut engine = FacetEngine::new(items, dims);

    engine.toggle("quality", 3);
    assert_eq!(engine.matched_ids(), vec!["1", "2"]);
    assert_eq!(count(&engine, "quality", "4"), Some(1));
    assert_eq!(count(&engine, "quality", "2"), Some(1));
    assert_eq!(count(&engine, "quality", "3"), Some(2));
}

#[test]
fn price_range_with_open_end() {
    let dims = DimensionSet::new(vec![Dimension::numeric_range(
        "price",
        "Price",
        Source::field("price"),
    )])
    .unwrap();
    let items = vec![
        Record::new("a").with("price", 5),
        Record::new("b").with("price", 15),
        Record::new("c").with("price", 25),
    ];
    let mut engine = FacetEngine::new(items, dims);
    assert_eq!(
        engine.facets().get("price").and_then(|f| f.range()),
        Some((5.0, 25.0))
    );

    engine.set_range("price", Some(10.0), Some(20.0));
    assert_eq!(engine.matched_ids(), vec!["b"]);

    engine.set_range("price", Some(10.0), None);
    assert_eq!(engine.matched_ids(), vec!["b", "c"]);
}

#[test]
fn divisible_quantity_buckets() {
    let qty = Source::field("qty");
    let dims = DimensionSet::new(vec![Dimension::bucketed(
        "qty",
        "Quantity",
        vec![
            Bucket::new("2", "Pairs", qty.clone(), BucketRule::DivisibleBy(2)),
            Bucket::new("3", "Triples", qty, BucketRule::DivisibleBy(3)),
        ],
    )])
    .unwrap();
    let items = vec![
        Record::new("4").with("qty", 4),
        Record::new("6").with("qty", 6),
        Record::new("5").with("qty", 5),
        Record::new("9").with("qty", 9),
    ];
    let mut engine = FacetEngine::new(items, dims);
    assert_eq!(count(&engine, "qty", "2"), Some(2));
    assert_eq!(count(&engine, "qty", "3"), Some(2));

    engine.toggle("qty", "2");
    engine.toggle("qty", "3");
    assert_eq!(engine.matched_ids(), vec!["4", "6", "9"]);
}

#[test]
fn store_attributes_through_join() {
    let stores: JoinTable = vec![
        ("10".to_string(), Record::new("10").with("uf", "SP").with("refs", 120)),
        ("11".to_string(), Record::new("11").with("uf", "RJ").with("refs", 7)),
        ("12".to_string(), Record::new("12").with("uf", "SP").with("refs", 55)),
    ]
    .into_iter()
    .collect();
    let stores = std::rc::Rc::new(stores);
    let refs = Source::joined("store", stores.clone(), "refs");

    let dims = DimensionSet::new(vec![
        Dimension::discrete("uf", "State", Source::joined("store", stores, "uf"))
            .labels(Labels::new().table([("SP", "São Paulo"), ("RJ", "Rio de Janeiro")]))
            .order(OptionOrder::Label),
        Dimension::bucketed(
            "refs",
            "Reviews",
            vec![
                Bucket::new("100+", "100+", refs.clone(), BucketRule::at_least(100.0)),
                Bucket::new(
                    "50-99",
                    "50-99",
                    refs.clone(),
                    BucketRule::Between {
                        min: Some(50.0),
                        max: Some(99.0),
                    },
                ),
                Bucket::new(
                    "10-49",
                    "10-49",
                    refs.clone(),
                    BucketRule::Between {
                        min: Some(10.0),
                        max: Some(49.0),
                    },
                ),
                Bucket::new("0-9", "0-9", refs, BucketRule::below(9.0)),
            ],
        ),
    ])
    .unwrap();

    let offers = vec![
        Record::new("o1").with("store", 10),
        Record::new("o2").with("store", 11),
        Record::new("o3").with("store", 12),
        Record::new("o4").with("store", 99),
    ];
    let mut engine = FacetEngine::new(offers, dims);

    let labels: Vec<&str> = engine
        .facets()
        .get("uf")
        .unwrap()
        .options()
        .iter()
        .map(|o| o.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Rio de Janeiro", "São Paulo"]);
    let buckets: Vec<&str> = engine
        .facets()
        .get("refs")
        .unwrap()
        .options()
        .iter()
        .map(|o| o.value.as_str())
        .collect();
    assert_eq!(buckets, vec!["100+", "50-99", "0-9"]);

    engine.toggle("uf", "SP");
    assert_eq!(engine.matched_ids(), vec!["o1", "o3"]);
    assert_eq!(count(&engine, "refs", "0-9"), Some(0));
    assert_eq!(count(&engine, "uf", "RJ"), Some(1));
}

#[test]
fn missing_extras_default_to_none() {
    let dims = DimensionSet::new(vec![Dimension::discrete(
        "extras",
        "Extras",
        Source::field("extras"),
    )
    .missing_as(0)
    .labels(Labels::new().table([("0", "None"), ("1", "Foil")]).prefix("Extra "))])
    .unwrap();
    let items = vec![
        Record::new("1").with("extras", 1),
        Record::new("2"),
        Record::new("3").with("extras", 7),
    ];
    let mut engine = FacetEngine::new(items, dims);
    let labels: Vec<&str> = engine
        .facets()
        .get("extras")
        .unwrap()
        .options()
        .iter()
        .map(|o| o.label.as_str())
        .collect();
    assert_eq!(labels, vec!["None", "Foil", "Extra 7"]);

    engine.toggle("extras", 0);
    assert_eq!(engine.matched_ids(), vec!["2"]);
}
