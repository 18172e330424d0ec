//! Seeker - Faceted filter engine for in-memory storefront listings.
//!
//! Seeker filters a fixed collection of items across several attribute
//! dimensions and keeps live, cross-filtered option counts. It supports:
//!
//! - Single-valued, multi-valued, bucketed, numeric-range and free-text dimensions
//! - Values read from the item itself or joined through a second entity
//! - Label tables with deterministic `"<Prefix><id>"` fallbacks
//! - Counts that ignore a dimension's own predicate ("N more if you also pick this")
//!
//! # Quick Start
//!
//! ```rust
//! use vitrine_seeker::{Dimension, DimensionSet, FacetEngine, FacetValue, Record, Source};
//!
//! let dims = DimensionSet::new(vec![
//!     Dimension::multi_valued("quality", "Quality", Source::field("q")),
//!     Dimension::numeric_range("price", "Price", Source::field("price")),
//! ]).unwrap();
//!
//! let offers = vec![
//!     Record::new("1").with("q", vec![2, 3]).with("price", 5.0),
//!     Record::new("2").with("q", vec![3]).with("price", 15.0),
//!     Record::new("3").with("q", vec![4]).with("price", 25.0),
//! ];
//!
//! let mut engine = FacetEngine::new(offers, dims);
//! engine.toggle("quality", "3");
//! assert_eq!(engine.matched_ids(), vec!["1", "2"]);
//!
//! // Quality counts ignore the quality predicate itself.
//! let four = engine.facets().option("quality", &FacetValue::from("4")).unwrap();
//! assert_eq!(four.count, 1);
//! ```
//!
//! # Match Semantics
//!
//! ```text
//! match = ∀ dimension D with a predicate:
//!           (item satisfies at least one of D's selected values)
//! ```
//!
//! - **Within a dimension**: OR across selected values or buckets
//! - **Across dimensions**: AND
//! - **No predicates**: every item matches
//!
//! | Kind | Item matches when |
//! |------|-------------------|
//! | Discrete | its value is selected |
//! | Multi-valued | any of its values is selected |
//! | Bucketed | it falls into any selected bucket |
//! | Numeric range | its number lies in `[min, max]`; missing numbers fail |
//! | Text | any text field contains the query, case-insensitively |
//!
//! Predicates for dimensions the engine does not know are ignored.

mod counter;
mod dimension;
mod engine;
mod error;
mod evaluator;
mod extract;
mod facet;
mod item;
mod ordering;
mod predicate;
mod value;

// Re-export public API
pub use counter::{FacetCounter, Recount};
pub use dimension::{
    Bucket, BucketRule, Dimension, DimensionKind, DimensionSet, JoinTable, Labels, Source,
};
pub use engine::{ActiveTag, FacetEngine, TagKind};
pub use error::{Result, SeekerError};
pub use evaluator::Evaluator;
pub use extract::{Extractor, DEFAULT_MIN_DISTINCT};
pub use facet::{Facet, FacetBody, FacetOption, FacetSet};
pub use item::{Facetable, Field, Record};
pub use ordering::OptionOrder;
pub use predicate::{Predicate, PredicateStore, Range};
pub use value::{FacetValue, Number, Value};
