//! Dimension specifications.
//!
//! A [`Dimension`] is one axis of filtering. Its [`DimensionKind`] decides how
//! values are read from an item and how a predicate on it is matched:
//!
//! | Kind | Options | Predicate |
//! |------|---------|-----------|
//! | `Discrete` | distinct values of a single-valued field | selected values (OR) |
//! | `MultiValued` | distinct values across a list field | selected values (OR, any overlap) |
//! | `NumericRange` | `{min, max}` bounds | inclusive range |
//! | `Bucketed` | declared buckets with a rule each | selected bucket ids (OR) |
//! | `Text` | none | case-insensitive substring |

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::{Result, SeekerError};
use crate::item::{Facetable, Record};
use crate::ordering::OptionOrder;
use crate::value::{FacetValue, Value};

/// Cross-reference table keyed by the canonical form of a join field.
///
/// Used for attributes that live on a second entity, such as the store that
/// lists an offer.
#[derive(Debug, Clone, Default)]
pub struct JoinTable {
    rows: HashMap<String, Record>,
}

impl JoinTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        JoinTable::default()
    }

    /// Adds a row under the given key.
    pub fn insert(&mut self, key: impl Into<String>, row: Record) {
        self.rows.insert(key.into(), row);
    }

    /// Looks up a row.
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(String, Record)> for JoinTable {
    fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
        JoinTable {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Where a dimension reads its raw value from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A field of the item itself.
    Field(String),
    /// A field of the row that `via` points to in `table`.
    Joined {
        via: String,
        table: Rc<JoinTable>,
        field: String,
    },
    /// The first of several sources that yields a value.
    FirstOf(Vec<Source>),
    /// Another source's value, kept only when it satisfies `rule`.
    Accepting { source: Box<Source>, rule: BucketRule },
}

impl Source {
    /// Reads a field of the item itself.
    pub fn field(name: impl Into<String>) -> Self {
        Source::Field(name.into())
    }

    /// Reads `field` from the row that the item's `via` field points to.
    pub fn joined(via: impl Into<String>, table: Rc<JoinTable>, field: impl Into<String>) -> Self {
        Source::Joined {
            via: via.into(),
            table,
            field: field.into(),
        }
    }

    /// Tries `sources` in order; blank and missing values fall through.
    pub fn first_of(sources: impl IntoIterator<Item = Source>) -> Self {
        Source::FirstOf(sources.into_iter().collect())
    }

    /// Reads this source as missing whenever its value fails `rule`.
    pub fn accepting(self, rule: BucketRule) -> Self {
        Source::Accepting {
            source: Box::new(self),
            rule,
        }
    }

    /// Reads the raw value for `item`.
    pub fn read<'a, T: Facetable + ?Sized>(&'a self, item: &'a T) -> Value<'a> {
        match self {
            Source::Field(name) => item.facet_field(name),
            Source::Joined { via, table, field } => {
                let Some(key) = item.facet_field(via).facet_key() else {
                    return Value::None;
                };
                match table.get(key.as_str()) {
                    Some(row) => row.facet_field(field),
                    None => Value::None,
                }
            }
            Source::FirstOf(sources) => sources
                .iter()
                .map(|source| source.read(item))
                .find(|value| !value.facet_keys().is_empty())
                .unwrap_or(Value::None),
            Source::Accepting { source, rule } => {
                let value = source.read(item);
                if rule.matches(&value) {
                    value
                } else {
                    Value::None
                }
            }
        }
    }
}

/// Matching rule of one bucket.
#[derive(Clone)]
pub enum BucketRule {
    /// Positive integers divisible by N.
    DivisibleBy(u64),
    /// Numbers within a closed range; an absent bound is open-ended.
    Between { min: Option<f64>, max: Option<f64> },
    /// Numbers that round to `target` once clamped to `0..=ceiling`.
    RoundsTo { target: i64, ceiling: i64 },
    /// Values whose canonical key equals the given one.
    Equals(FacetValue),
    /// Absent, null or blank values.
    Missing,
    /// Any of the nested rules.
    AnyOf(Vec<BucketRule>),
    /// Host-supplied rule.
    Custom(Rc<dyn Fn(&Value<'_>) -> bool>),
}

impl BucketRule {
    /// Shorthand for `Between` with an inclusive lower bound only.
    pub fn at_least(min: f64) -> Self {
        BucketRule::Between {
            min: Some(min),
            max: None,
        }
    }

    /// Shorthand for `Between` with an inclusive upper bound only.
    pub fn below(max: f64) -> Self {
        BucketRule::Between {
            min: None,
            max: Some(max),
        }
    }

    /// Wraps a closure as a rule.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value<'_>) -> bool + 'static,
    {
        BucketRule::Custom(Rc::new(f))
    }

    /// Evaluates the rule against a raw value.
    pub fn matches(&self, value: &Value<'_>) -> bool {
        match self {
            BucketRule::DivisibleBy(divisor) => match value.to_number() {
                Some(n) => {
                    let n = n.to_f64();
                    *divisor > 0 && n > 0.0 && n.fract() == 0.0 && (n as u64) % divisor == 0
                }
                None => false,
            },
            BucketRule::Between { min, max } => value.to_number().is_some_and(|n| {
                let n = n.to_f64();
                min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
            }),
            BucketRule::RoundsTo { target, ceiling } => value.to_number().is_some_and(|n| {
                let rounded = n.to_f64().round().clamp(0.0, *ceiling as f64) as i64;
                rounded == *target
            }),
            BucketRule::Equals(key) => value.facet_keys().contains(key),
            BucketRule::Missing => value.facet_keys().is_empty(),
            BucketRule::AnyOf(rules) => rules.iter().any(|rule| rule.matches(value)),
            BucketRule::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for BucketRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketRule::DivisibleBy(n) => f.debug_tuple("DivisibleBy").field(n).finish(),
            BucketRule::Between { min, max } => f
                .debug_struct("Between")
                .field("min", min)
                .field("max", max)
                .finish(),
            BucketRule::RoundsTo { target, ceiling } => f
                .debug_struct("RoundsTo")
                .field("target", target)
                .field("ceiling", ceiling)
                .finish(),
            BucketRule::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            BucketRule::Missing => f.write_str("Missing"),
            BucketRule::AnyOf(rules) => f.debug_tuple("AnyOf").field(rules).finish(),
            BucketRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One option of a bucketed dimension.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub id: FacetValue,
    pub label: String,
    pub source: Source,
    pub rule: BucketRule,
}

impl Bucket {
    pub fn new(
        id: impl Into<FacetValue>,
        label: impl Into<String>,
        source: Source,
        rule: BucketRule,
    ) -> Self {
        Bucket {
            id: id.into(),
            label: label.into(),
            source,
            rule,
        }
    }

    /// Returns `true` if the item falls into this bucket.
    pub fn matches<T: Facetable + ?Sized>(&self, item: &T) -> bool {
        self.rule.matches(&self.source.read(item))
    }
}

/// Resolves raw option values to display labels.
///
/// Resolution order: custom formatter, then lookup table, then
/// `"<prefix><value>"`. An optional template (`"{label} ({value})"`) wraps the
/// table or fallback result.
#[derive(Clone, Default)]
pub struct Labels {
    table: BTreeMap<String, String>,
    prefix: String,
    template: Option<String>,
    formatter: Option<Rc<dyn Fn(&str) -> String>>,
}

impl Labels {
    pub fn new() -> Self {
        Labels::default()
    }

    /// Adds lookup entries.
    pub fn table<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.table
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the fallback prefix for unmapped values.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets a template with `{label}` and `{value}` placeholders.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Replaces table lookup with a formatter.
    pub fn formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.formatter = Some(Rc::new(f));
        self
    }

    /// Resolves the label for a value.
    pub fn resolve(&self, value: &FacetValue) -> String {
        if let Some(format) = &self.formatter {
            return format(value.as_str());
        }
        let base = match self.table.get(value.as_str()) {
            Some(label) => label.clone(),
            None => format!("{}{}", self.prefix, value),
        };
        match &self.template {
            Some(template) => template
                .replace("{label}", &base)
                .replace("{value}", value.as_str()),
            None => base,
        }
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Labels")
            .field("entries", &self.table.len())
            .field("prefix", &self.prefix)
            .field("template", &self.template)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Extraction and matching strategy of a dimension.
#[derive(Debug, Clone)]
pub enum DimensionKind {
    Discrete(Source),
    MultiValued(Source),
    NumericRange(Source),
    Bucketed(Vec<Bucket>),
    Text(Vec<Source>),
}

impl DimensionKind {
    /// Returns the display name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKind::Discrete(_) => "discrete",
            DimensionKind::MultiValued(_) => "multi-valued",
            DimensionKind::NumericRange(_) => "numeric-range",
            DimensionKind::Bucketed(_) => "bucketed",
            DimensionKind::Text(_) => "text",
        }
    }

    /// Returns `true` for kinds whose predicate is a value selection.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self,
            DimensionKind::Discrete(_) | DimensionKind::MultiValued(_) | DimensionKind::Bucketed(_)
        )
    }
}

/// A named axis of filtering.
///
/// ```
/// use vitrine_seeker::{Dimension, Labels, Source};
///
/// let quality = Dimension::multi_valued("quality", "Quality", Source::field("q"))
///     .labels(Labels::new().table([("2", "Near Mint")]).prefix("Q"));
/// assert_eq!(quality.key(), "quality");
/// ```
#[derive(Debug, Clone)]
pub struct Dimension {
    key: String,
    label: String,
    kind: DimensionKind,
    labels: Labels,
    order: OptionOrder,
    missing_as: Option<FacetValue>,
    skip: BTreeSet<FacetValue>,
    numeric_keys: bool,
    min_distinct: Option<usize>,
    hide_counts: bool,
    positive_only: bool,
}

impl Dimension {
    fn with_kind(key: impl Into<String>, label: impl Into<String>, kind: DimensionKind) -> Self {
        let order = match kind {
            DimensionKind::Bucketed(_) => OptionOrder::Declared,
            _ => OptionOrder::default(),
        };
        Dimension {
            key: key.into(),
            label: label.into(),
            kind,
            labels: Labels::default(),
            order,
            missing_as: None,
            skip: BTreeSet::new(),
            numeric_keys: false,
            min_distinct: None,
            hide_counts: false,
            positive_only: false,
        }
    }

    /// Single-valued categorical dimension.
    pub fn discrete(key: impl Into<String>, label: impl Into<String>, source: Source) -> Self {
        Self::with_kind(key, label, DimensionKind::Discrete(source))
    }

    /// Categorical dimension where an item may hold several values.
    pub fn multi_valued(key: impl Into<String>, label: impl Into<String>, source: Source) -> Self {
        Self::with_kind(key, label, DimensionKind::MultiValued(source))
    }

    /// Numeric `[min, max]` dimension.
    pub fn numeric_range(key: impl Into<String>, label: impl Into<String>, source: Source) -> Self {
        Self::with_kind(key, label, DimensionKind::NumericRange(source))
    }

    /// Dimension whose options are computed buckets.
    pub fn bucketed(key: impl Into<String>, label: impl Into<String>, buckets: Vec<Bucket>) -> Self {
        Self::with_kind(key, label, DimensionKind::Bucketed(buckets))
    }

    /// Free-text dimension matched against one or more text fields.
    pub fn text(key: impl Into<String>, label: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::with_kind(key, label, DimensionKind::Text(sources))
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn order(mut self, order: OptionOrder) -> Self {
        self.order = order;
        self
    }

    /// Counts items lacking a value under `value` instead of skipping them.
    pub fn missing_as(mut self, value: impl Into<FacetValue>) -> Self {
        self.missing_as = Some(value.into());
        self
    }

    /// Never offers `value` as an option.
    pub fn skip_value(mut self, value: impl Into<FacetValue>) -> Self {
        self.skip.insert(value.into());
        self
    }

    /// Normalises numeric strings before keying (`"4.50"` becomes `"4.5"`).
    pub fn numeric_keys(mut self) -> Self {
        self.numeric_keys = true;
        self
    }

    /// Overrides the extractor's minimum number of distinct values.
    pub fn min_distinct(mut self, n: usize) -> Self {
        self.min_distinct = Some(n);
        self
    }

    /// Marks option counts as not worth displaying.
    pub fn hide_counts(mut self) -> Self {
        self.hide_counts = true;
        self
    }

    /// Leaves zero and negative numbers out of a range dimension's bounds.
    /// They still match range predicates.
    pub fn positive_only(mut self) -> Self {
        self.positive_only = true;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &DimensionKind {
        &self.kind
    }

    pub fn option_order(&self) -> OptionOrder {
        self.order
    }

    pub fn min_distinct_override(&self) -> Option<usize> {
        self.min_distinct
    }

    pub fn counts_hidden(&self) -> bool {
        self.hide_counts
    }

    /// Display label for one of this dimension's values.
    pub fn label_for(&self, value: &FacetValue) -> String {
        match &self.kind {
            DimensionKind::Bucketed(_) => match self.bucket(value) {
                Some(bucket) => bucket.label.clone(),
                None => self.labels.resolve(value),
            },
            _ => self.labels.resolve(value),
        }
    }

    /// Looks up a bucket by id.
    pub fn bucket(&self, id: &FacetValue) -> Option<&Bucket> {
        match &self.kind {
            DimensionKind::Bucketed(buckets) => buckets.iter().find(|b| &b.id == id),
            _ => None,
        }
    }

    /// Option keys the item carries on this dimension.
    ///
    /// Single-valued dimensions yield at most one key; a list found where a
    /// single value was expected is treated as malformed and yields none.
    /// Range and text dimensions have no option keys.
    pub fn keys_of<T: Facetable + ?Sized>(&self, item: &T) -> Vec<FacetValue> {
        match &self.kind {
            DimensionKind::Discrete(source) => {
                let keys = match source.read(item) {
                    Value::Many(_) => {
                        trace!(dimension = %self.key, "list value on single-valued dimension ignored");
                        Vec::new()
                    }
                    value => self.key_for(&value).into_iter().collect(),
                };
                self.finish_keys(keys)
            }
            DimensionKind::MultiValued(source) => {
                let keys = match source.read(item) {
                    Value::Many(values) => {
                        let mut keys: Vec<FacetValue> = Vec::with_capacity(values.len());
                        for key in values.iter().filter_map(|v| self.key_for(v)) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                        keys
                    }
                    value => self.key_for(&value).into_iter().collect(),
                };
                self.finish_keys(keys)
            }
            DimensionKind::Bucketed(buckets) => buckets
                .iter()
                .filter(|bucket| bucket.matches(item))
                .map(|bucket| bucket.id.clone())
                .collect(),
            DimensionKind::NumericRange(_) | DimensionKind::Text(_) => Vec::new(),
        }
    }

    /// Numeric value of the item on a range dimension.
    pub fn number_of<T: Facetable + ?Sized>(&self, item: &T) -> Option<f64> {
        match &self.kind {
            DimensionKind::NumericRange(source) => {
                source.read(item).to_number().map(|n| n.to_f64())
            }
            _ => None,
        }
    }

    /// Numeric value of the item as it counts towards the range bounds.
    pub fn bound_of<T: Facetable + ?Sized>(&self, item: &T) -> Option<f64> {
        self.number_of(item)
            .filter(|n| !self.positive_only || *n > 0.0)
    }

    /// Returns `true` if any text source contains `needle` (already lower-cased).
    pub fn text_matches<T: Facetable + ?Sized>(&self, item: &T, needle: &str) -> bool {
        match &self.kind {
            DimensionKind::Text(sources) => sources.iter().any(|source| {
                source
                    .read(item)
                    .as_str()
                    .is_some_and(|text| text.to_lowercase().contains(needle))
            }),
            _ => false,
        }
    }

    /// Returns `true` if the item has any searchable text on this dimension.
    pub fn has_text<T: Facetable + ?Sized>(&self, item: &T) -> bool {
        match &self.kind {
            DimensionKind::Text(sources) => sources
                .iter()
                .any(|source| source.read(item).as_str().is_some_and(|t| !t.trim().is_empty())),
            _ => false,
        }
    }

    fn key_for(&self, value: &Value<'_>) -> Option<FacetValue> {
        if self.numeric_keys {
            value
                .to_number()
                .and_then(|n| n.canonical())
                .map(FacetValue::new)
        } else {
            value.facet_key()
        }
    }

    fn finish_keys(&self, mut keys: Vec<FacetValue>) -> Vec<FacetValue> {
        if keys.is_empty() {
            if let Some(default) = &self.missing_as {
                keys.push(default.clone());
            }
        }
        keys.retain(|key| !self.skip.contains(key));
        keys
    }

    fn validate(&self) -> Result<()> {
        match &self.kind {
            DimensionKind::Bucketed(buckets) => {
                if buckets.is_empty() {
                    return Err(SeekerError::EmptyBuckets(self.key.clone()));
                }
                let mut seen = BTreeSet::new();
                for bucket in buckets {
                    if !seen.insert(&bucket.id) {
                        return Err(SeekerError::DuplicateBucket {
                            dimension: self.key.clone(),
                            bucket: bucket.id.to_string(),
                        });
                    }
                    if matches!(bucket.rule, BucketRule::DivisibleBy(0)) {
                        return Err(SeekerError::ZeroDivisor {
                            dimension: self.key.clone(),
                            bucket: bucket.id.to_string(),
                        });
                    }
                }
                Ok(())
            }
            DimensionKind::Text(sources) if sources.is_empty() => {
                Err(SeekerError::EmptyTextSources(self.key.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// The validated, immutable set of dimensions of one engine.
#[derive(Debug, Clone, Default)]
pub struct DimensionSet {
    dimensions: Vec<Dimension>,
}

impl DimensionSet {
    /// Validates and wraps the given dimensions, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails on duplicate keys and on malformed bucket or text definitions.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self> {
        let mut keys = BTreeSet::new();
        for dimension in &dimensions {
            if !keys.insert(dimension.key.as_str()) {
                return Err(SeekerError::DuplicateDimension(dimension.key.clone()));
            }
            dimension.validate()?;
        }
        Ok(DimensionSet { dimensions })
    }

    pub fn get(&self, key: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}
