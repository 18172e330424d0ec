//! Runtime value types for facet extraction and matching.
//!
//! The [`Value`] enum is what an item hands back when the engine asks for one
//! of its fields. [`FacetValue`] is the canonical, owned key the engine uses
//! for distinct-value tallies and for selections held in a
//! [`PredicateStore`](crate::PredicateStore).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime value of an item field, borrowed from the source record.
///
/// # Example
///
/// ```
/// use vitrine_seeker::{Value, Number};
///
/// struct Offer {
///     quality: u8,
///     seller: String,
/// }
///
/// fn field<'a>(offer: &'a Offer, name: &str) -> Value<'a> {
///     match name {
///         "quality" => Value::Number(Number::U64(offer.quality as u64)),
///         "seller" => Value::String(&offer.seller),
///         _ => Value::None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Boolean value.
    Bool(bool),
    /// Several values held at once (e.g. an offer accepted at qualities 2, 3 and 4).
    Many(Vec<Value<'a>>),
    /// Field not present, null, or unsupported.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` if this is a `String` value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if this is a `Number` value.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if this is a `Many` value.
    pub fn is_many(&self) -> bool {
        matches!(self, Value::Many(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of a scalar value.
    ///
    /// Numbers are returned as-is and numeric strings are parsed. Non-finite
    /// results, booleans, lists and missing values yield `None`.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::String(s) => Number::parse(s),
            _ => None,
        }
    }

    /// Canonical key of a scalar value.
    ///
    /// Blank strings, non-finite numbers, lists and missing values have no key.
    pub fn facet_key(&self) -> Option<FacetValue> {
        match self {
            Value::String(s) if !s.trim().is_empty() => Some(FacetValue::new(*s)),
            Value::Number(n) => n.canonical().map(FacetValue),
            Value::Bool(b) => Some(FacetValue::new(if *b { "true" } else { "false" })),
            _ => None,
        }
    }

    /// Canonical keys of this value, one per distinct element.
    ///
    /// A scalar yields at most one key; `Many` yields the de-duplicated keys of
    /// its elements in first-seen order.
    pub fn facet_keys(&self) -> Vec<FacetValue> {
        match self {
            Value::Many(values) => {
                let mut keys: Vec<FacetValue> = Vec::with_capacity(values.len());
                for key in values.iter().filter_map(Value::facet_key) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                keys
            }
            other => other.facet_key().into_iter().collect(),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Comparisons between different numeric types are handled by converting
/// to the appropriate common type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns `false` only for NaN and infinite floats.
    pub fn is_finite(self) -> bool {
        match self {
            Number::F64(n) => n.is_finite(),
            _ => true,
        }
    }

    /// Parses a trimmed decimal string, preferring integers.
    ///
    /// ```
    /// use vitrine_seeker::Number;
    ///
    /// assert_eq!(Number::parse(" 42 "), Some(Number::I64(42)));
    /// assert_eq!(Number::parse("4.50"), Some(Number::F64(4.5)));
    /// assert_eq!(Number::parse("n/a"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Number> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::I64(n));
        }
        match s.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Number::F64(n)),
            _ => None,
        }
    }

    /// Canonical decimal rendering used as a facet key.
    ///
    /// Integral floats render without a fractional part, so `4`, `4u64` and
    /// `4.0` share the key `"4"`. Non-finite floats have no key.
    pub fn canonical(self) -> Option<String> {
        match self {
            Number::I64(n) => Some(n.to_string()),
            Number::U64(n) => Some(n.to_string()),
            Number::F64(n) if !n.is_finite() => None,
            Number::F64(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                Some((n as i64).to_string())
            }
            Number::F64(n) => Some(n.to_string()),
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number::U64(n as u64)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

/// Canonical key of one facet option.
///
/// Numbers are stored in their [`Number::canonical`] form, so a selection made
/// from a chip labelled `3` matches items carrying `3`, `3u64` or `"3"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetValue(String);

impl FacetValue {
    /// Creates a key from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        FacetValue(value.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the key as a number, if it is one.
    pub fn as_number(&self) -> Option<Number> {
        Number::parse(&self.0)
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FacetValue {
    fn from(s: &str) -> Self {
        FacetValue(s.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(s: String) -> Self {
        FacetValue(s)
    }
}

impl From<i64> for FacetValue {
    fn from(n: i64) -> Self {
        FacetValue(n.to_string())
    }
}

impl From<i32> for FacetValue {
    fn from(n: i32) -> Self {
        FacetValue(n.to_string())
    }
}

impl From<u32> for FacetValue {
    fn from(n: u32) -> Self {
        FacetValue(n.to_string())
    }
}

impl From<u64> for FacetValue {
    fn from(n: u64) -> Self {
        FacetValue(n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_checks() {
        assert!(Value::String("test").is_string());
        assert!(Value::Number(Number::I64(42)).is_number());
        assert!(Value::Many(vec![]).is_many());
        assert!(Value::None.is_none());
    }

    #[test]
    fn value_extractors() {
        assert_eq!(Value::String("hello").as_str(), Some("hello"));
        assert_eq!(
            Value::Number(Number::I64(42)).as_number(),
            Some(Number::I64(42))
        );
        assert_eq!(Value::Bool(true).as_bool(), Some(true));

        // Wrong type returns None
        assert_eq!(Value::String("test").as_number(), None);
        assert_eq!(Value::Number(Number::I64(1)).as_str(), None);
    }

    #[test]
    fn to_number_parses_numeric_strings() {
        assert_eq!(Value::String("15.5").to_number(), Some(Number::F64(15.5)));
        assert_eq!(Value::String("7").to_number(), Some(Number::I64(7)));
        assert_eq!(Value::String("abc").to_number(), None);
        assert_eq!(Value::Number(Number::F64(f64::NAN)).to_number(), None);
        assert_eq!(Value::Bool(true).to_number(), None);
        assert_eq!(Value::None.to_number(), None);
    }

    #[test]
    fn canonical_numbers_share_keys() {
        assert_eq!(Number::I64(4).canonical().as_deref(), Some("4"));
        assert_eq!(Number::U64(4).canonical().as_deref(), Some("4"));
        assert_eq!(Number::F64(4.0).canonical().as_deref(), Some("4"));
        assert_eq!(Number::F64(4.5).canonical().as_deref(), Some("4.5"));
        assert_eq!(Number::F64(f64::INFINITY).canonical(), None);
    }

    #[test]
    fn facet_key_skips_blank_and_missing() {
        assert_eq!(Value::String("SP").facet_key(), Some(FacetValue::from("SP")));
        assert_eq!(Value::String("   ").facet_key(), None);
        assert_eq!(Value::None.facet_key(), None);
        assert_eq!(Value::Many(vec![Value::String("a")]).facet_key(), None);
    }

    #[test]
    fn facet_keys_dedupes_many() {
        let many = Value::Many(vec![
            Value::Number(Number::I64(2)),
            Value::String("3"),
            Value::Number(Number::F64(2.0)),
            Value::None,
        ]);
        assert_eq!(
            many.facet_keys(),
            vec![FacetValue::from("2"), FacetValue::from("3")]
        );
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(5).compare(Number::U64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
    }

    #[test]
    fn facet_value_as_number() {
        assert_eq!(FacetValue::from("12").as_number(), Some(Number::I64(12)));
        assert_eq!(FacetValue::from("fav").as_number(), None);
        assert_eq!(FacetValue::from(3i64).to_string(), "3");
    }
}
