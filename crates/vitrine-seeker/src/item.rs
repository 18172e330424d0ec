//! Items the engine filters.
//!
//! The engine only ever reads items through the [`Facetable`] trait. Hosts that
//! already have typed structs implement it by hand; hosts that parse loosely
//! typed page data use [`Record`], an owned field map.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::value::{Number, Value};

/// Trait for types the facet engine can filter.
///
/// # Manual Implementation
///
/// ```
/// use std::borrow::Cow;
/// use vitrine_seeker::{Facetable, Value, Number};
///
/// struct Offer {
///     id: u64,
///     quality: u8,
/// }
///
/// impl Facetable for Offer {
///     fn facet_id(&self) -> Cow<'_, str> {
///         Cow::Owned(self.id.to_string())
///     }
///
///     fn facet_field(&self, field: &str) -> Value<'_> {
///         match field {
///             "quality" => Value::Number(Number::U64(self.quality as u64)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Facetable {
    /// Stable identifier used to find the item's handle on the host page.
    fn facet_id(&self) -> Cow<'_, str>;

    /// Returns the value of a field, or [`Value::None`] if it is absent.
    fn facet_field(&self, field: &str) -> Value<'_>;
}

impl<T: Facetable + ?Sized> Facetable for &T {
    fn facet_id(&self) -> Cow<'_, str> {
        (**self).facet_id()
    }

    fn facet_field(&self, field: &str) -> Value<'_> {
        (**self).facet_field(field)
    }
}

/// Owned field value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Number(Number),
    Bool(bool),
    Many(Vec<Field>),
    Null,
}

impl Field {
    /// Borrows this field as a [`Value`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Field::Text(s) => Value::String(s),
            Field::Number(n) => Value::Number(*n),
            Field::Bool(b) => Value::Bool(*b),
            Field::Many(items) => Value::Many(items.iter().map(Field::as_value).collect()),
            Field::Null => Value::None,
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Text(s)
    }
}

impl From<i32> for Field {
    fn from(n: i32) -> Self {
        Field::Number(Number::from(n))
    }
}

impl From<i64> for Field {
    fn from(n: i64) -> Self {
        Field::Number(Number::from(n))
    }
}

impl From<u64> for Field {
    fn from(n: u64) -> Self {
        Field::Number(Number::from(n))
    }
}

impl From<f64> for Field {
    fn from(n: f64) -> Self {
        Field::Number(Number::from(n))
    }
}

impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Bool(b)
    }
}

impl<T: Into<Field>> From<Vec<T>> for Field {
    fn from(items: Vec<T>) -> Self {
        Field::Many(items.into_iter().map(Into::into).collect())
    }
}

/// A loosely typed item: a stable id plus named fields.
///
/// ```
/// use vitrine_seeker::{Facetable, Record, Value};
///
/// let offer = Record::new("17")
///     .with("quality", vec![2, 3])
///     .with("price", 15.5);
///
/// assert_eq!(offer.facet_id(), "17");
/// assert!(offer.facet_field("quality").is_many());
/// assert!(offer.facet_field("missing").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    id: String,
    fields: BTreeMap<String, Field>,
}

impl Record {
    /// Creates an empty record with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Field>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets a field in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Field>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the record id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a field, if set.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterates over the fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Facetable for Record {
    fn facet_id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn facet_field(&self, field: &str) -> Value<'_> {
        self.fields
            .get(field)
            .map(Field::as_value)
            .unwrap_or(Value::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reads_fields() {
        let record = Record::new("a")
            .with("name", "Sol Ring")
            .with("cmc", 1)
            .with("foil", true);

        assert_eq!(record.facet_field("name"), Value::String("Sol Ring"));
        assert_eq!(record.facet_field("cmc"), Value::Number(Number::I64(1)));
        assert_eq!(record.facet_field("foil"), Value::Bool(true));
        assert_eq!(record.facet_field("unknown"), Value::None);
    }

    #[test]
    fn many_field_borrows_elements() {
        let record = Record::new("a").with("quality", vec![2, 3]);
        assert_eq!(
            record.facet_field("quality"),
            Value::Many(vec![
                Value::Number(Number::I64(2)),
                Value::Number(Number::I64(3))
            ])
        );
    }

    #[test]
    fn reference_forwards() {
        let record = Record::new("x").with("uf", "SP");
        let by_ref = &record;
        assert_eq!(by_ref.facet_id(), "x");
        assert_eq!(by_ref.facet_field("uf"), Value::String("SP"));
    }

    #[test]
    fn insert_overwrites() {
        let mut record = Record::new("x").with("uf", "SP");
        record.insert("uf", "RJ");
        assert_eq!(record.get("uf"), Some(&Field::Text("RJ".into())));
        assert_eq!(record.fields().count(), 1);
    }
}
