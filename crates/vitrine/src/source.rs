//! Page data to engine records.
//!
//! Listing pages embed their stock as JSON arrays of loosely typed objects.
//! Conversion is lenient: fields keep whatever JSON type they arrived with
//! and the dimension specs decide how to read them.
//!
//! | JSON | Field |
//! |------|-------|
//! | string | `Text` |
//! | number | `Number` |
//! | bool | `Bool` |
//! | null | `Null` |
//! | array | `Many` of the converted elements |
//! | object | `Many` of its keys (buylist `q`/`l` maps) |

use serde_json::{Map, Value as Json};
use tracing::debug;
use vitrine_seeker::{Field, JoinTable, Record};

use crate::error::{ConfigError, Result};

/// Converts JSON listings into [`Record`]s.
#[derive(Debug, Clone)]
pub struct RecordSource {
    id_fields: Vec<String>,
}

impl Default for RecordSource {
    fn default() -> Self {
        RecordSource::new("id")
    }
}

impl RecordSource {
    /// Reads the item id from `id_field`.
    pub fn new(id_field: impl Into<String>) -> Self {
        RecordSource {
            id_fields: vec![id_field.into()],
        }
    }

    /// Adds another id field, tried when the earlier ones are absent.
    pub fn or_id(mut self, id_field: impl Into<String>) -> Self {
        self.id_fields.push(id_field.into());
        self
    }

    /// Parses a JSON array of objects.
    pub fn parse(&self, json: &str) -> Result<Vec<Record>> {
        let value: Json = serde_json::from_str(json).map_err(|source| ConfigError::Json {
            what: "listing",
            source,
        })?;
        self.from_value(&value)
    }

    /// Converts an already parsed array. Entries that are not objects or
    /// carry no id are skipped.
    pub fn from_value(&self, value: &Json) -> Result<Vec<Record>> {
        let Json::Array(entries) = value else {
            return Err(ConfigError::Shape {
                what: "listing",
                expected: "an array of objects",
            });
        };
        let records: Vec<Record> = entries
            .iter()
            .filter_map(|entry| match entry {
                Json::Object(object) => self.record(object),
                _ => None,
            })
            .collect();
        if records.len() < entries.len() {
            debug!(
                skipped = entries.len() - records.len(),
                "listing entries without id skipped"
            );
        }
        Ok(records)
    }

    /// Converts one object, or `None` if it has no usable id.
    pub fn record(&self, object: &Map<String, Json>) -> Option<Record> {
        let id = self
            .id_fields
            .iter()
            .find_map(|name| object.get(name).and_then(id_string))?;
        let mut record = Record::new(id);
        for (name, value) in object {
            record.insert(name.as_str(), to_field(value));
        }
        Some(record)
    }
}

/// Parses a JSON object of rows keyed by id, such as the store table a
/// listing references through `lj_id`.
pub fn join_table(json: &str) -> Result<JoinTable> {
    let value: Json = serde_json::from_str(json).map_err(|source| ConfigError::Json {
        what: "join table",
        source,
    })?;
    let Json::Object(rows) = value else {
        return Err(ConfigError::Shape {
            what: "join table",
            expected: "an object keyed by id",
        });
    };
    Ok(rows
        .into_iter()
        .filter_map(|(key, row)| match row {
            Json::Object(fields) => {
                let mut record = Record::new(key.clone());
                for (name, value) in &fields {
                    record.insert(name.as_str(), to_field(value));
                }
                Some((key, record))
            }
            _ => None,
        })
        .collect())
}

fn id_string(value: &Json) -> Option<String> {
    match value {
        Json::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_field(value: &Json) -> Field {
    match value {
        Json::Null => Field::Null,
        Json::Bool(b) => Field::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Field::from(i)
            } else if let Some(u) = n.as_u64() {
                Field::from(u)
            } else {
                n.as_f64().map(Field::from).unwrap_or(Field::Null)
            }
        }
        Json::String(s) => Field::Text(s.clone()),
        Json::Array(items) => Field::Many(items.iter().map(to_field).collect()),
        Json::Object(map) => Field::Many(map.keys().cloned().map(Field::Text).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_seeker::{Facetable, Value};

    #[test]
    fn converts_json_types() {
        let records = RecordSource::default()
            .parse(r#"[{"id": 7, "qualid": 2, "name": "Bolt", "foil": true, "extras": null}]"#)
            .unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id(), "7");
        assert_eq!(r.get("name"), Some(&Field::Text("Bolt".into())));
        assert_eq!(r.get("foil"), Some(&Field::Bool(true)));
        assert!(r.facet_field("extras").is_none());
        assert_eq!(r.facet_field("qualid").facet_key().map(|k| k.to_string()), Some("2".into()));
    }

    #[test]
    fn objects_become_their_keys() {
        let records = RecordSource::default()
            .parse(r#"[{"id": "a", "q": {"1": 10, "3": 5}}]"#)
            .unwrap();
        let keys: Vec<String> = records[0]
            .facet_field("q")
            .facet_keys()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["1", "3"]);
        assert!(matches!(records[0].facet_field("q"), Value::Many(_)));
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let source = RecordSource::new("id").or_id("idEstoque");
        let records = source
            .parse(r#"[{"id": 1}, {"idEstoque": 2}, {"x": 3}, "junk", {"id": ""}]"#)
            .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn non_array_is_rejected() {
        let err = RecordSource::default().parse(r#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Shape { what: "listing", .. }));
    }

    #[test]
    fn join_table_rows_by_key() {
        let table = join_table(r#"{"12": {"lj_uf": "SP", "lj_fav": 1}, "bad": 3}"#).unwrap();
        assert_eq!(table.len(), 1);
        let row = table.get("12").unwrap();
        assert_eq!(row.get("lj_uf"), Some(&Field::Text("SP".into())));
    }
}
