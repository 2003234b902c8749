//! Firestore JSON value encoding.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ferry_core::types::{Document, Fields, Value};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A value as encoded by the Firestore REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    #[serde(with = "double")]
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(WireLatLng),
    ArrayValue(WireArray),
    MapValue(WireMap),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireLatLng {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct WireArray {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<WireValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct WireMap {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, WireValue>,
}

/// A document as encoded by the Firestore REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, WireValue>,
}

/// Resource path of one project database.
///
/// Converts documents between the engine model and the wire encoding.
/// References are stored relative to the database, so a document read from
/// one project and written to another points into the project it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePath {
    root: String,
}

impl DatabasePath {
    /// Creates the path of `database` in `project_id`.
    pub fn new(project_id: &str, database: &str) -> Self {
        Self {
            root: format!("projects/{project_id}/databases/{database}/documents"),
        }
    }

    /// Returns `projects/{p}/databases/{d}/documents`.
    #[must_use]
    pub fn documents_root(&self) -> &str {
        &self.root
    }

    /// Returns the full resource name of a document.
    #[must_use]
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.root)
    }

    pub(crate) fn decode_document(&self, wire: WireDocument) -> Result<Document> {
        let id = document_id(&wire.name)
            .ok_or_else(|| Error::Value(format!("document name `{}` has no id", wire.name)))?
            .to_owned();

        Ok(Document::new(id, self.decode_fields(wire.fields)?))
    }

    pub(crate) fn encode_document(&self, collection: &str, document: Document) -> WireDocument {
        WireDocument {
            name: self.document_name(collection, &document.id),
            fields: self.encode_fields(document.fields),
        }
    }

    fn decode_fields(&self, fields: BTreeMap<String, WireValue>) -> Result<Fields> {
        fields
            .into_iter()
            .map(|(name, value)| Ok((name, self.decode(value)?)))
            .collect()
    }

    fn encode_fields(&self, fields: Fields) -> BTreeMap<String, WireValue> {
        fields
            .into_iter()
            .map(|(name, value)| (name, self.encode(value)))
            .collect()
    }

    pub(crate) fn decode(&self, value: WireValue) -> Result<Value> {
        Ok(match value {
            WireValue::NullValue(()) => Value::Null,
            WireValue::BooleanValue(b) => Value::Boolean(b),
            WireValue::IntegerValue(i) => Value::Integer(
                i.parse()
                    .map_err(|_| Error::Value(format!("`{i}` is not a 64-bit integer")))?,
            ),
            WireValue::DoubleValue(d) => Value::Double(d),
            WireValue::TimestampValue(ts) => Value::Timestamp(
                ts.parse()
                    .map_err(|_| Error::Value(format!("`{ts}` is not an RFC 3339 timestamp")))?,
            ),
            WireValue::StringValue(s) => Value::String(s),
            WireValue::BytesValue(b) => Value::Bytes(
                STANDARD
                    .decode(b.as_bytes())
                    .map_err(|e| Error::Value(format!("bytes value is not base64: {e}")))?,
            ),
            WireValue::ReferenceValue(r) => Value::Reference(relative_reference(&r)),
            WireValue::GeoPointValue(p) => Value::GeoPoint {
                latitude: p.latitude,
                longitude: p.longitude,
            },
            WireValue::ArrayValue(a) => Value::Array(
                a.values
                    .into_iter()
                    .map(|v| self.decode(v))
                    .collect::<Result<_>>()?,
            ),
            WireValue::MapValue(m) => Value::Map(self.decode_fields(m.fields)?),
        })
    }

    pub(crate) fn encode(&self, value: Value) -> WireValue {
        match value {
            Value::Null => WireValue::NullValue(()),
            Value::Boolean(b) => WireValue::BooleanValue(b),
            Value::Integer(i) => WireValue::IntegerValue(i.to_string()),
            Value::Double(d) => WireValue::DoubleValue(d),
            Value::Timestamp(ts) => WireValue::TimestampValue(ts.to_string()),
            Value::String(s) => WireValue::StringValue(s),
            Value::Bytes(b) => WireValue::BytesValue(STANDARD.encode(b)),
            Value::Reference(path) => WireValue::ReferenceValue(format!("{}/{path}", self.root)),
            Value::GeoPoint {
                latitude,
                longitude,
            } => WireValue::GeoPointValue(WireLatLng {
                latitude,
                longitude,
            }),
            Value::Array(values) => WireValue::ArrayValue(WireArray {
                values: values.into_iter().map(|v| self.encode(v)).collect(),
            }),
            Value::Map(fields) => WireValue::MapValue(WireMap {
                fields: self.encode_fields(fields),
            }),
        }
    }
}

/// Returns the last segment of a document resource name.
pub(crate) fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Proto3 JSON encoding of doubles: numbers, except for the non-finite
/// values, which travel as `"NaN"`, `"Infinity"` and `"-Infinity"`.
mod double {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};
    use serde::ser::Serializer;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if value.is_sign_positive() { "Infinity" } else { "-Infinity" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(DoubleVisitor)
    }

    struct DoubleVisitor;

    impl<'de> Visitor<'de> for DoubleVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other
                    .parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}

/// Strips `projects/{p}/databases/{d}/documents/` from a reference.
fn relative_reference(reference: &str) -> String {
    match reference.split_once("/documents/") {
        Some((_, relative)) => relative.to_owned(),
        None => reference.to_owned(),
    }
}
