//! Conversion between [`Value`] and deserialized JSON/TOML documents.

use super::{Key, Map, Scalar, Value};
use crate::path::Path;
use serde::de::{self, MapAccess, SeqAccess};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use toml_edit::{Array, DocumentMut, InlineTable, Item, Table};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML syntax: {message}")]
    InvalidTomlSyntax { message: String },

    #[error("TOML cannot represent {what} at {path}")]
    Unrepresentable { what: &'static str, path: Path },

    #[error("TOML document root must be a map, found {kind}")]
    RootNotTable { kind: super::ShapeKind },
}

// Records serialize as maps of all their fields; absent indirections as null.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Ref(reference) => match &reference.target {
                Some(target) => target.serialize(serializer),
                None => serializer.serialize_none(),
            },
            Value::Dyn(dynamic) => match &dynamic.held {
                Some(held) => held.serialize(serializer),
                None => serializer.serialize_none(),
            },
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(&key.to_string(), value)?;
                }
                out.end()
            }
            Value::List(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
            Value::Record(record) => {
                let mut out = serializer.serialize_map(Some(record.fields.len()))?;
                for field in &record.fields {
                    out.serialize_entry(&field.name, &field.value)?;
                }
                out.end()
            }
            Value::Scalar(scalar) => match scalar {
                Scalar::Null => serializer.serialize_unit(),
                Scalar::Bool(b) => serializer.serialize_bool(*b),
                Scalar::Int(i) => serializer.serialize_i64(*i),
                Scalar::Float(f) => serializer.serialize_f64(*f),
                Scalar::Str(s) => serializer.serialize_str(s),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> de::Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any structured value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => Value::int(i),
            Err(_) => Value::float(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::str(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(Key::Str(key), value);
        }
        Ok(Value::Map(map))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::int(i),
                None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (Key::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

pub fn from_json_str(input: &str) -> Result<Value, ConvertError> {
    let json: serde_json::Value = serde_json::from_str(input)?;
    Ok(json.into())
}

pub fn to_json_string_pretty(value: &Value) -> Result<String, ConvertError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_toml_str(input: &str) -> Result<Value, ConvertError> {
    let document = input
        .parse::<DocumentMut>()
        .map_err(|err| ConvertError::InvalidTomlSyntax {
            message: err.to_string(),
        })?;
    Ok(from_toml_table(document.as_table()))
}

fn from_toml_table(table: &Table) -> Value {
    Value::Map(
        table
            .iter()
            .filter_map(|(key, item)| from_toml_item(item).map(|value| (Key::from(key), value)))
            .collect(),
    )
}

fn from_toml_item(item: &Item) -> Option<Value> {
    match item {
        Item::None => None,
        Item::Value(value) => Some(from_toml_value(value)),
        Item::Table(table) => Some(from_toml_table(table)),
        Item::ArrayOfTables(tables) => Some(Value::List(tables.iter().map(from_toml_table).collect())),
    }
}

fn from_toml_value(value: &toml_edit::Value) -> Value {
    match value {
        toml_edit::Value::String(s) => Value::str(s.value().clone()),
        toml_edit::Value::Integer(i) => Value::int(*i.value()),
        toml_edit::Value::Float(f) => Value::float(*f.value()),
        toml_edit::Value::Boolean(b) => Value::bool(*b.value()),
        toml_edit::Value::Datetime(dt) => Value::str(dt.value().to_string()),
        toml_edit::Value::Array(array) => Value::List(array.iter().map(from_toml_value).collect()),
        toml_edit::Value::InlineTable(table) => Value::Map(
            table
                .iter()
                .map(|(key, value)| (Key::from(key), from_toml_value(value)))
                .collect(),
        ),
    }
}

/// Render a map-rooted value as a TOML document.
pub fn to_toml_string(value: &Value) -> Result<String, ConvertError> {
    let root = value.resolve().ok_or(ConvertError::RootNotTable {
        kind: value.kind(),
    })?;
    let mut document = DocumentMut::new();
    match root {
        Value::Map(_) | Value::Record(_) => {
            *document.as_table_mut() = to_toml_table(root, &Path::root())?;
        }
        other => {
            return Err(ConvertError::RootNotTable { kind: other.kind() });
        }
    }
    Ok(document.to_string())
}

/// Entries of a map or the mutable and immutable fields of a record.
fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Map(map) => map.iter().map(|(k, v)| (k.to_string(), v)).collect(),
        Value::Record(record) => record
            .fields
            .iter()
            .map(|field| (field.name.clone(), &field.value))
            .collect(),
        _ => Vec::new(),
    }
}

fn to_toml_table(value: &Value, path: &Path) -> Result<Table, ConvertError> {
    let mut table = Table::new();
    for (key, child) in entries(value) {
        let child_path = path.child(key.clone());
        let item = match child.resolve() {
            Some(resolved @ (Value::Map(_) | Value::Record(_))) => {
                Item::Table(to_toml_table(resolved, &child_path)?)
            }
            _ => Item::Value(to_toml_value(child, &child_path)?),
        };
        table.insert(key.as_str(), item);
    }
    Ok(table)
}

fn to_toml_value(value: &Value, path: &Path) -> Result<toml_edit::Value, ConvertError> {
    let Some(resolved) = value.resolve() else {
        return Err(ConvertError::Unrepresentable {
            what: "an absent value",
            path: path.clone(),
        });
    };
    Ok(match resolved {
        Value::Scalar(Scalar::Null) => {
            return Err(ConvertError::Unrepresentable {
                what: "null",
                path: path.clone(),
            })
        }
        Value::Scalar(Scalar::Bool(b)) => toml_edit::Value::from(*b),
        Value::Scalar(Scalar::Int(i)) => toml_edit::Value::from(*i),
        Value::Scalar(Scalar::Float(f)) => toml_edit::Value::from(*f),
        Value::Scalar(Scalar::Str(s)) => toml_edit::Value::from(s.as_str()),
        Value::List(items) => {
            let mut array = Array::new();
            for (index, item) in items.iter().enumerate() {
                array.push(to_toml_value(item, &path.child(index.to_string()))?);
            }
            toml_edit::Value::Array(array)
        }
        Value::Map(_) | Value::Record(_) => {
            let mut inline = InlineTable::new();
            for (key, child) in entries(resolved) {
                let child_path = path.child(key.clone());
                inline.insert(key.as_str(), to_toml_value(child, &child_path)?);
            }
            toml_edit::Value::InlineTable(inline)
        }
        Value::Ref(_) | Value::Dyn(_) => {
            return Err(ConvertError::Unrepresentable {
                what: "an unresolved indirection",
                path: path.clone(),
            })
        }
    })
}
