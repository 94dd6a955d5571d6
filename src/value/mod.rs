//! The universal datum the engine walks.
//!
//! A [`Value`] is a closed tagged union over the six shape kinds the engine
//! knows how to dispatch on. References and dynamic wrappers are transparent
//! to traversal but are preserved, with fresh allocations, in every copy.

pub mod convert;

use std::collections::BTreeMap;
use std::fmt;

pub use convert::ConvertError;

/// Keyed collection storage. Iteration order is not significant to the engine;
/// a `BTreeMap` keeps output deterministic.
pub type Map = BTreeMap<Key, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A value reached through an indirection. The referent may be absent.
    Ref(Reference),
    /// A container whose concrete shape is only known from the held value.
    Dyn(Dynamic),
    Map(Map),
    List(Vec<Value>),
    Record(Record),
    Scalar(Scalar),
}

/// Key of a keyed collection.
///
/// The `Display` form is what appears in a [`Path`](crate::Path). It is not
/// injective across variants: `Key::Int(1)` and `Key::Str("1")` both render
/// as `1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Str(String),
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub target: Option<Box<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dynamic {
    /// Nominal type of the wrapper, kept on copies.
    pub type_name: String,
    pub held: Option<Box<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    /// Immutable fields are copied verbatim and never handed to a visitor.
    pub mutable: bool,
}

/// Which variant a node is. `Absent` describes an indirection with nothing
/// behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Reference,
    Dynamic,
    Map,
    List,
    Record,
    Scalar,
    Absent,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Reference => "reference",
            ShapeKind::Dynamic => "dynamic",
            ShapeKind::Map => "map",
            ShapeKind::List => "list",
            ShapeKind::Record => "record",
            ShapeKind::Scalar => "scalar",
            ShapeKind::Absent => "absent",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{i}"),
            Key::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl Reference {
    pub fn to(value: Value) -> Self {
        Self {
            target: Some(Box::new(value)),
        }
    }

    pub fn absent() -> Self {
        Self { target: None }
    }
}

impl Dynamic {
    pub fn new(type_name: impl Into<String>, held: Value) -> Self {
        Self {
            type_name: type_name.into(),
            held: Some(Box::new(held)),
        }
    }

    pub fn empty(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            held: None,
        }
    }
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder: append a mutable field.
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value,
            mutable: true,
        });
        self
    }

    /// Builder: append a field the engine must never visit or mutate.
    pub fn private_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value,
            mutable: false,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Str(s.into()))
    }

    pub fn int(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }

    pub fn float(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }

    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    pub fn empty_map() -> Self {
        Value::Map(Map::new())
    }

    /// Build a map from `(key, value)` pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn reference(value: Value) -> Self {
        Value::Ref(Reference::to(value))
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Value::Ref(Reference { target: None }) => ShapeKind::Absent,
            Value::Dyn(Dynamic { held: None, .. }) => ShapeKind::Absent,
            Value::Ref(_) => ShapeKind::Reference,
            Value::Dyn(_) => ShapeKind::Dynamic,
            Value::Map(_) => ShapeKind::Map,
            Value::List(_) => ShapeKind::List,
            Value::Record(_) => ShapeKind::Record,
            Value::Scalar(_) => ShapeKind::Scalar,
        }
    }

    /// Follow references and dynamic wrappers to the concrete value.
    ///
    /// Returns `None` when an indirection along the way is absent.
    pub fn resolve(&self) -> Option<&Value> {
        match self {
            Value::Ref(Reference { target }) => target.as_deref().and_then(Value::resolve),
            Value::Dyn(Dynamic { held, .. }) => held.as_deref().and_then(Value::resolve),
            other => Some(other),
        }
    }

    pub fn resolve_mut(&mut self) -> Option<&mut Value> {
        match self {
            Value::Ref(Reference { target }) => target.as_deref_mut().and_then(Value::resolve_mut),
            Value::Dyn(Dynamic { held, .. }) => held.as_deref_mut().and_then(Value::resolve_mut),
            other => Some(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.resolve()? {
            Value::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self.resolve()? {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self.resolve()? {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The zero value of this value's shape.
    ///
    /// Used when a record field is deleted: record fields cannot be removed,
    /// so they are reset instead.
    pub fn zero_like(&self) -> Value {
        match self {
            Value::Ref(_) => Value::Ref(Reference::absent()),
            Value::Dyn(dynamic) => Value::Dyn(Dynamic::empty(dynamic.type_name.clone())),
            Value::Map(_) => Value::empty_map(),
            Value::List(_) => Value::List(Vec::new()),
            Value::Record(record) => Value::Record(Record {
                type_name: record.type_name.clone(),
                fields: record
                    .fields
                    .iter()
                    .map(|field| Field {
                        name: field.name.clone(),
                        value: field.value.zero_like(),
                        mutable: field.mutable,
                    })
                    .collect(),
            }),
            Value::Scalar(scalar) => Value::Scalar(match scalar {
                Scalar::Null => Scalar::Null,
                Scalar::Bool(_) => Scalar::Bool(false),
                Scalar::Int(_) => Scalar::Int(0),
                Scalar::Float(_) => Scalar::Float(0.0),
                Scalar::Str(_) => Scalar::Str(String::new()),
            }),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}
