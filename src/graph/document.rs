//! Vertex and edge documents together with the attribute merge rule.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rdf::{xsd, Literal};

/// Attribute value: a scalar until a second distinct value shows up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Many(Vec<Value>),
    One(Value),
}

impl AttributeValue {
    /// Adds `value` keeping insertion order and uniqueness. Returns whether
    /// anything changed.
    pub fn merge(&mut self, value: Value) -> bool {
        match self {
            Self::One(current) if *current == value => false,
            Self::One(current) => {
                let first = current.take();
                *self = Self::Many(vec![first, value]);
                true
            }
            Self::Many(values) if values.contains(&value) => false,
            Self::Many(values) => {
                values.push(value);
                true
            }
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.first(),
        }
    }
}

/// Predicate fragment to value mapping shared by vertices and edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    /// Merges `value` under `key`. Returns whether anything changed.
    pub fn merge(&mut self, key: &str, value: Value) -> bool {
        if let Some(current) = self.0.get_mut(key) {
            current.merge(value)
        } else {
            self.0.insert(key.to_owned(), AttributeValue::One(value));
            true
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One ontology class, stored in the collection named after its prefix.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vertex {
    #[serde(skip)]
    collection: String,
    #[serde(rename = "_key")]
    key: String,
    term: String,
    #[serde(flatten)]
    attributes: Attributes,
}

impl Vertex {
    #[must_use]
    pub fn new(collection: &str, key: &str, term: &str) -> Self {
        Self {
            collection: collection.to_owned(),
            key: key.to_owned(),
            term: term.to_owned(),
            attributes: Attributes::default(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// `{collection}/{key}` reference used by edges.
    #[must_use]
    pub fn id(&self) -> String {
        document_id(&self.collection, &self.key)
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn merge(&mut self, key: &str, value: Value) -> bool {
        self.attributes.merge(key, value)
    }

    /// JSON document as written to the store.
    ///
    /// # Errors
    ///
    /// When an attribute cannot be represented as JSON.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Directed relation between two vertices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    #[serde(skip)]
    collection: String,
    #[serde(rename = "_key")]
    key: String,
    #[serde(rename = "_from")]
    from: String,
    #[serde(rename = "_to")]
    to: String,
    #[serde(flatten)]
    attributes: Attributes,
}

impl Edge {
    pub const LABEL: &'static str = "label";

    #[must_use]
    pub fn new(from: &Vertex, to: &Vertex, label: &str) -> Self {
        let mut attributes = Attributes::default();
        attributes.merge(Self::LABEL, Value::String(label.to_owned()));
        Self {
            collection: edge_collection(from.collection(), to.collection()),
            key: edge_key(from.key(), to.key()),
            from: from.id(),
            to: to.id(),
            attributes,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reference of the source vertex.
    #[must_use]
    pub fn from_id(&self) -> &str {
        &self.from
    }

    /// Reference of the target vertex.
    #[must_use]
    pub fn to_id(&self) -> &str {
        &self.to
    }

    /// The predicate the edge was created from.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.attributes
            .get(Self::LABEL)
            .and_then(AttributeValue::first)
            .and_then(Value::as_str)
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn merge(&mut self, key: &str, value: Value) -> bool {
        self.attributes.merge(key, value)
    }

    /// JSON document as written to the store.
    ///
    /// # Errors
    ///
    /// When an attribute cannot be represented as JSON.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[must_use]
pub fn document_id(collection: &str, key: &str) -> String {
    format!("{collection}/{key}")
}

#[must_use]
pub fn edge_collection(from: &str, to: &str) -> String {
    format!("{from}-{to}")
}

#[must_use]
pub fn edge_key(from: &str, to: &str) -> String {
    format!("{from}-{to}")
}

/// Converts a literal to the JSON value stored as an attribute.
///
/// Numbers and booleans keep their type; dates and date-times are rendered
/// as `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS[.f][±HH:MM]`. Values that do not
/// parse under their datatype stay strings.
#[must_use]
pub fn literal_value(literal: &Literal) -> Value {
    let text = literal.value();
    let typed = match literal.datatype() {
        Some(datatype) if xsd::INTEGERS.contains(&datatype) => {
            text.trim().parse::<i64>().ok().map(Value::from)
        }
        Some(xsd::BOOLEAN) => match text.trim() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        Some(xsd::DECIMAL | xsd::DOUBLE | xsd::FLOAT) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        Some(xsd::DATE_TIME) => normalize_date_time(text.trim()).map(Value::String),
        Some(xsd::DATE) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .ok()
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string())),
        _ => None,
    };
    typed.unwrap_or_else(|| Value::String(text.to_owned()))
}

fn normalize_date_time(text: &str) -> Option<String> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|date_time| date_time.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}
