//! Model tree types
//!
//! A model is an ordered association list keyed by [`CompactName`]. Key order
//! is sibling order in XML; repeated siblings are one key holding a
//! [`Value::List`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{NetconfXmlError, Result};
use crate::name::CompactName;

/// A model node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub enum Value {
    /// Absent value: an empty element
    Null,
    /// Scalar rendered as text
    Text(String),
    /// Nested ordered mapping
    Tree(Tree),
    /// Repeated siblings sharing one name
    List(Vec<Value>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert from JSON; numbers and booleans become text, object keys are
    /// parsed as compact names
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        Ok(match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Text(b.to_string()),
            JsonValue::Number(n) => Value::Text(n.to_string()),
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            JsonValue::Object(map) => Value::Tree(Tree::from_json_map(map)?),
        })
    }

    /// Convert to JSON with compact-name keys
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Text(text) => JsonValue::String(text.clone()),
            Value::Tree(tree) => tree.to_json(),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Value::Tree(tree)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = NetconfXmlError;

    fn try_from(json: JsonValue) -> Result<Self> {
        Value::from_json(&json)
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

/// Ordered mapping from compact name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub struct Tree {
    entries: Vec<(CompactName, Value)>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, keeping the position of an existing key
    pub fn insert(&mut self, name: CompactName, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder form of [`Tree::insert`]
    pub fn with(mut self, name: CompactName, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Append-or-promote: a new key is appended; an existing list grows by
    /// one item; an existing non-list becomes `[old, value]`
    pub fn merge(&mut self, name: CompactName, value: Value) {
        let Some((_, existing)) = self.entries.iter_mut().find(|(n, _)| *n == name) else {
            self.entries.push((name, value));
            return;
        };
        match existing {
            Value::List(items) => items.push(value),
            other => {
                let previous = std::mem::replace(other, Value::Null);
                *other = Value::List(vec![previous, value]);
            }
        }
    }

    /// Entry for the key whose compact form is `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n.to_string() == key)
            .map(|(_, v)| v)
    }

    pub fn get_name(&self, name: &CompactName) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set the text content of the element this tree renders into
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.insert(CompactName::SetText, Value::Text(text.into()));
    }

    /// Splice a pre-serialized XML fragment into the element
    pub fn splice(&mut self, fragment: impl Into<String>) {
        self.insert(CompactName::RawSplice, Value::Text(fragment.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompactName, &Value)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &CompactName> {
        self.entries.iter().map(|(n, _)| n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_json_map(map: &Map<String, JsonValue>) -> Result<Self> {
        let mut tree = Tree::new();
        for (key, value) in map {
            tree.insert(key.parse()?, Value::from_json(value)?);
        }
        Ok(tree)
    }

    /// Build a tree from a JSON object
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match json {
            JsonValue::Object(map) => Self::from_json_map(map),
            other => Err(NetconfXmlError::InvalidValue(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect(),
        )
    }
}

impl IntoIterator for Tree {
    type Item = (CompactName, Value);
    type IntoIter = std::vec::IntoIter<(CompactName, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(CompactName, Value)> for Tree {
    fn from_iter<I: IntoIterator<Item = (CompactName, Value)>>(iter: I) -> Self {
        let mut tree = Tree::new();
        for (name, value) in iter {
            tree.insert(name, value);
        }
        tree
    }
}

impl TryFrom<JsonValue> for Tree {
    type Error = NetconfXmlError;

    fn try_from(json: JsonValue) -> Result<Self> {
        Tree::from_json(&json)
    }
}

impl From<Tree> for JsonValue {
    fn from(tree: Tree) -> Self {
        tree.to_json()
    }
}
