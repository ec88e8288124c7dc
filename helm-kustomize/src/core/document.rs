//! Closed document model for YAML manifest streams.
//!
//! Documents are decoded into a small set of value kinds and always re-encoded
//! with sorted mapping keys, so a decode/encode cycle is deterministic no matter
//! how the input was laid out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Number;

use crate::error::{RenderError, Result};

/// One YAML node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value kind, used in validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// A top-level mapping from the input stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Return `key` only when it holds a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Parse a single YAML document.
    ///
    /// Returns `Ok(None)` for empty or null content. A top-level value that is
    /// not a mapping, or a second document, is an error.
    pub fn parse(text: &str) -> std::result::Result<Option<Document>, String> {
        let mut documents = serde_yaml::Deserializer::from_str(text);
        let Some(first) = documents.next() else {
            return Ok(None);
        };
        let value = serde_yaml::Value::deserialize(first).map_err(|e| e.to_string())?;
        if documents.next().is_some() {
            return Err("expected a single YAML document".to_string());
        }
        Document::from_yaml(value)
    }

    /// Serialize to YAML with sorted keys and a trailing newline.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| RenderError::Encode(e.to_string()))
    }

    fn from_yaml(value: serde_yaml::Value) -> std::result::Result<Option<Document>, String> {
        match value {
            serde_yaml::Value::Null => Ok(None),
            serde_yaml::Value::Tagged(tagged) => Document::from_yaml(tagged.value),
            serde_yaml::Value::Mapping(mapping) => match convert_mapping(mapping)? {
                map if map.is_empty() => Ok(None),
                map => Ok(Some(Document(map))),
            },
            other => Err(format!(
                "top-level value must be a mapping, got {}",
                convert(other)?.kind_name()
            )),
        }
    }
}

/// Decode every non-empty document of a multi-document YAML stream, in order.
pub fn decode_stream(input: &[u8]) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (index, deserializer) in serde_yaml::Deserializer::from_slice(input).enumerate() {
        let value = serde_yaml::Value::deserialize(deserializer)
            .map_err(|e| RenderError::Decode(format!("document {index}: {e}")))?;
        if let Some(document) = Document::from_yaml(value)
            .map_err(|e| RenderError::Decode(format!("document {index}: {e}")))?
        {
            documents.push(document);
        }
    }
    Ok(documents)
}

/// Encode documents as one stream separated by `---` lines.
///
/// No documents encode to zero bytes.
pub fn encode_stream(documents: &[Document]) -> Result<Vec<u8>> {
    let mut out = String::new();
    for (index, document) in documents.iter().enumerate() {
        if index > 0 {
            out.push_str("---\n");
        }
        out.push_str(&document.to_yaml()?);
    }
    Ok(out.into_bytes())
}

fn convert(value: serde_yaml::Value) -> std::result::Result<Value, String> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => Value::Number(n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(convert)
                .collect::<std::result::Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => Value::Mapping(convert_mapping(mapping)?),
        // Tags carry no meaning for manifests; keep the tagged value.
        serde_yaml::Value::Tagged(tagged) => convert(tagged.value)?,
    })
}

fn convert_mapping(
    mapping: serde_yaml::Mapping,
) -> std::result::Result<BTreeMap<String, Value>, String> {
    let mut out = BTreeMap::new();
    for (key, value) in mapping {
        let key = key_string(key)?;
        let value = convert(value)?;
        if out.insert(key.clone(), value).is_some() {
            return Err(format!("duplicate mapping key {key:?}"));
        }
    }
    Ok(out)
}

fn key_string(key: serde_yaml::Value) -> std::result::Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Tagged(tagged) => key_string(tagged.value),
        serde_yaml::Value::Null => Err("mapping key must not be null".to_string()),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err("mapping key must be a scalar".to_string())
        }
    }
}
