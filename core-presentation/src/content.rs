//! Content descriptors and items
//!
//! The descriptor lists the fields a content response carries; every item in
//! the response is keyed by exactly those field names, in both formatted and
//! persisted form. Fields a record does not carry still appear, mapped to an
//! empty display value and a null persisted value.

use crate::selection::SelectionKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Presentation context a content response is built for.
///
/// The display type biases which fields the descriptor keeps; it never
/// changes which records are part of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayType {
    /// Tabular display; all fields.
    Grid,
    /// Compact list display; primitive fields only.
    List,
    /// Property pane display; all fields.
    PropertyPane,
}

impl DisplayType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Grid" => Some(Self::Grid),
            "List" => Some(Self::List),
            "PropertyPane" => Some(Self::PropertyPane),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "Grid",
            Self::List => "List",
            Self::PropertyPane => "PropertyPane",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller adjustments applied to the computed descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorOverrides {
    pub display_type: DisplayType,
}

impl DescriptorOverrides {
    pub fn new(display_type: DisplayType) -> Self {
        Self { display_type }
    }
}

/// Shape of a field's persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// A JSON scalar, rendered human-readable.
    Primitive,
    /// A structured value, surfaced as one JSON-text entry without
    /// recursive flattening.
    Composite,
}

/// One named field of a content response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: ValueKind,
}

impl Field {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == ValueKind::Primitive
    }
}

/// The merged field schema of a content response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub display_type: DisplayType,
    pub fields: Vec<Field>,
}

impl Descriptor {
    /// Field names in descriptor order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

/// One record's contribution to a content response.
///
/// Both maps are keyed by exactly the descriptor's field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub key: SelectionKey,
    /// Human-readable renderings, one per descriptor field.
    pub display_values: HashMap<String, String>,
    /// Persisted values, one per descriptor field.
    pub values: HashMap<String, serde_json::Value>,
}

/// A computed content response: the field schema plus the matching items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub descriptor: Descriptor,
    pub content_set: Vec<ContentItem>,
}

/// Render a persisted value the way the display map carries it.
///
/// Primitive scalars drop their JSON quoting; composite values stay as a
/// single JSON-text entry.
pub(crate) fn format_display_value(kind: ValueKind, value: &serde_json::Value) -> String {
    match kind {
        ValueKind::Primitive => match value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => other.to_string(),
        },
        ValueKind::Composite => match value {
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        },
    }
}
