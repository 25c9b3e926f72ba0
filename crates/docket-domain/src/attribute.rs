//! Open attribute bag attached to entities, nodes and legal elements

use std::collections::BTreeMap;
use std::fmt;

/// Ordered attribute map (deterministic iteration and serialization)
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Free text
    Text(String),
    /// Numeric value (amounts, scores)
    Number(f64),
    /// Boolean flag
    Flag(bool),
    /// List of strings (e.g. claim types)
    List(Vec<String>),
}

impl AttributeValue {
    /// Borrow the value as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the value as a list, if it is a list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value carries no information
    ///
    /// Blank text and empty lists are empty; numbers and flags never are.
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Text(s) => s.trim().is_empty(),
            AttributeValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
            AttributeValue::Number(_) | AttributeValue::Flag(_) => false,
        }
    }

    /// Case-insensitive containment check against text or list items
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        match self {
            AttributeValue::Text(s) => s.to_lowercase().contains(&needle),
            AttributeValue::List(items) => items.iter().any(|i| i.to_lowercase() == needle),
            AttributeValue::Number(_) | AttributeValue::Flag(_) => false,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Flag(b) => write!(f, "{}", b),
            AttributeValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::List(value)
    }
}
