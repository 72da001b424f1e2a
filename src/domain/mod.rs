pub mod item;
pub mod metadata;

pub use item::Item;
pub use metadata::{BridgeMetadata, ParameterSpec};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw request-style parameters for one bridge invocation: string keys to
/// string or list-of-string values. No schema is enforced at this layer.
pub type Params = BTreeMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// The value as a single string, or `None` for a list value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Many(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}
