use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized unit of content produced by a bridge.
///
/// Items form an ordered sequence; insertion order is source document
/// order. The core never merges or deduplicates items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub title: Option<String>,
    pub link: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub content: Option<String>,
    /// Adapter-defined fields beyond the common four.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }
}
