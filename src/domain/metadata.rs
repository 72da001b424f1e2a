use std::collections::BTreeMap;

use serde::Deserialize;

/// Seconds a cached bridge result stays fresh when the descriptor does not
/// say otherwise.
pub const DEFAULT_CACHE_DURATION_SECS: u64 = 3600;

/// Metadata loaded from a bridge descriptor file.
///
/// Every field is optional in the descriptor; omitted fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeMetadata {
    /// Display name of the source.
    pub name: String,
    /// Source URI.
    pub uri: String,
    pub description: String,
    pub maintainer: String,
    /// Parameter schema, keyed by parameter name. Not enforced by the core.
    pub parameters: BTreeMap<String, ParameterSpec>,
    pub cache_duration: u64,
}

impl Default for BridgeMetadata {
    fn default() -> Self {
        Self {
            name: "Unnamed bridge".to_string(),
            uri: String::new(),
            description: "No description provided".to_string(),
            maintainer: "No maintainer".to_string(),
            parameters: BTreeMap::new(),
            cache_duration: DEFAULT_CACHE_DURATION_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParameterSpec {
    /// Human-readable label.
    pub title: Option<String>,
    pub required: bool,
    pub default: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_for_empty_descriptor() {
        let meta: BridgeMetadata = toml::from_str("").unwrap();
        assert_eq!(meta.name, "Unnamed bridge");
        assert_eq!(meta.description, "No description provided");
        assert_eq!(meta.maintainer, "No maintainer");
        assert_eq!(meta.cache_duration, 3600);
        assert!(meta.parameters.is_empty());
    }

    #[test]
    fn test_full_descriptor() {
        let meta: BridgeMetadata = toml::from_str(
            r#"
            name = "Example"
            uri = "https://example.com/"
            description = "Example source"
            maintainer = "someone"
            cache_duration = 300

            [parameters.u]
            title = "Username"
            required = true
            "#,
        )
        .unwrap();

        assert_eq!(meta.name, "Example");
        assert_eq!(meta.uri, "https://example.com/");
        assert_eq!(meta.cache_duration, 300);
        let spec = &meta.parameters["u"];
        assert_eq!(spec.title.as_deref(), Some("Username"));
        assert!(spec.required);
        assert_eq!(spec.default, None);
    }
}
