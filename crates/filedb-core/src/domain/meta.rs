//! Free-form metadata attached to databases and collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const NAME_KEY: &str = "name";

/// `name` plus arbitrary key/value pairs.
///
/// Serialized flat: `{"name": "Basin A", "owner": "hydro"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub name: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Meta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Add an extra key. `"name"` sets the name instead, so it never appears twice
    /// in the serialized form.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == NAME_KEY {
            self.name = match value {
                serde_json::Value::String(name) => name,
                other => other.to_string(),
            };
        } else {
            self.extra.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_serializes_flat() {
        let meta = Meta::named("Basin A").with("owner", "hydro");
        let v = serde_json::to_value(&meta).unwrap();
        assert_eq!(v, json!({"name": "Basin A", "owner": "hydro"}));
    }

    #[test]
    fn meta_with_only_name_is_just_name() {
        let v = serde_json::to_value(Meta::named("Survey1")).unwrap();
        assert_eq!(v, json!({"name": "Survey1"}));
    }

    #[test]
    fn with_name_replaces_the_name() {
        let meta = Meta::named("x").with("name", "y").with("owner", "hydro");
        assert_eq!(meta.name, "y");
        assert_eq!(meta.get("name"), None);

        let raw = serde_json::to_string(&meta).unwrap();
        let back: Meta = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let meta: Meta = serde_json::from_str(r#"{"name":"x","notes":"n"}"#).unwrap();
        assert_eq!(meta.name, "x");
        assert_eq!(meta.get("notes"), Some(&json!("n")));
    }
}
