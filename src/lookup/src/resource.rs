//! Framework-side resource record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute values supplied by the configuration layer, plus the identity
/// the read assigns
///
/// Values are kept as raw strings; nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl ResourceData {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a raw attribute value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set a raw attribute value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Identity assigned by the last successful read
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assign the resource identity
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Drop the resource identity
    pub fn clear_id(&mut self) {
        self.id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_and_id() {
        let mut data = ResourceData::new().with("group_id", "g").with("role_id", "owner");
        assert_eq!(data.get("group_id"), Some("g"));
        assert_eq!(data.get("missing"), None);
        assert_eq!(data.id(), None);

        data.set("role_id", "member");
        data.set_id("policy-abc");
        assert_eq!(data.get("role_id"), Some("member"));
        assert_eq!(data.id(), Some("policy-abc"));

        data.clear_id();
        assert_eq!(data.id(), None);
    }
}
