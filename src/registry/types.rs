//! Registry data model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A capability as announced by a backend in its registration manifest.
///
/// Both fields are optional on the wire: entries missing either one are
/// skipped individually instead of failing the whole registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDecl {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl CapabilityDecl {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.into()),
        }
    }

    /// Returns `(name, type)` when both are present and non-blank.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let kind = self.kind.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((name, kind))
    }
}

/// Registered backend, keyed by its base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRecord {
    pub url: String,
    /// Capability name → capability type.
    pub models: BTreeMap<String, String>,
    pub healthy: bool,
    pub last_checked_at: DateTime<Utc>,
}

impl BackendRecord {
    pub fn offers(&self, capability: &str) -> bool {
        self.models.contains_key(capability)
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// Normalised registry key the record was stored under.
    pub url: String,
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("missing service url")]
    MissingUrl,

    #[error("invalid service url '{0}': expected an absolute http(s) URL")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_decl_wire_shape() {
        let decl: CapabilityDecl =
            serde_json::from_str(r#"{"name":"echo","type":"chat"}"#).unwrap();
        assert_eq!(decl.parts(), Some(("echo", "chat")));

        let partial: CapabilityDecl = serde_json::from_str(r#"{"name":"echo"}"#).unwrap();
        assert_eq!(partial.parts(), None);

        let blank = CapabilityDecl::new("  ", "chat");
        assert_eq!(blank.parts(), None);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = BackendRecord {
            url: "http://b1:8080".into(),
            models: [("echo".to_string(), "chat".to_string())].into_iter().collect(),
            healthy: true,
            last_checked_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["models"]["echo"], "chat");
        assert_eq!(json["healthy"], true);
        assert!(json.get("lastCheckedAt").is_some());
    }
}
