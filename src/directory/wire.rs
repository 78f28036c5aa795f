//! JSON payloads exchanged with the directory service.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{BackendRecord, CapabilityDecl};

/// `POST /register` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub url: Option<String>,
    pub models: Option<Vec<CapabilityDecl>>,
}

/// `DELETE /unregister` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnregisterRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub success: bool,
    pub message: String,
}

impl StatusMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// `GET /services` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesResponse {
    pub success: bool,
    pub services: BTreeMap<String, BackendRecord>,
}

/// `GET /services/models/{name}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendList {
    pub success: bool,
    pub services: Vec<String>,
}

/// Capability names, as returned by type listings and `/api/models`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelList {
    pub available_models: Vec<String>,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
        }
    }
}
