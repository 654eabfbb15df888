//! REST API response types served by the web actor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ActorStatus;
use crate::sim::{StageKind, SyncedDecoration};

/// GET /api/status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub actors: HashMap<String, ActorStatusResponse>,
    #[serde(default)]
    pub stage: Option<StageKind>,
    #[serde(default)]
    pub decorations: usize,
}

/// Per-actor status within the status response. Also used as the cached
/// per-actor state in the web layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorStatusResponse {
    #[serde(default)]
    pub name: String,
    pub status: ActorStatus,
    #[serde(default)]
    pub telemetry: HashMap<String, String>,
}

/// GET /api/decorations response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecorationsResponse {
    pub decorations: Vec<SyncedDecoration>,
}
