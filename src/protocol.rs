use serde::{Deserialize, Serialize};

pub const GRAPH_LOAD: &str = "graph_load";
pub const GRAPH_UPDATE: &str = "graph_update";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WSMessage<T> {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub timestamp: u64,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> WSMessage<T> {
    pub fn new(msg_type: &str, request_id: Option<String>, payload: Option<T>) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            timestamp: now_millis(),
            request_id,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// Payload of `graph_load` (server -> editor) and `graph_update` (editor -> server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub graph: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub material: Option<String>,
}

pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
