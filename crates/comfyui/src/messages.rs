//! ComfyUI history status messages.
//!
//! A history record's `status.messages` is a list of two-element tuples
//! `[kind, payload]`, mirroring the events ComfyUI broadcasts while a
//! prompt executes. This module parses them into a typed
//! [`StatusMessage`] enum. Unknown kinds and payloads that fail to parse
//! are kept as [`StatusMessage::Other`] rather than rejected.

use serde::Deserialize;

/// A parsed `[kind, payload]` status message.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "(String, serde_json::Value)")]
pub enum StatusMessage {
    /// `execution_start`: the prompt began executing.
    ExecutionStart(ExecutionStartData),
    /// `execution_cached`: some nodes were served from cache.
    ExecutionCached(ExecutionCachedData),
    /// `execution_success`: every node finished.
    ExecutionSuccess(ExecutionStartData),
    /// `execution_error`: a node raised an exception.
    ExecutionError(ExecutionErrorData),
    /// `execution_interrupted`: execution was stopped via `/interrupt`.
    ExecutionInterrupted(ExecutionInterruptedData),
    /// Any other kind, or a known kind whose payload did not parse.
    Other {
        kind: String,
        payload: serde_json::Value,
    },
}

/// Payload for `execution_start` and `execution_success` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStartData {
    pub prompt_id: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Payload for `execution_cached` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionCachedData {
    pub prompt_id: String,
    /// Node IDs whose outputs were served from cache.
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Payload for `execution_error` messages.
///
/// Fields are optional: older servers omit some of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionErrorData {
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub exception_message: Option<String>,
    #[serde(default)]
    pub exception_type: Option<String>,
}

/// Payload for `execution_interrupted` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionInterruptedData {
    pub prompt_id: String,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub node_type: Option<String>,
}

impl From<(String, serde_json::Value)> for StatusMessage {
    fn from((kind, payload): (String, serde_json::Value)) -> Self {
        let parsed = match kind.as_str() {
            "execution_start" => parse(&payload).map(Self::ExecutionStart),
            "execution_cached" => parse(&payload).map(Self::ExecutionCached),
            "execution_success" => parse(&payload).map(Self::ExecutionSuccess),
            "execution_error" => parse(&payload).map(Self::ExecutionError),
            "execution_interrupted" => parse(&payload).map(Self::ExecutionInterrupted),
            _ => None,
        };
        parsed.unwrap_or(Self::Other { kind, payload })
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: &serde_json::Value) -> Option<T> {
    serde_json::from_value(payload.clone()).ok()
}

impl StatusMessage {
    /// The `[kind, ...]` tag this message was parsed from.
    pub fn kind(&self) -> &str {
        match self {
            Self::ExecutionStart(_) => "execution_start",
            Self::ExecutionCached(_) => "execution_cached",
            Self::ExecutionSuccess(_) => "execution_success",
            Self::ExecutionError(_) => "execution_error",
            Self::ExecutionInterrupted(_) => "execution_interrupted",
            Self::Other { kind, .. } => kind,
        }
    }
}
