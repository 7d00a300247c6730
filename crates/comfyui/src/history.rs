//! Persisted prompt history (`GET /history/{prompt_id}`).

use std::collections::{BTreeMap, HashMap};

use comfyrun_core::artifact::ArtifactRef;
use serde::Deserialize;

use crate::messages::{ExecutionErrorData, StatusMessage};

/// Body of `GET /history/{prompt_id}`: records keyed by prompt id.
///
/// ComfyUI answers `{}` for a prompt it has no record of.
pub type HistoryResponse = HashMap<String, HistoryRecord>;

/// `status_str` value ComfyUI reports for a failed prompt.
pub const STATUS_ERROR: &str = "error";

/// One prompt's history entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub status: Option<HistoryStatus>,
    /// Outputs keyed by node id. Ordered so collection is deterministic.
    #[serde(default)]
    pub outputs: BTreeMap<String, NodeOutput>,
}

/// Final (or current) status of a prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryStatus {
    /// `"success"` or `"error"` once execution finished.
    #[serde(default)]
    pub status_str: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub messages: Vec<StatusMessage>,
}

/// Files produced by one node. Keys other than `images` and `gifs`
/// (text outputs, `animated` flags, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeOutput {
    #[serde(default)]
    pub images: Vec<ArtifactRef>,
    #[serde(default)]
    pub gifs: Vec<ArtifactRef>,
}

impl HistoryStatus {
    pub fn is_error(&self) -> bool {
        self.status_str.as_deref() == Some(STATUS_ERROR)
    }

    /// The first `execution_error` message, if any.
    pub fn execution_error(&self) -> Option<&ExecutionErrorData> {
        self.messages.iter().find_map(|msg| match msg {
            StatusMessage::ExecutionError(data) => Some(data),
            _ => None,
        })
    }
}

impl HistoryRecord {
    /// Every artifact reference across all nodes: node ids in order,
    /// `images` before `gifs` within a node.
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactRef> {
        self.outputs
            .values()
            .flat_map(|node| node.images.iter().chain(node.gifs.iter()))
    }
}
