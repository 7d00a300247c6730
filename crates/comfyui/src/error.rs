//! Pipeline error taxonomy.
//!
//! Every stage before artifact collection fails with a [`PipelineError`].
//! The orchestrator wraps it into a single [`ComfyUIError`] whose message
//! carries a fixed `ComfyUI API Error:` prefix. Per-artifact failures
//! never appear here; they become failure output records instead.

use comfyrun_core::error::CoreError;

use crate::api::ComfyUIApiError;

/// Generic message used when an errored prompt carries no
/// `execution_error` details.
pub const EXECUTION_FAILED: &str = "Workflow execution failed";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The caller's settings are out of range.
    #[error("{0}")]
    Settings(#[from] CoreError),

    /// The workflow text is not valid JSON.
    #[error("Invalid workflow JSON: {0}")]
    Payload(#[source] serde_json::Error),

    /// The `/system_stats` probe failed.
    #[error("Cannot reach ComfyUI: {0}")]
    Connectivity(#[source] ComfyUIApiError),

    /// ComfyUI answered with an unexpected shape.
    #[error("Unexpected response from ComfyUI: {0}")]
    Protocol(String),

    /// A queue, history or submission request failed.
    #[error("{0}")]
    Request(#[source] ComfyUIApiError),

    /// The prompt left the queue without leaving a history record.
    #[error(
        "Workflow execution failed: prompt {prompt_id} disappeared from queue but is not in \
         history. This usually indicates a server crash or prompt parsing error."
    )]
    Vanished { prompt_id: String },

    /// The history record has no `status` field.
    #[error("Workflow execution failed: prompt {prompt_id} contains no status")]
    MissingStatus { prompt_id: String },

    /// ComfyUI reported the prompt as errored.
    #[error("{message}")]
    Execution {
        message: String,
        node_id: Option<String>,
        node_type: Option<String>,
        exception_message: Option<String>,
    },

    /// The attempt budget ran out before the prompt completed.
    #[error("Execution timeout after {minutes} minutes")]
    Timeout { minutes: u32 },
}

impl From<ComfyUIApiError> for PipelineError {
    /// Body decoding failures are protocol violations; everything else is
    /// a failed request.
    fn from(err: ComfyUIApiError) -> Self {
        match err {
            ComfyUIApiError::Decode(e) => Self::Protocol(e.to_string()),
            other => Self::Request(other),
        }
    }
}

/// The single error reported by [`crate::pipeline::ComfyUIPipeline::run`].
#[derive(Debug, thiserror::Error)]
#[error("ComfyUI API Error: {source}")]
pub struct ComfyUIError {
    #[from]
    source: PipelineError,
}

impl ComfyUIError {
    /// The stage-level cause.
    pub fn kind(&self) -> &PipelineError {
        &self.source
    }

    pub fn into_kind(self) -> PipelineError {
        self.source
    }
}
