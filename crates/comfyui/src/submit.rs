//! Workflow submission: connectivity probe followed by `POST /prompt`.

use chrono::Utc;
use comfyrun_core::types::Timestamp;

use crate::api::ComfyUIService;
use crate::error::PipelineError;

/// A prompt accepted by ComfyUI. Immutable once created.
#[derive(Debug, Clone)]
pub struct Job {
    /// Server-assigned prompt identifier.
    pub prompt_id: String,
    /// Client id sent alongside the prompt.
    pub client_id: String,
    pub workflow: serde_json::Value,
    pub submitted_at: Timestamp,
}

/// Parse raw workflow text into a JSON document.
pub fn parse_workflow(text: &str) -> Result<serde_json::Value, PipelineError> {
    serde_json::from_str(text).map_err(PipelineError::Payload)
}

/// Probe the instance, then queue `workflow` for execution.
///
/// The probe is not retried: if `/system_stats` fails the submission is
/// abandoned with [`PipelineError::Connectivity`].
pub async fn submit_workflow<S: ComfyUIService + ?Sized>(
    service: &S,
    workflow: serde_json::Value,
) -> Result<Job, PipelineError> {
    tracing::debug!("Checking ComfyUI connectivity");
    service
        .system_stats()
        .await
        .map_err(PipelineError::Connectivity)?;

    let client_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(client_id = %client_id, "Queueing prompt");
    let response = service.submit_workflow(&workflow, &client_id).await?;

    let prompt_id = match response.prompt_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => return Err(missing_job_id(&response.node_errors)),
    };

    tracing::info!(
        prompt_id = %prompt_id,
        queue_number = ?response.number,
        "Prompt queued",
    );

    Ok(Job {
        prompt_id,
        client_id,
        workflow,
        submitted_at: Utc::now(),
    })
}

/// Protocol error for a `/prompt` answer without a usable id. Per-node
/// validation errors, when ComfyUI sent any, are carried in the message.
fn missing_job_id(node_errors: &serde_json::Value) -> PipelineError {
    let reported = match node_errors {
        serde_json::Value::Null => false,
        serde_json::Value::Object(map) => !map.is_empty(),
        _ => true,
    };
    if reported {
        PipelineError::Protocol(format!("no job id returned (node errors: {node_errors})"))
    } else {
        PipelineError::Protocol("no job id returned".into())
    }
}
