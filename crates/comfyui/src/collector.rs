//! Result collection for a completed prompt.
//!
//! Flattens every node's `images` and `gifs`, keeps the references the
//! [`CategoryPolicy`] admits, and fetches + normalizes all of them
//! concurrently. A failing artifact degrades to a failure record and
//! never affects its siblings.

use comfyrun_core::artifact::{ArtifactRef, CategoryPolicy};
use comfyrun_core::normalize::{normalize, NormalizeError};
use comfyrun_core::output::OutputRecord;
use comfyrun_core::settings::ImageOptions;
use futures::future::join_all;

use crate::api::ComfyUIService;
use crate::fetch::{fetch_artifact, FetchError};
use crate::history::HistoryRecord;

/// Why a single artifact could not be turned into a success record.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// References from `record` that `policy` admits, in collection order.
pub fn eligible_artifacts(record: &HistoryRecord, policy: CategoryPolicy) -> Vec<&ArtifactRef> {
    record
        .artifacts()
        .filter(|artifact| policy.admits(&artifact.category))
        .collect()
}

/// Produce one output record per eligible artifact.
///
/// All downloads run concurrently with no limit, and every one runs to
/// completion before this returns.
pub async fn collect_outputs<S: ComfyUIService + ?Sized>(
    service: &S,
    record: &HistoryRecord,
    policy: CategoryPolicy,
    options: &ImageOptions,
) -> Vec<OutputRecord> {
    let artifacts = eligible_artifacts(record, policy);
    tracing::info!(count = artifacts.len(), "Collecting prompt outputs");

    let records = join_all(
        artifacts
            .into_iter()
            .map(|artifact| collect_one(service, artifact, options)),
    )
    .await;

    let failed = records.iter().filter(|r| !r.is_success()).count();
    tracing::info!(total = records.len(), failed, "Output collection finished");
    records
}

/// Fetch and normalize one artifact, converting any error into a
/// failure record.
pub async fn collect_one<S: ComfyUIService + ?Sized>(
    service: &S,
    artifact: &ArtifactRef,
    options: &ImageOptions,
) -> OutputRecord {
    tracing::debug!(
        filename = %artifact.filename,
        category = %artifact.category,
        kind = ?artifact.kind(),
        "Downloading artifact",
    );

    match fetch_and_normalize(service, artifact, options).await {
        Ok(payload) => OutputRecord::Success(payload),
        Err(e) => {
            tracing::warn!(filename = %artifact.filename, error = %e, "Artifact collection failed");
            OutputRecord::failure(artifact, e)
        }
    }
}

async fn fetch_and_normalize<S: ComfyUIService + ?Sized>(
    service: &S,
    artifact: &ArtifactRef,
    options: &ImageOptions,
) -> Result<comfyrun_core::output::ArtifactPayload, ArtifactError> {
    let bytes = fetch_artifact(service, artifact).await?;
    Ok(normalize(artifact, &bytes, options)?)
}
