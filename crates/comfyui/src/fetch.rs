//! Artifact download via `GET /view`.

use comfyrun_core::artifact::ArtifactRef;

use crate::api::{ComfyUIApiError, ComfyUIService};

/// Download failure for a single artifact.
#[derive(Debug, thiserror::Error)]
#[error("failed to download {filename}: {source}")]
pub struct FetchError {
    pub filename: String,
    #[source]
    pub source: ComfyUIApiError,
}

/// Fetch the raw bytes of `artifact`.
pub async fn fetch_artifact<S: ComfyUIService + ?Sized>(
    service: &S,
    artifact: &ArtifactRef,
) -> Result<Vec<u8>, FetchError> {
    service.view(artifact).await.map_err(|source| FetchError {
        filename: artifact.filename.clone(),
        source,
    })
}
