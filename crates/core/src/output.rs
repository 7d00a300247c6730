//! Output records returned to the caller, one per collected artifact.

use serde::Serialize;

use crate::artifact::{ArtifactCategory, ArtifactRef};

/// Broad media class of a successful record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// `Video` when the MIME type starts with `video/`, `Image` otherwise.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Image
        }
    }
}

/// A successfully fetched and normalized artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactPayload {
    pub filename: String,
    #[serde(rename = "type")]
    pub category: ArtifactCategory,
    pub subfolder: String,
    /// Base64 (standard alphabet, padded) of the emitted bytes.
    pub data: String,
    pub media_type: MediaType,
    /// Size of the emitted bytes, e.g. `"12.3 kB"`.
    pub file_size: String,
    pub file_extension: String,
    pub mime_type: String,
}

/// An artifact that could not be fetched or normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactFailure {
    pub filename: String,
    #[serde(rename = "type")]
    pub category: ArtifactCategory,
    pub subfolder: String,
    pub error: String,
}

/// Exactly one record is produced per eligible artifact reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutputRecord {
    Success(ArtifactPayload),
    Failure(ArtifactFailure),
}

impl OutputRecord {
    /// Build a failure record for `artifact` from any displayable error.
    pub fn failure(artifact: &ArtifactRef, error: impl std::fmt::Display) -> Self {
        Self::Failure(ArtifactFailure {
            filename: artifact.filename.clone(),
            category: artifact.category.clone(),
            subfolder: artifact.subfolder.clone(),
            error: error.to_string(),
        })
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Success(p) => &p.filename,
            Self::Failure(f) => &f.filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Size in kilobytes rounded to one decimal place, suffixed with ` kB`.
///
/// Whole values print without a fraction (`2048` bytes -> `"2 kB"`).
pub fn format_file_size(len: usize) -> String {
    let kb = (len as f64 / 1024.0 * 10.0).round() / 10.0;
    format!("{kb} kB")
}
