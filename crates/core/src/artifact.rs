//! Artifact references and kind classification.
//!
//! ComfyUI reports every file a node produced as `{filename, subfolder,
//! type}`. This module models those references, decides which ones are
//! eligible for collection, and classifies each one as a still image
//! (re-encoded) or a video-like file (passed through untouched).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// ComfyUI's classification of why an artifact exists (the `type` field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactCategory {
    /// Saved by an output node (`SaveImage`, `VHS_VideoCombine`, ...).
    Output,
    /// Scratch files such as `PreviewImage` results.
    Temp,
    /// Anything else, including `input` and an absent tag (empty string).
    Other(String),
}

impl ArtifactCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Output => "output",
            Self::Temp => "temp",
            Self::Other(s) => s,
        }
    }
}

impl Default for ArtifactCategory {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ArtifactCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "output" => Self::Output,
            "temp" => Self::Temp,
            _ => Self::Other(value),
        }
    }
}

impl From<ArtifactCategory> for String {
    fn from(value: ArtifactCategory) -> Self {
        match value {
            ArtifactCategory::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which artifact categories are collected after a job completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryPolicy {
    /// Only `output` artifacts.
    #[default]
    OutputOnly,
    /// `output` and `temp` artifacts.
    OutputAndTemp,
}

impl CategoryPolicy {
    /// Whether an artifact of `category` should be collected.
    pub fn admits(self, category: &ArtifactCategory) -> bool {
        match self {
            Self::OutputOnly => matches!(category, ArtifactCategory::Output),
            Self::OutputAndTemp => {
                matches!(category, ArtifactCategory::Output | ArtifactCategory::Temp)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// A file produced by a job, as listed in the history outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub category: ArtifactCategory,
}

impl ArtifactRef {
    /// Lower-cased text after the last `.` of the filename, or an empty
    /// string when there is none.
    pub fn extension(&self) -> String {
        file_extension(&self.filename)
    }

    /// Infer how this artifact must be normalized.
    pub fn kind(&self) -> ArtifactKind {
        classify(&self.filename)
    }
}

// ---------------------------------------------------------------------------
// Kind classification
// ---------------------------------------------------------------------------

/// Extensions that are passed through without transcoding.
pub const VIDEO_LIKE_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "gif", "webp"];

/// Fallback MIME type for extensions missing from [`mime_for_extension`].
pub const OCTET_STREAM: &str = "application/octet-stream";

/// How an artifact is normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Still image, decoded and re-encoded into the requested format.
    Image,
    /// Video or animation, carrying its lower-cased extension.
    VideoLike(String),
}

/// Classify a filename by its extension.
///
/// Anything outside [`VIDEO_LIKE_EXTENSIONS`], including a filename with
/// no extension at all, is treated as a still image.
pub fn classify(filename: &str) -> ArtifactKind {
    let ext = file_extension(filename);
    if VIDEO_LIKE_EXTENSIONS.contains(&ext.as_str()) {
        ArtifactKind::VideoLike(ext)
    } else {
        ArtifactKind::Image
    }
}

/// Lower-cased extension of `filename` (empty when it has no `.`).
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// MIME type for a pass-through extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_video_like_extensions() {
        for ext in VIDEO_LIKE_EXTENSIONS {
            let name = format!("clip_00001.{ext}");
            assert_eq!(classify(&name), ArtifactKind::VideoLike(ext.to_string()));
        }
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify("CLIP.MP4"), ArtifactKind::VideoLike("mp4".into()));
    }

    #[test]
    fn classify_still_images() {
        assert_eq!(classify("ComfyUI_00001_.png"), ArtifactKind::Image);
        assert_eq!(classify("photo.jpeg"), ArtifactKind::Image);
        assert_eq!(classify("no_extension"), ArtifactKind::Image);
    }

    #[test]
    fn extension_uses_last_dot() {
        assert_eq!(file_extension("a.b.c.WebM"), "webm");
        assert_eq!(file_extension("plain"), "");
    }

    #[test]
    fn mime_table() {
        assert_eq!(mime_for_extension("mp4"), "video/mp4");
        assert_eq!(mime_for_extension("webm"), "video/webm");
        assert_eq!(mime_for_extension("mov"), "video/quicktime");
        assert_eq!(mime_for_extension("avi"), "video/x-msvideo");
        assert_eq!(mime_for_extension("gif"), "image/gif");
        assert_eq!(mime_for_extension("webp"), "image/webp");
        assert_eq!(mime_for_extension("mkv"), OCTET_STREAM);
    }

    #[test]
    fn category_round_trips_through_strings() {
        assert_eq!(ArtifactCategory::from("output".to_string()), ArtifactCategory::Output);
        assert_eq!(ArtifactCategory::from("temp".to_string()), ArtifactCategory::Temp);
        assert_eq!(
            ArtifactCategory::from("input".to_string()),
            ArtifactCategory::Other("input".into())
        );
        assert_eq!(String::from(ArtifactCategory::Temp), "temp");
    }

    #[test]
    fn reference_deserializes_with_defaults() {
        let r: ArtifactRef = serde_json::from_str(r#"{"filename":"x.png"}"#).unwrap();
        assert_eq!(r.subfolder, "");
        assert_eq!(r.category, ArtifactCategory::default());

        let r: ArtifactRef =
            serde_json::from_str(r#"{"filename":"x.png","subfolder":"run1","type":"output"}"#)
                .unwrap();
        assert_eq!(r.subfolder, "run1");
        assert_eq!(r.category, ArtifactCategory::Output);
    }

    #[test]
    fn output_only_policy() {
        let policy = CategoryPolicy::OutputOnly;
        assert!(policy.admits(&ArtifactCategory::Output));
        assert!(!policy.admits(&ArtifactCategory::Temp));
        assert!(!policy.admits(&ArtifactCategory::Other("input".into())));
    }

    #[test]
    fn output_and_temp_policy() {
        let policy = CategoryPolicy::OutputAndTemp;
        assert!(policy.admits(&ArtifactCategory::Output));
        assert!(policy.admits(&ArtifactCategory::Temp));
        assert!(!policy.admits(&ArtifactCategory::default()));
    }
}
