//! Pipeline settings supplied by the caller.

use std::str::FromStr;

use crate::artifact::CategoryPolicy;
use crate::error::CoreError;

/// Default JPEG quality when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
/// Default time budget for a workflow, in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 30;

/// Format still images are re-encoded into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Name used for both the file extension and the `image/<name>` MIME type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(self) -> String {
        format!("image/{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(CoreError::Validation(format!(
                "Unknown output format '{other}', expected 'jpeg' or 'png'"
            ))),
        }
    }
}

/// Requested encoding for still images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub format: OutputFormat,
    /// JPEG quality (1-100). Ignored, and not validated, for PNG.
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Everything one pipeline invocation needs from its caller.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Base HTTP URL of the ComfyUI instance, e.g. `http://host:8188`.
    pub api_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    pub image: ImageOptions,
    pub timeout_minutes: u32,
    pub category_policy: CategoryPolicy,
}

impl PipelineSettings {
    /// Settings with default image options, timeout and category policy.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: None,
            image: ImageOptions::default(),
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            category_policy: CategoryPolicy::default(),
        }
    }

    /// Check field ranges before any request is made.
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(CoreError::Validation("API URL must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Validation(format!(
                "API URL '{url}' must start with http:// or https://"
            )));
        }
        if self.image.format == OutputFormat::Jpeg {
            validate_jpeg_quality(self.image.jpeg_quality)?;
        }
        if self.timeout_minutes == 0 {
            return Err(CoreError::Validation(
                "Timeout must be at least 1 minute".into(),
            ));
        }
        Ok(())
    }
}

/// Validate that a JPEG quality value is within 1-100.
pub fn validate_jpeg_quality(quality: u8) -> Result<(), CoreError> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "JPEG quality {quality} is outside the allowed range [1, 100]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = PipelineSettings::new("http://localhost:8188");
        assert_eq!(s.image.format, OutputFormat::Jpeg);
        assert_eq!(s.image.jpeg_quality, 80);
        assert_eq!(s.timeout_minutes, 30);
        assert_eq!(s.category_policy, CategoryPolicy::OutputOnly);
        assert!(s.api_key.is_none());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn parse_output_format() {
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!(" PNG ".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_matches!("tiff".parse::<OutputFormat>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn mime_follows_format() {
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn jpeg_quality_bounds() {
        assert!(validate_jpeg_quality(1).is_ok());
        assert!(validate_jpeg_quality(100).is_ok());
        assert!(validate_jpeg_quality(0).is_err());
        assert!(validate_jpeg_quality(101).is_err());
    }

    #[test]
    fn jpeg_quality_only_checked_for_jpeg() {
        let mut s = PipelineSettings::new("http://localhost:8188");
        s.image.jpeg_quality = 0;
        assert_matches!(s.validate(), Err(CoreError::Validation(msg)) if msg.contains("JPEG quality"));

        s.image.format = OutputFormat::Png;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut s = PipelineSettings::new("http://localhost:8188");
        s.timeout_minutes = 0;
        assert_matches!(s.validate(), Err(CoreError::Validation(msg)) if msg.contains("Timeout"));
    }

    #[test]
    fn url_scheme_required() {
        assert!(PipelineSettings::new("").validate().is_err());
        assert!(PipelineSettings::new("localhost:8188").validate().is_err());
        assert!(PipelineSettings::new("https://comfy.example.com").validate().is_ok());
    }
}
