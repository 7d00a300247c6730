use std::path::PathBuf;

use comfyrun_core::artifact::CategoryPolicy;
use comfyrun_core::error::CoreError;
use comfyrun_core::settings::{
    OutputFormat, PipelineSettings, DEFAULT_JPEG_QUALITY, DEFAULT_TIMEOUT_MINUTES,
};

/// Errors raised while reading the runner configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Settings(#[from] CoreError),
}

/// Runner configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// File holding the workflow JSON.
    pub workflow_path: PathBuf,
    pub settings: PipelineSettings,
}

impl RunConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default        |
    /// |------------------------|----------------|
    /// | `COMFYUI_API_URL`      | (required)     |
    /// | `COMFYUI_API_KEY`      | none           |
    /// | `WORKFLOW_PATH`        | (required)     |
    /// | `OUTPUT_FORMAT`        | `jpeg`         |
    /// | `JPEG_QUALITY`         | `80`           |
    /// | `TIMEOUT_MINUTES`      | `30`           |
    /// | `COLLECT_TEMP_OUTPUTS` | `false`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RunConfig::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("COMFYUI_API_URL").ok_or(ConfigError::Missing("COMFYUI_API_URL"))?;
        let workflow_path = var("WORKFLOW_PATH")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("WORKFLOW_PATH"))?;

        let mut settings = PipelineSettings::new(api_url.trim());
        settings.api_key = var("COMFYUI_API_KEY");

        settings.image.format = match var("OUTPUT_FORMAT") {
            Some(raw) => raw.parse::<OutputFormat>()?,
            None => OutputFormat::default(),
        };
        settings.image.jpeg_quality =
            parse_or("JPEG_QUALITY", var("JPEG_QUALITY"), DEFAULT_JPEG_QUALITY)?;
        settings.timeout_minutes =
            parse_or("TIMEOUT_MINUTES", var("TIMEOUT_MINUTES"), DEFAULT_TIMEOUT_MINUTES)?;

        if parse_or("COLLECT_TEMP_OUTPUTS", var("COLLECT_TEMP_OUTPUTS"), false)? {
            settings.category_policy = CategoryPolicy::OutputAndTemp;
        }

        settings.validate()?;

        Ok(Self {
            workflow_path,
            settings,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
