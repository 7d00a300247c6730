//! Pipeline orchestration: submit -> poll -> collect.
//!
//! [`ComfyUIPipeline`] owns the service handle and the caller's settings.
//! Any failure before collection is reported as one [`ComfyUIError`];
//! once polling succeeds the (possibly partially failed) output list is
//! always returned.

use comfyrun_core::output::OutputRecord;
use comfyrun_core::settings::PipelineSettings;

use crate::api::{ComfyUIApi, ComfyUIService};
use crate::collector::collect_outputs;
use crate::error::{ComfyUIError, PipelineError};
use crate::poller::{wait_for_completion, PollConfig};
use crate::submit::{parse_workflow, submit_workflow};

/// Runs one workflow end to end against a ComfyUI instance.
pub struct ComfyUIPipeline<S> {
    service: S,
    settings: PipelineSettings,
    poll: PollConfig,
}

impl ComfyUIPipeline<ComfyUIApi> {
    /// Build a pipeline talking HTTP to `settings.api_url`.
    pub fn connect(settings: PipelineSettings) -> Result<Self, ComfyUIError> {
        settings.validate().map_err(PipelineError::from)?;
        let api = ComfyUIApi::new(&settings.api_url, settings.api_key.as_deref())
            .map_err(PipelineError::from)?;
        Ok(Self::new(api, settings))
    }
}

impl<S: ComfyUIService> ComfyUIPipeline<S> {
    /// Build a pipeline over any [`ComfyUIService`] implementation.
    pub fn new(service: S, settings: PipelineSettings) -> Self {
        let poll = PollConfig::for_timeout(settings.timeout_minutes);
        Self {
            service,
            settings,
            poll,
        }
    }

    /// Override the polling cadence (the attempt budget and reported
    /// timeout come from `poll`, not from the settings).
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Submit `workflow_json`, wait for completion and collect outputs.
    pub async fn run(&self, workflow_json: &str) -> Result<Vec<OutputRecord>, ComfyUIError> {
        self.execute(workflow_json).await.map_err(|e| {
            tracing::error!(error = %e, "ComfyUI pipeline failed");
            ComfyUIError::from(e)
        })
    }

    async fn execute(&self, workflow_json: &str) -> Result<Vec<OutputRecord>, PipelineError> {
        self.settings.validate()?;
        let workflow = parse_workflow(workflow_json)?;

        let job = submit_workflow(&self.service, workflow).await?;
        let record = wait_for_completion(&self.service, &job, &self.poll).await?;

        Ok(collect_outputs(
            &self.service,
            &record,
            self.settings.category_policy,
            &self.settings.image,
        )
        .await)
    }
}
