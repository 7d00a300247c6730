//! Completion polling.
//!
//! After submission the poller waits a fixed initial delay, then checks
//! the queue once per attempt. While the prompt sits in the running or
//! pending list nothing else is fetched. Once it is absent from both,
//! the history record decides the outcome:
//!
//! ```text
//! Submitted -> Polling -> {Running, Pending} -> LeftQueue
//!           -> {Completed, Errored, Vanished, UnknownStatus}
//! Polling   -> TimedOut   (attempt budget exhausted)
//! ```
//!
//! `UnknownStatus` (left the queue, history not yet final) consumes the
//! attempt and polling continues. The loop is bounded by an attempt
//! counter, and every attempt by [`PollConfig::attempt_timeout`] and an
//! overall deadline, so a server that accepts connections but never
//! answers still ends in [`PipelineError::Timeout`].

use std::time::Duration;

use comfyrun_core::settings::DEFAULT_TIMEOUT_MINUTES;
use tokio::time::Instant;

use crate::api::ComfyUIService;
use crate::error::{PipelineError, EXECUTION_FAILED};
use crate::history::{HistoryRecord, HistoryResponse, HistoryStatus};
use crate::queue::QueuePosition;
use crate::submit::Job;

/// Wait before the first check, giving ComfyUI time to register the prompt.
pub const INITIAL_DELAY: Duration = Duration::from_secs(5);
/// Wait before every attempt.
pub const ATTEMPT_DELAY: Duration = Duration::from_secs(1);
/// One attempt per second of the timeout budget.
pub const ATTEMPTS_PER_MINUTE: u32 = 60;
/// Longest a single queue/history check may take before the attempt is
/// given up.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunable parameters for the polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub initial_delay: Duration,
    pub attempt_delay: Duration,
    pub max_attempts: u32,
    /// Upper bound on one attempt's requests. A stalled attempt still
    /// consumes its slot in the budget.
    pub attempt_timeout: Duration,
    /// Reported in [`PipelineError::Timeout`].
    pub timeout_minutes: u32,
}

impl PollConfig {
    /// Standard cadence with a budget of `60 * minutes` attempts.
    pub fn for_timeout(minutes: u32) -> Self {
        Self {
            initial_delay: INITIAL_DELAY,
            attempt_delay: ATTEMPT_DELAY,
            max_attempts: ATTEMPTS_PER_MINUTE.saturating_mul(minutes),
            attempt_timeout: ATTEMPT_TIMEOUT,
            timeout_minutes: minutes,
        }
    }

    /// Wall-clock bound for a whole polling run: the scheduled delays
    /// plus one attempt timeout of slack.
    pub fn total_budget(&self) -> Duration {
        self.initial_delay
            .saturating_add(self.attempt_delay.saturating_mul(self.max_attempts))
            .saturating_add(self.attempt_timeout)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::for_timeout(DEFAULT_TIMEOUT_MINUTES)
    }
}

/// What a single attempt observed.
#[derive(Debug)]
pub enum PollState {
    Running,
    Pending,
    /// Left the queue; history is neither completed nor errored yet.
    UnknownStatus,
    Completed(HistoryRecord),
}

/// Poll until the job completes, fails, or the attempt budget runs out.
pub async fn wait_for_completion<S: ComfyUIService + ?Sized>(
    service: &S,
    job: &Job,
    config: &PollConfig,
) -> Result<HistoryRecord, PipelineError> {
    let prompt_id = job.prompt_id.as_str();
    let deadline = Instant::now() + config.total_budget();
    tokio::time::sleep(config.initial_delay).await;

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.attempt_delay).await;

        let attempt_deadline = (Instant::now() + config.attempt_timeout).min(deadline);
        let Ok(state) = tokio::time::timeout_at(attempt_deadline, poll_once(service, prompt_id)).await
        else {
            tracing::warn!(
                prompt_id = %prompt_id,
                attempt,
                timeout_secs = config.attempt_timeout.as_secs(),
                "Poll attempt got no answer in time",
            );
            if Instant::now() >= deadline {
                break;
            }
            continue;
        };

        match state? {
            PollState::Completed(record) => {
                tracing::info!(
                    prompt_id = %prompt_id,
                    attempt,
                    elapsed_secs = (chrono::Utc::now() - job.submitted_at).num_seconds(),
                    "Prompt completed",
                );
                return Ok(record);
            }
            state => {
                tracing::debug!(
                    prompt_id = %prompt_id,
                    attempt,
                    max_attempts = config.max_attempts,
                    ?state,
                    "Prompt not finished",
                );
            }
        }
    }

    tracing::warn!(
        prompt_id = %prompt_id,
        timeout_minutes = config.timeout_minutes,
        elapsed_secs = (chrono::Utc::now() - job.submitted_at).num_seconds(),
        "Prompt did not complete in time",
    );
    Err(PipelineError::Timeout {
        minutes: config.timeout_minutes,
    })
}

/// One attempt: check the queue, and the history only if the prompt has
/// left it.
pub async fn poll_once<S: ComfyUIService + ?Sized>(
    service: &S,
    prompt_id: &str,
) -> Result<PollState, PipelineError> {
    let queue = service.get_queue().await?;
    match queue.position(prompt_id) {
        QueuePosition::Running => return Ok(PollState::Running),
        QueuePosition::Pending => return Ok(PollState::Pending),
        QueuePosition::Absent => {}
    }

    tracing::debug!(prompt_id = %prompt_id, "Prompt left the queue, checking history");
    let history = service.get_history(prompt_id).await?;
    evaluate_history(history, prompt_id)
}

/// Classify the history response of a prompt that has left the queue.
pub fn evaluate_history(
    mut history: HistoryResponse,
    prompt_id: &str,
) -> Result<PollState, PipelineError> {
    let record = history
        .remove(prompt_id)
        .ok_or_else(|| PipelineError::Vanished {
            prompt_id: prompt_id.to_string(),
        })?;

    let Some(status) = record.status.as_ref() else {
        return Err(PipelineError::MissingStatus {
            prompt_id: prompt_id.to_string(),
        });
    };

    if status.is_error() {
        return Err(execution_failure(status));
    }
    if status.completed {
        return Ok(PollState::Completed(record));
    }
    Ok(PollState::UnknownStatus)
}

/// Build the error for an errored prompt from its first `execution_error`
/// message, or a generic one when none is present.
pub fn execution_failure(status: &HistoryStatus) -> PipelineError {
    match status.execution_error() {
        Some(data) => {
            let node_id = data.node_id.as_deref().unwrap_or("unknown");
            let node_type = data.node_type.as_deref().unwrap_or("unknown");
            let exception = data
                .exception_message
                .as_deref()
                .unwrap_or("no exception message");
            PipelineError::Execution {
                message: format!(
                    "{EXECUTION_FAILED} in node {node_id} ({node_type}): {exception}"
                ),
                node_id: data.node_id.clone(),
                node_type: data.node_type.clone(),
                exception_message: data.exception_message.clone(),
            }
        }
        None => PipelineError::Execution {
            message: EXECUTION_FAILED.to_string(),
            node_id: None,
            node_type: None,
            exception_message: None,
        },
    }
}
