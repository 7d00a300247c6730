#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use comfyrun_comfyui::api::{ComfyUIApiError, ComfyUIService, SubmitResponse};
use comfyrun_comfyui::history::HistoryResponse;
use comfyrun_comfyui::poller::PollConfig;
use comfyrun_comfyui::queue::QueueSnapshot;
use comfyrun_core::artifact::ArtifactRef;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::{json, Value};

pub const PROMPT_ID: &str = "abc123";

/// Scripted in-memory ComfyUI.
///
/// Queue and history responses are consumed front to back; the last one
/// repeats once the script runs out.
pub struct FakeComfyUI {
    pub probe_error: Option<u16>,
    pub submit_body: Value,
    /// When set, `/queue` accepts the request and never answers.
    pub stall_queue: bool,
    queue: Mutex<VecDeque<QueueSnapshot>>,
    history: Mutex<VecDeque<HistoryResponse>>,
    files: HashMap<String, Result<Vec<u8>, (u16, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeComfyUI {
    pub fn new() -> Self {
        Self {
            probe_error: None,
            submit_body: json!({"prompt_id": PROMPT_ID, "number": 1, "node_errors": {}}),
            stall_queue: false,
            queue: Mutex::new(VecDeque::from([empty_queue()])),
            history: Mutex::new(VecDeque::from([HistoryResponse::new()])),
            files: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_queue(self, script: Vec<QueueSnapshot>) -> Self {
        *self.queue.lock().unwrap() = script.into();
        self
    }

    pub fn with_history(self, script: Vec<Value>) -> Self {
        *self.history.lock().unwrap() = script
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        self
    }

    pub fn with_file(mut self, filename: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(filename.to_string(), Ok(bytes));
        self
    }

    pub fn with_broken_file(mut self, filename: &str, status: u16, body: &str) -> Self {
        self.files
            .insert(filename.to_string(), Err((status, body.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(endpoint))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T: Clone>(script: &Mutex<VecDeque<T>>) -> T {
        let mut script = script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl ComfyUIService for FakeComfyUI {
    async fn system_stats(&self) -> Result<(), ComfyUIApiError> {
        self.record("system_stats".into());
        match self.probe_error {
            Some(status) => Err(ComfyUIApiError::ApiError {
                status,
                body: "service unavailable".into(),
            }),
            None => Ok(()),
        }
    }

    async fn submit_workflow(
        &self,
        workflow: &Value,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        assert!(!client_id.is_empty());
        assert!(workflow.is_object());
        self.record("prompt".into());
        Ok(serde_json::from_value(self.submit_body.clone())?)
    }

    async fn get_queue(&self) -> Result<QueueSnapshot, ComfyUIApiError> {
        self.record("queue".into());
        if self.stall_queue {
            return std::future::pending().await;
        }
        Ok(Self::next(&self.queue))
    }

    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, ComfyUIApiError> {
        self.record(format!("history/{prompt_id}"));
        Ok(Self::next(&self.history))
    }

    async fn view(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, ComfyUIApiError> {
        self.record(format!("view/{}", artifact.filename));
        match self.files.get(&artifact.filename) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err((status, body))) => Err(ComfyUIApiError::ApiError {
                status: *status,
                body: body.clone(),
            }),
            None => Err(ComfyUIApiError::ApiError {
                status: 404,
                body: "Not Found".into(),
            }),
        }
    }
}

pub fn empty_queue() -> QueueSnapshot {
    QueueSnapshot::default()
}

pub fn running_queue() -> QueueSnapshot {
    serde_json::from_value(json!({
        "queue_running": [[0, PROMPT_ID, {}, {}, ["9"]]],
        "queue_pending": []
    }))
    .unwrap()
}

pub fn pending_queue() -> QueueSnapshot {
    serde_json::from_value(json!({
        "queue_running": [[0, "someone-else", {}, {}, ["9"]]],
        "queue_pending": [[1, PROMPT_ID, {}, {}, ["9"]]]
    }))
    .unwrap()
}

/// History response with a completed record whose outputs are `outputs`.
pub fn completed_history(outputs: Value) -> Value {
    json!({
        PROMPT_ID: {
            "prompt": [1, PROMPT_ID, {}, {}, ["9"]],
            "status": {
                "status_str": "success",
                "completed": true,
                "messages": [
                    ["execution_start", {"prompt_id": PROMPT_ID, "timestamp": 1}],
                    ["execution_success", {"prompt_id": PROMPT_ID, "timestamp": 2}]
                ]
            },
            "outputs": outputs
        }
    })
}

/// Poll cadence with no delays and a budget of `60 * minutes` attempts.
pub fn instant_poll(minutes: u32) -> PollConfig {
    PollConfig {
        initial_delay: Duration::ZERO,
        attempt_delay: Duration::ZERO,
        ..PollConfig::for_timeout(minutes)
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbaImage::from_pixel(16, 16, Rgba([10, 120, 240, 255]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_with_encoder(PngEncoder::new(&mut buf))
        .unwrap();
    buf
}

pub const WORKFLOW: &str = r#"{
    "3": {"class_type": "KSampler", "inputs": {"seed": 1, "steps": 20}},
    "9": {"class_type": "SaveImage", "inputs": {"images": ["8", 0]}}
}"#;
