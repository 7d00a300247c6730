//! ComfyUI workflow client.
//!
//! Submits a workflow to a ComfyUI instance, polls the queue and history
//! until the prompt finishes, and collects every produced artifact as a
//! normalized [`OutputRecord`](comfyrun_core::output::OutputRecord).
//!
//! The entry point is [`pipeline::ComfyUIPipeline`]. Each stage is also
//! usable on its own against any [`api::ComfyUIService`].

pub mod api;
pub mod collector;
pub mod error;
pub mod fetch;
pub mod history;
pub mod messages;
pub mod pipeline;
pub mod poller;
pub mod queue;
pub mod submit;
