//! Runner for one ComfyUI workflow invocation.
//!
//! The binary loads a [`config::RunConfig`] from the environment, runs the
//! pipeline once and prints the output records as JSON.

pub mod config;
