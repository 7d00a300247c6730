//! Pure domain logic for comfyrun.
//!
//! Artifact classification, output records, image normalization and
//! pipeline settings. Nothing in this crate performs network I/O, so
//! every module can be tested in isolation.

pub mod artifact;
pub mod error;
pub mod normalize;
pub mod output;
pub mod settings;
pub mod types;
