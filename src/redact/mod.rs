//! Redaction: applying policy actions to detected spans
//!
//! - [`engine`]: single-pass segment assembly over one text unit
//! - [`json`]: structural walker applying the pipeline to string leaves only

pub mod engine;
pub mod json;

pub use engine::{apply_policy, apply_uniform, fingerprint};
pub use json::{collect_string_leaves, rebuild_with_leaves, StringLeaf};
