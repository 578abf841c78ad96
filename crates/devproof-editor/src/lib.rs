//! # devproof-editor
//!
//! Validation of the editor configuration shipped with a development
//! environment: debug launch entries, task definitions, workspace settings,
//! extension recommendations, and the references between them.
//!
//! Every check is a cheap static read. No stage gates another, so the
//! pipeline always reports on every document.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cross;
pub mod document;
pub mod extensions;
pub mod graph;
pub mod launch;
pub mod pipeline;
pub mod settings;
pub mod tasks;

pub use pipeline::EditorConfigPipeline;
