//! # devproof-container
//!
//! Proves a container development environment works: the config document
//! is checked, the runtime probed, the image built, and the project
//! compiled and tested inside it.
//!
//! Stages run strictly in order. Each is described by a
//! [`stages::StageDescriptor`] whose gate decides, from earlier outcomes,
//! whether it runs at all; skipped stages do not appear in the report.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod compile;
pub mod config;
pub mod pipeline;
pub mod project;
pub mod script;
pub mod stages;
pub mod test_output;

pub use pipeline::ContainerPipeline;
