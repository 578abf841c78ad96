//! # devproof-common
//!
//! Shared result model, error definitions, configuration, document access,
//! and report aggregation used across the entire devproof workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives both validation pipelines
//! build their reports from.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod aggregate;
pub mod codes;
pub mod config;
pub mod constants;
pub mod documents;
pub mod error;
pub mod types;
