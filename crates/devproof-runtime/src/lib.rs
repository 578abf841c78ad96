//! Container runtime adapter for devproof.
//!
//! Turns high-level intents (probe, build, run, inspect, remove) into
//! invocations of an external runtime CLI. Every invocation, successful or
//! not, is folded into a [`exec::CommandResult`]; callers never handle
//! errors on the common failure path.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod dockerfile;
pub mod engine;
pub mod exec;
pub mod fakes;
pub mod process;
pub mod tag;

pub use backend::CommandRunner;
pub use engine::{BuildRequest, ContainerRunOptions, ContainerRuntime};
pub use exec::{CommandResult, RunOptions};
