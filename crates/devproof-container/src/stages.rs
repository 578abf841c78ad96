//! Stage descriptors and the gating driver.
//!
//! Gating lives in data: each descriptor carries a predicate over the
//! outcomes recorded so far, and one loop evaluates them in order. A stage
//! whose gate is closed is skipped and leaves no result behind.

use std::fmt;

use devproof_common::aggregate::exception_result;
use devproof_common::constants::stages;
use devproof_common::error::Result;
use devproof_common::types::ValidationResult;

/// Whether a stage's failure invalidates the stages after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Failure aborts every stage gated on this one.
    Critical,
    /// Failure is reported but gates nothing.
    NonCritical,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::NonCritical => write!(f, "non-critical"),
        }
    }
}

/// Outcomes of the stages executed so far.
#[derive(Debug, Default)]
pub struct Outcomes {
    results: Vec<ValidationResult>,
}

impl Outcomes {
    /// Whether `stage` ran and passed.
    #[must_use]
    pub fn passed(&self, stage: &str) -> bool {
        self.results.iter().any(|r| r.stage == stage && r.success)
    }

    /// Whether `stage` ran at all.
    #[must_use]
    pub fn ran(&self, stage: &str) -> bool {
        self.results.iter().any(|r| r.stage == stage)
    }

    /// Results in execution order.
    #[must_use]
    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }
}

/// One stage of a gated pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StageDescriptor {
    /// Stable stage name.
    pub name: &'static str,
    /// How a failure affects later stages.
    pub criticality: Criticality,
    /// Whether the stage runs, given earlier outcomes.
    pub gate: fn(&Outcomes) -> bool,
}

const fn always(_: &Outcomes) -> bool {
    true
}

fn config_passed(outcomes: &Outcomes) -> bool {
    outcomes.passed(stages::CONFIG)
}

fn config_and_runtime_passed(outcomes: &Outcomes) -> bool {
    outcomes.passed(stages::CONFIG) && outcomes.passed(stages::RUNTIME)
}

fn build_passed(outcomes: &Outcomes) -> bool {
    outcomes.passed(stages::BUILD)
}

fn compile_passed(outcomes: &Outcomes) -> bool {
    outcomes.passed(stages::COMPILE)
}

/// The container environment stages, in execution order.
pub const CONTAINER_STAGES: [StageDescriptor; 6] = [
    StageDescriptor {
        name: stages::CONFIG,
        criticality: Criticality::Critical,
        gate: always,
    },
    StageDescriptor {
        name: stages::RUNTIME,
        criticality: Criticality::Critical,
        gate: config_passed,
    },
    StageDescriptor {
        name: stages::DOCKERFILE,
        criticality: Criticality::NonCritical,
        gate: config_passed,
    },
    StageDescriptor {
        name: stages::BUILD,
        criticality: Criticality::Critical,
        gate: config_and_runtime_passed,
    },
    StageDescriptor {
        name: stages::COMPILE,
        criticality: Criticality::Critical,
        gate: build_passed,
    },
    StageDescriptor {
        name: stages::TEST,
        criticality: Criticality::NonCritical,
        gate: compile_passed,
    },
];

/// Runs `execute` for every descriptor whose gate is open.
///
/// An `Err` from `execute` is converted into a result carrying a single
/// critical error, so a stage never aborts the driver itself.
pub fn drive(
    descriptors: &[StageDescriptor],
    mut execute: impl FnMut(&StageDescriptor) -> Result<ValidationResult>,
) -> Vec<ValidationResult> {
    let mut outcomes = Outcomes::default();
    for descriptor in descriptors {
        if !(descriptor.gate)(&outcomes) {
            tracing::info!(stage = descriptor.name, "stage skipped");
            continue;
        }
        tracing::info!(stage = descriptor.name, criticality = %descriptor.criticality, "stage started");
        let result = execute(descriptor).unwrap_or_else(|e| {
            tracing::warn!(stage = descriptor.name, error = %e, "stage aborted");
            exception_result(descriptor.name, &e)
        });
        if !result.success && descriptor.criticality == Criticality::Critical {
            tracing::warn!(stage = descriptor.name, "critical stage failed");
        }
        tracing::info!(
            stage = descriptor.name,
            success = result.success,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "stage finished"
        );
        outcomes.results.push(result);
    }
    outcomes.into_results()
}
