//! Scripted [`CommandRunner`] for exercising pipelines without a runtime.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use crate::backend::CommandRunner;
use crate::exec::{CommandResult, RunOptions};

#[derive(Debug, Default)]
struct State {
    responses: HashMap<String, VecDeque<CommandResult>>,
    calls: Vec<Vec<String>>,
}

/// Replays canned results keyed by the first argument (`build`, `run`, ...).
///
/// Responses for a key are consumed in order; the last one is sticky.
/// Keys with no scripted response succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    state: Mutex<State>,
    fallback: Option<CommandResult>,
}

impl ScriptedRunner {
    /// A runner on which every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose binary cannot be started.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            state: Mutex::default(),
            fallback: Some(CommandResult::spawn_failure("docker not found on PATH")),
        }
    }

    /// Queues `result` for calls whose first argument is `key`.
    #[must_use]
    pub fn respond(self, key: &str, result: CommandResult) -> Self {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.responses.entry(key.to_string()).or_default().push_back(result);
        }
        self
    }

    /// Every recorded argument vector, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).calls.clone()
    }

    /// Recorded calls whose first argument is `key`.
    #[must_use]
    pub fn calls_to(&self, key: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| args.first().is_some_and(|first| first == key))
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, args: &[String], _options: &RunOptions) -> CommandResult {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.calls.push(args.to_vec());
        if let Some(fallback) = &self.fallback {
            return fallback.clone();
        }
        let key = args.first().cloned().unwrap_or_default();
        let Some(queue) = state.responses.get_mut(&key) else {
            return CommandResult::ok("");
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| CommandResult::ok(""))
        } else {
            queue.front().cloned().unwrap_or_else(|| CommandResult::ok(""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(runner: &ScriptedRunner, args: &[&str]) -> CommandResult {
        let args: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();
        runner.run(&args, &RunOptions::default())
    }

    #[test]
    fn responses_are_consumed_then_last_sticks() {
        let runner = ScriptedRunner::new()
            .respond("run", CommandResult::ok("first"))
            .respond("run", CommandResult::ok("second"));
        assert_eq!(call(&runner, &["run"]).stdout, "first");
        assert_eq!(call(&runner, &["run"]).stdout, "second");
        assert_eq!(call(&runner, &["run"]).stdout, "second");
    }

    #[test]
    fn unscripted_keys_succeed() {
        let runner = ScriptedRunner::new();
        assert!(call(&runner, &["build", "-t", "x"]).success);
        assert_eq!(runner.calls_to("build").len(), 1);
        assert!(runner.calls_to("run").is_empty());
    }

    #[test]
    fn unavailable_fails_everything() {
        let runner = ScriptedRunner::unavailable();
        let result = call(&runner, &["--version"]);
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
    }
}
