//! Recovery of test counts from captured runner output.
//!
//! Four summary shapes are probed in a fixed order and the first one that
//! matches decides the counts:
//!
//! 1. Jest: `Tests: 2 failed, 1 skipped, 8 passed, 11 total`
//! 2. Mocha: `15 passing (3s)`, `2 failing`, `1 pending`
//! 3. pytest / cargo: `10 passed, 2 failed` or
//!    `test result: ok. 10 passed; 0 failed; 1 ignored`, summed over lines
//! 4. A per-test stream of `PASS` / `FAIL` tokens
//!
//! Text that matches none of them yields all zeros. Sums saturate at
//! `u64::MAX`.

use std::sync::LazyLock;

use devproof_common::types::TestCounts;
use regex::Regex;

struct Patterns {
    jest_line: Regex,
    jest_pair: Regex,
    mocha_passing: Regex,
    mocha_failing: Regex,
    mocha_pending: Regex,
    passed: Regex,
    failed: Regex,
    skipped: Regex,
    pass_token: Regex,
    fail_token: Regex,
}

static PATTERNS: LazyLock<Option<Patterns>> = LazyLock::new(|| {
    Some(Patterns {
        jest_line: Regex::new(r"(?m)^\s*Tests:\s+(.*\btotal\b.*)$").ok()?,
        jest_pair: Regex::new(r"(\d+)\s+(failed|passed|skipped|todo|total)").ok()?,
        mocha_passing: Regex::new(r"(?m)^\s*(\d+)\s+passing\b").ok()?,
        mocha_failing: Regex::new(r"(?m)^\s*(\d+)\s+failing\b").ok()?,
        mocha_pending: Regex::new(r"(?m)^\s*(\d+)\s+pending\b").ok()?,
        passed: Regex::new(r"\b(\d+)\s+passed\b").ok()?,
        failed: Regex::new(r"\b(\d+)\s+(?:failed|errors?)\b").ok()?,
        skipped: Regex::new(r"\b(\d+)\s+(?:skipped|ignored)\b").ok()?,
        pass_token: Regex::new(r"\bPASS\b").ok()?,
        fail_token: Regex::new(r"\bFAIL\b").ok()?,
    })
});

/// Recovers counts from `text`. All zeros when no shape matches.
#[must_use]
pub fn interpret(text: &str) -> TestCounts {
    let Some(patterns) = PATTERNS.as_ref() else {
        return TestCounts::default();
    };
    jest(patterns, text)
        .or_else(|| mocha(patterns, text))
        .or_else(|| passed_failed(patterns, text))
        .or_else(|| tokens(patterns, text))
        .unwrap_or_default()
}

fn number(capture: Option<regex::Match<'_>>) -> u64 {
    capture.and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

fn jest(p: &Patterns, text: &str) -> Option<TestCounts> {
    let line = p.jest_line.captures(text)?.get(1)?.as_str();
    let mut counts = TestCounts::default();
    for pair in p.jest_pair.captures_iter(line) {
        let n = number(pair.get(1));
        match pair.get(2).map(|m| m.as_str()) {
            Some("failed") => counts.failed = counts.failed.saturating_add(n),
            Some("passed") => counts.passed = counts.passed.saturating_add(n),
            Some("skipped" | "todo") => counts.skipped = counts.skipped.saturating_add(n),
            Some("total") => counts.total = n,
            _ => {}
        }
    }
    Some(counts)
}

fn mocha(p: &Patterns, text: &str) -> Option<TestCounts> {
    let passing = p.mocha_passing.captures(text).map(|c| number(c.get(1)));
    let failing = p.mocha_failing.captures(text).map(|c| number(c.get(1)));
    if passing.is_none() && failing.is_none() {
        return None;
    }
    let pending = p.mocha_pending.captures(text).map_or(0, |c| number(c.get(1)));
    let passed = passing.unwrap_or(0);
    let failed = failing.unwrap_or(0);
    Some(TestCounts {
        total: passed.saturating_add(failed).saturating_add(pending),
        passed,
        failed,
        skipped: pending,
    })
}

fn passed_failed(p: &Patterns, text: &str) -> Option<TestCounts> {
    let mut counts = TestCounts::default();
    let mut matched = false;
    for line in text.lines() {
        let Some(passed) = p.passed.captures(line) else {
            continue;
        };
        matched = true;
        counts.passed = counts.passed.saturating_add(number(passed.get(1)));
        let failed = p.failed.captures(line).map_or(0, |c| number(c.get(1)));
        counts.failed = counts.failed.saturating_add(failed);
        let skipped = p.skipped.captures(line).map_or(0, |c| number(c.get(1)));
        counts.skipped = counts.skipped.saturating_add(skipped);
    }
    counts.total = counts.passed.saturating_add(counts.failed).saturating_add(counts.skipped);
    matched.then_some(counts)
}

fn tokens(p: &Patterns, text: &str) -> Option<TestCounts> {
    let passed = u64::try_from(p.pass_token.find_iter(text).count()).unwrap_or(u64::MAX);
    let failed = u64::try_from(p.fail_token.find_iter(text).count()).unwrap_or(u64::MAX);
    if passed == 0 && failed == 0 {
        return None;
    }
    Some(TestCounts {
        total: passed.saturating_add(failed),
        passed,
        failed,
        skipped: 0,
    })
}
