//! Classification of plan transcript lines into control roles.
//!
//! The vocabulary below is the contract with Terraform's human-readable
//! output. Matching is case-sensitive and runs on the ANSI-stripped text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Phrases that open the part of the report worth rendering as a tree.
pub const START_MARKERS: [&str; 4] = [
    "Terraform will perform the following actions",
    "Objects have changed outside of Terraform",
    "Terraform detected the following changes",
    "Terraform used the selected providers",
];

/// Printed when the plan step failed part way through.
pub const PROBLEM_MARKER: &str =
    "Terraform planned the following actions, but then encountered a problem";

/// Printed when the plan is empty.
pub const NO_CHANGES_MARKERS: [&str; 2] = [
    "No changes. Your infrastructure matches the configuration.",
    "No changes. No objects need to be destroyed.",
];

/// Confirmation questions, matched against the whole line.
pub const PROMPTS: [&str; 2] = [
    "Do you want to perform these actions?",
    "Do you really want to destroy all resources?",
];

pub const HEREDOC_OPENERS: [&str; 2] = ["<<-EOT", "<<EOT"];
pub const HEREDOC_CLOSE: &str = "EOT";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ansi escape pattern is valid")
});

/// Semantic role of one transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Start,
    Problem,
    NoChanges,
    Prompt,
    HeredocOpen,
    HeredocClose,
    Opener,
    Closer,
    Text,
}

/// Remove ANSI CSI sequences, borrowing when there is nothing to strip.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

/// Classify a line that may still carry color escapes.
///
/// Control roles win over structural ones, in the order
/// problem, no-changes, start, prompt.
pub fn classify(line: &str) -> LineRole {
    let raw = strip_ansi(line);
    let raw = raw.trim_end_matches('\r');

    if raw.contains(PROBLEM_MARKER) {
        LineRole::Problem
    } else if NO_CHANGES_MARKERS.iter().any(|marker| raw.contains(marker)) {
        LineRole::NoChanges
    } else if START_MARKERS.iter().any(|marker| raw.contains(marker)) {
        LineRole::Start
    } else if PROMPTS.iter().any(|prompt| *prompt == raw.trim_end()) {
        LineRole::Prompt
    } else {
        classify_structure(raw)
    }
}

/// Structural role of an already-stripped line, ignoring control phrases.
pub fn classify_structure(raw: &str) -> LineRole {
    if is_heredoc_open(raw) {
        LineRole::HeredocOpen
    } else if is_heredoc_close(raw) {
        LineRole::HeredocClose
    } else if is_opener(raw) {
        LineRole::Opener
    } else if is_closer(raw) {
        LineRole::Closer
    } else {
        LineRole::Text
    }
}

pub fn is_opener(raw: &str) -> bool {
    matches!(raw.chars().next_back(), Some('(' | '[' | '{'))
}

pub fn is_closer(raw: &str) -> bool {
    matches!(raw.trim_start().chars().next(), Some(')' | ']' | '}'))
}

pub fn is_heredoc_open(raw: &str) -> bool {
    let raw = raw.trim_end();
    HEREDOC_OPENERS.iter().any(|token| raw.ends_with(token))
}

pub fn is_heredoc_close(raw: &str) -> bool {
    raw.trim() == HEREDOC_CLOSE
}
