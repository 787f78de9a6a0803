//! Stable exit codes for the plantree CLI.
//!
//! When a wrapped command runs to completion its own exit code is
//! propagated instead.

/// Input was browsed (or the wrapped command succeeded).
pub const OK: i32 = 0;
/// Internal error, including failure to spawn the wrapped command.
pub const INVALID: i32 = 1;
/// The plan reported that no changes are needed.
pub const NO_CHANGES: i32 = 2;
/// The plan reported that it encountered a problem.
pub const PROBLEM: i32 = 3;
/// A confirmation prompt arrived on piped input, which cannot be answered.
pub const PIPING_MISUSE: i32 = 4;
