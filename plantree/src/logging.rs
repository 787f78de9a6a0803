//! Development-time tracing.
//!
//! The tree view owns the terminal while it runs, so diagnostics can be sent
//! to a file instead of stderr. Stderr output is held back while the view is
//! up (see [`pause_stderr`]).

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming a log file, used when `--log-file` is absent.
pub const LOG_FILE_ENV: &str = "PLANTREE_LOG";

static STDERR_PAUSED: AtomicBool = AtomicBool::new(false);

/// Drops stderr log events until the guard goes away.
#[must_use = "stderr logging resumes as soon as the guard is dropped"]
pub struct StderrPause {
    _private: (),
}

impl Drop for StderrPause {
    fn drop(&mut self) {
        STDERR_PAUSED.store(false, Ordering::Relaxed);
    }
}

/// Stop writing log events to stderr, e.g. while the alternate screen is up.
///
/// Events are discarded, not buffered. A log file is unaffected.
pub fn pause_stderr() -> StderrPause {
    STDERR_PAUSED.store(true, Ordering::Relaxed);
    StderrPause { _private: () }
}

pub fn stderr_paused() -> bool {
    STDERR_PAUSED.load(Ordering::Relaxed)
}

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output goes to `log_file`
/// (appended, no colors) when given, otherwise to stderr in compact format
/// unless [`pause_stderr`] is in effect.
///
/// # Example
/// ```bash
/// RUST_LOG=plantree=debug plantree --log-file /tmp/plantree.log terraform apply
/// ```
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .compact(),
                )
                .try_init()
                .context("install tracing subscriber")?;
        }
        None => {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr.with_filter(|_| !stderr_paused()))
                        .compact(),
                )
                .try_init()
                .context("install tracing subscriber")?;
        }
    }
    Ok(())
}
