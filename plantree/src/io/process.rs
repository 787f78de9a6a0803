//! Helpers for running the wrapped command as an interactive child.
//!
//! The child's stdout is handed to the parser, its stdin is kept for the
//! confirmation answer, and stderr is drained on a background thread so the
//! child never blocks on a full pipe while the UI is up.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument};

use crate::exit_codes;

/// Line written to the child when the user confirms.
pub const ANSWER: &str = "yes";

/// A spawned child with every stdio stream piped.
pub struct Process {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: StderrCapture,
    pub watch: ExitWatch,
}

/// Spawn `command` (program followed by its arguments).
#[instrument(skip_all, fields(program = command.first().map(String::as_str)))]
pub fn spawn(command: &[String]) -> Result<Process> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).with_context(|| format!("spawn {}", command.join(" ")));
        }
    };

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin was not piped"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let pid = child.id();
    info!(pid, "child process started");
    Ok(Process {
        stdin,
        stdout,
        stderr: StderrCapture::start(stderr),
        watch: ExitWatch::new(child),
    })
}

/// Background collection of a child's stderr.
pub struct StderrCapture {
    handle: thread::JoinHandle<Result<Vec<u8>>>,
}

impl StderrCapture {
    pub fn start<R: Read + Send + 'static>(mut reader: R) -> Self {
        let handle = thread::spawn(move || {
            let mut buf = Vec::new();
            match reader.read_to_end(&mut buf) {
                Ok(_) => Ok(buf),
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(buf),
                Err(err) => Err(err).context("read stderr"),
            }
        });
        Self { handle }
    }

    /// Wait for the child to close stderr and return everything it wrote.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("stderr reader thread panicked")),
        }
    }
}

enum WatchState {
    Pending(Child),
    Waiting(oneshot::Receiver<io::Result<ExitStatus>>),
    Exited(ExitStatus),
    Failed,
}

/// One-shot handoff of the child's exit status.
///
/// The watch starts unarmed. [`ExitWatch::arm`] moves the child onto a
/// waiter thread whose only output is the oneshot send; the UI loop and
/// the final drain are the only readers.
pub struct ExitWatch {
    pid: u32,
    state: WatchState,
}

impl ExitWatch {
    pub fn new(child: Child) -> Self {
        Self {
            pid: child.id(),
            state: WatchState::Pending(child),
        }
    }

    /// Start waiting for exit in the background. No-op once armed.
    pub fn arm(&mut self) {
        if !matches!(self.state, WatchState::Pending(_)) {
            return;
        }
        let WatchState::Pending(mut child) = std::mem::replace(&mut self.state, WatchState::Failed)
        else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        thread::spawn(move || {
            let _ = tx.send(child.wait());
        });
        debug!("exit watcher armed");
        self.state = WatchState::Waiting(rx);
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self.state, WatchState::Pending(_))
    }

    /// Exit status if the child is already known to have exited.
    pub fn try_status(&mut self) -> Option<ExitStatus> {
        match &mut self.state {
            WatchState::Pending(child) => match child.try_wait() {
                Ok(Some(status)) => {
                    self.state = WatchState::Exited(status);
                    Some(status)
                }
                _ => None,
            },
            WatchState::Waiting(rx) => match rx.try_recv() {
                Ok(Ok(status)) => {
                    self.state = WatchState::Exited(status);
                    Some(status)
                }
                Ok(Err(err)) => {
                    error!(err = %err, "waiting for child failed");
                    self.state = WatchState::Failed;
                    None
                }
                Err(_) => None,
            },
            WatchState::Exited(status) => Some(*status),
            WatchState::Failed => None,
        }
    }

    /// Wait for exit from async code. Cancel-safe: dropping the future
    /// leaves the watch armed.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.arm();
        if let WatchState::Waiting(rx) = &mut self.state {
            let result = rx.await;
            self.settle(result)?;
        }
        self.status()
    }

    /// Wait for exit from blocking code (outside any async runtime).
    pub fn wait_blocking(&mut self) -> Result<ExitStatus> {
        match &mut self.state {
            WatchState::Pending(child) => {
                let status = child.wait().context("wait for child")?;
                self.state = WatchState::Exited(status);
            }
            WatchState::Waiting(_) => {
                let WatchState::Waiting(rx) =
                    std::mem::replace(&mut self.state, WatchState::Failed)
                else {
                    bail!("exit watcher changed state while waiting");
                };
                let result = rx.blocking_recv();
                self.settle(result)?;
            }
            WatchState::Exited(_) | WatchState::Failed => {}
        }
        self.status()
    }

    /// Ask a still running child to stop, as if the user had pressed Ctrl-C.
    ///
    /// Returns false without signalling once the exit status is known, so
    /// a reaped pid is never signalled.
    pub fn interrupt(&mut self) -> Result<bool> {
        if let Some(status) = self.try_status() {
            debug!(pid = self.pid, %status, "child already exited, not interrupting");
            return Ok(false);
        }
        if matches!(self.state, WatchState::Failed) {
            return Ok(false);
        }
        send_interrupt(self.pid)?;
        Ok(true)
    }

    fn settle(
        &mut self,
        result: std::result::Result<io::Result<ExitStatus>, oneshot::error::RecvError>,
    ) -> Result<()> {
        match result {
            Ok(Ok(status)) => {
                self.state = WatchState::Exited(status);
                Ok(())
            }
            Ok(Err(err)) => {
                self.state = WatchState::Failed;
                Err(err).context("wait for child")
            }
            Err(_) => {
                self.state = WatchState::Failed;
                bail!("exit watcher stopped without a status")
            }
        }
    }

    fn status(&self) -> Result<ExitStatus> {
        match self.state {
            WatchState::Exited(status) => Ok(status),
            _ => bail!("child exit status unavailable"),
        }
    }
}

/// Write the confirmation answer and a newline to the child's stdin.
pub fn write_answer<W: Write + ?Sized>(writer: &mut W) -> Result<()> {
    writeln!(writer, "{ANSWER}").context("write answer to child")?;
    writer.flush().context("flush answer to child")?;
    Ok(())
}

#[cfg(unix)]
fn send_interrupt(pid: u32) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).context("child pid out of range")?;
    match kill(Pid::from_raw(raw), Signal::SIGINT) {
        Ok(()) => {
            info!(pid, "sent interrupt to child");
            Ok(())
        }
        Err(Errno::ESRCH) => {
            debug!(pid, "child already gone");
            Ok(())
        }
        Err(errno) => Err(anyhow!("interrupt child {pid}: {errno}")),
    }
}

#[cfg(not(unix))]
fn send_interrupt(pid: u32) -> Result<()> {
    tracing::warn!(pid, "interrupting the child is only supported on unix");
    Ok(())
}

/// Copy what is left of `reader` to `writer`.
///
/// A broken pipe means the other side already closed and ends the copy
/// normally.
pub fn copy_residual<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> Result<u64> {
    let copied = match io::copy(reader, writer) {
        Ok(n) => n,
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("pipe closed during residual copy");
            0
        }
        Err(err) => return Err(err).context("copy residual output"),
    };
    match writer.flush() {
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
            Err(err).context("flush residual output")
        }
        _ => Ok(copied),
    }
}

/// Exit code to propagate for a finished child.
pub fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(exit_codes::INVALID)
}
