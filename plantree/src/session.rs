//! One run of plantree: parse the plan, hand it to the UI, finish the child.
//!
//! A session moves through [`Phase`]s in order. Everything that touches the
//! terminal lives behind the [`Frontend`] trait so the flow can be driven
//! by a scripted frontend in tests.

use std::io::{BufReader, Read, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::builder::{Signal, build_tree};
use crate::core::tree::Tree;
use crate::exit_codes;
use crate::io::process::{self, ExitWatch, Process, copy_residual, exit_code};
use crate::io::tee::TeeReader;

pub const PIPING_MISUSE_MESSAGE: &str = "plantree: piping only works with \
`terraform plan | plantree`. For apply or destroy run `plantree terraform apply` \
or `plantree terraform destroy`.";

/// Where the plan output comes from.
pub enum Source {
    /// Run this command (program and arguments) as a child.
    Command(Vec<String>),
    /// Read an already running plan from a pipe.
    Reader(Box<dyn Read + Send>),
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub start_expanded: bool,
    /// Show the UI. When false, pending prompts count as declined.
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Spawning,
    Streaming,
    /// Plan output ended without a question; the tree is only browsed.
    Browsing,
    AwaitingPrompt,
    Terminating,
    Done,
}

/// How the UI ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    /// The answer was written to the child.
    Confirmed,
    /// The child exited while the UI was up.
    ChildExited,
    /// The user left without answering.
    Quit,
    /// No UI was shown.
    Skipped,
}

/// Everything a frontend needs for one run.
pub struct UiRequest<'a> {
    pub tree: Tree,
    /// Pending confirmation question, if the plan asked one.
    pub prompt: Option<String>,
    /// Child stdin for the answer; `None` when reading from a pipe.
    pub answer: Option<&'a mut dyn Write>,
    /// Exit watch of the child; `None` when reading from a pipe.
    pub watch: Option<&'a mut ExitWatch>,
}

pub trait Frontend {
    /// Show the tree until the user answers, quits, or the child exits.
    ///
    /// On [`UiExit::Confirmed`] the frontend has already written the answer.
    fn run(&mut self, request: UiRequest<'_>) -> Result<UiExit>;
}

struct PhaseLog {
    phase: Phase,
}

impl PhaseLog {
    fn new(phase: Phase) -> Self {
        debug!(?phase, "session phase");
        Self { phase }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "session phase");
        self.phase = phase;
    }
}

/// Run a full session and return the process exit code.
///
/// Plan output is echoed to `out` as it is parsed and whatever follows is
/// replayed afterwards, so `out` receives the source's stdout exactly once.
/// A child's stderr is collected and written to `err` at the end.
pub fn run_session<F, O, E>(
    source: Source,
    options: &SessionOptions,
    frontend: &mut F,
    out: &mut O,
    err: &mut E,
) -> Result<i32>
where
    F: Frontend + ?Sized,
    O: Write,
    E: Write,
{
    match source {
        Source::Command(command) => run_child(&command, options, frontend, out, err),
        Source::Reader(reader) => run_piped(reader, options, frontend, out, err),
    }
}

#[instrument(skip_all)]
fn run_child<F, O, E>(
    command: &[String],
    options: &SessionOptions,
    frontend: &mut F,
    out: &mut O,
    err: &mut E,
) -> Result<i32>
where
    F: Frontend + ?Sized,
    O: Write,
    E: Write,
{
    let mut phase = PhaseLog::new(Phase::Spawning);
    let Process {
        mut stdin,
        mut stdout,
        stderr,
        mut watch,
    } = process::spawn(command)?;

    phase.enter(Phase::Streaming);
    let outcome = {
        let tee = TeeReader::new(&mut stdout, &mut *out);
        build_tree(BufReader::new(tee), options.start_expanded)?
    };

    let fixed_code = match outcome.signal {
        Signal::Problem => Some(exit_codes::PROBLEM),
        Signal::NoChanges => Some(exit_codes::NO_CHANGES),
        Signal::Prompt(_) | Signal::EndOfStream => None,
    };

    if fixed_code.is_none() {
        let prompt = match outcome.signal {
            Signal::Prompt(prompt) => Some(prompt),
            _ => None,
        };
        let pending = prompt.is_some();
        phase.enter(if pending {
            Phase::AwaitingPrompt
        } else {
            Phase::Browsing
        });

        let ui_exit = if options.interactive {
            frontend.run(UiRequest {
                tree: outcome.tree,
                prompt,
                answer: Some(&mut stdin as &mut dyn Write),
                watch: Some(&mut watch),
            })?
        } else {
            UiExit::Skipped
        };
        info!(?ui_exit, "ui finished");

        let declined = match ui_exit {
            UiExit::Confirmed | UiExit::ChildExited => false,
            UiExit::Quit => true,
            UiExit::Skipped => pending,
        };
        if declined && watch.interrupt()? {
            debug!("declined, child interrupted");
        }
    }

    phase.enter(Phase::Terminating);
    drop(stdin);
    copy_residual(&mut stdout, out)?;
    let collected = stderr.finish()?;
    copy_residual(&mut collected.as_slice(), err)?;
    let status = watch.wait_blocking()?;
    phase.enter(Phase::Done);
    info!(%status, "child finished");

    Ok(fixed_code.unwrap_or_else(|| exit_code(status)))
}

#[instrument(skip_all)]
fn run_piped<F, O, E>(
    mut reader: Box<dyn Read + Send>,
    options: &SessionOptions,
    frontend: &mut F,
    out: &mut O,
    err: &mut E,
) -> Result<i32>
where
    F: Frontend + ?Sized,
    O: Write,
    E: Write,
{
    let mut phase = PhaseLog::new(Phase::Streaming);
    let outcome = {
        let tee = TeeReader::new(&mut reader, &mut *out);
        build_tree(BufReader::new(tee), options.start_expanded)?
    };

    let code = match outcome.signal {
        Signal::Problem => exit_codes::PROBLEM,
        Signal::NoChanges => exit_codes::NO_CHANGES,
        Signal::Prompt(_) => {
            copy_residual(&mut reader, out)?;
            writeln!(err, "{PIPING_MISUSE_MESSAGE}").context("write piping guidance")?;
            phase.enter(Phase::Done);
            return Ok(exit_codes::PIPING_MISUSE);
        }
        Signal::EndOfStream => {
            phase.enter(Phase::Browsing);
            if options.interactive {
                let ui_exit = frontend.run(UiRequest {
                    tree: outcome.tree,
                    prompt: None,
                    answer: None,
                    watch: None,
                })?;
                info!(?ui_exit, "ui finished");
            }
            exit_codes::OK
        }
    };

    phase.enter(Phase::Terminating);
    copy_residual(&mut reader, out)?;
    phase.enter(Phase::Done);
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{START_LINE, ScriptedFrontend, lines_source, sh_source};

    fn interactive() -> SessionOptions {
        SessionOptions {
            start_expanded: false,
            interactive: true,
        }
    }

    #[test]
    fn piped_plan_without_prompt_is_browsed() {
        let mut frontend = ScriptedFrontend::new(UiExit::Quit);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let source = lines_source(&[START_LINE, "  a {", "    b", "  }"]);
        let code = run_session(source, &interactive(), &mut frontend, &mut out, &mut err)
            .expect("session");
        assert_eq!(code, exit_codes::OK);
        assert_eq!(frontend.runs.len(), 1);
        assert!(!frontend.runs[0].had_child);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            format!("{START_LINE}\n  a {{\n    b\n  }}\n")
        );
        assert!(err.is_empty());
    }

    #[test]
    fn piped_prompt_is_misuse() {
        let mut frontend = ScriptedFrontend::new(UiExit::Confirmed);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let source = lines_source(&[
            START_LINE,
            "  a {",
            "  }",
            "Do you want to perform these actions?",
            "  Enter a value: ",
        ]);
        let code = run_session(source, &interactive(), &mut frontend, &mut out, &mut err)
            .expect("session");
        assert_eq!(code, exit_codes::PIPING_MISUSE);
        assert!(frontend.runs.is_empty());
        let out = String::from_utf8(out).expect("utf8");
        assert!(out.ends_with("Do you want to perform these actions?\n  Enter a value: \n"));
        assert_eq!(
            String::from_utf8(err).expect("utf8"),
            format!("{PIPING_MISUSE_MESSAGE}\n")
        );
    }

    #[test]
    fn child_problem_replays_output_and_stderr() {
        let script = format!(
            "echo '{START_LINE}'; echo '  a {{'; \
             echo 'Terraform planned the following actions, but then encountered a problem:'; \
             echo 'Error: boom'; echo 'details' >&2; exit 1"
        );
        let mut frontend = ScriptedFrontend::new(UiExit::Confirmed);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run_session(
            sh_source(&script),
            &interactive(),
            &mut frontend,
            &mut out,
            &mut err,
        )
        .expect("session");
        assert_eq!(code, exit_codes::PROBLEM);
        assert!(frontend.runs.is_empty());
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            format!(
                "{START_LINE}\n  a {{\n\
                 Terraform planned the following actions, but then encountered a problem:\n\
                 Error: boom\n"
            )
        );
        assert_eq!(err, b"details\n");
    }

    #[test]
    fn confirmed_prompt_answers_child() {
        let script = format!(
            "echo '{START_LINE}'; echo '  a {{'; echo '  }}'; \
             echo 'Do you want to perform these actions?'; read answer; echo \"got $answer\""
        );
        let mut frontend = ScriptedFrontend::new(UiExit::Confirmed);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run_session(
            sh_source(&script),
            &interactive(),
            &mut frontend,
            &mut out,
            &mut err,
        )
        .expect("session");
        assert_eq!(code, exit_codes::OK);
        let run = &frontend.runs[0];
        assert!(run.had_child);
        assert_eq!(run.prompt.as_deref(), Some("Do you want to perform these actions?"));
        assert!(String::from_utf8(out).expect("utf8").ends_with("got yes\n"));
    }

    #[test]
    fn skipped_ui_declines_pending_prompt() {
        let script = format!(
            "echo '{START_LINE}'; echo 'Do you want to perform these actions?'; \
             read answer; echo \"got $answer\""
        );
        let mut frontend = ScriptedFrontend::new(UiExit::Confirmed);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let options = SessionOptions::default();
        run_session(sh_source(&script), &options, &mut frontend, &mut out, &mut err)
            .expect("session");
        assert!(frontend.runs.is_empty());
        assert!(!String::from_utf8(out).expect("utf8").contains("got yes"));
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let mut frontend = ScriptedFrontend::new(UiExit::Quit);
        let source = Source::Command(vec!["plantree-no-such-program".to_string()]);
        let err = run_session(
            source,
            &interactive(),
            &mut frontend,
            &mut Vec::new(),
            &mut Vec::new(),
        )
        .expect_err("spawn must fail");
        assert!(format!("{err:#}").contains("spawn plantree-no-such-program"));
    }
}
