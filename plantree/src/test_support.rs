//! Test-only helpers for feeding plan transcripts and scripting the UI.

use std::io::Cursor;

use anyhow::Result;

use crate::core::builder::{ParseOutcome, build_tree};
use crate::core::tree::Tree;
use crate::io::process::write_answer;
use crate::session::{Frontend, Source, UiExit, UiRequest};

/// First start marker; lines before it are ignored by the parser.
pub const START_LINE: &str = "Terraform will perform the following actions:";

/// Parse `lines` as if each were printed with a trailing newline.
pub fn parse_lines(lines: &[&str]) -> ParseOutcome {
    build_tree(transcript(lines).as_bytes(), false).expect("in-memory parse cannot fail")
}

/// Newline-terminated transcript of `lines`.
pub fn transcript(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

/// Piped source replaying `lines`.
pub fn lines_source(lines: &[&str]) -> Source {
    Source::Reader(Box::new(Cursor::new(transcript(lines).into_bytes())))
}

/// Child source running `script` under `sh -c`.
pub fn sh_source(script: &str) -> Source {
    Source::Command(vec![
        "sh".to_string(),
        "-c".to_string(),
        script.to_string(),
    ])
}

/// What a [`ScriptedFrontend`] was shown.
#[derive(Debug)]
pub struct SeenRun {
    pub tree: Tree,
    pub prompt: Option<String>,
    pub had_child: bool,
}

/// Frontend that ends every run with a fixed [`UiExit`].
///
/// Like the terminal frontend it writes the answer before reporting
/// `Confirmed`, and waits for the child before reporting `ChildExited`.
pub struct ScriptedFrontend {
    pub exit: UiExit,
    pub runs: Vec<SeenRun>,
}

impl ScriptedFrontend {
    pub fn new(exit: UiExit) -> Self {
        Self {
            exit,
            runs: Vec::new(),
        }
    }
}

impl Frontend for ScriptedFrontend {
    fn run(&mut self, request: UiRequest<'_>) -> Result<UiExit> {
        let UiRequest {
            tree,
            prompt,
            answer,
            watch,
        } = request;
        let had_child = answer.is_some();
        match self.exit {
            UiExit::Confirmed => {
                if let Some(answer) = answer {
                    write_answer(answer)?;
                }
            }
            UiExit::ChildExited => {
                if let Some(watch) = watch {
                    watch.wait_blocking()?;
                }
            }
            UiExit::Quit | UiExit::Skipped => {}
        }
        self.runs.push(SeenRun {
            tree,
            prompt,
            had_child,
        });
        Ok(self.exit)
    }
}
