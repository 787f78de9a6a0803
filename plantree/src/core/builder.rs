//! Incremental tree building from a plan transcript.
//!
//! [`TreeBuilder::push_line`] is the pure state machine; [`build_tree`]
//! drives it from any `BufRead` until a terminal [`Signal`].

use std::io::BufRead;
use std::ops::ControlFlow;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::classifier::{LineRole, classify, classify_structure, strip_ansi};
use crate::core::markup::ansi_to_markup;
use crate::core::tree::{NodeId, Tree};

/// Why parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Input ended without a control line.
    EndOfStream,
    /// A confirmation question, as printed (colors stripped).
    Prompt(String),
    /// The plan partially failed.
    Problem,
    /// The plan has nothing to do.
    NoChanges,
}

#[derive(Debug)]
pub struct ParseOutcome {
    pub tree: Tree,
    pub signal: Signal,
}

/// Per-pass state. The root stays at the bottom of `scope_stack`.
#[derive(Debug)]
struct ParseState {
    scope_stack: Vec<NodeId>,
    started: bool,
    in_heredoc: bool,
}

#[derive(Debug)]
pub struct TreeBuilder {
    tree: Tree,
    state: ParseState,
    start_expanded: bool,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TreeBuilder {
    /// `start_expanded` controls the initial state of scope openers.
    pub fn new(start_expanded: bool) -> Self {
        let tree = Tree::default();
        let root = tree.root();
        Self {
            tree,
            state: ParseState {
                scope_stack: vec![root],
                started: false,
                in_heredoc: false,
            },
            start_expanded,
        }
    }

    /// Number of open scopes above the root.
    pub fn depth(&self) -> usize {
        self.state.scope_stack.len() - 1
    }

    pub fn in_heredoc(&self) -> bool {
        self.state.in_heredoc
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Feed one line (without its terminator).
    ///
    /// Returns `Break` with the terminal signal when the line ends the parse;
    /// no node is created for that line.
    pub fn push_line(&mut self, line: &str) -> ControlFlow<Signal> {
        let mut role = classify(line);
        match role {
            LineRole::Problem => return ControlFlow::Break(Signal::Problem),
            LineRole::NoChanges => return ControlFlow::Break(Signal::NoChanges),
            _ => {}
        }

        if !self.state.started {
            if role == LineRole::Start {
                debug!("report start marker found");
                self.state.started = true;
            }
            return ControlFlow::Continue(());
        }

        let raw = strip_ansi(line);
        let raw = raw.trim_end_matches('\r');
        match role {
            LineRole::Prompt => return ControlFlow::Break(Signal::Prompt(raw.to_string())),
            // later start phrases are ordinary report text
            LineRole::Start => role = classify_structure(raw),
            _ => {}
        }

        let parent = self.top();
        let id = self.tree.append(parent, ansi_to_markup(line.trim_end_matches('\r')));

        if self.state.in_heredoc {
            if role == LineRole::HeredocClose {
                self.state.in_heredoc = false;
            }
            return ControlFlow::Continue(());
        }

        match role {
            LineRole::HeredocOpen => self.state.in_heredoc = true,
            LineRole::Opener => {
                self.tree.set_selectable(id, true);
                self.tree.set_expanded(id, self.start_expanded);
                self.state.scope_stack.push(id);
            }
            LineRole::Closer => self.pop_scope(),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    pub fn finish(self, signal: Signal) -> ParseOutcome {
        ParseOutcome {
            tree: self.tree,
            signal,
        }
    }

    fn top(&self) -> NodeId {
        self.state
            .scope_stack
            .last()
            .copied()
            .unwrap_or_else(|| self.tree.root())
    }

    fn pop_scope(&mut self) {
        if self.state.scope_stack.len() > 1 {
            self.state.scope_stack.pop();
            return;
        }
        warn!("unbalanced closing bracket in plan output, keeping root scope");
    }
}

/// Read `reader` line by line until the builder signals or input ends.
pub fn build_tree<R: BufRead>(mut reader: R, start_expanded: bool) -> Result<ParseOutcome> {
    let mut builder = TreeBuilder::new(start_expanded);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .context("read plan output")?;
        if n == 0 {
            debug!(nodes = builder.tree().len(), "plan output ended");
            return Ok(builder.finish(Signal::EndOfStream));
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        if let ControlFlow::Break(signal) = builder.push_line(line) {
            debug!(?signal, nodes = builder.tree().len(), "parse stopped");
            return Ok(builder.finish(signal));
        }
    }
}
