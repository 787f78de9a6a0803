//! The cooperative UI loop.
//!
//! Terminal events and the child's exit race in one `tokio::select!`; the
//! first to resolve decides how the UI ends.

use std::io::{self, Write};
use std::process::ExitStatus;

use anyhow::{Context, Result, anyhow};
use crossterm::event::Event;
use futures::{Stream, StreamExt};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tracing::{debug, info};

use crate::io::process::{ExitWatch, write_answer};
use crate::session::UiExit;
use crate::ui::app::{App, AppAction};
use crate::ui::render::ui;

pub(crate) async fn run<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: S,
    mut answer: Option<&mut dyn Write>,
    mut watch: Option<&mut ExitWatch>,
) -> Result<UiExit>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    loop {
        terminal
            .draw(|frame| ui(frame, app))
            .map_err(|err| anyhow!("draw frame: {err}"))?;
        // the first frame is on screen before the child can end the view
        if let Some(watch) = watch.as_deref_mut() {
            if !watch.is_armed() {
                watch.arm();
                debug!("first frame drawn, watching child exit");
            }
        }
        let watching = watch.is_some();

        tokio::select! {
            status = wait_exit(&mut watch), if watching => {
                let status = status?;
                if !status.success() || app.has_prompt() {
                    info!(%status, "child exited while the tree was shown");
                    return Ok(UiExit::ChildExited);
                }
                debug!(%status, "child finished cleanly, tree stays open");
                watch = None;
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        let action = app.on_event(event);
                        if let Some(exit) = handle_action(action, answer.as_deref_mut())? {
                            return Ok(exit);
                        }
                    }
                    Some(Err(err)) => return Err(err).context("read terminal event"),
                    None => return Ok(UiExit::Quit),
                }
            }
        }
    }
}

async fn wait_exit(watch: &mut Option<&mut ExitWatch>) -> Result<ExitStatus> {
    match watch {
        Some(watch) => watch.wait().await,
        None => std::future::pending().await,
    }
}

/// Carry out an [`AppAction`]. Returns the UI's exit once it should end.
fn handle_action(
    action: AppAction,
    answer: Option<&mut (dyn Write + '_)>,
) -> Result<Option<UiExit>> {
    match action {
        AppAction::None => Ok(None),
        AppAction::Quit => Ok(Some(UiExit::Quit)),
        AppAction::Confirm => {
            if let Some(answer) = answer {
                write_answer(answer)?;
            }
            Ok(Some(UiExit::Confirmed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use futures::stream;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ratatui::backend::TestBackend;

    use crate::core::dialog::{Choice, button_layout};
    use crate::io::config::PlantreeConfig;
    use crate::io::process::{Process, exit_code, spawn};
    use crate::test_support::{START_LINE, parse_lines};

    const PROMPT: &str = "Do you want to perform these actions?";

    fn sh(script: &str) -> Process {
        spawn(&["sh".to_string(), "-c".to_string(), script.to_string()]).expect("spawn")
    }

    fn app(prompt: Option<&str>) -> App {
        let outcome = parse_lines(&[START_LINE, "  + resource \"a\" {", "      + id = 1", "    }"]);
        App::new(
            outcome.tree,
            prompt.map(str::to_string),
            &PlantreeConfig::default(),
        )
    }

    fn terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(80, 12)).expect("terminal")
    }

    /// Key presses followed by a stream that never ends.
    fn keys(codes: Vec<KeyCode>) -> impl Stream<Item = io::Result<Event>> + Unpin {
        let events: Vec<io::Result<Event>> = codes
            .into_iter()
            .map(|code| Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))))
            .collect();
        stream::iter(events).chain(stream::pending())
    }

    fn footer(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let y = buffer.area.height - 1;
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn confirm_writes_answer_before_leaving() {
        let mut stdin = Vec::new();
        let exit =
            handle_action(AppAction::Confirm, Some(&mut stdin as &mut dyn Write)).expect("confirm");
        assert_eq!(exit, Some(UiExit::Confirmed));
        assert_eq!(stdin, b"yes\n");
    }

    #[test]
    fn quit_and_idle_write_nothing() {
        let mut stdin = Vec::new();
        assert_eq!(
            handle_action(AppAction::Quit, Some(&mut stdin as &mut dyn Write)).expect("quit"),
            Some(UiExit::Quit)
        );
        assert_eq!(
            handle_action(AppAction::None, Some(&mut stdin as &mut dyn Write)).expect("idle"),
            None
        );
        assert!(stdin.is_empty());
    }

    #[tokio::test]
    async fn failed_child_ends_the_view() {
        let mut process = sh("exit 3");
        let mut terminal = terminal();
        let mut app = app(None);
        assert!(!process.watch.is_armed());

        let exit = run(
            &mut terminal,
            &mut app,
            keys(Vec::new()),
            Some(&mut process.stdin as &mut dyn Write),
            Some(&mut process.watch),
        )
        .await
        .expect("run");

        assert_eq!(exit, UiExit::ChildExited);
        assert!(footer(&terminal).starts_with("↑/↓ move"));
        let status = process.watch.try_status().expect("exit status");
        assert_eq!(exit_code(status), 3);
    }

    #[tokio::test]
    async fn clean_exit_with_pending_prompt_ends_the_view() {
        let mut process = sh("exit 0");
        let mut terminal = terminal();
        let mut app = app(Some(PROMPT));

        let exit = run(
            &mut terminal,
            &mut app,
            keys(Vec::new()),
            Some(&mut process.stdin as &mut dyn Write),
            Some(&mut process.watch),
        )
        .await
        .expect("run");

        assert_eq!(exit, UiExit::ChildExited);
    }

    #[tokio::test]
    async fn clean_exit_without_prompt_keeps_tree_open() {
        let mut process = sh("exit 0");
        let mut terminal = terminal();
        let mut app = app(None);

        let result = tokio::time::timeout(
            Duration::from_millis(500),
            run(
                &mut terminal,
                &mut app,
                keys(Vec::new()),
                Some(&mut process.stdin as &mut dyn Write),
                Some(&mut process.watch),
            ),
        )
        .await;

        assert!(result.is_err(), "view ended on a clean exit: {result:?}");
        assert!(process.watch.try_status().expect("exit status").success());
    }

    #[tokio::test]
    async fn confirm_button_answers_the_waiting_child() {
        let mut process = sh("read answer; echo \"got $answer\"");
        let mut terminal = terminal();
        let mut app = app(Some(PROMPT)).with_rng(StdRng::seed_from_u64(11));
        let confirm = button_layout(&mut StdRng::seed_from_u64(11))
            .iter()
            .position(|&choice| choice == Choice::Confirm)
            .expect("confirm slot");

        let mut codes = vec![KeyCode::End, KeyCode::Enter];
        codes.extend(std::iter::repeat_n(KeyCode::Tab, confirm));
        codes.push(KeyCode::Enter);

        let exit = run(
            &mut terminal,
            &mut app,
            keys(codes),
            Some(&mut process.stdin as &mut dyn Write),
            Some(&mut process.watch),
        )
        .await
        .expect("run");
        assert_eq!(exit, UiExit::Confirmed);

        drop(process.stdin);
        let mut out = String::new();
        process.stdout.read_to_string(&mut out).expect("read stdout");
        assert_eq!(out, "got yes\n");
        assert!(process.watch.wait().await.expect("wait").success());
    }

    #[tokio::test]
    async fn closed_event_stream_quits() {
        let mut terminal = terminal();
        let mut app = app(None);
        let exit = run(&mut terminal, &mut app, stream::empty(), None, None)
            .await
            .expect("run");
        assert_eq!(exit, UiExit::Quit);
    }
}
