//! Terminal setup and teardown around the tree view.

use std::io::{self, Stdout};

use crossterm::ExecutableCommand;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Put the terminal into "TUI mode".
///
/// Enables raw mode, switches to the alternate screen (capturing the mouse
/// when asked), and clears it. Raw mode is undone if a later step fails.
pub fn setup(mouse: bool) -> io::Result<Tui> {
    enable_raw_mode()?;
    let result = enter(mouse);
    if result.is_err() {
        let _ = disable_raw_mode();
    }
    result
}

fn enter(mouse: bool) -> io::Result<Tui> {
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    if mouse {
        stdout.execute(EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal back to normal "shell mode".
pub fn restore(terminal: &mut Tui, mouse: bool) -> io::Result<()> {
    disable_raw_mode()?;
    if mouse {
        terminal.backend_mut().execute(DisableMouseCapture)?;
    }
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
