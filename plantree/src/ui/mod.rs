//! Terminal frontend: the plan tree and the confirmation dialog.

pub mod app;
pub(crate) mod event_loop;
pub mod render;
pub mod terminal;

use anyhow::{Context, Result};
use crossterm::event::EventStream;
use tracing::debug;

use crate::io::config::PlantreeConfig;
use crate::logging;
use crate::session::{Frontend, UiExit, UiRequest};
use crate::ui::app::App;

/// [`Frontend`] drawing on the real terminal.
pub struct TerminalFrontend {
    config: PlantreeConfig,
}

impl TerminalFrontend {
    pub fn new(config: PlantreeConfig) -> Self {
        Self { config }
    }
}

impl Frontend for TerminalFrontend {
    fn run(&mut self, request: UiRequest<'_>) -> Result<UiExit> {
        let UiRequest {
            tree,
            prompt,
            answer,
            watch,
        } = request;
        let mut app = App::new(tree, prompt, &self.config);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("build ui runtime")?;
        debug!(mouse = self.config.mouse, "taking over the terminal");
        let _quiet = logging::pause_stderr();
        let mut terminal = terminal::setup(self.config.mouse).context("set up terminal")?;

        let result = runtime.block_on(event_loop::run(
            &mut terminal,
            &mut app,
            EventStream::new(),
            answer,
            watch,
        ));
        terminal::restore(&mut terminal, self.config.mouse).context("restore terminal")?;
        result
    }
}
