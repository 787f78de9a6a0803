//! Interactive state for the plan tree view and confirmation dialog.
//!
//! `App` owns the parsed [`Tree`], the focused node, the scroll offset and
//! the open dialog, if any. Input handlers mutate this state and report an
//! [`AppAction`] for the event loop to carry out.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::layout::{Position, Rect};
use tracing::debug;

use crate::core::dialog::{Choice, Dialog};
use crate::core::tree::{NodeId, NodeKind, Row, Tree};
use crate::io::config::{DialogConfig, PlantreeConfig};
use crate::ui::render::{button_areas, modal_area, screen_layout};

const SCROLL_STEP: usize = 3;

/// What the event loop should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    None,
    /// Leave the UI without answering.
    Quit,
    /// The confirm button was pressed.
    Confirm,
}

pub struct App {
    pub tree: Tree,
    /// Focused node; always a visible, selectable node when set.
    pub focus: Option<NodeId>,
    /// Index of the first visible row shown at the top of the tree pane.
    pub scroll_offset: usize,
    /// Whole terminal area (updated before every draw).
    pub area: Rect,
    pub dialog: Option<Dialog>,
    pub labels: DialogConfig,
    prompt: Option<String>,
    mouse: bool,
    rng: StdRng,
}

impl App {
    /// Build the view for `tree`; a pending `prompt` becomes the last
    /// top-level node.
    pub fn new(mut tree: Tree, prompt: Option<String>, config: &PlantreeConfig) -> Self {
        if let Some(prompt) = &prompt {
            tree.append_confirm(prompt);
        }
        let focus = tree.first_focus();
        Self {
            tree,
            focus,
            scroll_offset: 0,
            area: Rect::new(0, 0, 80, 24),
            dialog: None,
            labels: config.dialog.clone(),
            prompt,
            mouse: config.mouse,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the dialog's randomness source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn has_prompt(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        self.ensure_focus_visible();
    }

    pub fn visible_rows(&self) -> Vec<Row> {
        self.tree.visible_rows()
    }

    /// Height of the tree pane in rows.
    pub fn viewport_height(&self) -> usize {
        let [tree_area, _] = screen_layout(self.area);
        usize::from(tree_area.height).max(1)
    }

    pub fn on_event(&mut self, event: Event) -> AppAction {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.on_key(key),
            Event::Mouse(mouse) if self.mouse => self.on_mouse(mouse),
            Event::Resize(width, height) => {
                self.set_area(Rect::new(0, 0, width, height));
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return AppAction::Quit;
        }
        if self.dialog.is_some() {
            return self.on_dialog_key(key);
        }

        match key.code {
            KeyCode::Char('q') => return AppAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_focus(Direction::Up);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_focus(Direction::Down);
            }
            KeyCode::Home | KeyCode::Char('g') => self.focus_edge(Direction::Up),
            KeyCode::End | KeyCode::Char('G') => self.focus_edge(Direction::Down),
            KeyCode::PageUp => self.page(Direction::Up),
            KeyCode::PageDown => self.page(Direction::Down),
            KeyCode::Right | KeyCode::Char('l') => self.expand_or_advance(),
            KeyCode::Left | KeyCode::Char('h') => self.collapse_or_ascend(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.focus {
                    self.activate(id);
                }
            }
            _ => {}
        }
        AppAction::None
    }

    fn on_dialog_key(&mut self, key: KeyEvent) -> AppAction {
        let Some(dialog) = self.dialog.as_mut() else {
            return AppAction::None;
        };
        let choice = match key.code {
            KeyCode::Esc => Some(dialog.escape()),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                dialog.focus_prev();
                None
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                dialog.focus_next();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => Some(dialog.press_focused()),
            _ => None,
        };
        choice.map_or(AppAction::None, |choice| self.resolve(choice))
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) -> AppAction {
        let position = Position::new(mouse.column, mouse.row);
        if self.dialog.is_some() {
            if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
                return AppAction::None;
            }
            let Some(index) = self.button_at(position) else {
                return AppAction::None;
            };
            return match self.dialog.as_ref().and_then(|dialog| dialog.press(index)) {
                Some(choice) => self.resolve(choice),
                None => AppAction::None,
            };
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = self.node_at(position) {
                    if self.tree.node(id).selectable {
                        self.focus = Some(id);
                        self.activate(id);
                    }
                }
            }
            MouseEventKind::ScrollDown => {
                let max = self.visible_rows().len().saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + SCROLL_STEP).min(max);
            }
            MouseEventKind::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
            }
            _ => {}
        }
        AppAction::None
    }

    /// Carry out a dialog choice. Cancel returns to the tree view.
    fn resolve(&mut self, choice: Choice) -> AppAction {
        match choice {
            Choice::Confirm => {
                debug!("confirmation accepted");
                AppAction::Confirm
            }
            Choice::Cancel => {
                debug!("confirmation dialog dismissed");
                self.dialog = None;
                AppAction::None
            }
        }
    }

    /// Enter/click on a node: open the dialog on the confirm node, toggle
    /// anything with children.
    fn activate(&mut self, id: NodeId) {
        match self.tree.node(id).kind {
            NodeKind::Confirm => self.open_dialog(),
            _ if self.tree.has_children(id) => self.tree.toggle(id),
            _ => {}
        }
    }

    fn open_dialog(&mut self) {
        if let Some(prompt) = &self.prompt {
            self.dialog = Some(Dialog::new(prompt, &mut self.rng));
        }
    }

    fn expand_or_advance(&mut self) {
        let Some(id) = self.focus else {
            return;
        };
        if self.tree.node(id).expanded {
            self.move_focus(Direction::Down);
        } else {
            self.tree.set_expanded(id, true);
        }
    }

    fn collapse_or_ascend(&mut self) {
        let Some(id) = self.focus else {
            return;
        };
        if self.tree.node(id).expanded && self.tree.has_children(id) {
            self.tree.set_expanded(id, false);
            return;
        }
        match self.tree.parent(id) {
            Some(parent) if parent != self.tree.root() => {
                self.focus = Some(parent);
                self.ensure_focus_visible();
            }
            _ => {}
        }
    }

    /// Move to the next selectable visible row. Returns true if focus moved.
    fn move_focus(&mut self, direction: Direction) -> bool {
        let rows = self.visible_rows();
        let current = self
            .focus
            .and_then(|id| rows.iter().position(|row| row.id == id));
        let next = match (direction, current) {
            (_, None) => rows.iter().find(|row| self.is_selectable(row)),
            (Direction::Down, Some(pos)) => {
                rows[pos + 1..].iter().find(|row| self.is_selectable(row))
            }
            (Direction::Up, Some(pos)) => {
                rows[..pos].iter().rev().find(|row| self.is_selectable(row))
            }
        };
        match next {
            Some(row) => {
                self.focus = Some(row.id);
                self.ensure_focus_visible();
                true
            }
            None => false,
        }
    }

    fn focus_edge(&mut self, direction: Direction) {
        let rows = self.visible_rows();
        let target = match direction {
            Direction::Up => rows.iter().find(|row| self.is_selectable(row)),
            Direction::Down => rows.iter().rev().find(|row| self.is_selectable(row)),
        };
        if let Some(row) = target {
            self.focus = Some(row.id);
            self.ensure_focus_visible();
        }
    }

    fn page(&mut self, direction: Direction) {
        for _ in 0..self.viewport_height() {
            if !self.move_focus(direction) {
                break;
            }
        }
    }

    fn is_selectable(&self, row: &Row) -> bool {
        self.tree.node(row.id).selectable
    }

    /// Scroll so the focused row is inside the viewport.
    pub fn ensure_focus_visible(&mut self) {
        let Some(id) = self.focus else {
            return;
        };
        let Some(pos) = self.visible_rows().iter().position(|row| row.id == id) else {
            return;
        };
        let height = self.viewport_height();
        if pos < self.scroll_offset {
            self.scroll_offset = pos;
        } else if pos >= self.scroll_offset + height {
            self.scroll_offset = pos + 1 - height;
        }
    }

    fn node_at(&self, position: Position) -> Option<NodeId> {
        let [tree_area, _] = screen_layout(self.area);
        if !tree_area.contains(position) {
            return None;
        }
        let index = self.scroll_offset + usize::from(position.y - tree_area.y);
        self.visible_rows().get(index).map(|row| row.id)
    }

    fn button_at(&self, position: Position) -> Option<usize> {
        let dialog = self.dialog.as_ref()?;
        let labels = self.button_labels(dialog);
        let modal = modal_area(self.area);
        button_areas(modal, &labels)
            .iter()
            .position(|rect| rect.contains(position))
    }

    /// Labels for the dialog's buttons, in slot order.
    pub fn button_labels(&self, dialog: &Dialog) -> [&str; 4] {
        (*dialog.buttons()).map(|choice| match choice {
            Choice::Confirm => self.labels.confirm_label.as_str(),
            Choice::Cancel => self.labels.cancel_label.as_str(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::Signal;
    use crate::test_support::{START_LINE, parse_lines};

    const PROMPT: &str = "Do you want to perform these actions?";

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn plan_app() -> App {
        let outcome = parse_lines(&[
            START_LINE,
            "  # note",
            "  resource \"a\" {",
            "    tags = {",
            "      k = v",
            "    }",
            "  }",
            "  resource \"b\" {",
            "    id = 1",
            "  }",
            PROMPT,
        ]);
        let Signal::Prompt(prompt) = outcome.signal else {
            panic!("expected prompt, got {:?}", outcome.signal);
        };
        App::new(outcome.tree, Some(prompt), &PlantreeConfig::default())
            .with_rng(StdRng::seed_from_u64(11))
    }

    fn top(app: &App, index: usize) -> NodeId {
        app.tree.children(app.tree.root())[index]
    }

    fn focused_text(app: &App) -> &str {
        &app.tree.node(app.focus.expect("focus")).text
    }

    #[test]
    fn initial_focus_is_first_block() {
        let app = plan_app();
        assert_eq!(focused_text(&app), "  resource \"a\" {...}");
        assert!(app.has_prompt());
        let confirm = top(&app, 3);
        assert_eq!(app.tree.node(confirm).kind, NodeKind::Confirm);
        assert_eq!(app.tree.node(confirm).text, PROMPT);
    }

    #[test]
    fn down_skips_unselectable_rows() {
        let mut app = plan_app();
        app.on_key(key(KeyCode::Down));
        assert_eq!(focused_text(&app), "  resource \"b\" {...}");
        app.on_key(key(KeyCode::Down));
        assert_eq!(focused_text(&app), PROMPT);
        app.on_key(key(KeyCode::Down));
        assert_eq!(focused_text(&app), PROMPT);
        app.on_key(key(KeyCode::Home));
        assert_eq!(focused_text(&app), "  resource \"a\" {...}");
    }

    #[test]
    fn right_expands_then_descends_and_left_climbs_back() {
        let mut app = plan_app();
        let a = top(&app, 1);
        app.on_key(key(KeyCode::Right));
        assert!(app.tree.node(a).expanded);
        assert_eq!(app.tree.node(a).text, "  resource \"a\" {");

        app.on_key(key(KeyCode::Right));
        assert_eq!(focused_text(&app), "    tags = {...}");

        app.on_key(key(KeyCode::Left));
        assert_eq!(app.focus, Some(a));
        app.on_key(key(KeyCode::Left));
        assert!(!app.tree.node(a).expanded);
        assert_eq!(app.tree.node(a).text, "  resource \"a\" {...}");

        // top-level node never climbs to the hidden root
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.focus, Some(a));
    }

    #[test]
    fn enter_toggles_focused_block() {
        let mut app = plan_app();
        let a = top(&app, 1);
        app.on_key(key(KeyCode::Enter));
        assert!(app.tree.node(a).expanded);
        app.on_key(key(KeyCode::Enter));
        assert!(!app.tree.node(a).expanded);
    }

    #[test]
    fn escape_closes_dialog_without_action() {
        let mut app = plan_app();
        app.on_key(key(KeyCode::End));
        assert_eq!(app.on_key(key(KeyCode::Enter)), AppAction::None);
        assert!(app.dialog.is_some());

        assert_eq!(app.on_key(key(KeyCode::Esc)), AppAction::None);
        assert!(app.dialog.is_none());
        assert_eq!(focused_text(&app), PROMPT);
    }

    #[test]
    fn pressing_the_confirm_button_confirms() {
        let mut app = plan_app();
        app.on_key(key(KeyCode::End));
        app.on_key(key(KeyCode::Enter));
        let confirm = app
            .dialog
            .as_ref()
            .expect("dialog")
            .buttons()
            .iter()
            .position(|&choice| choice == Choice::Confirm)
            .expect("confirm button");
        assert_ne!(confirm, 0);
        for _ in 0..confirm {
            app.on_key(key(KeyCode::Tab));
        }
        assert_eq!(app.on_key(key(KeyCode::Enter)), AppAction::Confirm);
    }

    #[test]
    fn pressing_a_cancel_button_returns_to_tree() {
        let mut app = plan_app();
        app.on_key(key(KeyCode::End));
        app.on_key(key(KeyCode::Enter));
        // slot 0 is always a cancel button
        assert_eq!(app.on_key(key(KeyCode::Enter)), AppAction::None);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let mut app = plan_app();
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), AppAction::Quit);
        app.on_key(key(KeyCode::End));
        app.on_key(key(KeyCode::Enter));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(ctrl_c), AppAction::Quit);
    }

    #[test]
    fn clicking_rows_focuses_and_toggles() {
        let mut app = plan_app();
        app.set_area(Rect::new(0, 0, 80, 24));
        // rows: note, resource a, resource b, prompt
        let b = top(&app, 2);
        app.on_mouse(click(5, 2));
        assert_eq!(app.focus, Some(b));
        assert!(app.tree.node(b).expanded);

        // the note row is not selectable
        app.on_mouse(click(5, 0));
        assert_eq!(app.focus, Some(b));
    }

    #[test]
    fn clicking_the_confirm_button_confirms() {
        let mut app = plan_app();
        app.set_area(Rect::new(0, 0, 80, 24));
        app.on_mouse(click(5, 3));
        let dialog = app.dialog.clone().expect("dialog opened by click");
        let labels = app.button_labels(&dialog);
        let areas = button_areas(modal_area(app.area), &labels);
        let confirm = dialog
            .buttons()
            .iter()
            .position(|&choice| choice == Choice::Confirm)
            .expect("confirm button");
        let target = areas[confirm];
        assert_eq!(
            app.on_mouse(click(target.x + 1, target.y)),
            AppAction::Confirm
        );
    }

    #[test]
    fn plan_without_prompt_has_no_confirm_node() {
        let outcome = parse_lines(&[START_LINE, "  a {", "  }"]);
        let mut app = App::new(outcome.tree, None, &PlantreeConfig::default());
        assert!(!app.has_prompt());
        app.on_key(key(KeyCode::End));
        app.on_key(key(KeyCode::Enter));
        assert!(app.dialog.is_none());
    }
}
