//! Drawing of the tree pane, the footer and the confirmation modal.
//!
//! Geometry helpers are shared with mouse hit testing in [`super::app`], so
//! what is drawn and what is clickable always agree.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::core::dialog::BUTTON_COUNT;
use crate::core::markup::{MarkupColor, MarkupStyle, parse_markup};
use crate::core::tree::{NodeKind, Row};
use crate::ui::app::App;

const MODAL_WIDTH: u16 = 64;
const MODAL_HEIGHT: u16 = 7;
const BUTTON_GAP: u16 = 2;

const TREE_HINTS: &str = "↑/↓ move  ←/→ collapse/expand  enter toggle  q quit";
const PROMPT_HINTS: &str = "↑/↓ move  ←/→ collapse/expand  enter toggle or answer  q quit";
const DIALOG_HINTS: &str = "←/→ choose  enter press  esc back";

/// Split the screen into the tree pane and a one-line footer.
pub fn screen_layout(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area)
}

/// Centered rectangle of the confirmation modal.
pub fn modal_area(area: Rect) -> Rect {
    let width = area.width.min(MODAL_WIDTH);
    let height = area.height.min(MODAL_HEIGHT);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Button rectangles on the modal's last inner row, centered as a group.
pub fn button_areas(modal: Rect, labels: &[&str; BUTTON_COUNT]) -> [Rect; BUTTON_COUNT] {
    let widths = (*labels).map(|label| {
        u16::try_from(label.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(4)
    });
    let total = widths
        .iter()
        .fold(BUTTON_GAP * (BUTTON_COUNT as u16 - 1), |sum, &w| sum.saturating_add(w));
    let y = modal.y + modal.height.saturating_sub(2);
    let mut x = modal.x + modal.width.saturating_sub(total) / 2;
    widths.map(|width| {
        let rect = Rect::new(x, y, width, 1).intersection(modal);
        x = x.saturating_add(width + BUTTON_GAP);
        rect
    })
}

/// Draw one frame.
pub fn ui(frame: &mut Frame<'_>, app: &mut App) {
    app.set_area(frame.area());
    let [tree_area, footer_area] = screen_layout(frame.area());

    render_tree(frame, tree_area, app);

    let hints = if app.dialog.is_some() {
        DIALOG_HINTS
    } else if app.has_prompt() {
        PROMPT_HINTS
    } else {
        TREE_HINTS
    };
    let footer = Paragraph::new(hints).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(footer, footer_area);

    if app.dialog.is_some() {
        render_dialog(frame, app);
    }
}

fn render_tree(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let rows = app.visible_rows();
    let lines: Vec<Line<'static>> = rows
        .iter()
        .skip(app.scroll_offset)
        .take(usize::from(area.height))
        .map(|row| row_line(app, row))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn row_line(app: &App, row: &Row) -> Line<'static> {
    let node = app.tree.node(row.id);
    let mut spans = vec![Span::raw("  ".repeat(row.depth))];
    spans.extend(
        parse_markup(&node.text)
            .into_iter()
            .map(|segment| Span::styled(segment.text, markup_style(segment.style))),
    );

    let mut style = Style::default();
    if node.kind == NodeKind::Confirm {
        style = style.add_modifier(Modifier::BOLD);
    }
    if app.focus == Some(row.id) {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Line::from(spans).style(style)
}

fn render_dialog(frame: &mut Frame<'_>, app: &App) {
    let Some(dialog) = app.dialog.as_ref() else {
        return;
    };
    let modal = modal_area(frame.area());
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(modal);
    frame.render_widget(block, modal);

    let prompt_area = Rect {
        height: inner.height.saturating_sub(2),
        ..inner
    };
    let prompt = Paragraph::new(dialog.prompt().to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(prompt, prompt_area);

    let labels = app.button_labels(dialog);
    for (index, rect) in button_areas(modal, &labels).into_iter().enumerate() {
        let style = if index == dialog.focus() {
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::UNDERLINED)
        };
        let button = Paragraph::new(format!("  {}  ", labels[index]))
            .style(style)
            .alignment(Alignment::Center);
        frame.render_widget(button, rect);
    }
}

fn markup_style(markup: MarkupStyle) -> Style {
    let mut style = Style::default();
    if let Some(color) = markup.fg {
        style = style.fg(markup_color(color));
    }
    if markup.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if markup.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if markup.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

fn markup_color(color: MarkupColor) -> Color {
    match color {
        MarkupColor::Black => Color::Black,
        MarkupColor::Red => Color::Red,
        MarkupColor::Green => Color::Green,
        MarkupColor::Yellow => Color::Yellow,
        MarkupColor::Blue => Color::Blue,
        MarkupColor::Magenta => Color::Magenta,
        MarkupColor::Cyan => Color::Cyan,
        MarkupColor::Gray => Color::Gray,
        MarkupColor::DarkGray => Color::DarkGray,
        MarkupColor::LightRed => Color::LightRed,
        MarkupColor::LightGreen => Color::LightGreen,
        MarkupColor::LightYellow => Color::LightYellow,
        MarkupColor::LightBlue => Color::LightBlue,
        MarkupColor::LightMagenta => Color::LightMagenta,
        MarkupColor::LightCyan => Color::LightCyan,
        MarkupColor::White => Color::White,
    }
}
