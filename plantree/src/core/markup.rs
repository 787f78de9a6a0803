//! Translation between ANSI SGR escapes and the tree's inline markup.
//!
//! Node text stores colors as bracketed markup tokens (`[green]`, `[::b]`,
//! `[-:-:-]`) so that suffix rewriting can work on plain string ends. The
//! renderer turns the markup back into styled segments with
//! [`parse_markup`]. Escapes missing from the table are left in the text.

/// Foreground colors the markup can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
    DarkGray,
    LightRed,
    LightGreen,
    LightYellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    White,
}

/// Style in effect for a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupStyle {
    pub fg: Option<MarkupColor>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: MarkupStyle,
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Fg(MarkupColor),
    Bold,
    Italic,
    Underline,
    Reset,
}

const TABLE: [(&str, &str, Token); 20] = [
    ("\x1b[30m", "[black]", Token::Fg(MarkupColor::Black)),
    ("\x1b[31m", "[red]", Token::Fg(MarkupColor::Red)),
    ("\x1b[32m", "[green]", Token::Fg(MarkupColor::Green)),
    ("\x1b[33m", "[yellow]", Token::Fg(MarkupColor::Yellow)),
    ("\x1b[34m", "[blue]", Token::Fg(MarkupColor::Blue)),
    ("\x1b[35m", "[magenta]", Token::Fg(MarkupColor::Magenta)),
    ("\x1b[36m", "[cyan]", Token::Fg(MarkupColor::Cyan)),
    ("\x1b[37m", "[gray]", Token::Fg(MarkupColor::Gray)),
    ("\x1b[90m", "[darkgray]", Token::Fg(MarkupColor::DarkGray)),
    ("\x1b[91m", "[lightred]", Token::Fg(MarkupColor::LightRed)),
    ("\x1b[92m", "[lightgreen]", Token::Fg(MarkupColor::LightGreen)),
    ("\x1b[93m", "[lightyellow]", Token::Fg(MarkupColor::LightYellow)),
    ("\x1b[94m", "[lightblue]", Token::Fg(MarkupColor::LightBlue)),
    ("\x1b[95m", "[lightmagenta]", Token::Fg(MarkupColor::LightMagenta)),
    ("\x1b[96m", "[lightcyan]", Token::Fg(MarkupColor::LightCyan)),
    ("\x1b[97m", "[white]", Token::Fg(MarkupColor::White)),
    ("\x1b[1m", "[::b]", Token::Bold),
    ("\x1b[3m", "[::i]", Token::Italic),
    ("\x1b[4m", "[::u]", Token::Underline),
    ("\x1b[0m", "[-:-:-]", Token::Reset),
];

/// Replace every recognized escape with its markup token in one pass.
pub fn ansi_to_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(pos) = rest.find('\x1b') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match TABLE.iter().find(|(escape, _, _)| rest.starts_with(escape)) {
            Some((escape, markup, _)) => {
                out.push_str(markup);
                rest = &rest[escape.len()..];
            }
            None => {
                out.push('\x1b');
                rest = &rest['\x1b'.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Split markup text into styled segments.
///
/// Only the exact tokens produced by [`ansi_to_markup`] are interpreted;
/// any other bracketed text is kept literally.
pub fn parse_markup(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut style = MarkupStyle::default();
    let mut current = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find('[') {
        current.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match TABLE.iter().find(|(_, markup, _)| rest.starts_with(markup)) {
            Some((_, markup, token)) => {
                if !current.is_empty() {
                    segments.push(Segment {
                        text: std::mem::take(&mut current),
                        style,
                    });
                }
                apply(&mut style, *token);
                rest = &rest[markup.len()..];
            }
            None => {
                current.push('[');
                rest = &rest[1..];
            }
        }
    }
    current.push_str(rest);
    if !current.is_empty() {
        segments.push(Segment {
            text: current,
            style,
        });
    }
    segments
}

fn apply(style: &mut MarkupStyle, token: Token) {
    match token {
        Token::Fg(color) => style.fg = Some(color),
        Token::Bold => style.bold = true,
        Token::Italic => style.italic = true,
        Token::Underline => style.underline = true,
        Token::Reset => *style = MarkupStyle::default(),
    }
}
