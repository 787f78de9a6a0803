//! Confirmation dialog protocol.
//!
//! The dialog shows four buttons. Slot 0 always cancels; slots 1-3 hold two
//! more cancels and the single confirm, shuffled on every construction so
//! the confirm button never sits in a habitual position.

use rand::Rng;
use rand::seq::SliceRandom;

pub const BUTTON_COUNT: usize = 4;

/// What a button (or key) does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Confirm,
    Cancel,
}

/// Button layout with a fixed cancel in slot 0.
pub fn button_layout<R: Rng + ?Sized>(rng: &mut R) -> [Choice; BUTTON_COUNT] {
    let mut buttons = [Choice::Cancel, Choice::Cancel, Choice::Cancel, Choice::Confirm];
    buttons[1..].shuffle(rng);
    buttons
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    prompt: String,
    buttons: [Choice; BUTTON_COUNT],
    focus: usize,
}

impl Dialog {
    pub fn new<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> Self {
        Self {
            prompt: prompt.to_string(),
            buttons: button_layout(rng),
            focus: 0,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn buttons(&self) -> &[Choice; BUTTON_COUNT] {
        &self.buttons
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % BUTTON_COUNT;
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + BUTTON_COUNT - 1) % BUTTON_COUNT;
    }

    /// Choice of the button at `index`, if there is one.
    pub fn press(&self, index: usize) -> Option<Choice> {
        self.buttons.get(index).copied()
    }

    pub fn press_focused(&self) -> Choice {
        self.buttons[self.focus]
    }

    /// Explicit cancel input; no button fires.
    pub fn escape(&self) -> Choice {
        Choice::Cancel
    }
}
