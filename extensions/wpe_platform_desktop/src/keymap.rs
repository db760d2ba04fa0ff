//! Keyboard state for the desktop display

use std::cell::Cell;
use wpe_platform::{Keymap, Modifiers};

/// Tracks the modifier state reported by the host keyboard
#[derive(Debug, Default)]
pub struct DesktopKeymap {
    modifiers: Cell<Modifiers>,
}

impl DesktopKeymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_modifiers(&self, modifiers: Modifiers) {
        self.modifiers.set(modifiers.keyboard());
    }
}

impl Keymap for DesktopKeymap {
    fn modifiers(&self) -> Modifiers {
        self.modifiers.get()
    }
}
