//! View and toplevel state flags

use bitflags::bitflags;

bitflags! {
    /// State of a view, mirrored from its toplevel window
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ViewState: u32 {
        /// No flags set
        const NONE = 0;
        /// The toplevel covers its whole screen
        const FULLSCREEN = 1 << 0;
        /// The toplevel is maximized
        const MAXIMIZED = 1 << 1;
        /// The toplevel has keyboard focus
        const ACTIVE = 1 << 2;
    }
}

impl ViewState {
    pub fn is_fullscreen(self) -> bool {
        self.contains(ViewState::FULLSCREEN)
    }

    pub fn is_maximized(self) -> bool {
        self.contains(ViewState::MAXIMIZED)
    }

    pub fn is_active(self) -> bool {
        self.contains(ViewState::ACTIVE)
    }
}
