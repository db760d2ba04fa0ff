//! Input event types delivered to the engine

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifiers and pressed pointer buttons
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const NONE = 0;
        const CONTROL = 1 << 0;
        const SHIFT = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
        const CAPS_LOCK = 1 << 4;
        const BUTTON1 = 1 << 5;
        const BUTTON2 = 1 << 6;
        const BUTTON3 = 1 << 7;
        const BUTTON4 = 1 << 8;
        const BUTTON5 = 1 << 9;
    }
}

impl Modifiers {
    /// Modifier flag for a pointer button, if the button has one
    pub fn for_button(button: u32) -> Option<Modifiers> {
        match button {
            1 => Some(Modifiers::BUTTON1),
            2 => Some(Modifiers::BUTTON2),
            3 => Some(Modifiers::BUTTON3),
            4 => Some(Modifiers::BUTTON4),
            5 => Some(Modifiers::BUTTON5),
            _ => None,
        }
    }

    /// Only the keyboard part of the modifier set
    pub fn keyboard(self) -> Modifiers {
        self & (Modifiers::CONTROL
            | Modifiers::SHIFT
            | Modifiers::ALT
            | Modifiers::META
            | Modifiers::CAPS_LOCK)
    }
}

/// Pointer buttons, numbered the way X11 and Wayland number them
pub mod button {
    pub const PRIMARY: u32 = 1;
    pub const MIDDLE: u32 = 2;
    pub const SECONDARY: u32 = 3;
    pub const BACK: u32 = 8;
    pub const FORWARD: u32 = 9;
}

/// Device class an event originated from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputSource {
    #[default]
    Mouse,
    Pen,
    Keyboard,
    Touchscreen,
    Touchpad,
    Trackpoint,
    TabletPad,
}

/// Pointer crossing/motion kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerMotion {
    Enter,
    Move,
    Leave,
}

/// Press/release state for buttons and keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PressState {
    Pressed,
    Released,
}

/// Touch sequence phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Input events
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Pointer entered, moved over or left the view
    Pointer {
        motion: PointerMotion,
        source: InputSource,
        time: u32,
        modifiers: Modifiers,
        x: f64,
        y: f64,
        /// Movement since the previous pointer event
        delta_x: f64,
        delta_y: f64,
    },
    /// Pointer button pressed or released
    Button {
        state: PressState,
        source: InputSource,
        time: u32,
        modifiers: Modifiers,
        button: u32,
        x: f64,
        y: f64,
        /// Click count for presses, 0 for releases
        press_count: u32,
    },
    /// Wheel or touchpad scroll
    Scroll {
        source: InputSource,
        time: u32,
        modifiers: Modifiers,
        delta_x: f64,
        delta_y: f64,
        /// Deltas are in pixels rather than wheel steps
        precise_deltas: bool,
        /// Marks the end of a scroll sequence
        is_stop: bool,
        x: f64,
        y: f64,
    },
    /// Key pressed or released
    Keyboard {
        state: PressState,
        source: InputSource,
        time: u32,
        modifiers: Modifiers,
        keycode: u32,
        keyval: u32,
    },
    /// Touchscreen contact
    Touch {
        phase: TouchPhase,
        time: u32,
        modifiers: Modifiers,
        sequence_id: u64,
        x: f64,
        y: f64,
    },
}

impl InputEvent {
    /// Modifier state at the time of the event
    pub fn modifiers(&self) -> Modifiers {
        match self {
            InputEvent::Pointer { modifiers, .. }
            | InputEvent::Button { modifiers, .. }
            | InputEvent::Scroll { modifiers, .. }
            | InputEvent::Keyboard { modifiers, .. }
            | InputEvent::Touch { modifiers, .. } => *modifiers,
        }
    }

    /// Position in view coordinates, for events that have one
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            InputEvent::Pointer { x, y, .. }
            | InputEvent::Button { x, y, .. }
            | InputEvent::Scroll { x, y, .. }
            | InputEvent::Touch { x, y, .. } => Some((*x, *y)),
            InputEvent::Keyboard { .. } => None,
        }
    }
}
