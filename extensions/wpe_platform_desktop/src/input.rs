//! Desktop input conversion (winit -> wpe_platform)

use std::time::{Duration, Instant};
use winit::dpi::PhysicalPosition;
use winit::event::{
    ElementState, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, Touch,
    TouchPhase as WinitTouchPhase,
};
use winit::keyboard::{Key as WinitKey, ModifiersState, NamedKey};
use wpe_platform::{
    button, InputEvent, InputSource, Modifiers, PointerMotion, PressState, TouchPhase,
};

/// Presses closer together than this count as one multi-click
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(400);
/// Maximum pointer travel between presses of a multi-click, in logical pixels
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;
/// Click counts cycle back to 1 after a triple click
const MAX_CLICK_COUNT: u32 = 3;

/// Convert winit mouse button to an engine button number
pub fn convert_mouse_button(button: WinitMouseButton) -> u32 {
    match button {
        WinitMouseButton::Left => button::PRIMARY,
        WinitMouseButton::Middle => button::MIDDLE,
        WinitMouseButton::Right => button::SECONDARY,
        WinitMouseButton::Back => button::BACK,
        WinitMouseButton::Forward => button::FORWARD,
        WinitMouseButton::Other(n) => u32::from(n),
    }
}

/// Convert winit element state to an engine press state
pub fn convert_press_state(state: ElementState) -> PressState {
    match state {
        ElementState::Pressed => PressState::Pressed,
        ElementState::Released => PressState::Released,
    }
}

/// Convert winit modifiers to engine modifiers
///
/// winit does not report the caps-lock state, so `CAPS_LOCK` is never set.
pub fn convert_modifiers(modifiers: ModifiersState) -> Modifiers {
    let mut result = Modifiers::NONE;
    result.set(Modifiers::SHIFT, modifiers.shift_key());
    result.set(Modifiers::CONTROL, modifiers.control_key());
    result.set(Modifiers::ALT, modifiers.alt_key());
    result.set(Modifiers::META, modifiers.super_key());
    result
}

/// Convert a winit key to an XKB keysym
///
/// Characters map to their Latin-1 keysym or to the Unicode keysym range.
/// Unknown keys map to 0.
pub fn convert_key(key: &WinitKey) -> u32 {
    match key {
        WinitKey::Named(named) => match named {
            // Special keys
            NamedKey::Space => 0x0020,
            NamedKey::Enter => 0xff0d,
            NamedKey::Escape => 0xff1b,
            NamedKey::Backspace => 0xff08,
            NamedKey::Tab => 0xff09,
            NamedKey::Delete => 0xffff,
            NamedKey::Insert => 0xff63,
            NamedKey::Home => 0xff50,
            NamedKey::End => 0xff57,
            NamedKey::PageUp => 0xff55,
            NamedKey::PageDown => 0xff56,

            // Arrow keys
            NamedKey::ArrowLeft => 0xff51,
            NamedKey::ArrowUp => 0xff52,
            NamedKey::ArrowRight => 0xff53,
            NamedKey::ArrowDown => 0xff54,

            // Modifier keys
            NamedKey::Shift => 0xffe1,
            NamedKey::Control => 0xffe3,
            NamedKey::CapsLock => 0xffe5,
            NamedKey::Alt => 0xffe9,
            NamedKey::Super => 0xffeb,

            // Function keys
            NamedKey::F1 => 0xffbe,
            NamedKey::F2 => 0xffbf,
            NamedKey::F3 => 0xffc0,
            NamedKey::F4 => 0xffc1,
            NamedKey::F5 => 0xffc2,
            NamedKey::F6 => 0xffc3,
            NamedKey::F7 => 0xffc4,
            NamedKey::F8 => 0xffc5,
            NamedKey::F9 => 0xffc6,
            NamedKey::F10 => 0xffc7,
            NamedKey::F11 => 0xffc8,
            NamedKey::F12 => 0xffc9,

            _ => 0,
        },
        WinitKey::Character(c) => match c.chars().next() {
            Some(ch) if (ch as u32) < 0x100 => ch as u32,
            Some(ch) => 0x0100_0000 | ch as u32,
            None => 0,
        },
        _ => 0,
    }
}

/// Counts presses of the same button close together in time and space
#[derive(Debug, Default)]
pub struct ClickCounter {
    last: Option<(u32, Instant, (f64, f64))>,
    count: u32,
}

impl ClickCounter {
    /// Register a press; returns its click count
    pub fn press(&mut self, button: u32, at: Instant, position: (f64, f64)) -> u32 {
        let continues = self.last.is_some_and(|(last_button, last_at, last_position)| {
            last_button == button
                && at.saturating_duration_since(last_at) <= DOUBLE_CLICK_TIME
                && (position.0 - last_position.0).abs() <= DOUBLE_CLICK_DISTANCE
                && (position.1 - last_position.1).abs() <= DOUBLE_CLICK_DISTANCE
        });

        self.count = if continues && self.count < MAX_CLICK_COUNT {
            self.count + 1
        } else {
            1
        };
        self.last = Some((button, at, position));
        self.count
    }
}

/// Stateful winit to engine input translation for one window
#[derive(Debug)]
pub struct InputTranslator {
    start: Instant,
    keyboard: Modifiers,
    buttons: Modifiers,
    scale_factor: f64,
    position: Option<(f64, f64)>,
    clicks: ClickCounter,
}

impl InputTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            start: Instant::now(),
            keyboard: Modifiers::NONE,
            buttons: Modifiers::NONE,
            scale_factor,
            position: None,
            clicks: ClickCounter::default(),
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Record new keyboard modifiers; returns them in engine form
    pub fn set_modifiers(&mut self, modifiers: ModifiersState) -> Modifiers {
        self.keyboard = convert_modifiers(modifiers);
        self.keyboard
    }

    /// Keyboard modifiers plus held pointer buttons
    pub fn modifiers(&self) -> Modifiers {
        self.keyboard | self.buttons
    }

    fn time(&self) -> u32 {
        // wraps after ~49 days, like X server timestamps
        self.start.elapsed().as_millis() as u32
    }

    fn position(&self) -> (f64, f64) {
        self.position.unwrap_or((0.0, 0.0))
    }

    fn pointer(&self, motion: PointerMotion, delta: (f64, f64)) -> InputEvent {
        let (x, y) = self.position();
        InputEvent::Pointer {
            motion,
            source: InputSource::Mouse,
            time: self.time(),
            modifiers: self.modifiers(),
            x,
            y,
            delta_x: delta.0,
            delta_y: delta.1,
        }
    }

    pub fn cursor_entered(&mut self) -> InputEvent {
        self.pointer(PointerMotion::Enter, (0.0, 0.0))
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> InputEvent {
        let logical = position.to_logical::<f64>(self.scale_factor);
        let current = (logical.x, logical.y);
        let delta = match self.position {
            Some(previous) => (current.0 - previous.0, current.1 - previous.1),
            None => (0.0, 0.0),
        };
        self.position = Some(current);
        self.pointer(PointerMotion::Move, delta)
    }

    pub fn cursor_left(&mut self) -> InputEvent {
        let event = self.pointer(PointerMotion::Leave, (0.0, 0.0));
        self.position = None;
        event
    }

    pub fn mouse_input(&mut self, state: ElementState, button: WinitMouseButton) -> InputEvent {
        let button = convert_mouse_button(button);
        let state = convert_press_state(state);
        // modifiers describe the state before this event
        let modifiers = self.modifiers();
        let position = self.position();

        let press_count = match state {
            PressState::Pressed => self.clicks.press(button, Instant::now(), position),
            PressState::Released => 0,
        };
        if let Some(mask) = Modifiers::for_button(button) {
            self.buttons.set(mask, state == PressState::Pressed);
        }

        InputEvent::Button {
            state,
            source: InputSource::Mouse,
            time: self.time(),
            modifiers,
            button,
            x: position.0,
            y: position.1,
            press_count,
        }
    }

    pub fn mouse_wheel(&mut self, delta: MouseScrollDelta, phase: WinitTouchPhase) -> InputEvent {
        let (source, delta_x, delta_y, precise_deltas) = match delta {
            MouseScrollDelta::LineDelta(x, y) => (InputSource::Mouse, x as f64, y as f64, false),
            MouseScrollDelta::PixelDelta(pos) => {
                let logical = pos.to_logical::<f64>(self.scale_factor);
                (InputSource::Touchpad, logical.x, logical.y, true)
            }
        };
        let (x, y) = self.position();
        InputEvent::Scroll {
            source,
            time: self.time(),
            modifiers: self.modifiers(),
            delta_x,
            delta_y,
            precise_deltas,
            is_stop: matches!(phase, WinitTouchPhase::Ended | WinitTouchPhase::Cancelled),
            x,
            y,
        }
    }

    /// Translate a key press or release
    pub fn key(&mut self, state: ElementState, key: &WinitKey, keycode: u32) -> InputEvent {
        InputEvent::Keyboard {
            state: convert_press_state(state),
            source: InputSource::Keyboard,
            time: self.time(),
            modifiers: self.modifiers(),
            keycode,
            keyval: convert_key(key),
        }
    }

    pub fn keyboard_input(&mut self, event: &KeyEvent) -> InputEvent {
        self.key(event.state, &event.logical_key, scancode(event))
    }

    pub fn touch(&mut self, touch: &Touch) -> InputEvent {
        let logical = touch.location.to_logical::<f64>(self.scale_factor);
        let phase = match touch.phase {
            WinitTouchPhase::Started => TouchPhase::Down,
            WinitTouchPhase::Moved => TouchPhase::Move,
            WinitTouchPhase::Ended => TouchPhase::Up,
            WinitTouchPhase::Cancelled => TouchPhase::Cancel,
        };
        InputEvent::Touch {
            phase,
            time: self.time(),
            modifiers: self.modifiers(),
            sequence_id: touch.id,
            x: logical.x,
            y: logical.y,
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "windows", target_os = "macos"))]
fn scancode(event: &KeyEvent) -> u32 {
    use winit::platform::scancode::PhysicalKeyExtScancode;
    event.physical_key.to_scancode().unwrap_or(0)
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
fn scancode(_event: &KeyEvent) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons() {
        assert_eq!(convert_mouse_button(WinitMouseButton::Left), 1);
        assert_eq!(convert_mouse_button(WinitMouseButton::Middle), 2);
        assert_eq!(convert_mouse_button(WinitMouseButton::Right), 3);
        assert_eq!(convert_mouse_button(WinitMouseButton::Back), 8);
        assert_eq!(convert_mouse_button(WinitMouseButton::Other(12)), 12);
    }

    #[test]
    fn test_modifiers() {
        let mods = convert_modifiers(ModifiersState::SHIFT | ModifiersState::SUPER);
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::META);
    }

    #[test]
    fn test_keysyms() {
        assert_eq!(convert_key(&WinitKey::Named(NamedKey::Enter)), 0xff0d);
        assert_eq!(convert_key(&WinitKey::Character("a".into())), 'a' as u32);
        assert_eq!(convert_key(&WinitKey::Character("é".into())), 0xe9);
        assert_eq!(convert_key(&WinitKey::Character("€".into())), 0x0100_20ac);
        assert_eq!(convert_key(&WinitKey::Named(NamedKey::MediaPlay)), 0);
    }

    #[test]
    fn test_click_counting() {
        let mut clicks = ClickCounter::default();
        let t0 = Instant::now();
        assert_eq!(clicks.press(1, t0, (10.0, 10.0)), 1);
        assert_eq!(clicks.press(1, t0 + Duration::from_millis(200), (12.0, 10.0)), 2);
        assert_eq!(clicks.press(1, t0 + Duration::from_millis(400), (12.0, 11.0)), 3);
        assert_eq!(clicks.press(1, t0 + Duration::from_millis(500), (12.0, 11.0)), 1);

        // too slow, too far, other button
        assert_eq!(clicks.press(1, t0 + Duration::from_secs(2), (12.0, 11.0)), 1);
        assert_eq!(clicks.press(1, t0 + Duration::from_millis(2100), (40.0, 11.0)), 1);
        assert_eq!(clicks.press(3, t0 + Duration::from_millis(2200), (40.0, 11.0)), 1);
    }

    #[test]
    fn test_motion_deltas_in_logical_pixels() {
        let mut input = InputTranslator::new(2.0);
        input.cursor_moved(PhysicalPosition::new(20.0, 40.0));
        match input.cursor_moved(PhysicalPosition::new(30.0, 30.0)) {
            InputEvent::Pointer {
                motion,
                x,
                y,
                delta_x,
                delta_y,
                ..
            } => {
                assert_eq!(motion, PointerMotion::Move);
                assert_eq!((x, y), (15.0, 15.0));
                assert_eq!((delta_x, delta_y), (5.0, -5.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_button_press_and_release() {
        let mut input = InputTranslator::new(1.0);
        input.cursor_moved(PhysicalPosition::new(5.0, 6.0));

        let press = input.mouse_input(ElementState::Pressed, WinitMouseButton::Left);
        assert!(matches!(
            press,
            InputEvent::Button {
                state: PressState::Pressed,
                button: 1,
                press_count: 1,
                modifiers,
                ..
            } if modifiers.is_empty()
        ));
        assert_eq!(input.modifiers(), Modifiers::BUTTON1);

        let release = input.mouse_input(ElementState::Released, WinitMouseButton::Left);
        assert!(matches!(
            release,
            InputEvent::Button {
                state: PressState::Released,
                press_count: 0,
                modifiers,
                ..
            } if modifiers == Modifiers::BUTTON1
        ));
        assert_eq!(input.modifiers(), Modifiers::NONE);
        assert_eq!(release.position(), Some((5.0, 6.0)));
    }

    #[test]
    fn test_scroll() {
        let mut input = InputTranslator::new(1.0);
        let wheel =
            input.mouse_wheel(MouseScrollDelta::LineDelta(0.0, -1.0), WinitTouchPhase::Moved);
        assert!(matches!(
            wheel,
            InputEvent::Scroll {
                source: InputSource::Mouse,
                precise_deltas: false,
                is_stop: false,
                ..
            }
        ));

        let end = input.mouse_wheel(
            MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 3.0)),
            WinitTouchPhase::Ended,
        );
        assert!(matches!(
            end,
            InputEvent::Scroll {
                source: InputSource::Touchpad,
                precise_deltas: true,
                is_stop: true,
                ..
            }
        ));
    }

    #[test]
    fn test_key_carries_modifiers() {
        let mut input = InputTranslator::new(1.0);
        input.set_modifiers(ModifiersState::CONTROL);
        let event = input.key(ElementState::Pressed, &WinitKey::Character("c".into()), 46);
        assert!(matches!(
            event,
            InputEvent::Keyboard {
                state: PressState::Pressed,
                modifiers,
                keycode: 46,
                keyval: 0x63,
                ..
            } if modifiers == Modifiers::CONTROL
        ));
    }
}
