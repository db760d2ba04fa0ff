//! Notifications from the platform to the engine
//!
//! Every notification is a variant of a small closed enum, delivered through
//! an [`EventSink`]. Sinks are called synchronously on the event loop thread,
//! in the order the platform produces the events.

use crate::buffer::FrameBuffer;
use crate::input::InputEvent;
use crate::state::ViewState;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Control flow after handling an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlFlow {
    /// Continue running the event loop
    #[default]
    Continue,
    /// Exit the event loop
    Exit,
}

/// View notifications
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    /// The buffer is no longer on screen; the engine may reuse or free it
    BufferReleased(FrameBuffer),
    /// The buffer was drawn for the first time
    BufferRendered(FrameBuffer),
    /// The view was resized
    Resized {
        /// New width in logical pixels
        width: u32,
        /// New height in logical pixels
        height: u32,
    },
    /// Device scale factor changed
    ScaleChanged(f64),
    /// Fullscreen/maximized/active state changed
    StateChanged(ViewState),
    /// The view moved to a different screen, or off all screens
    ScreenChanged,
    /// The view gained keyboard focus
    FocusIn,
    /// The view lost keyboard focus
    FocusOut,
    /// Translated input event
    Input(InputEvent),
    /// The view is going away; no further events follow
    Closed,
}

/// Toplevel notifications
#[derive(Clone, Debug, PartialEq)]
pub enum ToplevelEvent {
    /// Fullscreen/maximized/active state changed
    StateChanged(ViewState),
    /// The toplevel moved to a different screen, or off all screens
    ScreenChanged,
    /// Device scale factor changed
    ScaleChanged(f64),
    /// The toplevel is going away
    Closed,
}

/// Receiver of platform notifications
pub trait EventSink<E> {
    fn dispatch(&self, event: E);
}

impl<E, F> EventSink<E> for F
where
    F: Fn(E),
{
    fn dispatch(&self, event: E) {
        self(event)
    }
}

/// Single-threaded queue of events
///
/// Cloning yields another handle to the same queue. The platform pushes
/// into it from its callbacks and the engine drains it once per loop turn.
#[derive(Debug)]
pub struct EventQueue<E> {
    events: Rc<RefCell<VecDeque<E>>>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Take all queued events in delivery order
    pub fn drain(&self) -> Vec<E> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn pop(&self) -> Option<E> {
        self.events.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl<E> Clone for EventQueue<E> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventSink<E> for EventQueue<E> {
    fn dispatch(&self, event: E) {
        self.events.borrow_mut().push_back(event);
    }
}
