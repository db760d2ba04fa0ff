//! WPE Platform Abstraction Layer
//!
//! This crate provides the engine-facing types and traits a browser engine
//! uses to render into, and receive input from, a host windowing system.
//!
//! # Architecture
//!
//! The abstraction is built around four role traits:
//!
//! - [`Display`] - connection to the host, screens, GPU device identity
//! - [`View`] - a renderable surface that frame buffers are presented to
//! - [`Toplevel`] - the host window a view is mounted in
//! - [`Keymap`] - keyboard state
//!
//! The platform reports back to the engine through [`ViewEvent`] and
//! [`ToplevelEvent`] values delivered to an [`EventSink`].
//!
//! # Platform Implementations
//!
//! - `wpe_platform_desktop` - desktop windows using winit
//!
//! # Example
//!
//! ```ignore
//! use wpe_platform::prelude::*;
//!
//! fn present(view: &impl View, buffer: &FrameBuffer) {
//!     match view.render_buffer(buffer, &[]) {
//!         Ok(()) => {}
//!         Err(e) if e.is_transient() => { /* retry with the next frame */ }
//!         Err(e) => tracing::warn!("giving up on view: {e}"),
//!     }
//! }
//! ```

mod buffer;
mod cursor;
mod error;
mod event;
mod input;
mod platform;
mod screen;
mod state;

// Re-export all public types
pub use buffer::{
    fourcc, BufferId, BufferKind, DmaBufDescriptor, DmaBufFormat, DmaBufPlane, FrameBuffer,
    RawFd, Rect, ShmDescriptor, DRM_FORMAT_ARGB8888, DRM_FORMAT_MOD_LINEAR, DRM_FORMAT_XRGB8888,
};
pub use cursor::{Cursor, CursorImage};
pub use error::{PlatformError, Result, ViewError};
pub use event::{ControlFlow, EventQueue, EventSink, ToplevelEvent, ViewEvent};
pub use input::{
    button, InputEvent, InputSource, Modifiers, PointerMotion, PressState, TouchPhase,
};
pub use platform::{Display, Keymap, Toplevel, View};
pub use screen::{MonitorId, Screen};
pub use state::ViewState;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::buffer::{BufferKind, DmaBufDescriptor, DmaBufPlane, FrameBuffer, Rect};
    pub use crate::cursor::{Cursor, CursorImage};
    pub use crate::error::{PlatformError, Result, ViewError};
    pub use crate::event::{ControlFlow, EventQueue, EventSink, ToplevelEvent, ViewEvent};
    pub use crate::input::{InputEvent, InputSource, Modifiers, PressState};
    pub use crate::platform::{Display, Keymap, Toplevel, View};
    pub use crate::screen::{MonitorId, Screen};
    pub use crate::state::ViewState;
}
