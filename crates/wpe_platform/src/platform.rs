//! Platform role traits
//!
//! The engine talks to a platform through one trait per role. A platform
//! backend provides exactly one implementation of each.

use crate::buffer::{DmaBufFormat, FrameBuffer, Rect};
use crate::cursor::{Cursor, CursorImage};
use crate::error::ViewError;
use crate::input::Modifiers;
use crate::screen::Screen;
use crate::state::ViewState;
use std::rc::Rc;

/// Connection to the host windowing system
pub trait Display {
    /// The view type created by this display
    type View: View<Toplevel = Self::Toplevel>;
    /// The toplevel type views are bound to
    type Toplevel: Toplevel;
    /// The keymap type for this display
    type Keymap: Keymap;

    /// Get the platform name
    ///
    /// Returns a string like "desktop".
    fn name(&self) -> &'static str;

    /// Create a new view bound to this display
    fn create_view(&self) -> Self::View;

    /// The keymap, created on first use and cached afterwards
    fn keymap(&self) -> Rc<Self::Keymap>;

    /// Number of screens currently connected
    fn n_screens(&self) -> usize;

    /// Screen at `index`, in host order
    fn screen(&self, index: usize) -> Option<Screen>;

    /// Path of the primary DRM device node, if the GPU exposes it
    fn drm_device(&self) -> Option<String>;

    /// Path of the DRM render node, if the GPU exposes it
    fn drm_render_node(&self) -> Option<String>;

    /// DMA-BUF formats the host can import, best first
    fn preferred_dma_buf_formats(&self) -> Vec<DmaBufFormat>;
}

/// A renderable surface embedded in a toplevel
///
/// Operations that need a toplevel report "unavailable" (`false` / `None`)
/// while the view is not mounted in one.
pub trait View {
    type Toplevel: Toplevel;

    /// Present a frame buffer; `damage` lists the regions that changed since
    /// the previous frame (empty means the whole buffer)
    fn render_buffer(&self, buffer: &FrameBuffer, damage: &[Rect]) -> Result<(), ViewError>;

    /// Current size in logical pixels
    fn size(&self) -> (u32, u32);

    /// Device scale factor
    fn scale(&self) -> f64;

    /// State of the toplevel the view is mounted in
    fn state(&self) -> Option<ViewState>;

    /// The toplevel the view is mounted in
    fn toplevel(&self) -> Option<Self::Toplevel>;

    /// The screen the view is currently on
    fn screen(&self) -> Option<Screen>;

    /// Request fullscreen; returns `false` when no toplevel is available
    fn set_fullscreen(&self, fullscreen: bool) -> bool;

    /// Request maximization; returns `false` when no toplevel is available
    fn set_maximized(&self, maximized: bool) -> bool;

    /// Set the cursor shown over the view
    fn set_cursor(&self, cursor: Cursor);

    /// Show a cursor drawn from pixels instead of a named shape
    fn set_cursor_from_bytes(&self, image: CursorImage);

    /// Declare which parts of the view are opaque (`None` clears the hint)
    fn set_opaque_rectangles(&self, rects: Option<&[Rect]>);
}

/// A top-level host window
pub trait Toplevel {
    /// Current state; `None` once the window is gone
    fn state(&self) -> Option<ViewState>;

    fn set_title(&self, title: &str);

    /// Request fullscreen; returns `false` when the window is gone
    fn set_fullscreen(&self, fullscreen: bool) -> bool;

    /// Request maximization; returns `false` when the window is gone
    fn set_maximized(&self, maximized: bool) -> bool;

    /// The screen the toplevel is currently on
    fn screen(&self) -> Option<Screen>;

    /// Whether the toplevel currently overlaps any screen
    fn is_in_screen(&self) -> bool;

    /// Device scale factor
    fn scale(&self) -> f64;
}

/// Keyboard state queries
pub trait Keymap {
    /// Modifiers currently held on the default keyboard
    fn modifiers(&self) -> Modifiers;
}
