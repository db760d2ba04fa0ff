//! Desktop window implementation using winit

use crate::config::DesktopConfig;
use crate::host::{HostToplevelState, HostWindow, WindowKey};
use crate::monitor::WinitDisplay;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{
    CursorIcon, CustomCursor, CustomCursorSource, Fullscreen, Window as WinitWindow,
    WindowAttributes,
};
use wpe_platform::{Cursor, CursorImage, MonitorId, Rect};

/// Desktop window wrapping a winit window
pub struct DesktopWindow {
    window: Arc<WinitWindow>,
    host: WinitDisplay,
    focused: Cell<bool>,
    transparent: bool,
    opaque_region: RefCell<Option<Vec<Rect>>>,
    // Custom cursors can only be created with the event loop at hand
    pending_cursor: RefCell<Option<CustomCursorSource>>,
}

impl DesktopWindow {
    /// Create a new desktop window
    pub fn new(
        event_loop: &ActiveEventLoop,
        host: &WinitDisplay,
        config: &DesktopConfig,
    ) -> Result<Self, winit::error::OsError> {
        let mut attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable)
            .with_decorations(config.decorations)
            .with_transparent(config.transparent)
            .with_maximized(config.maximized);

        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = event_loop.create_window(attrs)?;
        let focused = window.has_focus();

        Ok(Self {
            window: Arc::new(window),
            host: host.clone(),
            focused: Cell::new(focused),
            transparent: config.transparent,
            opaque_region: RefCell::new(None),
            pending_cursor: RefCell::new(None),
        })
    }

    /// Get the underlying winit window
    pub fn winit_window(&self) -> &WinitWindow {
        &self.window
    }

    /// Get an Arc to the winit window
    pub fn winit_window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Inner size in logical pixels
    pub fn logical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size().to_logical::<u32>(self.window.scale_factor());
        (size.width, size.height)
    }

    /// The opaque region last requested by the view
    pub fn opaque_region(&self) -> Option<Vec<Rect>> {
        self.opaque_region.borrow().clone()
    }

    /// Set focus state (called by event loop)
    pub(crate) fn set_focused(&self, focused: bool) {
        self.focused.set(focused);
    }

    /// Install a cursor image set since the last call
    pub(crate) fn flush_cursor(&self, event_loop: &ActiveEventLoop) {
        let Some(source) = self.pending_cursor.borrow_mut().take() else {
            return;
        };
        let cursor = event_loop.create_custom_cursor(source);
        self.window.set_cursor_visible(true);
        self.window.set_cursor(cursor);
    }

    fn covers_window(&self, region: &[Rect]) -> bool {
        let (width, height) = self.logical_size();
        let bounds = Rect::from_size(width as i32, height as i32);
        region.iter().any(|rect| rect.contains(&bounds))
    }
}

impl HostWindow for DesktopWindow {
    fn key(&self) -> WindowKey {
        WindowKey(u64::from(self.window.id()))
    }

    fn is_realized(&self) -> bool {
        true
    }

    fn toplevel_state(&self) -> HostToplevelState {
        let mut state = HostToplevelState::NONE;
        state.set(HostToplevelState::FULLSCREEN, self.window.fullscreen().is_some());
        state.set(HostToplevelState::MAXIMIZED, self.window.is_maximized());
        state.set(
            HostToplevelState::MINIMIZED,
            self.window.is_minimized().unwrap_or(false),
        );
        state.set(HostToplevelState::FOCUSED, self.focused.get());
        state
    }

    fn monitor_at_surface(&self) -> Option<MonitorId> {
        self.window
            .current_monitor()
            .map(|handle| self.host.monitor_id(&handle))
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn fullscreen(&self) {
        self.window
            .set_fullscreen(Some(Fullscreen::Borderless(None)));
    }

    fn unfullscreen(&self) {
        self.window.set_fullscreen(None);
    }

    fn maximize(&self) {
        self.window.set_maximized(true);
    }

    fn unmaximize(&self) {
        self.window.set_maximized(false);
    }

    fn present(&self) {
        self.window.set_visible(true);
        self.window.set_minimized(false);
        self.window.focus_window();
    }

    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    fn set_cursor(&self, cursor: Cursor) {
        let icon = match cursor {
            Cursor::Default => CursorIcon::Default,
            Cursor::Pointer => CursorIcon::Pointer,
            Cursor::Text => CursorIcon::Text,
            Cursor::Crosshair => CursorIcon::Crosshair,
            Cursor::Move => CursorIcon::Move,
            Cursor::NotAllowed => CursorIcon::NotAllowed,
            Cursor::ResizeNS => CursorIcon::NsResize,
            Cursor::ResizeEW => CursorIcon::EwResize,
            Cursor::ResizeNESW => CursorIcon::NeswResize,
            Cursor::ResizeNWSE => CursorIcon::NwseResize,
            Cursor::Grab => CursorIcon::Grab,
            Cursor::Grabbing => CursorIcon::Grabbing,
            Cursor::Wait => CursorIcon::Wait,
            Cursor::Progress => CursorIcon::Progress,
            Cursor::Help => CursorIcon::Help,
            Cursor::None => {
                self.window.set_cursor_visible(false);
                return;
            }
        };
        self.window.set_cursor_visible(true);
        self.window.set_cursor(icon);
    }

    fn set_cursor_image(&self, image: &CursorImage) {
        let source = custom_cursor_source(image);
        if source.is_none() {
            tracing::warn!(
                width = image.width,
                height = image.height,
                "cursor image rejected"
            );
        }
        *self.pending_cursor.borrow_mut() = source;
    }

    fn set_opaque_region(&self, region: Option<&[Rect]>) {
        // winit has no opaque region; a fully opaque view turns transparency off
        if self.transparent {
            let opaque = region.is_some_and(|region| self.covers_window(region));
            self.window.set_transparent(!opaque);
        }
        *self.opaque_region.borrow_mut() = region.map(<[Rect]>::to_vec);
    }

    fn queue_draw(&self) {
        self.window.request_redraw();
    }
}

fn custom_cursor_source(image: &CursorImage) -> Option<CustomCursorSource> {
    let rgba = image.to_rgba()?;
    let width = u16::try_from(image.width).ok()?;
    let height = u16::try_from(image.height).ok()?;
    let hotspot_x = u16::try_from(image.hotspot_x).ok()?;
    let hotspot_y = u16::try_from(image.hotspot_y).ok()?;
    CustomCursor::from_rgba(rgba, width, height, hotspot_x, hotspot_y).ok()
}
