//! winit monitors and display connection

use crate::host::{EglDeviceInfo, HostDisplay, MonitorInfo};
use raw_window_handle::{HasDisplayHandle, RawDisplayHandle};
use std::cell::RefCell;
use std::rc::Rc;
use winit::event_loop::ActiveEventLoop;
use winit::monitor::MonitorHandle;
use wpe_platform::{DmaBufFormat, MonitorId, PlatformError};

/// Numeric ids for host monitor handles
///
/// winit handles can be compared but carry no id, so each handle gets the
/// next number the first time it is seen and keeps it while it stays known.
#[derive(Debug)]
pub struct MonitorIds<H> {
    known: Vec<(H, MonitorId)>,
    next: u64,
}

impl<H: Clone + PartialEq> MonitorIds<H> {
    pub fn new() -> Self {
        Self {
            known: Vec::new(),
            next: 1,
        }
    }

    pub fn id(&mut self, handle: &H) -> MonitorId {
        if let Some((_, id)) = self.known.iter().find(|(known, _)| known == handle) {
            return *id;
        }
        let id = MonitorId(self.next);
        self.next += 1;
        self.known.push((handle.clone(), id));
        id
    }

    /// Forget handles that are no longer connected
    pub fn retain(&mut self, connected: &[H]) {
        self.known.retain(|(handle, _)| connected.contains(handle));
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl<H: Clone + PartialEq> Default for MonitorIds<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot a winit monitor in logical coordinates
fn monitor_info(handle: &MonitorHandle, id: MonitorId) -> MonitorInfo {
    let scale_factor = handle.scale_factor();
    let position = handle.position().to_logical::<i32>(scale_factor);
    let size = handle.size().to_logical::<i32>(scale_factor);
    MonitorInfo {
        id,
        x: position.x,
        y: position.y,
        width: size.width,
        height: size.height,
        // winit does not report physical dimensions
        width_mm: 0,
        height_mm: 0,
        scale_factor,
        refresh_rate: handle.refresh_rate_millihertz().unwrap_or(0),
    }
}

/// Name of the windowing backend behind a display handle
fn backend_name(handle: RawDisplayHandle) -> &'static str {
    match handle {
        RawDisplayHandle::Wayland(_) => "wayland",
        RawDisplayHandle::Xlib(_) | RawDisplayHandle::Xcb(_) => "x11",
        RawDisplayHandle::AppKit(_) => "macos",
        RawDisplayHandle::Windows(_) => "windows",
        _ => "unknown",
    }
}

/// Host display backed by a winit event loop
///
/// winit only exposes monitors while the event loop is running, so the list
/// is a snapshot taken by [`WinitDisplay::refresh`]. Clones share it.
#[derive(Clone, Debug)]
pub struct WinitDisplay {
    backend: &'static str,
    monitors: Rc<RefCell<Vec<MonitorInfo>>>,
    ids: Rc<RefCell<MonitorIds<MonitorHandle>>>,
    egl_device: Option<EglDeviceInfo>,
    dma_buf_formats: Vec<DmaBufFormat>,
}

impl WinitDisplay {
    pub fn connect(event_loop: &ActiveEventLoop) -> Result<Self, PlatformError> {
        let handle = event_loop
            .display_handle()
            .map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;
        let backend = backend_name(handle.as_raw());
        tracing::debug!(backend, "connected to display");

        let display = Self {
            backend,
            monitors: Rc::new(RefCell::new(Vec::new())),
            ids: Rc::new(RefCell::new(MonitorIds::new())),
            egl_device: None,
            dma_buf_formats: Vec::new(),
        };
        display.refresh(event_loop);
        Ok(display)
    }

    /// Provide the EGL device of a renderer that draws into the window
    pub fn with_egl_device(mut self, device: EglDeviceInfo) -> Self {
        self.egl_device = Some(device);
        self
    }

    /// Formats a renderer that can import DMA-BUFs accepts
    pub fn with_dma_buf_formats(mut self, formats: Vec<DmaBufFormat>) -> Self {
        self.dma_buf_formats = formats;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Id of a winit monitor, shared with the monitor list
    pub fn monitor_id(&self, handle: &MonitorHandle) -> MonitorId {
        self.ids.borrow_mut().id(handle)
    }

    /// Re-read the monitor list from the event loop
    pub fn refresh(&self, event_loop: &ActiveEventLoop) {
        let handles: Vec<MonitorHandle> = event_loop.available_monitors().collect();
        let monitors: Vec<MonitorInfo> = {
            let mut ids = self.ids.borrow_mut();
            ids.retain(&handles);
            handles
                .iter()
                .map(|handle| monitor_info(handle, ids.id(handle)))
                .collect()
        };
        *self.monitors.borrow_mut() = monitors;
    }
}

impl HostDisplay for WinitDisplay {
    fn monitors(&self) -> Vec<MonitorInfo> {
        self.monitors.borrow().clone()
    }

    fn egl_device(&self) -> Option<EglDeviceInfo> {
        self.egl_device.clone()
    }

    fn dma_buf_formats(&self) -> Vec<DmaBufFormat> {
        self.dma_buf_formats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_per_handle() {
        let mut ids = MonitorIds::new();
        let left = ids.id(&"DP-1");
        let right = ids.id(&"HDMI-1");
        assert_ne!(left, right);
        assert_eq!(ids.id(&"DP-1"), left);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_unplugged_handles_get_fresh_ids() {
        let mut ids = MonitorIds::new();
        let first = ids.id(&"DP-1");
        ids.id(&"HDMI-1");

        ids.retain(&["HDMI-1"]);
        assert_eq!(ids.len(), 1);
        assert_ne!(ids.id(&"DP-1"), first);
    }
}
