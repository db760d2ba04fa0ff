//! Desktop display: screens, GPU device identity and toplevel bookkeeping

use crate::adapter::BufferAdapter;
use crate::host::{EglDeviceInfo, HostDisplay, HostWindow, TextureBackend, WindowKey};
use crate::keymap::DesktopKeymap;
use crate::registry::MonitorSet;
use crate::toplevel::DesktopToplevel;
use crate::view::DesktopView;
use rustc_hash::FxHashMap;
use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;
use wpe_platform::{Display, DmaBufFormat, MonitorId, Screen};

const EGL_EXT_DEVICE_DRM: &str = "EGL_EXT_device_drm";
const EGL_EXT_DEVICE_DRM_RENDER_NODE: &str = "EGL_EXT_device_drm_render_node";

/// Whether a space separated extension list names `extension` exactly
pub fn has_extension(extensions: &str, extension: &str) -> bool {
    extensions
        .split_ascii_whitespace()
        .any(|name| name == extension)
}

/// DRM nodes of the GPU behind the host display
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrmDevice {
    pub device: Option<String>,
    pub render_node: Option<String>,
}

impl DrmDevice {
    /// Read the device paths the EGL device advertises
    ///
    /// A path is only trusted when its extension is in the device's
    /// extension list.
    pub fn from_egl(info: Option<&EglDeviceInfo>) -> Self {
        let Some(info) = info else {
            tracing::warn!("no EGL device for the display, DRM device unknown");
            return Self::default();
        };

        let device = if has_extension(&info.extensions, EGL_EXT_DEVICE_DRM) {
            info.drm_device_file.clone()
        } else {
            None
        };
        let render_node = if has_extension(&info.extensions, EGL_EXT_DEVICE_DRM_RENDER_NODE) {
            info.drm_render_node_file.clone()
        } else {
            None
        };

        if device.is_none() {
            tracing::debug!("EGL device does not expose a DRM device node");
        }
        Self {
            device,
            render_node,
        }
    }
}

struct DisplayInner<B: TextureBackend> {
    host: Box<dyn HostDisplay>,
    adapter: BufferAdapter<B>,
    screens: Rc<RefCell<MonitorSet>>,
    drm: DrmDevice,
    keymap: OnceCell<Rc<DesktopKeymap>>,
    toplevels: RefCell<FxHashMap<WindowKey, DesktopToplevel>>,
    dma_buf_import: Cell<bool>,
}

/// Connection to the host display
///
/// Cloning yields another handle to the same display.
pub struct DesktopDisplay<B: TextureBackend> {
    inner: Rc<DisplayInner<B>>,
}

impl<B: TextureBackend> DesktopDisplay<B> {
    /// Snapshot the host's monitors and GPU device
    pub fn connect(host: impl HostDisplay + 'static, textures: B) -> Self {
        let screens = MonitorSet::from_monitors(&host.monitors());
        let drm = DrmDevice::from_egl(host.egl_device().as_ref());
        tracing::debug!(
            screens = screens.len(),
            drm_device = ?drm.device,
            drm_render_node = ?drm.render_node,
            "display connected"
        );

        Self {
            inner: Rc::new(DisplayInner {
                host: Box::new(host),
                adapter: BufferAdapter::new(Rc::new(textures)),
                screens: Rc::new(RefCell::new(screens)),
                drm,
                keymap: OnceCell::new(),
                toplevels: RefCell::new(FxHashMap::default()),
                dma_buf_import: Cell::new(true),
            }),
        }
    }

    /// Stop advertising DMA-BUF formats, so the engine falls back to shared memory
    pub fn set_dma_buf_import(&self, enabled: bool) {
        self.inner.dma_buf_import.set(enabled);
    }

    pub(crate) fn adapter(&self) -> BufferAdapter<B> {
        self.inner.adapter.clone()
    }

    pub fn textures(&self) -> &Rc<B> {
        self.inner.adapter.backend()
    }

    /// The host monitor list changed at `index`
    ///
    /// `n_removed` screens are dropped there and the host's monitors at
    /// `index..index + n_added` are snapshotted in their place.
    pub fn monitors_changed(&self, index: usize, n_removed: usize, n_added: usize) {
        let monitors = self.inner.host.monitors();
        let end = (index + n_added).min(monitors.len());
        let start = index.min(end);
        if end - start != n_added {
            tracing::warn!(index, n_added, len = monitors.len(), "host reported monitors it does not have");
        }
        self.inner
            .screens
            .borrow_mut()
            .items_changed(index, n_removed, &monitors[start..end]);
    }

    /// Bring the screens in line with the host list; returns whether anything changed
    ///
    /// For hosts that do not report hot-plug themselves.
    pub fn sync_monitors(&self) -> bool {
        let monitors = self.inner.host.monitors();
        let change = self.inner.screens.borrow().diff(&monitors);
        let Some(change) = change else {
            return false;
        };
        tracing::debug!(?change, "monitors changed");
        self.inner.screens.borrow_mut().items_changed(
            change.index,
            change.removed,
            &monitors[change.index..change.index + change.added],
        );
        true
    }

    pub fn screens(&self) -> Vec<Screen> {
        self.inner.screens.borrow().iter().cloned().collect()
    }

    pub fn screen_for_monitor(&self, monitor: MonitorId) -> Option<Screen> {
        self.inner.screens.borrow().by_monitor(monitor).cloned()
    }

    pub fn drm_device_info(&self) -> &DrmDevice {
        &self.inner.drm
    }

    /// The toplevel for `window`, created on first request
    pub fn toplevel_for_window(&self, window: &Rc<dyn HostWindow>) -> DesktopToplevel {
        let key = window.key();
        if let Some(toplevel) = self.inner.toplevels.borrow().get(&key) {
            return toplevel.clone();
        }

        let toplevel = DesktopToplevel::new(window, Rc::downgrade(&self.inner.screens));
        tracing::debug!(window = ?key, "toplevel created");
        self.inner
            .toplevels
            .borrow_mut()
            .insert(key, toplevel.clone());
        toplevel
    }

    pub fn toplevel(&self, key: WindowKey) -> Option<DesktopToplevel> {
        self.inner.toplevels.borrow().get(&key).cloned()
    }

    /// The host window is gone; close and forget its toplevel
    pub fn window_destroyed(&self, key: WindowKey) {
        let toplevel = self.inner.toplevels.borrow_mut().remove(&key);
        if let Some(toplevel) = toplevel {
            toplevel.close();
        }
    }
}

impl<B: TextureBackend> Clone for DesktopDisplay<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: TextureBackend> Display for DesktopDisplay<B> {
    type View = DesktopView<B>;
    type Toplevel = DesktopToplevel;
    type Keymap = DesktopKeymap;

    fn name(&self) -> &'static str {
        "desktop"
    }

    fn create_view(&self) -> DesktopView<B> {
        DesktopView::new(self.clone())
    }

    fn keymap(&self) -> Rc<DesktopKeymap> {
        self.inner
            .keymap
            .get_or_init(|| {
                tracing::trace!("keymap created");
                Rc::new(DesktopKeymap::new())
            })
            .clone()
    }

    fn n_screens(&self) -> usize {
        self.inner.screens.borrow().len()
    }

    fn screen(&self, index: usize) -> Option<Screen> {
        self.inner.screens.borrow().get(index).cloned()
    }

    fn drm_device(&self) -> Option<String> {
        self.inner.drm.device.clone()
    }

    fn drm_render_node(&self) -> Option<String> {
        self.inner.drm.render_node.clone()
    }

    fn preferred_dma_buf_formats(&self) -> Vec<DmaBufFormat> {
        if !self.inner.dma_buf_import.get() {
            return Vec::new();
        }
        self.inner.host.dma_buf_formats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{monitor, FakeDisplay, FakeTextures, FakeWindow};
    use crate::host::MonitorInfo;
    use std::cell::RefCell;
    use wpe_platform::{EventQueue, Toplevel, ToplevelEvent, DRM_FORMAT_ARGB8888};

    fn connect(monitors: Vec<MonitorInfo>) -> (DesktopDisplay<FakeTextures>, Rc<RefCell<Vec<MonitorInfo>>>) {
        let host = FakeDisplay::default();
        *host.monitors.borrow_mut() = monitors;
        let list = host.monitors.clone();
        (DesktopDisplay::connect(host, FakeTextures::default()), list)
    }

    #[test]
    fn test_extension_tokens_match_exactly() {
        let extensions = "EGL_EXT_device_drm_render_node EGL_EXT_device_query";
        assert!(has_extension(extensions, "EGL_EXT_device_drm_render_node"));
        assert!(!has_extension(extensions, "EGL_EXT_device_drm"));
    }

    #[test]
    fn test_drm_device_from_egl() {
        let info = EglDeviceInfo {
            extensions: "EGL_EXT_device_drm EGL_EXT_device_drm_render_node".into(),
            drm_device_file: Some("/dev/dri/card0".into()),
            drm_render_node_file: Some("/dev/dri/renderD128".into()),
        };
        let drm = DrmDevice::from_egl(Some(&info));
        assert_eq!(drm.device.as_deref(), Some("/dev/dri/card0"));
        assert_eq!(drm.render_node.as_deref(), Some("/dev/dri/renderD128"));

        let info = EglDeviceInfo {
            extensions: "EGL_EXT_device_drm".into(),
            ..info
        };
        assert_eq!(DrmDevice::from_egl(Some(&info)).render_node, None);
        assert_eq!(DrmDevice::from_egl(None), DrmDevice::default());
    }

    #[test]
    fn test_connect_snapshots_screens() {
        let (display, _) = connect(vec![monitor(1, 0, 1920), monitor(2, 1920, 2560)]);
        assert_eq!(display.n_screens(), 2);
        assert_eq!(display.screen(1).unwrap().width, 2560);
        assert!(display.screen(2).is_none());
        assert_eq!(display.drm_device(), None);
        assert_eq!(display.name(), "desktop");
    }

    #[test]
    fn test_hot_plug_replace_middle() {
        let (display, host) = connect(vec![
            monitor(1, 0, 100),
            monitor(2, 100, 100),
            monitor(3, 200, 100),
        ]);
        let first = display.screen(0).unwrap();
        let last = display.screen(2).unwrap();

        host.borrow_mut()[1] = monitor(4, 100, 300);
        display.monitors_changed(1, 1, 1);

        assert_eq!(display.n_screens(), 3);
        assert_eq!(display.screen(0), Some(first));
        assert_eq!(display.screen(2), Some(last));
        assert_eq!(display.screen(1).unwrap().monitor, MonitorId(4));
    }

    #[test]
    fn test_sync_monitors() {
        let (display, host) = connect(vec![monitor(1, 0, 100), monitor(2, 100, 100)]);
        assert!(!display.sync_monitors());

        host.borrow_mut().remove(0);
        assert!(display.sync_monitors());
        let monitors: Vec<_> = display.screens().iter().map(|s| s.monitor).collect();
        assert_eq!(monitors, vec![MonitorId(2)]);
    }

    #[test]
    fn test_keymap_is_cached() {
        let (display, _) = connect(Vec::new());
        assert!(Rc::ptr_eq(&display.keymap(), &display.keymap()));
    }

    #[test]
    fn test_dma_buf_formats_can_be_disabled() {
        let mut host = FakeDisplay::default();
        host.formats = vec![DmaBufFormat {
            fourcc: DRM_FORMAT_ARGB8888,
            modifier: 0,
        }];
        let display = DesktopDisplay::connect(host, FakeTextures::default());
        assert_eq!(display.preferred_dma_buf_formats().len(), 1);
        display.set_dma_buf_import(false);
        assert!(display.preferred_dma_buf_formats().is_empty());
    }

    #[test]
    fn test_destroyed_window_has_no_screen() {
        let (display, _) = connect(vec![monitor(1, 0, 100)]);
        let window = FakeWindow::new(1);
        window.monitor.set(Some(MonitorId(1)));
        let host: Rc<dyn HostWindow> = window.clone();

        let toplevel = display.toplevel_for_window(&host);
        assert_eq!(toplevel.screen().map(|s| s.monitor), Some(MonitorId(1)));

        display.window_destroyed(WindowKey(1));
        assert_eq!(toplevel.state(), None);
        assert_eq!(toplevel.screen(), None);
        assert!(!toplevel.is_in_screen());
    }

    #[test]
    fn test_toplevel_per_window() {
        let (display, _) = connect(vec![monitor(1, 0, 100)]);
        let window = FakeWindow::new(7);
        let host: Rc<dyn HostWindow> = window.clone();

        let toplevel = display.toplevel_for_window(&host);
        let events = EventQueue::<ToplevelEvent>::new();
        toplevel.connect(Rc::new(events.clone()));
        assert_eq!(toplevel.key(), display.toplevel_for_window(&host).key());
        assert!(display.toplevel(WindowKey(7)).is_some());

        display.window_destroyed(WindowKey(7));
        assert_eq!(events.drain(), vec![ToplevelEvent::Closed]);
        assert!(!toplevel.set_fullscreen(true));
        assert!(display.toplevel(WindowKey(7)).is_none());

        // a new toplevel is created if the key shows up again
        let again = display.toplevel_for_window(&host);
        assert!(again.set_fullscreen(true));
    }
}
