//! Host toolkit boundary
//!
//! Everything the desktop platform needs from the windowing toolkit goes
//! through the traits in this module. The winit binding in [`crate::window`]
//! and [`crate::monitor`] is one implementation; tests use in-memory fakes.

use bitflags::bitflags;
use wpe_platform::{
    Cursor, CursorImage, DmaBufFormat, DmaBufPlane, MonitorId, Rect, ShmDescriptor,
};

/// Identity of a host window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey(pub u64);

bitflags! {
    /// Window state bits as reported by the host
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HostToplevelState: u32 {
        const NONE = 0;
        const MINIMIZED = 1 << 0;
        const MAXIMIZED = 1 << 1;
        const FULLSCREEN = 1 << 2;
        const FOCUSED = 1 << 3;
    }
}

/// Snapshot of a host monitor
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorInfo {
    pub id: MonitorId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Physical size in millimeters, 0 when the host does not know it
    pub width_mm: i32,
    pub height_mm: i32,
    pub scale_factor: f64,
    /// Refresh rate in millihertz, 0 when unknown
    pub refresh_rate: u32,
}

/// Strings queried from the EGL device backing the host display
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EglDeviceInfo {
    /// Space separated device extension list
    pub extensions: String,
    /// `EGL_DRM_DEVICE_FILE_EXT`
    pub drm_device_file: Option<String>,
    /// `EGL_DRM_RENDER_NODE_FILE_EXT`
    pub drm_render_node_file: Option<String>,
}

/// A top-level host window
pub trait HostWindow {
    fn key(&self) -> WindowKey;

    /// Whether the native surface exists
    fn is_realized(&self) -> bool;

    /// Current state bits of the native surface
    fn toplevel_state(&self) -> HostToplevelState;

    /// The monitor the host considers the surface to be on
    fn monitor_at_surface(&self) -> Option<MonitorId>;

    fn scale_factor(&self) -> f64;

    fn fullscreen(&self);

    fn unfullscreen(&self);

    fn maximize(&self);

    fn unmaximize(&self);

    /// Raise and focus the window
    fn present(&self);

    fn set_title(&self, title: &str);

    fn set_cursor(&self, cursor: Cursor);

    fn set_cursor_image(&self, image: &CursorImage);

    fn set_opaque_region(&self, region: Option<&[Rect]>);

    /// Ask the host to run a paint cycle soon
    fn queue_draw(&self);
}

/// The host display connection
pub trait HostDisplay {
    /// Current monitor list, in host order
    fn monitors(&self) -> Vec<MonitorInfo>;

    /// EGL device strings, or `None` when the display has no EGL device
    fn egl_device(&self) -> Option<EglDeviceInfo>;

    /// DMA-BUF formats the host compositor accepts
    fn dma_buf_formats(&self) -> Vec<DmaBufFormat>;
}

/// Builder for textures imported from DMA-BUF planes
pub trait DmaBufTextureBuilder {
    type Texture;

    fn set_width(&mut self, width: u32);

    fn set_height(&mut self, height: u32);

    fn set_fourcc(&mut self, fourcc: u32);

    fn set_modifier(&mut self, modifier: u64);

    fn set_n_planes(&mut self, n_planes: usize);

    fn set_plane(&mut self, index: usize, plane: DmaBufPlane);

    /// Declare that the next texture only differs from `texture` inside `region`
    ///
    /// Passing `None` requests a full import.
    fn set_update(&mut self, texture: Option<&Self::Texture>, region: &[Rect]);

    /// Import the planes; the error is the host's description of the failure
    fn build(&mut self) -> Result<Self::Texture, String>;
}

/// Factory for host textures
pub trait TextureBackend: 'static {
    type Texture: Clone + 'static;
    type Builder: DmaBufTextureBuilder<Texture = Self::Texture> + 'static;

    fn new_dma_buf_builder(&self) -> Self::Builder;

    /// Wrap a shared-memory raster in a CPU texture
    fn memory_texture(&self, width: u32, height: u32, shm: &ShmDescriptor) -> Self::Texture;
}

/// Paint target handed to the surface during the host's draw cycle
pub trait Snapshot<T> {
    fn append_texture(&mut self, texture: &T, bounds: Rect);
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory host used by the unit tests

    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq)]
    pub enum WindowCall {
        Fullscreen,
        Unfullscreen,
        Maximize,
        Unmaximize,
        Present,
        SetTitle(String),
        SetCursor(Cursor),
        SetCursorImage(CursorImage),
        SetOpaqueRegion(Option<Vec<Rect>>),
        QueueDraw,
    }

    pub struct FakeWindow {
        pub key: WindowKey,
        pub realized: Cell<bool>,
        pub state: Cell<HostToplevelState>,
        pub monitor: Cell<Option<MonitorId>>,
        pub scale: Cell<f64>,
        pub calls: RefCell<Vec<WindowCall>>,
    }

    impl FakeWindow {
        pub fn new(key: u64) -> Rc<Self> {
            Rc::new(Self {
                key: WindowKey(key),
                realized: Cell::new(true),
                state: Cell::new(HostToplevelState::NONE),
                monitor: Cell::new(None),
                scale: Cell::new(1.0),
                calls: RefCell::new(Vec::new()),
            })
        }

        pub fn take_calls(&self) -> Vec<WindowCall> {
            self.calls.borrow_mut().drain(..).collect()
        }

        fn record(&self, call: WindowCall) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl HostWindow for FakeWindow {
        fn key(&self) -> WindowKey {
            self.key
        }

        fn is_realized(&self) -> bool {
            self.realized.get()
        }

        fn toplevel_state(&self) -> HostToplevelState {
            self.state.get()
        }

        fn monitor_at_surface(&self) -> Option<MonitorId> {
            self.monitor.get()
        }

        fn scale_factor(&self) -> f64 {
            self.scale.get()
        }

        fn fullscreen(&self) {
            self.record(WindowCall::Fullscreen);
        }

        fn unfullscreen(&self) {
            self.record(WindowCall::Unfullscreen);
        }

        fn maximize(&self) {
            self.record(WindowCall::Maximize);
        }

        fn unmaximize(&self) {
            self.record(WindowCall::Unmaximize);
        }

        fn present(&self) {
            self.record(WindowCall::Present);
        }

        fn set_title(&self, title: &str) {
            self.record(WindowCall::SetTitle(title.to_string()));
        }

        fn set_cursor(&self, cursor: Cursor) {
            self.record(WindowCall::SetCursor(cursor));
        }

        fn set_cursor_image(&self, image: &CursorImage) {
            self.record(WindowCall::SetCursorImage(image.clone()));
        }

        fn set_opaque_region(&self, region: Option<&[Rect]>) {
            self.record(WindowCall::SetOpaqueRegion(region.map(|r| r.to_vec())));
        }

        fn queue_draw(&self) {
            self.record(WindowCall::QueueDraw);
        }
    }

    pub fn monitor(id: u64, x: i32, width: i32) -> MonitorInfo {
        MonitorInfo {
            id: MonitorId(id),
            x,
            y: 0,
            width,
            height: 1080,
            width_mm: 600,
            height_mm: 340,
            scale_factor: 1.0,
            refresh_rate: 60_000,
        }
    }

    #[derive(Default)]
    pub struct FakeDisplay {
        pub monitors: Rc<RefCell<Vec<MonitorInfo>>>,
        pub egl: Option<EglDeviceInfo>,
        pub formats: Vec<DmaBufFormat>,
    }

    impl HostDisplay for FakeDisplay {
        fn monitors(&self) -> Vec<MonitorInfo> {
            self.monitors.borrow().clone()
        }

        fn egl_device(&self) -> Option<EglDeviceInfo> {
            self.egl.clone()
        }

        fn dma_buf_formats(&self) -> Vec<DmaBufFormat> {
            self.formats.clone()
        }
    }

    /// Texture produced by [`FakeTextures`]
    #[derive(Clone, Debug, PartialEq)]
    pub struct FakeTexture {
        pub serial: u32,
        pub dma_buf: bool,
        /// Serial of the texture this one was incrementally built from
        pub update_of: Option<u32>,
        pub damage: Vec<Rect>,
    }

    #[derive(Default)]
    pub struct FakeTextures {
        pub serial: Rc<Cell<u32>>,
        pub builders_created: Rc<Cell<u32>>,
        pub fail_builds: Rc<Cell<bool>>,
    }

    pub struct FakeBuilder {
        serial: Rc<Cell<u32>>,
        fail: Rc<Cell<bool>>,
        pub width: u32,
        pub height: u32,
        pub fourcc: u32,
        pub modifier: u64,
        pub planes: Vec<Option<DmaBufPlane>>,
        update_of: Option<u32>,
        damage: Vec<Rect>,
    }

    impl DmaBufTextureBuilder for FakeBuilder {
        type Texture = FakeTexture;

        fn set_width(&mut self, width: u32) {
            self.width = width;
        }

        fn set_height(&mut self, height: u32) {
            self.height = height;
        }

        fn set_fourcc(&mut self, fourcc: u32) {
            self.fourcc = fourcc;
        }

        fn set_modifier(&mut self, modifier: u64) {
            self.modifier = modifier;
        }

        fn set_n_planes(&mut self, n_planes: usize) {
            self.planes = vec![None; n_planes];
        }

        fn set_plane(&mut self, index: usize, plane: DmaBufPlane) {
            self.planes[index] = Some(plane);
        }

        fn set_update(&mut self, texture: Option<&FakeTexture>, region: &[Rect]) {
            self.update_of = texture.map(|t| t.serial);
            self.damage = region.to_vec();
        }

        fn build(&mut self) -> Result<FakeTexture, String> {
            if self.fail.get() {
                return Err("import rejected".to_string());
            }
            self.serial.set(self.serial.get() + 1);
            Ok(FakeTexture {
                serial: self.serial.get(),
                dma_buf: true,
                update_of: self.update_of,
                damage: self.damage.clone(),
            })
        }
    }

    impl TextureBackend for FakeTextures {
        type Texture = FakeTexture;
        type Builder = FakeBuilder;

        fn new_dma_buf_builder(&self) -> FakeBuilder {
            self.builders_created.set(self.builders_created.get() + 1);
            FakeBuilder {
                serial: self.serial.clone(),
                fail: self.fail_builds.clone(),
                width: 0,
                height: 0,
                fourcc: 0,
                modifier: 0,
                planes: Vec::new(),
                update_of: None,
                damage: Vec::new(),
            }
        }

        fn memory_texture(&self, _width: u32, _height: u32, _shm: &ShmDescriptor) -> FakeTexture {
            self.serial.set(self.serial.get() + 1);
            FakeTexture {
                serial: self.serial.get(),
                dma_buf: false,
                update_of: None,
                damage: Vec::new(),
            }
        }
    }

    /// Snapshot that records what was drawn
    #[derive(Default)]
    pub struct RecordingSnapshot {
        pub drawn: Vec<(FakeTexture, Rect)>,
    }

    impl Snapshot<FakeTexture> for RecordingSnapshot {
        fn append_texture(&mut self, texture: &FakeTexture, bounds: Rect) {
            self.drawn.push((texture.clone(), bounds));
        }
    }
}
