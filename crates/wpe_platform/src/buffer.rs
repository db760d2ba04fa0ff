//! Frame buffers handed from the engine to the platform
//!
//! A [`FrameBuffer`] is a cheap, reference counted handle. The engine keeps
//! its own handle and gets the buffer back through
//! [`ViewEvent::BufferReleased`](crate::ViewEvent::BufferReleased) and
//! [`ViewEvent::BufferRendered`](crate::ViewEvent::BufferRendered); the
//! platform never frees pixel storage itself.
//!
//! Each buffer carries a single user-data slot. Platforms use it to cache
//! whatever state they derive from the buffer (texture builders, textures)
//! so repeated presentation of the same buffer does not rebuild it. The slot
//! is dropped together with the last handle.

use smallvec::SmallVec;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Raw file descriptor of a DMA-BUF plane
pub type RawFd = i32;

/// Build a DRM fourcc code from its four characters
pub const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

/// `DRM_FORMAT_ARGB8888`
pub const DRM_FORMAT_ARGB8888: u32 = fourcc(b'A', b'R', b'2', b'4');
/// `DRM_FORMAT_XRGB8888`
pub const DRM_FORMAT_XRGB8888: u32 = fourcc(b'X', b'R', b'2', b'4');
/// `DRM_FORMAT_MOD_LINEAR`
pub const DRM_FORMAT_MOD_LINEAR: u64 = 0;

/// Integer rectangle in view coordinates
///
/// Used for damage regions and opaque regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rect at the origin covering `width` x `height`
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Check if this rect fully covers another
    pub fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

/// One plane of a DMA-BUF
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaBufPlane {
    pub fd: RawFd,
    pub stride: u32,
    pub offset: u32,
}

/// GPU buffer imported by file descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DmaBufDescriptor {
    /// DRM fourcc format code
    pub format: u32,
    /// DRM format modifier
    pub modifier: u64,
    pub planes: SmallVec<[DmaBufPlane; 4]>,
}

impl DmaBufDescriptor {
    pub fn new(format: u32, modifier: u64, planes: impl IntoIterator<Item = DmaBufPlane>) -> Self {
        Self {
            format,
            modifier,
            planes: planes.into_iter().collect(),
        }
    }

    pub fn n_planes(&self) -> usize {
        self.planes.len()
    }
}

/// CPU raster in shared memory
#[derive(Clone)]
pub struct ShmDescriptor {
    pub data: Rc<[u8]>,
    pub stride: u32,
}

impl fmt::Debug for ShmDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShmDescriptor")
            .field("len", &self.data.len())
            .field("stride", &self.stride)
            .finish()
    }
}

/// Storage backing a frame buffer
#[derive(Clone, Debug)]
pub enum BufferKind {
    /// Zero-copy GPU buffer
    DmaBuf(DmaBufDescriptor),
    /// Shared-memory raster
    Shm(ShmDescriptor),
    /// Platform-native handle (e.g. an EGLImage) that only some platforms understand
    Native { handle: u64 },
}

impl BufferKind {
    pub fn name(&self) -> &'static str {
        match self {
            BufferKind::DmaBuf(_) => "dmabuf",
            BufferKind::Shm(_) => "shm",
            BufferKind::Native { .. } => "native",
        }
    }
}

/// Identity of a frame buffer, unique for the process lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct BufferInner {
    id: BufferId,
    width: u32,
    height: u32,
    kind: BufferKind,
    user_data: RefCell<Option<Box<dyn Any>>>,
}

/// Reference counted engine frame buffer
///
/// Equality is identity: two handles are equal if they refer to the same buffer.
#[derive(Clone)]
pub struct FrameBuffer {
    inner: Rc<BufferInner>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, kind: BufferKind) -> Self {
        Self {
            inner: Rc::new(BufferInner {
                id: BufferId::next(),
                width,
                height,
                kind,
                user_data: RefCell::new(None),
            }),
        }
    }

    /// Create a DMA-BUF backed buffer
    pub fn dma_buf(width: u32, height: u32, descriptor: DmaBufDescriptor) -> Self {
        Self::new(width, height, BufferKind::DmaBuf(descriptor))
    }

    /// Create a shared-memory buffer
    pub fn shm(width: u32, height: u32, data: impl Into<Rc<[u8]>>, stride: u32) -> Self {
        Self::new(
            width,
            height,
            BufferKind::Shm(ShmDescriptor {
                data: data.into(),
                stride,
            }),
        )
    }

    pub fn id(&self) -> BufferId {
        self.inner.id
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn kind(&self) -> &BufferKind {
        &self.inner.kind
    }

    /// Number of live handles to this buffer
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    pub fn has_user_data(&self) -> bool {
        self.inner.user_data.borrow().is_some()
    }

    /// Borrow the user data if it is present and of type `T`
    pub fn user_data<T: 'static>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.inner.user_data.borrow(), |slot| {
            slot.as_ref().and_then(|data| data.downcast_ref::<T>())
        })
        .ok()
    }

    /// Mutably borrow the user data if it is present and of type `T`
    pub fn user_data_mut<T: 'static>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.inner.user_data.borrow_mut(), |slot| {
            slot.as_mut().and_then(|data| data.downcast_mut::<T>())
        })
        .ok()
    }

    /// Attach user data, dropping whatever was attached before
    pub fn set_user_data<T: 'static>(&self, data: T) {
        *self.inner.user_data.borrow_mut() = Some(Box::new(data));
    }
}

impl PartialEq for FrameBuffer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for FrameBuffer {}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("id", &self.inner.id)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("kind", &self.inner.kind.name())
            .finish()
    }
}

/// A fourcc/modifier pair the platform can import
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DmaBufFormat {
    pub fourcc: u32,
    pub modifier: u64,
}
