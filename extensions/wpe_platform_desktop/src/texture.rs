//! CPU texture backend
//!
//! winit gives no access to a GPU context, so the desktop binding keeps
//! textures in memory and leaves uploading them to whatever renderer the
//! embedder draws the window with. DMA-BUF import always fails here; the
//! engine falls back to shared memory because no formats are advertised.

use crate::host::{DmaBufTextureBuilder, TextureBackend};
use std::fmt;
use std::rc::Rc;
use wpe_platform::{DmaBufPlane, Rect, ShmDescriptor};

/// A raster held in memory, shared with the frame buffer it came from
#[derive(Clone)]
pub struct MemoryTexture {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub data: Rc<[u8]>,
}

impl MemoryTexture {
    /// Bytes of row `y`, or `None` when the row is outside the raster
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride as usize;
        self.data.get(start..start + self.stride as usize)
    }
}

impl fmt::Debug for MemoryTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish()
    }
}

/// Texture backend without GPU import
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareTextures;

/// DMA-BUF builder that records the buffer layout and refuses to import it
#[derive(Debug, Default)]
pub struct NoDmaBufImport {
    width: u32,
    height: u32,
    fourcc: u32,
    modifier: u64,
    planes: usize,
}

impl DmaBufTextureBuilder for NoDmaBufImport {
    type Texture = MemoryTexture;

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
        self.planes = n_planes;
    }

    fn set_plane(&mut self, _index: usize, _plane: DmaBufPlane) {}

    fn set_update(&mut self, _texture: Option<&MemoryTexture>, _region: &[Rect]) {}

    fn build(&mut self) -> Result<MemoryTexture, String> {
        Err(format!(
            "no GPU import available for {}x{} buffer (format {:#010x}, modifier {:#x}, {} planes)",
            self.width, self.height, self.fourcc, self.modifier, self.planes
        ))
    }
}

impl TextureBackend for SoftwareTextures {
    type Texture = MemoryTexture;
    type Builder = NoDmaBufImport;

    fn new_dma_buf_builder(&self) -> NoDmaBufImport {
        NoDmaBufImport::default()
    }

    fn memory_texture(&self, width: u32, height: u32, shm: &ShmDescriptor) -> MemoryTexture {
        MemoryTexture {
            width,
            height,
            stride: shm.stride,
            data: Rc::clone(&shm.data),
        }
    }
}
