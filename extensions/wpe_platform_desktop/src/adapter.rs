//! Frame buffer to host texture conversion
//!
//! The adapter state lives in the buffer's user-data slot, so a buffer that
//! is presented again keeps its texture builder and the GPU import can be
//! updated in place instead of redone.

use crate::host::{DmaBufTextureBuilder, TextureBackend};
use std::rc::Rc;
use wpe_platform::{BufferKind, FrameBuffer, Rect, ViewError};

/// Per-buffer cache attached on first presentation
pub(crate) struct AdapterState<B: TextureBackend> {
    /// Only DMA-BUF buffers have a builder
    builder: Option<B::Builder>,
    texture: Option<B::Texture>,
}

/// Builds host textures for engine frame buffers
pub struct BufferAdapter<B: TextureBackend> {
    backend: Rc<B>,
}

impl<B: TextureBackend> BufferAdapter<B> {
    pub fn new(backend: Rc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    /// Attach adapter state to `buffer` unless it already has some
    pub fn adapt(&self, buffer: &FrameBuffer) -> Result<(), ViewError> {
        if buffer.user_data::<AdapterState<B>>().is_some() {
            return Ok(());
        }

        let builder = match buffer.kind() {
            BufferKind::DmaBuf(descriptor) => {
                let mut builder = self.backend.new_dma_buf_builder();
                builder.set_width(buffer.width());
                builder.set_height(buffer.height());
                builder.set_fourcc(descriptor.format);
                builder.set_modifier(descriptor.modifier);
                builder.set_n_planes(descriptor.n_planes());
                for (index, plane) in descriptor.planes.iter().enumerate() {
                    builder.set_plane(index, *plane);
                }
                Some(builder)
            }
            BufferKind::Shm(_) => None,
            BufferKind::Native { .. } => {
                tracing::debug!(buffer = %buffer.id(), "native buffers cannot be adapted");
                return Err(ViewError::UnsupportedBuffer);
            }
        };

        tracing::trace!(buffer = %buffer.id(), kind = buffer.kind().name(), "adapted buffer");
        buffer.set_user_data(AdapterState::<B> {
            builder,
            texture: None,
        });
        Ok(())
    }

    /// Build the texture for the buffer's current content
    ///
    /// For DMA-BUF buffers, a `previous` texture together with non-empty
    /// `damage` lets the builder update only the damaged regions. Shared
    /// memory buffers always produce a full texture. On failure the last
    /// good texture stays cached.
    pub fn build(
        &self,
        buffer: &FrameBuffer,
        previous: Option<&B::Texture>,
        damage: &[Rect],
    ) -> Result<B::Texture, ViewError> {
        let mut state = buffer
            .user_data_mut::<AdapterState<B>>()
            .ok_or(ViewError::UnsupportedBuffer)?;

        let texture = match (state.builder.as_mut(), buffer.kind()) {
            (Some(builder), _) => {
                let update = previous.filter(|_| !damage.is_empty());
                builder.set_update(update, damage);
                builder.build().map_err(|message| {
                    tracing::warn!(buffer = %buffer.id(), %message, "DMA-BUF import failed");
                    ViewError::RenderFailed(format!("failed to build DMA-BUF texture: {message}"))
                })?
            }
            (None, BufferKind::Shm(shm)) => {
                self.backend
                    .memory_texture(buffer.width(), buffer.height(), shm)
            }
            (None, _) => return Err(ViewError::UnsupportedBuffer),
        };

        state.texture = Some(texture.clone());
        Ok(texture)
    }

    /// The last texture built for `buffer`
    pub fn texture(&self, buffer: &FrameBuffer) -> Option<B::Texture> {
        buffer
            .user_data::<AdapterState<B>>()
            .and_then(|state| state.texture.clone())
    }
}

impl<B: TextureBackend> Clone for BufferAdapter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
        }
    }
}
