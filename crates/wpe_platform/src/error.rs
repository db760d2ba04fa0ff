//! Platform error types

use thiserror::Error;

/// Display and event loop errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Failed to connect to the host windowing system
    #[error("Display connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to create event loop
    #[error("Failed to create event loop: {0}")]
    EventLoop(String),

    /// Failed to create window
    #[error("Failed to create window: {0}")]
    WindowCreation(String),
}

/// Errors returned to the engine when presenting a frame buffer
///
/// None of these are fatal to the process. A failed presentation means
/// nothing new is drawn this frame; the surface stays alive unless the
/// error is [`ViewError::SurfaceDestroyed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The buffer kind cannot be displayed by this platform.
    ///
    /// Permanent for the given buffer: presenting it again fails the same way.
    #[error("Failed to render buffer: unsupported buffer")]
    UnsupportedBuffer,

    /// Building a texture for the buffer failed (e.g. the GPU rejected the import)
    #[error("Failed to render buffer: {0}")]
    RenderFailed(String),

    /// The surface backing the view has been closed
    #[error("Failed to render buffer: surface was destroyed")]
    SurfaceDestroyed,
}

impl ViewError {
    /// Whether presenting a fresh buffer to the same view may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ViewError::RenderFailed(_))
    }
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
