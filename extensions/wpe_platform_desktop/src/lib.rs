//! WPE Desktop Platform
//!
//! Presents browser engine frame buffers in desktop windows using winit.
//!
//! The crate is split into host-independent state machines and a thin winit
//! binding:
//!
//! - [`surface`] keeps the pending/committed buffer slots and damage
//! - [`toplevel`] folds window state and monitor membership into notifications
//! - [`registry`] keeps the screen list aligned with the host's monitors
//! - [`adapter`] turns frame buffers into textures
//! - [`input`] translates winit events into engine input events
//!
//! [`DesktopDisplay`], [`DesktopView`] and [`DesktopToplevel`] implement the
//! `wpe_platform` traits on top of them. They talk to the window system only
//! through the traits in [`host`], which [`DesktopWindow`] and
//! [`WinitDisplay`] implement.
//!
//! # Example
//!
//! ```ignore
//! use wpe_platform::prelude::*;
//! use wpe_platform_desktop::{DesktopConfig, DesktopEvent, DesktopPlatform};
//!
//! fn main() -> Result<(), PlatformError> {
//!     let platform = DesktopPlatform::new();
//!     let event_loop = platform.create_event_loop(DesktopConfig::default())?;
//!
//!     event_loop.run(|event, cx| {
//!         match event {
//!             DesktopEvent::Started => {
//!                 // Hand cx.view to the engine here
//!             }
//!             DesktopEvent::Frame => cx.view.paint(&mut my_renderer),
//!             DesktopEvent::View(ViewEvent::Closed) => return ControlFlow::Exit,
//!             _ => {}
//!         }
//!         ControlFlow::Continue
//!     })
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod display;
pub mod event_loop;
pub mod host;
pub mod input;
pub mod keymap;
pub mod monitor;
pub mod registry;
pub mod surface;
pub mod texture;
pub mod toplevel;
pub mod view;
pub mod window;

pub use adapter::BufferAdapter;
pub use config::DesktopConfig;
pub use display::{DesktopDisplay, DrmDevice};
pub use event_loop::{DesktopContext, DesktopEvent, DesktopEventLoop};
pub use host::{
    DmaBufTextureBuilder, EglDeviceInfo, HostDisplay, HostToplevelState, HostWindow, MonitorInfo,
    Snapshot, TextureBackend, WindowKey,
};
pub use input::InputTranslator;
pub use keymap::DesktopKeymap;
pub use monitor::WinitDisplay;
pub use registry::{MonitorSet, MonitorsChange};
pub use surface::PresentationSurface;
pub use texture::{MemoryTexture, SoftwareTextures};
pub use toplevel::{DesktopToplevel, ToplevelTracker};
pub use view::{DesktopView, ViewId};
pub use window::DesktopWindow;

use wpe_platform::PlatformError;

/// Desktop platform entry point
///
/// Provides windows on macOS, Windows, and Linux.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopPlatform;

impl DesktopPlatform {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        "desktop"
    }

    /// Create an event loop that mounts a view in a window built from `config`
    pub fn create_event_loop(&self, config: DesktopConfig) -> Result<DesktopEventLoop, PlatformError> {
        DesktopEventLoop::new(config)
    }
}
