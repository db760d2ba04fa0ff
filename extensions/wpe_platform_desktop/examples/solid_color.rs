//! Solid Color Demo
//!
//! Stands in for a browser engine: presents shared-memory frames of a single
//! color that changes with every pointer click, and logs what the window
//! would draw.
//!
//! Run with: cargo run -p wpe_platform_desktop --example solid_color

use std::rc::Rc;
use wpe_platform::prelude::*;
use wpe_platform_desktop::{DesktopConfig, DesktopEvent, DesktopPlatform, MemoryTexture, Snapshot};

const COLORS: [[u8; 4]; 3] = [
    [0x30, 0x30, 0xd0, 0xff],
    [0x30, 0xd0, 0x30, 0xff],
    [0xd0, 0x30, 0x30, 0xff],
];

/// Snapshot that only reports what it was asked to draw
struct LogSnapshot;

impl Snapshot<MemoryTexture> for LogSnapshot {
    fn append_texture(&mut self, texture: &MemoryTexture, bounds: Rect) {
        tracing::info!(
            width = texture.width,
            height = texture.height,
            ?bounds,
            "draw frame"
        );
    }
}

fn solid_frame(width: u32, height: u32, color: [u8; 4]) -> FrameBuffer {
    let stride = width * 4;
    let pixels: Rc<[u8]> = color
        .iter()
        .copied()
        .cycle()
        .take((stride * height) as usize)
        .collect::<Vec<_>>()
        .into();
    FrameBuffer::shm(width, height, pixels, stride)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let platform = DesktopPlatform::new();
    let event_loop = platform.create_event_loop(DesktopConfig::new("Solid Color").size(640, 480))?;
    let mut color = 0;

    event_loop.run(move |event, cx| {
        let redraw = match event {
            DesktopEvent::Started | DesktopEvent::View(ViewEvent::Resized { .. }) => true,
            DesktopEvent::View(ViewEvent::Input(InputEvent::Button {
                state: PressState::Pressed,
                ..
            })) => {
                color = (color + 1) % COLORS.len();
                true
            }
            DesktopEvent::Frame => {
                cx.view.paint(&mut LogSnapshot);
                false
            }
            DesktopEvent::View(ViewEvent::Closed) => return ControlFlow::Exit,
            _ => false,
        };

        if redraw {
            let (width, height) = cx.view.size();
            if width > 0 && height > 0 {
                let frame = solid_frame(width, height, COLORS[color]);
                if let Err(e) = cx.view.render_buffer(&frame, &[]) {
                    tracing::warn!("failed to present frame: {}", e);
                }
            }
        }
        ControlFlow::Continue
    })
}
