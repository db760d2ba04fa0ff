//! Double-buffered frame presentation
//!
//! The engine presents buffers at any rate; the host paints at its own. A
//! presented buffer waits in the pending slot until the next paint promotes
//! it to committed. At most one buffer is pending, so presenting twice
//! between paints silently drops the first one.
//!
//! The surface never calls the engine directly. Notifications are queued
//! and handed out by [`PresentationSurface::take_events`] so the caller can
//! deliver them after releasing any borrow of the surface.

use crate::adapter::BufferAdapter;
use crate::host::{Snapshot, TextureBackend};
use crate::toplevel::DesktopToplevel;
use wpe_platform::{FrameBuffer, InputEvent, Rect, ViewError, ViewEvent};

pub struct PresentationSurface<B: TextureBackend> {
    adapter: BufferAdapter<B>,
    pending: Option<FrameBuffer>,
    committed: Option<FrameBuffer>,
    width: u32,
    height: u32,
    scale: f64,
    toplevel: Option<DesktopToplevel>,
    redraw_queued: bool,
    closed: bool,
    outbox: Vec<ViewEvent>,
}

impl<B: TextureBackend> PresentationSurface<B> {
    pub fn new(adapter: BufferAdapter<B>) -> Self {
        Self {
            adapter,
            pending: None,
            committed: None,
            width: 0,
            height: 0,
            scale: 1.0,
            toplevel: None,
            redraw_queued: false,
            closed: false,
            outbox: Vec::new(),
        }
    }

    /// Accept a frame for display at the next paint
    ///
    /// On error nothing changes: the previously pending and committed
    /// buffers stay where they were.
    pub fn present(&mut self, buffer: &FrameBuffer, damage: &[Rect]) -> Result<(), ViewError> {
        if self.closed {
            return Err(ViewError::SurfaceDestroyed);
        }

        self.adapter.adapt(buffer)?;
        let previous = self
            .pending
            .as_ref()
            .or(self.committed.as_ref())
            .and_then(|shown| self.adapter.texture(shown));
        self.adapter.build(buffer, previous.as_ref(), damage)?;

        if let Some(dropped) = self.pending.replace(buffer.clone()) {
            tracing::trace!(buffer = %dropped.id(), "pending buffer replaced before paint");
        }
        tracing::trace!(buffer = %buffer.id(), damage = damage.len(), "buffer presented");
        self.queue_draw();
        Ok(())
    }

    /// Run one paint cycle
    ///
    /// Promotes the pending buffer, if any, and draws the committed one. On
    /// promotion the replaced buffer is released before the new one is
    /// reported rendered.
    pub fn paint(&mut self, snapshot: &mut dyn Snapshot<B::Texture>) {
        self.redraw_queued = false;
        if self.closed {
            return;
        }

        let promoted = match self.pending.take() {
            Some(pending) => {
                if let Some(old) = self.committed.replace(pending) {
                    // re-presenting the shown buffer keeps it on screen
                    if Some(&old) != self.committed.as_ref() {
                        self.outbox.push(ViewEvent::BufferReleased(old));
                    }
                }
                true
            }
            None => false,
        };

        let Some(committed) = self.committed.as_ref() else {
            return;
        };
        match self.adapter.texture(committed) {
            Some(texture) => {
                let bounds = Rect::from_size(self.width as i32, self.height as i32);
                snapshot.append_texture(&texture, bounds);
            }
            None => tracing::debug!(buffer = %committed.id(), "committed buffer has no texture"),
        }
        if promoted {
            self.outbox.push(ViewEvent::BufferRendered(committed.clone()));
        }
    }

    /// The host allocated a new size for the surface
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.closed || (self.width, self.height) == (width, height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.outbox.push(ViewEvent::Resized { width, height });
    }

    pub fn scale_changed(&mut self, scale: f64) {
        if self.closed || self.scale == scale {
            return;
        }
        self.scale = scale;
        self.outbox.push(ViewEvent::ScaleChanged(scale));
    }

    pub fn focus_changed(&mut self, focused: bool) {
        if self.closed {
            return;
        }
        self.outbox.push(if focused {
            ViewEvent::FocusIn
        } else {
            ViewEvent::FocusOut
        });
    }

    pub fn input(&mut self, event: InputEvent) {
        if !self.closed {
            self.outbox.push(ViewEvent::Input(event));
        }
    }

    /// Mount the surface in a toplevel
    pub fn realize(&mut self, toplevel: DesktopToplevel) {
        if self.closed {
            return;
        }
        self.toplevel = Some(toplevel);
        if self.pending.is_some() {
            self.queue_draw();
        }
    }

    /// Unmount the surface, returning the toplevel it was in
    pub fn unrealize(&mut self) -> Option<DesktopToplevel> {
        self.toplevel.take()
    }

    /// Tear the surface down; returns `false` if it was already closed
    ///
    /// Buffers still held are dropped without released/rendered
    /// notifications.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.pending = None;
        self.committed = None;
        self.toplevel = None;
        self.outbox.push(ViewEvent::Closed);
        true
    }

    /// Queued notifications, in the order they happened
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn queue_draw(&mut self) {
        self.redraw_queued = true;
        if let Some(window) = self.toplevel.as_ref().and_then(|t| t.window()) {
            window.queue_draw();
        }
    }

    pub fn pending(&self) -> Option<&FrameBuffer> {
        self.pending.as_ref()
    }

    pub fn committed(&self) -> Option<&FrameBuffer> {
        self.committed.as_ref()
    }

    pub fn toplevel(&self) -> Option<&DesktopToplevel> {
        self.toplevel.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_redraw_queued(&self) -> bool {
        self.redraw_queued
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{FakeTextures, FakeWindow, RecordingSnapshot, WindowCall};
    use crate::host::HostWindow;
    use crate::registry::MonitorSet;
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wpe_platform::{BufferKind, DmaBufDescriptor, DmaBufPlane, DRM_FORMAT_ARGB8888};

    fn surface() -> (PresentationSurface<FakeTextures>, Rc<FakeTextures>) {
        let backend = Rc::new(FakeTextures::default());
        let mut surface = PresentationSurface::new(BufferAdapter::new(backend.clone()));
        surface.resize(640, 480);
        surface.take_events();
        (surface, backend)
    }

    fn shm() -> FrameBuffer {
        FrameBuffer::shm(640, 480, vec![0u8; 640 * 480 * 4], 640 * 4)
    }

    fn dma_buf() -> FrameBuffer {
        FrameBuffer::dma_buf(
            640,
            480,
            DmaBufDescriptor::new(
                DRM_FORMAT_ARGB8888,
                0,
                [DmaBufPlane {
                    fd: 3,
                    stride: 2560,
                    offset: 0,
                }],
            ),
        )
    }

    #[test]
    fn test_present_then_paint() {
        let (mut surface, _) = surface();
        let a = shm();
        let b = shm();

        surface.present(&a, &[]).unwrap();
        assert!(surface.is_redraw_queued());
        let mut snapshot = RecordingSnapshot::default();
        surface.paint(&mut snapshot);
        assert_eq!(surface.take_events(), vec![ViewEvent::BufferRendered(a.clone())]);
        assert_eq!(snapshot.drawn.len(), 1);
        assert_eq!(snapshot.drawn[0].1, Rect::new(0, 0, 640, 480));

        surface.present(&b, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        assert_eq!(
            surface.take_events(),
            vec![
                ViewEvent::BufferReleased(a.clone()),
                ViewEvent::BufferRendered(b.clone())
            ]
        );
        assert_eq!(surface.committed(), Some(&b));
        assert!(surface.pending().is_none());
    }

    #[test]
    fn test_only_last_present_is_committed() {
        let (mut surface, _) = surface();
        let a = shm();
        let b = shm();
        let c = shm();

        surface.present(&a, &[]).unwrap();
        surface.present(&b, &[]).unwrap();
        surface.present(&c, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());

        assert_eq!(surface.take_events(), vec![ViewEvent::BufferRendered(c.clone())]);
        assert_eq!(surface.committed(), Some(&c));
        // the surface no longer holds the skipped buffers
        assert_eq!(a.handle_count(), 1);
        assert_eq!(b.handle_count(), 1);
    }

    #[test]
    fn test_paint_without_present() {
        let (mut surface, _) = surface();
        let mut snapshot = RecordingSnapshot::default();
        surface.paint(&mut snapshot);
        assert!(surface.take_events().is_empty());
        assert!(snapshot.drawn.is_empty());

        let a = shm();
        surface.present(&a, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        surface.take_events();

        // repaints keep drawing the committed buffer without new callbacks
        let mut snapshot = RecordingSnapshot::default();
        surface.paint(&mut snapshot);
        assert!(surface.take_events().is_empty());
        assert_eq!(snapshot.drawn.len(), 1);
    }

    #[test]
    fn test_unsupported_buffer_leaves_slots() {
        let (mut surface, _) = surface();
        let a = shm();
        let b = shm();
        surface.present(&a, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        surface.present(&b, &[]).unwrap();
        surface.take_events();

        let native = FrameBuffer::new(640, 480, BufferKind::Native { handle: 1 });
        assert_eq!(surface.present(&native, &[]), Err(ViewError::UnsupportedBuffer));
        assert_eq!(surface.pending(), Some(&b));
        assert_eq!(surface.committed(), Some(&a));
        assert!(surface.take_events().is_empty());
    }

    #[test]
    fn test_failed_import_leaves_slots() {
        let (mut surface, backend) = surface();
        let a = dma_buf();
        surface.present(&a, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());

        backend.fail_builds.set(true);
        let err = surface.present(&dma_buf(), &[]).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(surface.committed(), Some(&a));
        assert!(surface.pending().is_none());
    }

    #[test]
    fn test_damage_updates_shown_texture() {
        let (mut surface, _) = surface();
        let a = dma_buf();
        let b = dma_buf();
        surface.present(&a, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        let shown = surface.adapter.texture(&a).unwrap();

        let damage = [Rect::new(0, 0, 32, 32)];
        surface.present(&b, &damage).unwrap();
        let texture = surface.adapter.texture(&b).unwrap();
        assert_eq!(texture.update_of, Some(shown.serial));
        assert_eq!(texture.damage, damage.to_vec());
    }

    #[test]
    fn test_represent_committed_buffer() {
        let (mut surface, _) = surface();
        let a = shm();
        surface.present(&a, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        surface.take_events();

        surface.present(&a, &[Rect::new(0, 0, 8, 8)]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        assert_eq!(surface.take_events(), vec![ViewEvent::BufferRendered(a.clone())]);
    }

    #[test]
    fn test_close() {
        let (mut surface, _) = surface();
        let a = shm();
        let b = shm();
        surface.present(&a, &[]).unwrap();
        surface.paint(&mut RecordingSnapshot::default());
        surface.present(&b, &[]).unwrap();
        surface.take_events();

        assert!(surface.close());
        assert!(!surface.close());
        assert_eq!(surface.take_events(), vec![ViewEvent::Closed]);
        assert!(surface.committed().is_none());
        assert_eq!(surface.present(&a, &[]), Err(ViewError::SurfaceDestroyed));

        surface.paint(&mut RecordingSnapshot::default());
        surface.resize(10, 10);
        surface.input(InputEvent::Touch {
            phase: wpe_platform::TouchPhase::Down,
            time: 0,
            modifiers: Default::default(),
            sequence_id: 1,
            x: 0.0,
            y: 0.0,
        });
        assert!(surface.take_events().is_empty());
    }

    #[test]
    fn test_resize_and_scale_notify_on_change() {
        let (mut surface, _) = surface();
        surface.resize(640, 480);
        surface.resize(800, 600);
        surface.scale_changed(1.0);
        surface.scale_changed(2.0);
        surface.focus_changed(true);
        assert_eq!(
            surface.take_events(),
            vec![
                ViewEvent::Resized {
                    width: 800,
                    height: 600
                },
                ViewEvent::ScaleChanged(2.0),
                ViewEvent::FocusIn,
            ]
        );
        assert_eq!(surface.size(), (800, 600));
    }

    #[test]
    fn test_redraw_goes_through_window() {
        let (mut surface, _) = surface();
        let window = FakeWindow::new(1);
        let host: Rc<dyn HostWindow> = window.clone();
        let toplevel = DesktopToplevel::new(&host, Weak::<RefCell<MonitorSet>>::new());

        surface.present(&shm(), &[]).unwrap();
        assert!(window.take_calls().is_empty());

        surface.realize(toplevel);
        assert_eq!(window.take_calls(), vec![WindowCall::QueueDraw]);

        surface.present(&shm(), &[]).unwrap();
        assert_eq!(window.take_calls(), vec![WindowCall::QueueDraw]);

        assert!(surface.unrealize().is_some());
        assert!(surface.toplevel().is_none());
    }
}
