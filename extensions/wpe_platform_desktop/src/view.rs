//! Desktop view: a presentation surface joined to a display

use crate::display::DesktopDisplay;
use crate::host::{HostWindow, Snapshot, TextureBackend};
use crate::surface::PresentationSurface;
use crate::toplevel::DesktopToplevel;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use wpe_platform::{
    Cursor, CursorImage, EventSink, FrameBuffer, InputEvent, Rect, Screen, Toplevel,
    ToplevelEvent, View, ViewError, ViewEvent, ViewState,
};

/// Identity of a view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Forwards to whichever sink the engine installed last
#[derive(Default)]
struct SinkSlot {
    sink: RefCell<Option<Rc<dyn EventSink<ViewEvent>>>>,
}

impl EventSink<ViewEvent> for SinkSlot {
    fn dispatch(&self, event: ViewEvent) {
        let sink = self.sink.borrow().clone();
        match sink {
            Some(sink) => sink.dispatch(event),
            None => tracing::trace!(?event, "no view sink connected, event dropped"),
        }
    }
}

/// The cursor the engine asked for last
#[derive(Clone, Debug)]
enum CursorRequest {
    Named(Cursor),
    Image(CursorImage),
}

impl CursorRequest {
    fn apply(&self, window: &dyn HostWindow) {
        match self {
            CursorRequest::Named(cursor) => window.set_cursor(*cursor),
            CursorRequest::Image(image) => window.set_cursor_image(image),
        }
    }
}

struct ViewInner<B: TextureBackend> {
    id: ViewId,
    display: DesktopDisplay<B>,
    surface: RefCell<PresentationSurface<B>>,
    sink: Rc<SinkSlot>,
    cursor: RefCell<CursorRequest>,
    opaque_region: RefCell<Option<Vec<Rect>>>,
}

/// A view the engine renders into
///
/// Cloning yields another handle to the same view.
pub struct DesktopView<B: TextureBackend> {
    inner: Rc<ViewInner<B>>,
}

impl<B: TextureBackend> DesktopView<B> {
    pub(crate) fn new(display: DesktopDisplay<B>) -> Self {
        let surface = PresentationSurface::new(display.adapter());
        Self {
            inner: Rc::new(ViewInner {
                id: ViewId::next(),
                display,
                surface: RefCell::new(surface),
                sink: Rc::new(SinkSlot::default()),
                cursor: RefCell::new(CursorRequest::Named(Cursor::Default)),
                opaque_region: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> ViewId {
        self.inner.id
    }

    pub fn display(&self) -> &DesktopDisplay<B> {
        &self.inner.display
    }

    /// Route view events to `sink`, replacing any previous one
    pub fn connect(&self, sink: Rc<dyn EventSink<ViewEvent>>) {
        *self.inner.sink.sink.borrow_mut() = Some(sink);
    }

    /// Mount the view in a host window
    ///
    /// A view mounted elsewhere is unmounted from its old window first.
    pub fn realize(&self, window: &Rc<dyn HostWindow>) {
        if self.is_closed() {
            return;
        }
        if let Some(mounted) = self.toplevel() {
            if mounted.key() == window.key() && mounted.window().is_some() {
                return;
            }
            self.unrealize();
        }

        let toplevel = self.inner.display.toplevel_for_window(window);
        toplevel.attach_view(self.inner.id, self.inner.sink.clone());

        self.inner.cursor.borrow().apply(&**window);
        window.set_opaque_region(self.inner.opaque_region.borrow().as_deref());

        tracing::debug!(view = ?self.inner.id, window = ?window.key(), "view realized");
        let seeded = toplevel.snapshot_events();
        self.with_surface(|surface| {
            surface.scale_changed(window.scale_factor());
            surface.realize(toplevel);
        });

        // the toplevel may have been realized before this view was attached
        for event in seeded {
            match event {
                ToplevelEvent::StateChanged(state) => {
                    self.inner.sink.dispatch(ViewEvent::StateChanged(state))
                }
                ToplevelEvent::ScreenChanged => self.inner.sink.dispatch(ViewEvent::ScreenChanged),
                ToplevelEvent::ScaleChanged(_) | ToplevelEvent::Closed => {}
            }
        }
    }

    /// Unmount the view from its window
    pub fn unrealize(&self) {
        let toplevel = self.inner.surface.borrow_mut().unrealize();
        if let Some(toplevel) = toplevel {
            toplevel.detach_view(self.inner.id);
            tracing::debug!(view = ?self.inner.id, "view unrealized");
        }
    }

    pub fn resized(&self, width: u32, height: u32) {
        self.with_surface(|surface| surface.resize(width, height));
    }

    pub fn scale_changed(&self, scale: f64) {
        self.with_surface(|surface| surface.scale_changed(scale));
    }

    pub fn focus_changed(&self, focused: bool) {
        self.with_surface(|surface| surface.focus_changed(focused));
    }

    pub fn input(&self, event: InputEvent) {
        self.with_surface(|surface| surface.input(event));
    }

    /// Run the host's paint cycle for this view
    pub fn paint(&self, snapshot: &mut dyn Snapshot<B::Texture>) {
        self.with_surface(|surface| surface.paint(snapshot));
    }

    /// Close the view; later presentation fails with `SurfaceDestroyed`
    pub fn close(&self) {
        self.unrealize();
        self.with_surface(|surface| {
            surface.close();
        });
    }

    pub fn is_closed(&self) -> bool {
        self.inner.surface.borrow().is_closed()
    }

    /// The screen the view is on, by host monitor
    pub fn monitor(&self) -> Option<wpe_platform::MonitorId> {
        self.toplevel()?.current_monitor()
    }

    fn set_cursor_request(&self, request: CursorRequest) {
        if let Some(window) = self.toplevel().and_then(|t| t.window()) {
            request.apply(&*window);
        }
        *self.inner.cursor.borrow_mut() = request;
    }

    /// Run `f` on the surface, then deliver what it queued
    ///
    /// Events are dispatched after the surface borrow ends, so the engine
    /// may call back into the view from its sink.
    fn with_surface<R>(&self, f: impl FnOnce(&mut PresentationSurface<B>) -> R) -> R {
        let (result, events) = {
            let mut surface = self.inner.surface.borrow_mut();
            let result = f(&mut surface);
            (result, surface.take_events())
        };
        for event in events {
            self.inner.sink.dispatch(event);
        }
        result
    }
}

impl<B: TextureBackend> Clone for DesktopView<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: TextureBackend> View for DesktopView<B> {
    type Toplevel = DesktopToplevel;

    fn render_buffer(&self, buffer: &FrameBuffer, damage: &[Rect]) -> Result<(), ViewError> {
        let result = self.with_surface(|surface| surface.present(buffer, damage));
        if let Err(error) = &result {
            tracing::debug!(view = ?self.inner.id, buffer = %buffer.id(), %error, "present failed");
        }
        result
    }

    fn size(&self) -> (u32, u32) {
        self.inner.surface.borrow().size()
    }

    fn scale(&self) -> f64 {
        self.inner.surface.borrow().scale()
    }

    fn state(&self) -> Option<ViewState> {
        self.toplevel()?.state()
    }

    fn toplevel(&self) -> Option<DesktopToplevel> {
        self.inner.surface.borrow().toplevel().cloned()
    }

    fn screen(&self) -> Option<Screen> {
        self.toplevel()?.screen()
    }

    fn set_fullscreen(&self, fullscreen: bool) -> bool {
        self.toplevel()
            .is_some_and(|toplevel| toplevel.set_fullscreen(fullscreen))
    }

    fn set_maximized(&self, maximized: bool) -> bool {
        self.toplevel()
            .is_some_and(|toplevel| toplevel.set_maximized(maximized))
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.set_cursor_request(CursorRequest::Named(cursor));
    }

    fn set_cursor_from_bytes(&self, image: CursorImage) {
        self.set_cursor_request(CursorRequest::Image(image));
    }

    fn set_opaque_rectangles(&self, rects: Option<&[Rect]>) {
        *self.inner.opaque_region.borrow_mut() = rects.map(<[Rect]>::to_vec);
        if let Some(window) = self.toplevel().and_then(|t| t.window()) {
            window.set_opaque_region(rects);
        }
    }
}
