//! Desktop event loop implementation using winit

use crate::config::DesktopConfig;
use crate::display::DesktopDisplay;
use crate::host::HostWindow;
use crate::input::InputTranslator;
use crate::monitor::WinitDisplay;
use crate::texture::SoftwareTextures;
use crate::view::DesktopView;
use crate::window::DesktopWindow;
use std::rc::Rc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent as WinitWindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop as WinitEventLoop};
use winit::window::WindowId;
use wpe_platform::{
    ControlFlow, Display, EventQueue, EventSink, MonitorId, PlatformError, ToplevelEvent, View,
    ViewEvent,
};

/// Events delivered to the application handler
#[derive(Clone, Debug, PartialEq)]
pub enum DesktopEvent {
    /// The display is connected and the view is mounted in its window
    Started,
    /// The host wants a frame; draw it with [`DesktopView::paint`]
    Frame,
    /// A view notification
    View(ViewEvent),
    /// A notification from the window the view is mounted in
    Toplevel(ToplevelEvent),
}

/// Everything the handler can reach while the loop runs
pub struct DesktopContext {
    pub display: DesktopDisplay<SoftwareTextures>,
    pub view: DesktopView<SoftwareTextures>,
    pub window: Rc<DesktopWindow>,
}

/// Desktop event loop wrapping winit's event loop
pub struct DesktopEventLoop {
    event_loop: WinitEventLoop<()>,
    config: DesktopConfig,
}

impl DesktopEventLoop {
    /// Create a new desktop event loop
    pub fn new(config: DesktopConfig) -> Result<Self, PlatformError> {
        let event_loop =
            WinitEventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;

        Ok(Self { event_loop, config })
    }

    /// Mount one view in a window and run until the handler asks to exit
    pub fn run<F>(self, handler: F) -> Result<(), PlatformError>
    where
        F: FnMut(DesktopEvent, &DesktopContext) -> ControlFlow + 'static,
    {
        let mut app = DesktopApp::new(self.config, handler);
        self.event_loop
            .run_app(&mut app)
            .map_err(|e| PlatformError::EventLoop(e.to_string()))
    }
}

/// Internal winit application handler
struct DesktopApp<F>
where
    F: FnMut(DesktopEvent, &DesktopContext) -> ControlFlow,
{
    config: DesktopConfig,
    host: Option<WinitDisplay>,
    context: Option<DesktopContext>,
    handler: F,
    events: EventQueue<DesktopEvent>,
    input: InputTranslator,
    monitor: Option<MonitorId>,
    should_exit: bool,
}

impl<F> DesktopApp<F>
where
    F: FnMut(DesktopEvent, &DesktopContext) -> ControlFlow,
{
    fn new(config: DesktopConfig, handler: F) -> Self {
        Self {
            config,
            host: None,
            context: None,
            handler,
            events: EventQueue::new(),
            input: InputTranslator::new(1.0),
            monitor: None,
            should_exit: false,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), PlatformError> {
        let host = WinitDisplay::connect(event_loop)?;
        let display = DesktopDisplay::connect(host.clone(), SoftwareTextures);
        display.set_dma_buf_import(self.config.dma_buf_import);

        let view = display.create_view();
        let events = self.events.clone();
        view.connect(Rc::new(move |event: ViewEvent| {
            events.dispatch(DesktopEvent::View(event))
        }));

        let window = DesktopWindow::new(event_loop, &host, &self.config)
            .map(Rc::new)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        let host_window: Rc<dyn HostWindow> = window.clone();
        view.realize(&host_window);
        host_window.present();
        window.flush_cursor(event_loop);

        if let Some(toplevel) = view.toplevel() {
            let events = self.events.clone();
            toplevel.connect(Rc::new(move |event: ToplevelEvent| {
                events.dispatch(DesktopEvent::Toplevel(event))
            }));
            // realize already made this the current monitor; entering it
            // only adds it to the overlap list for a later left_monitor
            self.monitor = toplevel.current_monitor();
            if let Some(monitor) = self.monitor {
                toplevel.entered_monitor(monitor);
            }
        }

        let (width, height) = window.logical_size();
        view.resized(width, height);
        self.input = InputTranslator::new(window.scale_factor());

        let n_screens = display.n_screens();
        tracing::info!(
            backend = host.backend(),
            screens = n_screens,
            width,
            height,
            "desktop view started"
        );
        self.host = Some(host);
        self.context = Some(DesktopContext {
            display,
            view,
            window,
        });
        self.events.dispatch(DesktopEvent::Started);
        Ok(())
    }

    /// Hand queued events to the handler
    fn flush(&mut self) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        while let Some(event) = self.events.pop() {
            if (self.handler)(event, context) == ControlFlow::Exit {
                self.should_exit = true;
            }
        }
    }

    /// Follow the window across monitors and pick up hot-plugged ones
    fn track_monitors(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(host), Some(context)) = (self.host.as_ref(), self.context.as_ref()) else {
            return;
        };
        host.refresh(event_loop);
        context.display.sync_monitors();

        let Some(toplevel) = context.view.toplevel() else {
            return;
        };
        let current = context.window.monitor_at_surface();
        if current == self.monitor {
            return;
        }
        if let Some(monitor) = current {
            toplevel.entered_monitor(monitor);
        }
        if let Some(monitor) = self.monitor {
            toplevel.left_monitor(monitor);
        }
        self.monitor = current;
    }

    fn refresh_state(&self) {
        if let Some(context) = self.context.as_ref() {
            if let Some(toplevel) = context.view.toplevel() {
                toplevel.state_changed(context.window.toplevel_state());
            }
        }
    }
}

impl<F> ApplicationHandler for DesktopApp<F>
where
    F: FnMut(DesktopEvent, &DesktopContext) -> ControlFlow,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Create the window if we don't have one
        if self.context.is_none() {
            if let Err(e) = self.start(event_loop) {
                tracing::error!("Failed to start desktop view: {}", e);
                event_loop.exit();
                return;
            }
            self.flush();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WinitWindowEvent,
    ) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let view = context.view.clone();

        match event {
            WinitWindowEvent::CloseRequested => {
                view.close();
                context.display.window_destroyed(context.window.key());
                self.should_exit = true;
            }

            WinitWindowEvent::Resized(_) => {
                let (width, height) = context.window.logical_size();
                view.resized(width, height);
                self.refresh_state();
                self.track_monitors(event_loop);
            }

            WinitWindowEvent::Moved(_) => {
                self.track_monitors(event_loop);
            }

            WinitWindowEvent::Focused(focused) => {
                context.window.set_focused(focused);
                view.focus_changed(focused);
                self.refresh_state();
            }

            WinitWindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.input.set_scale_factor(scale_factor);
                view.scale_changed(scale_factor);
                if let Some(toplevel) = view.toplevel() {
                    toplevel.scale_changed(scale_factor);
                }
                self.track_monitors(event_loop);
            }

            WinitWindowEvent::RedrawRequested => {
                self.events.dispatch(DesktopEvent::Frame);
            }

            WinitWindowEvent::ModifiersChanged(mods) => {
                let modifiers = self.input.set_modifiers(mods.state());
                context.display.keymap().set_modifiers(modifiers);
            }

            WinitWindowEvent::KeyboardInput { event, .. } => {
                view.input(self.input.keyboard_input(&event));
            }

            WinitWindowEvent::CursorMoved { position, .. } => {
                view.input(self.input.cursor_moved(position));
            }

            WinitWindowEvent::CursorEntered { .. } => {
                view.input(self.input.cursor_entered());
            }

            WinitWindowEvent::CursorLeft { .. } => {
                view.input(self.input.cursor_left());
            }

            WinitWindowEvent::MouseInput { state, button, .. } => {
                view.input(self.input.mouse_input(state, button));
            }

            WinitWindowEvent::MouseWheel { delta, phase, .. } => {
                view.input(self.input.mouse_wheel(delta, phase));
            }

            WinitWindowEvent::Touch(touch) => {
                view.input(self.input.touch(&touch));
            }

            _ => {}
        }

        if let Some(context) = self.context.as_ref() {
            context.window.flush_cursor(event_loop);
        }
        self.flush();

        // Check for exit
        if self.should_exit {
            event_loop.exit();
        }
    }
}
