//! Toplevel state tracking
//!
//! [`ToplevelTracker`] is the pure state machine: host state bits in, engine
//! state flags and screen changes out. [`DesktopToplevel`] binds a tracker to
//! a host window and delivers the resulting events to the engine and to every
//! view mounted in the window.

use crate::host::{HostToplevelState, HostWindow, WindowKey};
use crate::registry::MonitorSet;
use crate::view::ViewId;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wpe_platform::{EventSink, MonitorId, Screen, Toplevel, ToplevelEvent, ViewEvent, ViewState};

/// Host bits and the engine flag each one drives
const STATE_MAP: [(HostToplevelState, ViewState); 3] = [
    (HostToplevelState::FULLSCREEN, ViewState::FULLSCREEN),
    (HostToplevelState::MAXIMIZED, ViewState::MAXIMIZED),
    (HostToplevelState::FOCUSED, ViewState::ACTIVE),
];

/// Window state and monitor membership
#[derive(Clone, Debug, Default)]
pub struct ToplevelTracker {
    host_state: HostToplevelState,
    state: ViewState,
    monitors: Vec<MonitorId>,
    current_monitor: Option<MonitorId>,
}

impl ToplevelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn current_monitor(&self) -> Option<MonitorId> {
        self.current_monitor
    }

    /// Monitors the window currently overlaps, in the order it entered them
    pub fn monitors(&self) -> &[MonitorId] {
        &self.monitors
    }

    /// Apply new host bits; returns the new engine state if it changed
    ///
    /// Only the flags whose host bit flipped since the last call are touched.
    pub fn state_changed(&mut self, host_state: HostToplevelState) -> Option<ViewState> {
        let mask = self.host_state ^ host_state;
        self.host_state = host_state;

        let mut state = self.state;
        for (host_flag, view_flag) in STATE_MAP {
            if mask.contains(host_flag) {
                state.set(view_flag, host_state.contains(host_flag));
            }
        }

        if state == self.state {
            return None;
        }
        self.state = state;
        Some(state)
    }

    /// Returns whether the current monitor changed
    pub fn entered_monitor(&mut self, monitor: MonitorId) -> bool {
        self.monitors.push(monitor);
        if self.current_monitor == Some(monitor) {
            return false;
        }
        self.current_monitor = Some(monitor);
        true
    }

    /// Returns whether the current monitor changed
    ///
    /// `monitor_at_surface` is asked for the new current monitor only when
    /// the window still overlaps at least one monitor.
    pub fn left_monitor(
        &mut self,
        monitor: MonitorId,
        monitor_at_surface: impl FnOnce() -> Option<MonitorId>,
    ) -> bool {
        if let Some(position) = self.monitors.iter().position(|m| *m == monitor) {
            self.monitors.remove(position);
        }

        let current = if self.monitors.is_empty() {
            None
        } else {
            monitor_at_surface()
        };
        if current == self.current_monitor {
            return false;
        }
        self.current_monitor = current;
        true
    }

    /// Replace the current monitor; returns whether it changed
    pub fn reset_monitor(&mut self, monitor: Option<MonitorId>) -> bool {
        let changed = self.current_monitor != monitor;
        self.current_monitor = monitor;
        changed
    }

    /// Drop all monitor membership
    pub fn clear_monitors(&mut self) {
        self.monitors.clear();
        self.current_monitor = None;
    }

    /// Events that describe the tracked state to a newly connected observer
    pub fn snapshot_events(&self) -> SmallVec<[ToplevelEvent; 2]> {
        let mut events = SmallVec::new();
        if !self.state.is_empty() {
            events.push(ToplevelEvent::StateChanged(self.state));
        }
        if self.current_monitor.is_some() {
            events.push(ToplevelEvent::ScreenChanged);
        }
        events
    }
}

type ViewSinks = SmallVec<[(ViewId, Rc<dyn EventSink<ViewEvent>>); 1]>;

struct ToplevelInner {
    key: WindowKey,
    window: Weak<dyn HostWindow>,
    valid: bool,
    realized: bool,
    closed: bool,
    tracker: ToplevelTracker,
    scale: f64,
    screens: Weak<RefCell<MonitorSet>>,
    sink: Option<Rc<dyn EventSink<ToplevelEvent>>>,
    views: ViewSinks,
}

/// A host window as seen by the engine
///
/// Cloning yields another handle to the same toplevel.
#[derive(Clone)]
pub struct DesktopToplevel {
    inner: Rc<RefCell<ToplevelInner>>,
}

impl DesktopToplevel {
    pub(crate) fn new(window: &Rc<dyn HostWindow>, screens: Weak<RefCell<MonitorSet>>) -> Self {
        let toplevel = Self {
            inner: Rc::new(RefCell::new(ToplevelInner {
                key: window.key(),
                window: Rc::downgrade(window),
                valid: true,
                realized: false,
                closed: false,
                tracker: ToplevelTracker::new(),
                scale: window.scale_factor(),
                screens,
                sink: None,
                views: SmallVec::new(),
            })),
        };
        if window.is_realized() {
            toplevel.realized();
        }
        toplevel
    }

    pub fn key(&self) -> WindowKey {
        self.inner.borrow().key
    }

    /// Route toplevel events to `sink`
    ///
    /// A realized toplevel first replays its current state and screen.
    pub fn connect(&self, sink: Rc<dyn EventSink<ToplevelEvent>>) {
        let replay = {
            let mut inner = self.inner.borrow_mut();
            inner.sink = Some(sink.clone());
            if inner.realized {
                inner.tracker.snapshot_events()
            } else {
                SmallVec::new()
            }
        };
        for event in replay {
            sink.dispatch(event);
        }
    }

    /// State and screen events for a view mounted after the toplevel was realized
    pub(crate) fn snapshot_events(&self) -> SmallVec<[ToplevelEvent; 2]> {
        let inner = self.inner.borrow();
        if inner.realized {
            inner.tracker.snapshot_events()
        } else {
            SmallVec::new()
        }
    }

    pub(crate) fn attach_view(&self, view: ViewId, sink: Rc<dyn EventSink<ViewEvent>>) {
        let mut inner = self.inner.borrow_mut();
        inner.views.retain(|(id, _)| *id != view);
        inner.views.push((view, sink));
    }

    pub(crate) fn detach_view(&self, view: ViewId) {
        self.inner.borrow_mut().views.retain(|(id, _)| *id != view);
    }

    /// The host window, unless it is gone
    pub fn window(&self) -> Option<Rc<dyn HostWindow>> {
        let inner = self.inner.borrow();
        if !inner.valid {
            return None;
        }
        inner.window.upgrade()
    }

    pub fn is_realized(&self) -> bool {
        self.inner.borrow().realized
    }

    pub fn current_monitor(&self) -> Option<MonitorId> {
        self.inner.borrow().tracker.current_monitor()
    }

    /// The native surface was created; seed state and monitor from the host
    pub fn realized(&self) {
        let Some(window) = self.window() else {
            return;
        };

        let mut events = SmallVec::<[ToplevelEvent; 2]>::new();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.realized {
                return;
            }
            inner.realized = true;
            if let Some(state) = inner.tracker.state_changed(window.toplevel_state()) {
                events.push(ToplevelEvent::StateChanged(state));
            }
            let current = window.monitor_at_surface();
            inner.tracker.reset_monitor(current);
            if current.is_some() {
                events.push(ToplevelEvent::ScreenChanged);
            }
        }
        tracing::debug!(window = ?self.key(), "toplevel realized");
        self.emit(events);
    }

    /// The native surface is gone; host notifications are ignored until realized again
    pub fn unrealized(&self) {
        self.inner.borrow_mut().realized = false;
    }

    pub fn state_changed(&self, host_state: HostToplevelState) {
        let state = {
            let mut inner = self.inner.borrow_mut();
            if !inner.realized {
                return;
            }
            inner.tracker.state_changed(host_state)
        };
        if let Some(state) = state {
            tracing::trace!(window = ?self.key(), ?state, "toplevel state changed");
            self.emit([ToplevelEvent::StateChanged(state)]);
        }
    }

    pub fn entered_monitor(&self, monitor: MonitorId) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            inner.realized && inner.tracker.entered_monitor(monitor)
        };
        if changed {
            tracing::trace!(window = ?self.key(), %monitor, "toplevel entered monitor");
            self.emit([ToplevelEvent::ScreenChanged]);
        }
    }

    pub fn left_monitor(&self, monitor: MonitorId) {
        let window = self.window();
        let changed = {
            let mut inner = self.inner.borrow_mut();
            inner.realized
                && inner.tracker.left_monitor(monitor, || {
                    window.as_ref().and_then(|w| w.monitor_at_surface())
                })
        };
        if changed {
            tracing::trace!(window = ?self.key(), %monitor, "toplevel left monitor");
            self.emit([ToplevelEvent::ScreenChanged]);
        }
    }

    pub fn scale_changed(&self, scale: f64) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.scale == scale {
                return;
            }
            inner.scale = scale;
        }
        self.emit([ToplevelEvent::ScaleChanged(scale)]);
    }

    /// Forget the window; every later request reports unavailable
    pub fn invalidate(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.valid = false;
        inner.realized = false;
        inner.tracker.clear_monitors();
    }

    /// Invalidate and notify the engine once
    pub fn close(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.valid = false;
            inner.realized = false;
            inner.tracker.clear_monitors();
        }
        tracing::debug!(window = ?self.key(), "toplevel closed");
        self.emit([ToplevelEvent::Closed]);
        self.inner.borrow_mut().views.clear();
    }

    fn emit(&self, events: impl IntoIterator<Item = ToplevelEvent>) {
        let (sink, views) = {
            let inner = self.inner.borrow();
            let views: ViewSinks = inner.views.clone();
            (inner.sink.clone(), views)
        };

        for event in events {
            let view_event = match &event {
                ToplevelEvent::StateChanged(state) => Some(ViewEvent::StateChanged(*state)),
                ToplevelEvent::ScreenChanged => Some(ViewEvent::ScreenChanged),
                ToplevelEvent::ScaleChanged(_) | ToplevelEvent::Closed => None,
            };
            if let Some(view_event) = view_event {
                for (_, view) in &views {
                    view.dispatch(view_event.clone());
                }
            }
            if let Some(sink) = &sink {
                sink.dispatch(event);
            }
        }
    }
}

impl Toplevel for DesktopToplevel {
    fn state(&self) -> Option<ViewState> {
        self.window()?;
        Some(self.inner.borrow().tracker.state())
    }

    fn set_title(&self, title: &str) {
        if let Some(window) = self.window() {
            window.set_title(title);
        }
    }

    fn set_fullscreen(&self, fullscreen: bool) -> bool {
        let Some(window) = self.window() else {
            return false;
        };
        if fullscreen {
            window.fullscreen();
        } else {
            window.unfullscreen();
        }
        true
    }

    fn set_maximized(&self, maximized: bool) -> bool {
        let Some(window) = self.window() else {
            return false;
        };
        if maximized {
            window.maximize();
        } else {
            window.unmaximize();
        }
        true
    }

    fn screen(&self) -> Option<Screen> {
        self.window()?;
        let inner = self.inner.borrow();
        let monitor = inner.tracker.current_monitor()?;
        let screens = inner.screens.upgrade()?;
        let screen = screens.borrow().by_monitor(monitor).cloned();
        screen
    }

    fn is_in_screen(&self) -> bool {
        self.screen().is_some()
    }

    fn scale(&self) -> f64 {
        self.inner.borrow().scale
    }
}

impl std::fmt::Debug for DesktopToplevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DesktopToplevel")
            .field("key", &inner.key)
            .field("valid", &inner.valid)
            .field("realized", &inner.realized)
            .field("state", &inner.tracker.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{monitor, FakeWindow, WindowCall};
    use wpe_platform::EventQueue;

    #[test]
    fn test_mask_only_touches_flipped_bits() {
        let mut tracker = ToplevelTracker::new();
        assert_eq!(
            tracker.state_changed(HostToplevelState::FULLSCREEN),
            Some(ViewState::FULLSCREEN)
        );
        assert_eq!(
            tracker.state_changed(HostToplevelState::FULLSCREEN | HostToplevelState::MAXIMIZED),
            Some(ViewState::FULLSCREEN | ViewState::MAXIMIZED)
        );
        assert_eq!(
            tracker.state_changed(HostToplevelState::MAXIMIZED | HostToplevelState::FOCUSED),
            Some(ViewState::MAXIMIZED | ViewState::ACTIVE)
        );
    }

    #[test]
    fn test_unmapped_bits_do_not_notify() {
        let mut tracker = ToplevelTracker::new();
        assert_eq!(tracker.state_changed(HostToplevelState::MINIMIZED), None);
        assert_eq!(tracker.state(), ViewState::NONE);
    }

    #[test]
    fn test_monitor_membership() {
        let mut tracker = ToplevelTracker::new();
        assert!(tracker.entered_monitor(MonitorId(1)));
        assert!(!tracker.entered_monitor(MonitorId(1)));
        assert!(tracker.entered_monitor(MonitorId(2)));
        assert_eq!(tracker.current_monitor(), Some(MonitorId(2)));

        // still overlapping monitor 1, which the host now reports
        assert!(tracker.left_monitor(MonitorId(2), || Some(MonitorId(1))));
        assert_eq!(tracker.current_monitor(), Some(MonitorId(1)));

        tracker.left_monitor(MonitorId(1), || Some(MonitorId(1)));
        assert!(tracker.left_monitor(MonitorId(1), || panic!("list is empty")));
        assert_eq!(tracker.current_monitor(), None);
        assert!(!tracker.left_monitor(MonitorId(3), || None));
    }

    fn mount(window: &Rc<FakeWindow>) -> (DesktopToplevel, Rc<RefCell<MonitorSet>>) {
        let screens = Rc::new(RefCell::new(MonitorSet::from_monitors(&[
            monitor(1, 0, 1920),
            monitor(2, 1920, 1920),
        ])));
        let window: Rc<dyn HostWindow> = window.clone();
        (DesktopToplevel::new(&window, Rc::downgrade(&screens)), screens)
    }

    #[test]
    fn test_mutators_forward_to_window() {
        let window = FakeWindow::new(1);
        let (toplevel, _screens) = mount(&window);

        assert!(toplevel.set_fullscreen(true));
        assert!(toplevel.set_maximized(false));
        toplevel.set_title("Example");
        assert_eq!(
            window.take_calls(),
            vec![
                WindowCall::Fullscreen,
                WindowCall::Unmaximize,
                WindowCall::SetTitle("Example".into())
            ]
        );
        // the tracked state only follows host notifications
        assert_eq!(toplevel.state(), Some(ViewState::NONE));
    }

    #[test]
    fn test_gone_window_is_unavailable() {
        let window = FakeWindow::new(1);
        let (toplevel, _screens) = mount(&window);
        drop(window);

        assert!(!toplevel.set_fullscreen(true));
        assert!(!toplevel.set_maximized(true));
        assert_eq!(toplevel.state(), None);

        let window = FakeWindow::new(2);
        let (toplevel, _screens) = mount(&window);
        toplevel.invalidate();
        assert!(!toplevel.set_fullscreen(true));
        assert!(window.take_calls().is_empty());
    }

    #[test]
    fn test_realize_seeds_state_and_screen() {
        let window = FakeWindow::new(1);
        window.realized.set(false);
        window.state.set(HostToplevelState::MAXIMIZED | HostToplevelState::FOCUSED);
        window.monitor.set(Some(MonitorId(2)));
        let (toplevel, _screens) = mount(&window);
        let events = EventQueue::<ToplevelEvent>::new();
        toplevel.connect(Rc::new(events.clone()));

        // not realized yet: host notifications are ignored
        toplevel.entered_monitor(MonitorId(1));
        assert!(events.is_empty());

        toplevel.realized();
        assert_eq!(
            events.drain(),
            vec![
                ToplevelEvent::StateChanged(ViewState::MAXIMIZED | ViewState::ACTIVE),
                ToplevelEvent::ScreenChanged
            ]
        );
        assert_eq!(toplevel.screen().unwrap().x, 1920);
        assert!(toplevel.is_in_screen());
    }

    #[test]
    fn test_events_reach_mounted_views() {
        let window = FakeWindow::new(1);
        let (toplevel, _screens) = mount(&window);
        let toplevel_events = EventQueue::<ToplevelEvent>::new();
        let view_events = EventQueue::<ViewEvent>::new();
        toplevel.connect(Rc::new(toplevel_events.clone()));
        toplevel.attach_view(ViewId::next(), Rc::new(view_events.clone()));

        toplevel.state_changed(HostToplevelState::FULLSCREEN);
        toplevel.entered_monitor(MonitorId(1));
        toplevel.scale_changed(2.0);
        toplevel.scale_changed(2.0);

        assert_eq!(
            view_events.drain(),
            vec![
                ViewEvent::StateChanged(ViewState::FULLSCREEN),
                ViewEvent::ScreenChanged
            ]
        );
        assert_eq!(
            toplevel_events.drain(),
            vec![
                ToplevelEvent::StateChanged(ViewState::FULLSCREEN),
                ToplevelEvent::ScreenChanged,
                ToplevelEvent::ScaleChanged(2.0)
            ]
        );
        assert_eq!(toplevel.scale(), 2.0);
    }

    #[test]
    fn test_close_once() {
        let window = FakeWindow::new(1);
        let (toplevel, _screens) = mount(&window);
        let events = EventQueue::<ToplevelEvent>::new();
        toplevel.connect(Rc::new(events.clone()));

        toplevel.close();
        toplevel.close();
        assert_eq!(events.drain(), vec![ToplevelEvent::Closed]);
        assert!(toplevel.window().is_none());
        assert!(!toplevel.set_maximized(true));
    }

    #[test]
    fn test_connect_replays_current_state() {
        let window = FakeWindow::new(1);
        window.state.set(HostToplevelState::MAXIMIZED);
        window.monitor.set(Some(MonitorId(1)));
        let (toplevel, _screens) = mount(&window);

        let events = EventQueue::<ToplevelEvent>::new();
        toplevel.connect(Rc::new(events.clone()));
        assert_eq!(
            events.drain(),
            vec![
                ToplevelEvent::StateChanged(ViewState::MAXIMIZED),
                ToplevelEvent::ScreenChanged
            ]
        );

        toplevel.unrealized();
        toplevel.connect(Rc::new(events.clone()));
        assert!(events.is_empty());
    }

    #[test]
    fn test_invalidated_toplevel_has_no_screen() {
        let window = FakeWindow::new(1);
        window.monitor.set(Some(MonitorId(1)));
        let (toplevel, _screens) = mount(&window);
        toplevel.entered_monitor(MonitorId(1));
        assert!(toplevel.is_in_screen());

        toplevel.invalidate();
        assert_eq!(toplevel.screen(), None);
        assert!(!toplevel.is_in_screen());
        assert_eq!(toplevel.current_monitor(), None);
    }

    #[test]
    fn test_screen_gone_after_unplug() {
        let window = FakeWindow::new(1);
        let (toplevel, screens) = mount(&window);
        toplevel.entered_monitor(MonitorId(1));
        assert!(toplevel.is_in_screen());

        screens.borrow_mut().items_changed(0, 1, &[]);
        assert!(!toplevel.is_in_screen());
    }
}
