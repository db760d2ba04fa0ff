//! Screen registry kept index-aligned with the host monitor list

use crate::host::MonitorInfo;
use wpe_platform::{MonitorId, Screen};

/// A splice of the host monitor list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorsChange {
    pub index: usize,
    pub removed: usize,
    pub added: usize,
}

/// Ordered screens, one per host monitor, in host order
#[derive(Debug)]
pub struct MonitorSet {
    screens: Vec<Screen>,
    next_id: u32,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self {
            screens: Vec::new(),
            next_id: 1,
        }
    }

    pub fn from_monitors(monitors: &[MonitorInfo]) -> Self {
        let mut set = Self::new();
        set.items_changed(0, 0, monitors);
        set
    }

    fn snapshot(&mut self, info: &MonitorInfo) -> Screen {
        let id = self.next_id;
        self.next_id += 1;
        Screen {
            id,
            monitor: info.id,
            x: info.x,
            y: info.y,
            width: info.width,
            height: info.height,
            physical_width: info.width_mm,
            physical_height: info.height_mm,
            scale: info.scale_factor,
            refresh_rate: info.refresh_rate,
        }
    }

    /// Remove `n_removed` screens at `index` and insert snapshots of `added` there
    ///
    /// Out-of-range splices are clamped to the current list.
    pub fn items_changed(&mut self, index: usize, n_removed: usize, added: &[MonitorInfo]) {
        let index = if index > self.screens.len() {
            tracing::warn!(index, len = self.screens.len(), "monitor splice past the end");
            self.screens.len()
        } else {
            index
        };
        let n_removed = n_removed.min(self.screens.len() - index);

        let fresh: Vec<Screen> = added.iter().map(|info| self.snapshot(info)).collect();
        let removed: Vec<Screen> = self
            .screens
            .splice(index..index + n_removed, fresh)
            .collect();

        for screen in &removed {
            tracing::debug!(screen = screen.id, monitor = %screen.monitor, "screen removed");
        }
        for screen in &self.screens[index..index + added.len()] {
            tracing::debug!(
                screen = screen.id,
                monitor = %screen.monitor,
                width = screen.width,
                height = screen.height,
                scale = screen.scale,
                "screen added"
            );
        }
    }

    /// Compute the splice that turns this set into `current`
    ///
    /// Screens whose monitor properties changed count as replaced.
    pub fn diff(&self, current: &[MonitorInfo]) -> Option<MonitorsChange> {
        let matches = |screen: &Screen, info: &MonitorInfo| {
            screen.monitor == info.id
                && screen.x == info.x
                && screen.y == info.y
                && screen.width == info.width
                && screen.height == info.height
                && screen.scale == info.scale_factor
                && screen.refresh_rate == info.refresh_rate
        };

        let prefix = self
            .screens
            .iter()
            .zip(current)
            .take_while(|(screen, info)| matches(screen, info))
            .count();
        let room = self.screens.len().min(current.len()) - prefix;
        let suffix = self.screens[prefix..]
            .iter()
            .rev()
            .zip(current[prefix..].iter().rev())
            .take(room)
            .take_while(|(screen, info)| matches(screen, info))
            .count();

        let removed = self.screens.len() - prefix - suffix;
        let added = current.len() - prefix - suffix;
        if removed == 0 && added == 0 {
            return None;
        }
        Some(MonitorsChange {
            index: prefix,
            removed,
            added,
        })
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Screen> {
        self.screens.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Screen> {
        self.screens.iter()
    }

    /// The screen created for a host monitor
    pub fn by_monitor(&self, monitor: MonitorId) -> Option<&Screen> {
        self.screens.iter().find(|screen| screen.monitor == monitor)
    }
}

impl Default for MonitorSet {
    fn default() -> Self {
        Self::new()
    }
}
