//! Screens as seen by the engine

use std::fmt;

/// Host-side identity of a monitor
///
/// Assigned by the host binding; stable for as long as the host keeps the
/// monitor connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorId(pub u64);

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "monitor-{}", self.0)
    }
}

/// Snapshot of a host monitor
///
/// Values are copied once when the screen is created. Later changes to the
/// host monitor are not reflected until the host reports it as replaced.
#[derive(Clone, Debug, PartialEq)]
pub struct Screen {
    /// Engine-facing id, unique among the screens of one display
    pub id: u32,
    /// The host monitor this screen was created from
    pub monitor: MonitorId,
    /// Position in the global coordinate space, in logical pixels
    pub x: i32,
    pub y: i32,
    /// Size in logical pixels
    pub width: i32,
    pub height: i32,
    /// Physical size in millimeters (0 when unknown)
    pub physical_width: i32,
    pub physical_height: i32,
    /// Device scale factor
    pub scale: f64,
    /// Refresh rate in millihertz (0 when unknown)
    pub refresh_rate: u32,
}

