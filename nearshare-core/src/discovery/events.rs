//! Discovery Event System
//!
//! Events emitted by the discovery simulator.

use crate::SimulatedDevice;

/// Events emitted by the discovery simulator
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// A scan started; `expected` devices will be revealed unless stopped
    ScanStarted {
        /// Scan epoch, bumped on every start and stop
        epoch: u64,
        expected: usize,
    },

    /// A device became visible
    DeviceRevealed {
        epoch: u64,
        /// The revealed device
        device: SimulatedDevice,
        /// Position in discovery order
        index: usize,
        /// Number of visible devices after this reveal
        visible: usize,
    },

    /// Every scheduled reveal fired
    ScanCompleted { epoch: u64, count: usize },

    /// The scan was stopped before completing
    ScanStopped { epoch: u64, visible: usize },
}

impl DiscoveryEvent {
    /// Check if this is a device revealed event
    pub fn is_device_revealed(&self) -> bool {
        matches!(self, DiscoveryEvent::DeviceRevealed { .. })
    }

    /// Check if this event ends a scan
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DiscoveryEvent::ScanCompleted { .. } | DiscoveryEvent::ScanStopped { .. }
        )
    }

    /// Get device ID if this event is device-related
    pub fn device_id(&self) -> Option<&str> {
        match self {
            DiscoveryEvent::DeviceRevealed { device, .. } => Some(&device.id),
            _ => None,
        }
    }

    /// Epoch of the scan this event belongs to
    pub fn epoch(&self) -> u64 {
        match self {
            DiscoveryEvent::ScanStarted { epoch, .. }
            | DiscoveryEvent::DeviceRevealed { epoch, .. }
            | DiscoveryEvent::ScanCompleted { epoch, .. }
            | DiscoveryEvent::ScanStopped { epoch, .. } => *epoch,
        }
    }
}
