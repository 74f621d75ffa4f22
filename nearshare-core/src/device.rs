//! Simulated Device Records
//!
//! Static descriptions of fake nearby peers. Nothing here talks to a network;
//! the records exist so the discovery and transfer simulators have something
//! to reveal and target.

use serde::{Deserialize, Serialize};

/// Kinds of simulated peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Phone,
    Laptop,
    Desktop,
    Tv,
    Tablet,
    Car,
    Speaker,
    Headphones,
    Watch,
}

impl DeviceKind {
    /// Convert device kind to string
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Phone => "phone",
            DeviceKind::Laptop => "laptop",
            DeviceKind::Desktop => "desktop",
            DeviceKind::Tv => "tv",
            DeviceKind::Tablet => "tablet",
            DeviceKind::Car => "car",
            DeviceKind::Speaker => "speaker",
            DeviceKind::Headphones => "headphones",
            DeviceKind::Watch => "watch",
        }
    }
}

/// Presence status shown next to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Busy,
    Away,
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Busy => "busy",
            DeviceStatus::Away => "away",
            DeviceStatus::Offline => "offline",
        }
    }

    /// Whether the device accepts transfers; only offline devices refuse
    pub fn is_reachable(&self) -> bool {
        !matches!(self, DeviceStatus::Offline)
    }
}

/// Network link the device was "seen" on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkType {
    Wifi,
    WifiDirect,
    Bluetooth,
    Ethernet,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Wifi => "wifi",
            NetworkType::WifiDirect => "wifi-direct",
            NetworkType::Bluetooth => "bluetooth",
            NetworkType::Ethernet => "ethernet",
        }
    }
}

/// A fake nearby peer
///
/// Immutable reference data. The registry hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedDevice {
    /// Stable identifier, unique within a registry
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Kind of device
    pub kind: DeviceKind,

    pub brand: String,

    pub model: String,

    /// Operating system string, e.g. "Android 14"
    pub os: String,

    /// Icon name used by a front end
    pub avatar: String,

    /// Distance from this device in metres
    pub distance_m: f32,

    /// Signal strength percentage (0-100)
    pub signal: u8,

    pub network: NetworkType,

    /// Capability tags, e.g. "files", "text", "screen-mirror"
    pub capabilities: Vec<String>,

    pub status: DeviceStatus,

    /// Battery level percentage, if the device reports one
    #[serde(default)]
    pub battery: Option<u8>,

    /// Relative transfer speed; bounds the per-tick progress step
    pub transfer_speed: u8,
}

impl SimulatedDevice {
    /// Create a device with neutral defaults for everything but identity
    ///
    /// # Examples
    ///
    /// ```
    /// use nearshare_core::{DeviceKind, SimulatedDevice};
    ///
    /// let device = SimulatedDevice::new("tv-1", "Living Room TV", DeviceKind::Tv)
    ///     .with_distance(4.5)
    ///     .with_capability("files");
    /// assert!(device.has_capability("files"));
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            brand: String::new(),
            model: String::new(),
            os: String::new(),
            avatar: kind.as_str().to_string(),
            distance_m: 0.0,
            signal: 100,
            network: NetworkType::Wifi,
            capabilities: Vec::new(),
            status: DeviceStatus::Online,
            battery: None,
            transfer_speed: 5,
        }
    }

    pub fn with_distance(mut self, distance_m: f32) -> Self {
        self.distance_m = distance_m;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_transfer_speed(mut self, transfer_speed: u8) -> Self {
        self.transfer_speed = transfer_speed;
        self
    }

    /// Check whether the device advertises a capability tag
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// One-line summary for logs and listings
    pub fn summary(&self) -> String {
        let battery = self
            .battery
            .map(|b| format!(", battery {}%", b))
            .unwrap_or_default();
        format!(
            "{} ({} {}) {:.1} m, signal {}%, {}{}",
            self.name,
            self.brand,
            self.model,
            self.distance_m,
            self.signal,
            self.status.as_str(),
            battery
        )
    }
}
