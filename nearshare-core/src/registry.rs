//! Mock Device Registry
//!
//! The fixed, ordered table of simulated peers that discovery reveals when no
//! capability probe produces devices of its own.

use crate::device::{DeviceKind, DeviceStatus, NetworkType, SimulatedDevice};
use crate::{Result, SimError};
use std::collections::HashSet;

struct ReferenceDevice {
    id: &'static str,
    name: &'static str,
    kind: DeviceKind,
    brand: &'static str,
    model: &'static str,
    os: &'static str,
    distance_m: f32,
    signal: u8,
    network: NetworkType,
    capabilities: &'static [&'static str],
    status: DeviceStatus,
    battery: Option<u8>,
    transfer_speed: u8,
}

const REFERENCE_DEVICES: &[ReferenceDevice] = &[
    ReferenceDevice {
        id: "phone-pixel-8",
        name: "Alex's Pixel 8",
        kind: DeviceKind::Phone,
        brand: "Google",
        model: "Pixel 8",
        os: "Android 14",
        distance_m: 1.2,
        signal: 92,
        network: NetworkType::Wifi,
        capabilities: &["files", "text", "photos"],
        status: DeviceStatus::Online,
        battery: Some(78),
        transfer_speed: 8,
    },
    ReferenceDevice {
        id: "laptop-macbook-pro",
        name: "Work MacBook Pro",
        kind: DeviceKind::Laptop,
        brand: "Apple",
        model: "MacBook Pro 14",
        os: "macOS 14",
        distance_m: 3.5,
        signal: 85,
        network: NetworkType::Wifi,
        capabilities: &["files", "text", "screen-mirror"],
        status: DeviceStatus::Online,
        battery: Some(64),
        transfer_speed: 10,
    },
    ReferenceDevice {
        id: "tv-lg-oled",
        name: "Living Room TV",
        kind: DeviceKind::Tv,
        brand: "LG",
        model: "OLED C3",
        os: "webOS 23",
        distance_m: 6.8,
        signal: 70,
        network: NetworkType::WifiDirect,
        capabilities: &["screen-mirror", "photos", "video"],
        status: DeviceStatus::Online,
        battery: None,
        transfer_speed: 6,
    },
    ReferenceDevice {
        id: "tablet-ipad-air",
        name: "Sam's iPad",
        kind: DeviceKind::Tablet,
        brand: "Apple",
        model: "iPad Air",
        os: "iPadOS 17",
        distance_m: 2.4,
        signal: 88,
        network: NetworkType::Wifi,
        capabilities: &["files", "text", "photos"],
        status: DeviceStatus::Away,
        battery: Some(41),
        transfer_speed: 7,
    },
    ReferenceDevice {
        id: "car-model-3",
        name: "Model 3",
        kind: DeviceKind::Car,
        brand: "Tesla",
        model: "Model 3",
        os: "Tesla OS 2024",
        distance_m: 15.0,
        signal: 45,
        network: NetworkType::Bluetooth,
        capabilities: &["audio", "contacts"],
        status: DeviceStatus::Busy,
        battery: Some(82),
        transfer_speed: 2,
    },
    ReferenceDevice {
        id: "speaker-sonos-era",
        name: "Kitchen Speaker",
        kind: DeviceKind::Speaker,
        brand: "Sonos",
        model: "Era 100",
        os: "Sonos S2",
        distance_m: 5.1,
        signal: 76,
        network: NetworkType::Wifi,
        capabilities: &["audio"],
        status: DeviceStatus::Online,
        battery: None,
        transfer_speed: 3,
    },
    ReferenceDevice {
        id: "headphones-wh1000xm5",
        name: "WH-1000XM5",
        kind: DeviceKind::Headphones,
        brand: "Sony",
        model: "WH-1000XM5",
        os: "Firmware 2.1",
        distance_m: 0.8,
        signal: 95,
        network: NetworkType::Bluetooth,
        capabilities: &["audio"],
        status: DeviceStatus::Busy,
        battery: Some(55),
        transfer_speed: 2,
    },
    ReferenceDevice {
        id: "watch-galaxy-6",
        name: "Galaxy Watch6",
        kind: DeviceKind::Watch,
        brand: "Samsung",
        model: "Galaxy Watch6",
        os: "Wear OS 4",
        distance_m: 0.5,
        signal: 97,
        network: NetworkType::Bluetooth,
        capabilities: &["text", "notifications"],
        status: DeviceStatus::Online,
        battery: Some(23),
        transfer_speed: 1,
    },
    ReferenceDevice {
        id: "desktop-studio",
        name: "Studio PC",
        kind: DeviceKind::Desktop,
        brand: "Custom",
        model: "Ryzen Workstation",
        os: "Windows 11",
        distance_m: 9.3,
        signal: 60,
        network: NetworkType::Ethernet,
        capabilities: &["files", "text"],
        status: DeviceStatus::Offline,
        battery: None,
        transfer_speed: 12,
    },
];

impl From<&ReferenceDevice> for SimulatedDevice {
    fn from(r: &ReferenceDevice) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name.to_string(),
            kind: r.kind,
            brand: r.brand.to_string(),
            model: r.model.to_string(),
            os: r.os.to_string(),
            avatar: r.kind.as_str().to_string(),
            distance_m: r.distance_m,
            signal: r.signal,
            network: r.network,
            capabilities: r.capabilities.iter().map(|c| c.to_string()).collect(),
            status: r.status,
            battery: r.battery,
            transfer_speed: r.transfer_speed,
        }
    }
}

/// Ordered table of simulated devices with unique ids
#[derive(Debug, Clone)]
pub struct MockDeviceRegistry {
    devices: Vec<SimulatedDevice>,
}

impl Default for MockDeviceRegistry {
    fn default() -> Self {
        Self::reference()
    }
}

impl MockDeviceRegistry {
    /// The built-in nine-device reference table
    pub fn reference() -> Self {
        Self {
            devices: REFERENCE_DEVICES.iter().map(SimulatedDevice::from).collect(),
        }
    }

    /// Build a registry from a custom list, rejecting duplicate ids
    ///
    /// # Examples
    ///
    /// ```
    /// use nearshare_core::{DeviceKind, MockDeviceRegistry, SimulatedDevice};
    ///
    /// let registry = MockDeviceRegistry::from_devices(vec![
    ///     SimulatedDevice::new("a", "A", DeviceKind::Phone),
    ///     SimulatedDevice::new("b", "B", DeviceKind::Tv),
    /// ])
    /// .unwrap();
    /// assert_eq!(registry.len(), 2);
    /// ```
    pub fn from_devices(devices: Vec<SimulatedDevice>) -> Result<Self> {
        let mut seen = HashSet::new();
        for device in &devices {
            if !seen.insert(device.id.as_str()) {
                return Err(SimError::Configuration(format!(
                    "duplicate device id '{}'",
                    device.id
                )));
            }
        }
        Ok(Self { devices })
    }

    /// All devices in table order
    pub fn devices(&self) -> &[SimulatedDevice] {
        &self.devices
    }

    pub fn get(&self, device_id: &str) -> Option<&SimulatedDevice> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    /// Look up a device, failing with `DeviceNotFound`
    pub fn require(&self, device_id: &str) -> Result<&SimulatedDevice> {
        self.get(device_id)
            .ok_or_else(|| SimError::DeviceNotFound(device_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices sorted ascending by distance
    pub fn by_distance(&self) -> Vec<SimulatedDevice> {
        let mut devices = self.devices.clone();
        sort_by_distance(&mut devices);
        devices
    }
}

/// Stable ascending sort by distance
pub fn sort_by_distance(devices: &mut [SimulatedDevice]) {
    devices.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table() {
        let registry = MockDeviceRegistry::reference();
        assert_eq!(registry.len(), 9);

        let kinds: HashSet<DeviceKind> = registry.devices().iter().map(|d| d.kind).collect();
        for kind in [
            DeviceKind::Phone,
            DeviceKind::Laptop,
            DeviceKind::Tv,
            DeviceKind::Tablet,
            DeviceKind::Car,
            DeviceKind::Speaker,
            DeviceKind::Headphones,
            DeviceKind::Watch,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_reference_ids_unique() {
        let registry = MockDeviceRegistry::reference();
        let ids: HashSet<&str> = registry.devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), registry.len());
    }

    #[test]
    fn test_lookup() {
        let registry = MockDeviceRegistry::reference();
        assert_eq!(
            registry.get("laptop-macbook-pro").map(|d| d.transfer_speed),
            Some(10)
        );
        assert!(registry.get("nope").is_none());
        assert!(matches!(
            registry.require("nope"),
            Err(SimError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = MockDeviceRegistry::from_devices(vec![
            SimulatedDevice::new("same", "One", DeviceKind::Phone),
            SimulatedDevice::new("same", "Two", DeviceKind::Tv),
        ]);
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_by_distance() {
        let sorted = MockDeviceRegistry::reference().by_distance();
        assert!(sorted
            .windows(2)
            .all(|w| w[0].distance_m <= w[1].distance_m));
        assert_eq!(sorted[0].id, "watch-galaxy-6");
    }
}
