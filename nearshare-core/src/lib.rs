//! NearShare Simulator Core
//!
//! Simulated nearby-device discovery and file/text sharing for prototyping
//! share UIs without real radios. Devices come from a fixed reference
//! registry and are revealed over time with jitter; transfers advance through
//! a staged lifecycle with randomized progress.

pub mod clipboard;
pub mod delay;
pub mod device;
pub mod discovery;
pub mod item;
pub mod registry;
pub mod selection;
pub mod service;
pub mod transfer;

mod error;

pub use clipboard::{copy_item, copy_text, Clipboard};
pub use delay::{DelaySource, FixedDelays, RandomDelays};
pub use device::{DeviceKind, DeviceStatus, NetworkType, SimulatedDevice};
pub use discovery::{
    CapabilityProbe, DiscoveryConfig, DiscoveryEvent, DiscoverySimulator, DEFAULT_BASE_STEP,
    DEFAULT_MAX_JITTER,
};
pub use error::{Result, SimError};
pub use item::{payload_size, ItemContent, ShareableItem};
pub use registry::MockDeviceRegistry;
pub use selection::SelectionState;
pub use service::{
    FetchState, Fetcher, FirmwareVersion, HardwareDevice, HardwareService, HealthReport,
    StaticHardwareService,
};
pub use transfer::{TransferConfig, TransferEvent, TransferSession, TransferSimulator, TransferStatus};
