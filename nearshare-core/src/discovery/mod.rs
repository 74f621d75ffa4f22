//! Simulated Device Discovery
//!
//! Mimics progressive network scan results by revealing simulated devices
//! one at a time on a staggered, jittered schedule.
//!
//! ## Scan Lifecycle
//!
//! 1. **Start**: clear the visible list and bump the scan epoch
//! 2. **Probe**: ask the optional [`CapabilityProbe`] for devices; fall back
//!    to the static registry only if it is missing, fails or finds nothing
//! 3. **Reveal**: append device `i` after `base_step * i + jitter`
//! 4. **Stop**: bump the epoch again; pending reveals are discarded
//!
//! ## Usage
//!
//! ```no_run
//! use nearshare_core::discovery::DiscoverySimulator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut discovery = DiscoverySimulator::with_defaults();
//!     let mut events = discovery.subscribe();
//!
//!     discovery.start().await;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("Discovery event: {:?}", event);
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod events;
pub mod simulator;

use crate::{Result, SimulatedDevice};
use async_trait::async_trait;
use std::time::Duration;

pub use events::DiscoveryEvent;
pub use simulator::{reveal_schedule, DiscoverySimulator};

/// Default delay between consecutive reveals
pub const DEFAULT_BASE_STEP: Duration = Duration::from_millis(600);

/// Default upper bound on the random extra delay per reveal
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(400);

/// Configuration for the discovery simulator
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Delay step multiplied by the reveal index
    pub base_step: Duration,

    /// Maximum random delay added to each reveal
    pub max_jitter: Duration,

    /// Re-sort the visible list by ascending distance after each reveal
    pub sort_by_distance: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_step: DEFAULT_BASE_STEP,
            max_jitter: DEFAULT_MAX_JITTER,
            sort_by_distance: true,
        }
    }
}

/// Opportunistic platform probe for real nearby devices
///
/// A wireless-adapter enumeration, for instance. When a probe returns
/// devices they replace the static registry for that scan.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Probe name for logging
    fn name(&self) -> &str;

    /// Enumerate devices the platform can see
    async fn probe(&self) -> Result<Vec<SimulatedDevice>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_config_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.base_step, DEFAULT_BASE_STEP);
        assert_eq!(config.max_jitter, DEFAULT_MAX_JITTER);
        assert!(config.sort_by_distance);
    }
}
