//! Discovery Simulator
//!
//! Owns the visible device list and a single reveal task per scan.

use super::events::DiscoveryEvent;
use super::{CapabilityProbe, DiscoveryConfig};
use crate::delay::{DelaySource, RandomDelays};
use crate::registry::{sort_by_distance, MockDeviceRegistry};
use crate::SimulatedDevice;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Capacity of the discovery event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Mutable scan state, only touched under the write lock
#[derive(Debug, Default)]
struct ScanState {
    /// Bumped on every start and stop; reveals from older epochs are dropped
    epoch: u64,
    scanning: bool,
    visible: Vec<SimulatedDevice>,
}

/// Compute the reveal offset of each of `count` devices
///
/// Offset `i` is `base_step * i + jitter_i`, raised where needed so the
/// offsets never decrease.
///
/// # Examples
///
/// ```
/// use nearshare_core::discovery::{reveal_schedule, DiscoveryConfig};
/// use nearshare_core::FixedDelays;
/// use std::time::Duration;
///
/// let schedule = reveal_schedule(3, &DiscoveryConfig::default(), &FixedDelays::default());
/// assert_eq!(
///     schedule,
///     vec![Duration::ZERO, Duration::from_millis(600), Duration::from_millis(1200)]
/// );
/// ```
pub fn reveal_schedule(
    count: usize,
    config: &DiscoveryConfig,
    delays: &dyn DelaySource,
) -> Vec<Duration> {
    let mut previous = Duration::ZERO;
    (0..count)
        .map(|index| {
            let offset =
                config.base_step * index as u32 + delays.reveal_jitter(index, config.max_jitter);
            previous = previous.max(offset);
            previous
        })
        .collect()
}

/// Staggered reveal of simulated devices
///
/// `start` and `stop` take `&mut self`; observers use the shared-reference
/// accessors and [`subscribe`](Self::subscribe).
pub struct DiscoverySimulator {
    /// Fallback source list
    registry: MockDeviceRegistry,

    config: DiscoveryConfig,

    delays: Arc<dyn DelaySource>,

    /// Optional platform probe tried before the registry
    probe: Option<Arc<dyn CapabilityProbe>>,

    state: Arc<RwLock<ScanState>>,

    event_tx: broadcast::Sender<DiscoveryEvent>,

    /// Reveal task of the current scan
    task: Option<JoinHandle<()>>,
}

impl DiscoverySimulator {
    /// Create a simulator over `registry` with random jitter
    pub fn new(registry: MockDeviceRegistry, config: DiscoveryConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            registry,
            config,
            delays: Arc::new(RandomDelays),
            probe: None,
            state: Arc::new(RwLock::new(ScanState::default())),
            event_tx,
            task: None,
        }
    }

    /// Reference registry, default configuration
    pub fn with_defaults() -> Self {
        Self::new(MockDeviceRegistry::reference(), DiscoveryConfig::default())
    }

    /// Replace the delay source
    pub fn with_delays(mut self, delays: Arc<dyn DelaySource>) -> Self {
        self.delays = delays;
        self
    }

    /// Attach a capability probe
    pub fn with_probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Subscribe to discovery events
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.event_tx.subscribe()
    }

    /// Start a scan, restarting any scan in progress
    ///
    /// Returns the number of devices that will be revealed.
    pub async fn start(&mut self) -> usize {
        self.halt().await;

        let epoch = {
            let mut state = self.state.write().await;
            state.epoch += 1;
            state.scanning = true;
            state.visible.clear();
            state.epoch
        };

        let source = self.resolve_source().await;
        let schedule = reveal_schedule(source.len(), &self.config, self.delays.as_ref());
        let expected = source.len();

        info!(
            "Starting discovery scan {} ({} devices, step {:?})",
            epoch, expected, self.config.base_step
        );
        let _ = self.event_tx.send(DiscoveryEvent::ScanStarted { epoch, expected });

        let state = self.state.clone();
        let event_tx = self.event_tx.clone();
        let sort = self.config.sort_by_distance;

        self.task = Some(tokio::spawn(async move {
            let started = Instant::now();

            for (index, (offset, device)) in schedule.into_iter().zip(source).enumerate() {
                sleep_until(started + offset).await;

                let mut state = state.write().await;
                if state.epoch != epoch {
                    debug!("Dropping reveal from stale scan {}", epoch);
                    return;
                }

                state.visible.push(device.clone());
                if sort {
                    sort_by_distance(&mut state.visible);
                }

                debug!(
                    "Revealed {} at {:.1} m ({}/{})",
                    device.name,
                    device.distance_m,
                    index + 1,
                    expected
                );
                let visible = state.visible.len();
                let _ = event_tx.send(DiscoveryEvent::DeviceRevealed {
                    epoch,
                    device,
                    index,
                    visible,
                });
            }

            let mut state = state.write().await;
            if state.epoch != epoch {
                return;
            }
            state.scanning = false;
            let count = state.visible.len();
            info!("Discovery scan {} completed with {} devices", epoch, count);
            let _ = event_tx.send(DiscoveryEvent::ScanCompleted { epoch, count });
        }));

        expected
    }

    /// Stop the scan; devices already revealed stay visible
    ///
    /// No reveal lands after this returns.
    pub async fn stop(&mut self) {
        let (was_scanning, epoch, visible) = {
            let mut state = self.state.write().await;
            let was_scanning = state.scanning;
            state.epoch += 1;
            state.scanning = false;
            (was_scanning, state.epoch, state.visible.len())
        };

        if let Some(task) = self.task.take() {
            task.abort();
        }

        if was_scanning {
            info!("Stopped discovery scan with {} devices visible", visible);
            let _ = self
                .event_tx
                .send(DiscoveryEvent::ScanStopped { epoch, visible });
        }
    }

    /// Wait for the current scan's reveal task to finish
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Snapshot of the visible devices
    pub async fn devices(&self) -> Vec<SimulatedDevice> {
        self.state.read().await.visible.clone()
    }

    /// Look up a visible device by id
    pub async fn device(&self, device_id: &str) -> Option<SimulatedDevice> {
        self.state
            .read()
            .await
            .visible
            .iter()
            .find(|d| d.id == device_id)
            .cloned()
    }

    pub async fn visible_count(&self) -> usize {
        self.state.read().await.visible.len()
    }

    pub async fn is_scanning(&self) -> bool {
        self.state.read().await.scanning
    }

    /// Abort the reveal task without emitting `ScanStopped`
    async fn halt(&mut self) {
        if let Some(task) = self.task.take() {
            self.state.write().await.epoch += 1;
            task.abort();
        }
    }

    /// Devices for the next scan
    ///
    /// The probe result wins when it is non-empty. Duplicate ids keep their
    /// first occurrence.
    async fn resolve_source(&self) -> Vec<SimulatedDevice> {
        let devices = match &self.probe {
            Some(probe) => match probe.probe().await {
                Ok(devices) if !devices.is_empty() => {
                    info!("Probe {} found {} devices", probe.name(), devices.len());
                    devices
                }
                Ok(_) => {
                    debug!(
                        "Probe {} found no devices, using reference list",
                        probe.name()
                    );
                    self.registry.devices().to_vec()
                }
                Err(e) => {
                    warn!(
                        "Probe {} failed: {}. Using reference list",
                        probe.name(),
                        e
                    );
                    self.registry.devices().to_vec()
                }
            },
            None => self.registry.devices().to_vec(),
        };

        let mut seen = HashSet::new();
        devices
            .into_iter()
            .filter(|d| seen.insert(d.id.clone()))
            .collect()
    }
}

impl Drop for DiscoverySimulator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
