//! Simulator Integration Tests
//!
//! Drives discovery and transfers end to end on a paused clock:
//! - Progressive reveal of the reference registry
//! - Probe fallback to the registry
//! - Transfer lifecycle, progress bounds and completion
//! - Cancellation of scans and transfers
//! - Selection bookkeeping around a completed share

use async_trait::async_trait;
use nearshare_core::discovery::{CapabilityProbe, DiscoveryConfig, DiscoveryEvent};
use nearshare_core::transfer::{TransferEvent, TransferStatus};
use nearshare_core::{
    DeviceKind, DeviceStatus, DiscoverySimulator, FixedDelays, MockDeviceRegistry,
    RandomDelays, Result, SelectionState, ShareableItem, SimError, SimulatedDevice,
    TransferConfig, TransferSimulator,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

fn fixed_transfers(step: u8) -> TransferSimulator {
    TransferSimulator::new(TransferConfig::default()).with_delays(Arc::new(
        FixedDelays::default()
            .with_connect(Duration::from_secs(2))
            .with_tick(Duration::from_millis(150))
            .with_step(step),
    ))
}

fn drain<T: Clone>(rx: &mut tokio::sync::broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

struct FailingProbe;

#[async_trait]
impl CapabilityProbe for FailingProbe {
    fn name(&self) -> &str {
        "failing"
    }

    async fn probe(&self) -> Result<Vec<SimulatedDevice>> {
        Err(SimError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "adapter locked",
        )))
    }
}

struct EmptyProbe;

#[async_trait]
impl CapabilityProbe for EmptyProbe {
    fn name(&self) -> &str {
        "empty"
    }

    async fn probe(&self) -> Result<Vec<SimulatedDevice>> {
        Ok(Vec::new())
    }
}

struct ListProbe(Vec<SimulatedDevice>);

#[async_trait]
impl CapabilityProbe for ListProbe {
    fn name(&self) -> &str {
        "list"
    }

    async fn probe(&self) -> Result<Vec<SimulatedDevice>> {
        Ok(self.0.clone())
    }
}

/// Full reference scan: every device shows up within 6 s, nearest first
#[tokio::test(start_paused = true)]
async fn test_reference_scan_reveals_all_sorted() {
    let mut discovery = DiscoverySimulator::with_defaults().with_delays(Arc::new(RandomDelays));
    let mut events = discovery.subscribe();

    assert_eq!(discovery.start().await, 9);
    sleep(Duration::from_secs(6)).await;

    let devices = discovery.devices().await;
    assert_eq!(devices.len(), 9);
    assert!(devices
        .windows(2)
        .all(|w| w[0].distance_m <= w[1].distance_m));
    assert_eq!(devices[0].id, "watch-galaxy-6");
    assert!(!discovery.is_scanning().await);

    let events = drain(&mut events);
    assert!(matches!(
        events.last(),
        Some(DiscoveryEvent::ScanCompleted { count: 9, .. })
    ));
}

/// The visible list only grows during a scan and each device appears once
#[tokio::test(start_paused = true)]
async fn test_visible_list_is_monotonic_and_exact() {
    let mut discovery = DiscoverySimulator::with_defaults().with_delays(Arc::new(RandomDelays));
    let mut events = discovery.subscribe();

    discovery.start().await;
    discovery.wait().await;

    let mut last_visible = 0;
    let mut revealed = Vec::new();
    for event in drain(&mut events) {
        if let DiscoveryEvent::DeviceRevealed {
            device, visible, ..
        } = event
        {
            assert_eq!(visible, last_visible + 1);
            last_visible = visible;
            revealed.push(device.id);
        }
    }

    let unique: HashSet<&String> = revealed.iter().collect();
    assert_eq!(revealed.len(), 9);
    assert_eq!(unique.len(), 9);

    let expected: HashSet<String> = MockDeviceRegistry::reference()
        .devices()
        .iter()
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(expected, revealed.into_iter().collect::<HashSet<_>>());
}

/// Sampled mid-scan, every snapshot contains the one before it
#[tokio::test(start_paused = true)]
async fn test_visible_snapshots_only_grow() {
    let mut discovery = DiscoverySimulator::with_defaults().with_delays(Arc::new(RandomDelays));
    discovery.start().await;

    let mut previous: HashSet<String> = HashSet::new();
    let mut growths = 0;
    for _ in 0..70 {
        sleep(Duration::from_millis(100)).await;
        let snapshot: HashSet<String> = discovery
            .devices()
            .await
            .into_iter()
            .map(|d| d.id)
            .collect();

        assert!(
            previous.is_subset(&snapshot),
            "device vanished: {:?} -> {:?}",
            previous,
            snapshot
        );
        if snapshot.len() > previous.len() {
            growths += 1;
        }
        previous = snapshot;
    }

    assert_eq!(previous.len(), 9);
    assert!(growths > 1, "reveals should be spread over several samples");
}

/// Nothing is revealed after stop returns
#[tokio::test(start_paused = true)]
async fn test_stop_discards_pending_reveals() {
    let config = DiscoveryConfig {
        base_step: Duration::from_millis(600),
        max_jitter: Duration::ZERO,
        sort_by_distance: false,
    };
    let mut discovery = DiscoverySimulator::new(MockDeviceRegistry::reference(), config)
        .with_delays(Arc::new(FixedDelays::default()));
    let mut events = discovery.subscribe();

    discovery.start().await;
    sleep(Duration::from_millis(1_300)).await;
    discovery.stop().await;
    let stopped_with = discovery.visible_count().await;
    assert_eq!(stopped_with, 3);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(discovery.visible_count().await, stopped_with);

    let events = drain(&mut events);
    let stop_at = events
        .iter()
        .position(|e| matches!(e, DiscoveryEvent::ScanStopped { .. }))
        .unwrap();
    assert!(events[stop_at..]
        .iter()
        .all(|e| !e.is_device_revealed()));
}

/// A failing probe falls back to the registry
#[tokio::test(start_paused = true)]
async fn test_failing_probe_uses_registry() {
    let mut discovery = DiscoverySimulator::with_defaults()
        .with_delays(Arc::new(FixedDelays::default()))
        .with_probe(Arc::new(FailingProbe));

    assert_eq!(discovery.start().await, 9);
    discovery.wait().await;
    assert_eq!(discovery.visible_count().await, 9);
}

/// An empty probe result falls back to the registry
#[tokio::test(start_paused = true)]
async fn test_empty_probe_uses_registry() {
    let mut discovery = DiscoverySimulator::with_defaults()
        .with_delays(Arc::new(FixedDelays::default()))
        .with_probe(Arc::new(EmptyProbe));

    assert_eq!(discovery.start().await, 9);
}

/// A probe with results replaces the registry, duplicates dropped
#[tokio::test(start_paused = true)]
async fn test_probe_results_replace_registry() {
    let probe = ListProbe(vec![
        SimulatedDevice::new("real-1", "Real Phone", DeviceKind::Phone).with_distance(2.0),
        SimulatedDevice::new("real-2", "Real Speaker", DeviceKind::Speaker).with_distance(1.0),
        SimulatedDevice::new("real-1", "Real Phone (again)", DeviceKind::Phone),
    ]);
    let mut discovery = DiscoverySimulator::with_defaults()
        .with_delays(Arc::new(FixedDelays::default()))
        .with_probe(Arc::new(probe));

    assert_eq!(discovery.start().await, 2);
    discovery.wait().await;

    let devices = discovery.devices().await;
    let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["real-2", "real-1"]);
    assert_eq!(devices[1].name, "Real Phone");
}

/// A fast device completes at exactly 100 within a bounded number of ticks
#[tokio::test(start_paused = true)]
async fn test_fast_transfer_completes_at_exactly_100() {
    let transfers = fixed_transfers(6);
    let mut events = transfers.subscribe();
    let laptop = MockDeviceRegistry::reference()
        .require("laptop-macbook-pro")
        .unwrap()
        .clone();
    assert_eq!(laptop.transfer_speed, 10);

    let id = transfers
        .start_transfer(laptop, vec![ShareableItem::file("/tmp/deck.pdf", 4_096)])
        .await
        .unwrap();
    let session = transfers.wait(&id).await.unwrap();

    assert_eq!(session.status, TransferStatus::Completed);
    assert_eq!(session.progress, 100);
    assert_eq!(session.bytes_transferred(), 4_096);

    let progress: Vec<u8> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            TransferEvent::Progress { progress, .. } => Some(progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 17);
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last(), Some(&100));
}

/// Progress stays within bounds under random steps; completed iff 100
#[tokio::test(start_paused = true)]
async fn test_random_progress_stays_in_bounds() {
    let transfers = TransferSimulator::default();
    let mut events = transfers.subscribe();
    let phone = SimulatedDevice::new("phone", "Phone", DeviceKind::Phone).with_transfer_speed(8);

    let id = transfers
        .start_transfer(phone, vec![ShareableItem::text("hello there")])
        .await
        .unwrap();
    let session = transfers.wait(&id).await.unwrap();
    assert_eq!(session.status, TransferStatus::Completed);

    let mut previous = 0;
    for event in drain(&mut events) {
        if let TransferEvent::Progress { progress, .. } = event {
            assert!(progress > previous && progress <= 100);
            assert!(progress - previous <= 6);
            previous = progress;
        }
    }
    assert_eq!(previous, 100);
}

/// An offline target fails after connecting and never makes progress
#[tokio::test(start_paused = true)]
async fn test_offline_device_fails() {
    let transfers = fixed_transfers(6);
    let desktop = MockDeviceRegistry::reference()
        .require("desktop-studio")
        .unwrap()
        .clone();
    assert_eq!(desktop.status, DeviceStatus::Offline);

    let id = transfers
        .start_transfer(desktop, vec![ShareableItem::text("ping")])
        .await
        .unwrap();
    let session = transfers.wait(&id).await.unwrap();

    assert_eq!(session.status, TransferStatus::Failed);
    assert_eq!(session.progress, 0);
    assert!(session.error.unwrap().contains("offline"));
}

/// Cancelling mid-transfer freezes progress and emits no further updates
#[tokio::test(start_paused = true)]
async fn test_cancel_stops_progress() {
    let transfers = fixed_transfers(2);
    let mut events = transfers.subscribe();
    let tv = SimulatedDevice::new("tv", "TV", DeviceKind::Tv).with_transfer_speed(6);

    let id = transfers
        .start_transfer(tv, vec![ShareableItem::file("/tmp/movie.mp4", 1_000_000)])
        .await
        .unwrap();

    // connect 2 s, connecting tick 150 ms, then 10 ticks at 2%
    sleep(Duration::from_millis(2_000 + 150 + 10 * 150 + 50)).await;
    transfers.cancel_transfer(&id).await.unwrap();

    let frozen = transfers.session(&id).await.unwrap();
    assert_eq!(frozen.status, TransferStatus::Cancelled);
    assert_eq!(frozen.progress, 20);

    sleep(Duration::from_secs(30)).await;
    let later = transfers.session(&id).await.unwrap();
    assert_eq!(later.progress, frozen.progress);
    assert_eq!(later.status, TransferStatus::Cancelled);

    let events = drain(&mut events);
    let cancelled_at = events
        .iter()
        .position(|e| matches!(e, TransferEvent::Cancelled { .. }))
        .unwrap();
    assert_eq!(cancelled_at, events.len() - 1);

    assert!(matches!(
        transfers.cancel_transfer(&id).await,
        Err(SimError::InvalidState(_))
    ));
}

/// Several transfers run side by side
#[tokio::test(start_paused = true)]
async fn test_concurrent_sessions() {
    let transfers = fixed_transfers(5);
    let registry = MockDeviceRegistry::reference();

    let a = transfers
        .start_transfer(
            registry.require("phone-pixel-8").unwrap().clone(),
            vec![ShareableItem::text("a")],
        )
        .await
        .unwrap();
    let b = transfers
        .start_transfer(
            registry.require("tv-lg-oled").unwrap().clone(),
            vec![ShareableItem::text("b")],
        )
        .await
        .unwrap();
    assert_eq!(transfers.active_count().await, 2);

    transfers.cancel_transfer(&b).await.unwrap();
    let a = transfers.wait(&a).await.unwrap();
    assert_eq!(a.status, TransferStatus::Completed);
    assert_eq!(transfers.active_count().await, 0);
    assert_eq!(transfers.remove_finished().await, 2);
}

/// Toggling twice restores the selection; completion clears it
#[tokio::test(start_paused = true)]
async fn test_selection_round_trip_and_clear_on_completion() {
    let library = vec![
        ShareableItem::text("meeting notes"),
        ShareableItem::file("/tmp/photo.jpg", 2_048),
        ShareableItem::file("/tmp/song.mp3", 8_192),
    ];

    let selection = Arc::new(RwLock::new(SelectionState::new()));
    {
        let mut sel = selection.write().await;
        sel.toggle(&library[0].id);
        sel.toggle(&library[2].id);

        let before = sel.clone();
        sel.toggle(&library[1].id);
        sel.toggle(&library[1].id);
        assert_eq!(*sel, before);
    }

    let payload = selection.read().await.payload(&library);
    assert_eq!(payload.len(), 2);
    assert_eq!(payload[0].id, library[0].id);

    let transfers = fixed_transfers(6).with_selection(selection.clone());
    let speaker = SimulatedDevice::new("speaker", "Speaker", DeviceKind::Speaker);
    let id = transfers.start_transfer(speaker, payload).await.unwrap();
    transfers.wait(&id).await.unwrap();

    assert!(selection.read().await.is_empty());
}

/// A cancelled transfer leaves the selection alone
#[tokio::test(start_paused = true)]
async fn test_cancel_keeps_selection() {
    let item = ShareableItem::text("draft");
    let selection = Arc::new(RwLock::new(SelectionState::new()));
    selection.write().await.select(&item.id);

    let transfers = fixed_transfers(6).with_selection(selection.clone());
    let phone = SimulatedDevice::new("phone", "Phone", DeviceKind::Phone);
    let id = transfers.start_transfer(phone, vec![item]).await.unwrap();

    transfers.cancel_transfer(&id).await.unwrap();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(selection.read().await.len(), 1);
}
