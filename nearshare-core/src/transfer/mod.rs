//! Simulated Transfers
//!
//! A [`TransferSession`] tracks a fake file/text transfer to a simulated
//! device. Its status only moves forward:
//!
//! ```text
//! preparing -> connecting -> transferring -> completed
//!                   |              |
//!                   +-> failed     +-> cancelled (also from any earlier state)
//! ```
//!
//! Progress is a percentage in `0..=100`. A session is `completed` if and
//! only if its progress reached 100. Speed and time remaining are derived
//! from progress, payload size and elapsed time; no real I/O happens.

pub mod events;
pub mod simulator;

use crate::item::{payload_size, ShareableItem};
use crate::SimulatedDevice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

pub use events::TransferEvent;
pub use simulator::TransferSimulator;

/// Default lower bound of the preparing -> connecting delay
pub const DEFAULT_CONNECT_DELAY_MIN: Duration = Duration::from_secs(1);

/// Default upper bound of the preparing -> connecting delay
pub const DEFAULT_CONNECT_DELAY_MAX: Duration = Duration::from_secs(3);

/// Default lower bound of the progress tick interval
pub const DEFAULT_TICK_MIN: Duration = Duration::from_millis(100);

/// Default upper bound of the progress tick interval
pub const DEFAULT_TICK_MAX: Duration = Duration::from_millis(300);

/// Default largest progress step in percentage points
pub const DEFAULT_MAX_PROGRESS_STEP: u8 = 6;

/// Configuration for the transfer simulator
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub connect_delay_min: Duration,
    pub connect_delay_max: Duration,
    pub tick_min: Duration,
    pub tick_max: Duration,
    /// Upper bound on the per-tick step; the device's speed may lower it
    pub max_progress_step: u8,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_delay_min: DEFAULT_CONNECT_DELAY_MIN,
            connect_delay_max: DEFAULT_CONNECT_DELAY_MAX,
            tick_min: DEFAULT_TICK_MIN,
            tick_max: DEFAULT_TICK_MAX,
            max_progress_step: DEFAULT_MAX_PROGRESS_STEP,
        }
    }
}

impl TransferConfig {
    /// Largest step allowed for a device
    pub fn max_step_for(&self, device: &SimulatedDevice) -> u8 {
        device
            .transfer_speed
            .clamp(1, self.max_progress_step.max(1))
    }
}

/// Transfer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Preparing,
    Connecting,
    Transferring,
    Completed,
    Failed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Preparing => "preparing",
            TransferStatus::Connecting => "connecting",
            TransferStatus::Transferring => "transferring",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the session can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral state of one simulated transfer
#[derive(Debug, Clone)]
pub struct TransferSession {
    pub id: String,
    /// Target device
    pub device: SimulatedDevice,
    /// Items being sent
    pub items: Vec<ShareableItem>,
    pub status: TransferStatus,
    /// Percentage in 0..=100
    pub progress: u8,
    /// Why the session failed, if it did
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// When the session entered `transferring`
    transferring_since: Option<Instant>,
    /// When the session reached a terminal status
    finished: Option<Instant>,
}

impl TransferSession {
    pub(crate) fn new(id: String, device: SimulatedDevice, items: Vec<ShareableItem>) -> Self {
        let now = Utc::now();
        Self {
            id,
            device,
            items,
            status: TransferStatus::Preparing,
            progress: 0,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            transferring_since: None,
            finished: None,
        }
    }

    /// Move to `status`, stamping timestamps
    pub(crate) fn set_status(&mut self, status: TransferStatus) {
        self.status = status;
        self.updated_at = Utc::now();

        if status == TransferStatus::Transferring {
            self.transferring_since = Some(Instant::now());
        }
        if status.is_terminal() {
            self.finished = Some(Instant::now());
            self.completed_at = Some(self.updated_at);
        }
    }

    /// Add `step` points, clamped at 100; returns the new progress
    pub(crate) fn advance(&mut self, step: u8) -> u8 {
        self.progress = self.progress.saturating_add(step).min(100);
        self.updated_at = Utc::now();
        self.progress
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        self.set_status(TransferStatus::Failed);
    }

    /// Total payload size in bytes
    pub fn total_bytes(&self) -> u64 {
        payload_size(&self.items)
    }

    /// Bytes implied by the current progress
    pub fn bytes_transferred(&self) -> u64 {
        self.total_bytes() * u64::from(self.progress) / 100
    }

    /// Time spent transferring, frozen once the session finished
    pub fn elapsed(&self) -> Duration {
        match self.transferring_since {
            Some(start) => self.finished.unwrap_or_else(Instant::now) - start,
            None => Duration::ZERO,
        }
    }

    /// Average transfer rate in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes_transferred() as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time until completion
    ///
    /// `None` until there is progress to extrapolate from.
    pub fn time_remaining(&self) -> Option<Duration> {
        if self.progress >= 100 {
            return Some(Duration::ZERO);
        }
        let elapsed = self.elapsed();
        if self.progress == 0 || elapsed.is_zero() {
            return None;
        }
        let remaining = u32::from(100 - self.progress);
        Some(elapsed * remaining / u32::from(self.progress))
    }
}
