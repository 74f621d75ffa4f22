//! Hardware Service Client Boundary
//!
//! Dashboards read hardware devices, firmware versions and health reports
//! from an external service client. The contract is simply "given an owner
//! or device id, return a record or a list of records". Responses are parsed
//! into typed records at the boundary and rejected there if malformed.
//!
//! Failures are captured by [`Fetcher`] as a displayable message; the caller
//! retries on demand.
//!
//! ```
//! use nearshare_core::service::{FetchState, Fetcher, HardwareService, StaticHardwareService};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let service = Arc::new(StaticHardwareService::fixture().unwrap().with_failures(1));
//! let mut fetcher = Fetcher::new({
//!     let service = service.clone();
//!     move || {
//!         let service = service.clone();
//!         async move { service.devices("owner-demo").await }
//!     }
//! });
//!
//! assert!(fetcher.load().await.is_failed());
//! assert!(matches!(fetcher.retry().await, FetchState::Loaded(devices) if devices.len() == 2));
//! # });
//! ```

use crate::{Result, SimError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// A managed hardware device owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareDevice {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub model: String,
    pub serial_number: String,
    /// Currently installed firmware version
    pub firmware_version: String,
    pub online: bool,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Firmware release channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareChannel {
    Stable,
    Beta,
    Nightly,
}

/// A firmware version available for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareVersion {
    pub version: String,
    pub channel: FirmwareChannel,
    pub released_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    /// Whether this is the version currently installed
    #[serde(default)]
    pub installed: bool,
}

/// Overall health verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

/// Health snapshot of a hardware device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub device_id: String,
    pub status: HealthStatus,
    #[serde(default)]
    pub battery: Option<u8>,
    #[serde(default)]
    pub temperature_c: Option<f32>,
    /// Storage used, percent
    #[serde(default)]
    pub storage_used: Option<u8>,
    #[serde(default)]
    pub issues: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Semantic checks beyond what deserialization enforces
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn check_percent(field: &str, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if v > 100 => Err(SimError::InvalidResponse(format!(
            "{} out of range: {}",
            field, v
        ))),
        _ => Ok(()),
    }
}

fn check_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SimError::InvalidResponse(format!("{} is empty", field)));
    }
    Ok(())
}

impl Validate for HardwareDevice {
    fn validate(&self) -> Result<()> {
        check_non_empty("device id", &self.id)?;
        check_non_empty("owner id", &self.owner_id)
    }
}

impl Validate for FirmwareVersion {
    fn validate(&self) -> Result<()> {
        check_non_empty("firmware version", &self.version)
    }
}

impl Validate for HealthReport {
    fn validate(&self) -> Result<()> {
        check_non_empty("device id", &self.device_id)?;
        check_percent("battery", self.battery)?;
        check_percent("storage used", self.storage_used)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<()> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for HashMap<String, T> {
    fn validate(&self) -> Result<()> {
        self.values().try_for_each(Validate::validate)
    }
}

/// Parse and validate a JSON service response
///
/// Shape errors and failed checks both become `InvalidResponse`.
pub fn parse_response<T>(json: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T =
        serde_json::from_str(json).map_err(|e| SimError::InvalidResponse(e.to_string()))?;
    value.validate()?;
    Ok(value)
}

/// Hardware/roadmap service client contract
#[async_trait]
pub trait HardwareService: Send + Sync {
    /// Devices owned by `owner_id`
    async fn devices(&self, owner_id: &str) -> Result<Vec<HardwareDevice>>;

    /// Firmware versions available for `device_id`
    async fn firmware_versions(&self, device_id: &str) -> Result<Vec<FirmwareVersion>>;

    /// Latest health report for `device_id`
    async fn health_report(&self, device_id: &str) -> Result<HealthReport>;
}

const FIXTURE_DEVICES: &str = r#"[
    {
        "id": "hw-hub-01",
        "ownerId": "owner-demo",
        "name": "Home Hub",
        "model": "NS-Hub 2",
        "serialNumber": "NSH2-0001-A",
        "firmwareVersion": "2.3.1",
        "online": true,
        "lastSeen": "2024-05-01T09:30:00Z"
    },
    {
        "id": "hw-sensor-02",
        "ownerId": "owner-demo",
        "name": "Garage Sensor",
        "model": "NS-Sense Mini",
        "serialNumber": "NSSM-0042-C",
        "firmwareVersion": "1.0.4",
        "online": false
    }
]"#;

const FIXTURE_FIRMWARE: &str = r#"{
    "hw-hub-01": [
        { "version": "2.3.1", "channel": "stable", "releasedAt": "2024-03-12T00:00:00Z", "notes": "Stability fixes", "installed": true },
        { "version": "2.4.0-beta.2", "channel": "beta", "releasedAt": "2024-04-20T00:00:00Z", "notes": "Faster pairing" }
    ],
    "hw-sensor-02": [
        { "version": "1.0.4", "channel": "stable", "releasedAt": "2023-11-02T00:00:00Z", "installed": true },
        { "version": "1.1.0", "channel": "stable", "releasedAt": "2024-02-14T00:00:00Z", "notes": "Lower idle power draw" }
    ]
}"#;

const FIXTURE_HEALTH: &str = r#"{
    "hw-hub-01": {
        "deviceId": "hw-hub-01",
        "status": "healthy",
        "temperatureC": 41.5,
        "storageUsed": 63,
        "generatedAt": "2024-05-01T09:30:00Z"
    },
    "hw-sensor-02": {
        "deviceId": "hw-sensor-02",
        "status": "degraded",
        "battery": 12,
        "issues": ["Battery low", "Last check-in over 24h ago"],
        "generatedAt": "2024-04-29T18:02:00Z"
    }
}"#;

/// In-memory service backed by fixture data
///
/// `with_failures(n)` makes the next `n` calls fail, for exercising retry.
#[derive(Debug)]
pub struct StaticHardwareService {
    devices: Vec<HardwareDevice>,
    firmware: HashMap<String, Vec<FirmwareVersion>>,
    health: HashMap<String, HealthReport>,
    failures_remaining: AtomicU32,
}

impl StaticHardwareService {
    /// Service loaded from the bundled fixtures
    pub fn fixture() -> Result<Self> {
        Self::from_json(FIXTURE_DEVICES, FIXTURE_FIRMWARE, FIXTURE_HEALTH)
    }

    /// Service loaded from JSON documents
    ///
    /// `firmware_json` and `health_json` are objects keyed by device id.
    pub fn from_json(devices_json: &str, firmware_json: &str, health_json: &str) -> Result<Self> {
        Ok(Self {
            devices: parse_response(devices_json)?,
            firmware: parse_response(firmware_json)?,
            health: parse_response(health_json)?,
            failures_remaining: AtomicU32::new(0),
        })
    }

    pub fn with_failures(self, failures: u32) -> Self {
        self.failures_remaining.store(failures, Ordering::SeqCst);
        self
    }

    fn check_available(&self) -> Result<()> {
        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SimError::Service("service unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HardwareService for StaticHardwareService {
    async fn devices(&self, owner_id: &str) -> Result<Vec<HardwareDevice>> {
        self.check_available()?;
        Ok(self
            .devices
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn firmware_versions(&self, device_id: &str) -> Result<Vec<FirmwareVersion>> {
        self.check_available()?;
        self.firmware
            .get(device_id)
            .cloned()
            .ok_or_else(|| SimError::DeviceNotFound(device_id.to_string()))
    }

    async fn health_report(&self, device_id: &str) -> Result<HealthReport> {
        self.check_available()?;
        self.health
            .get(device_id)
            .cloned()
            .ok_or_else(|| SimError::DeviceNotFound(device_id.to_string()))
    }
}

/// Load state of a dashboard panel
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(T),
    /// User-visible error message
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchState::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchState::Failed(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

type Request<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Runs a service request and captures its outcome for display
///
/// The request is kept so [`retry`](Self::retry) can re-issue it.
pub struct Fetcher<T> {
    request: Request<T>,
    state: FetchState<T>,
    attempts: u32,
}

impl<T: Send + 'static> Fetcher<T> {
    pub fn new<F, Fut>(request: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            request: Arc::new(move || request().boxed()),
            state: FetchState::Idle,
            attempts: 0,
        }
    }
}

impl<T> Fetcher<T> {
    /// Mark the fetch as loading and hand back the request to run
    ///
    /// The state reads `Loading` until [`finish`](Self::finish) records the
    /// outcome, so a UI can render a spinner in between.
    pub fn begin(&mut self) -> BoxFuture<'static, Result<T>> {
        self.state = FetchState::Loading;
        self.attempts += 1;
        (self.request)()
    }

    /// Record the outcome of a request started with [`begin`](Self::begin)
    pub fn finish(&mut self, result: Result<T>) -> &FetchState<T> {
        self.state = match result {
            Ok(value) => FetchState::Loaded(value),
            Err(e) => {
                warn!("Fetch attempt {} failed: {}", self.attempts, e);
                FetchState::Failed(e.user_message())
            }
        };
        &self.state
    }

    /// Issue the request and record the outcome
    pub async fn load(&mut self) -> &FetchState<T> {
        let result = self.begin().await;
        self.finish(result)
    }

    /// Re-issue the last request
    pub async fn retry(&mut self) -> &FetchState<T> {
        debug!("Retrying fetch (attempt {})", self.attempts + 1);
        self.load().await
    }

    /// Load, retrying until success or `max_attempts` total attempts
    pub async fn load_with_retries(&mut self, max_attempts: u32) -> &FetchState<T> {
        for _ in 0..max_attempts.max(1) {
            if self.load().await.is_loaded() {
                break;
            }
        }
        &self.state
    }

    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Number of requests issued so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_parses() {
        let service = StaticHardwareService::fixture().unwrap();
        assert_eq!(service.devices.len(), 2);
        assert_eq!(service.firmware.len(), 2);
        assert_eq!(
            service.health["hw-sensor-02"].status,
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let result = parse_response::<Vec<HardwareDevice>>(r#"{"id": "not-a-list"}"#);
        assert!(matches!(result, Err(SimError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        let json = r#"{
            "deviceId": "x",
            "status": "healthy",
            "battery": 140,
            "generatedAt": "2024-05-01T09:30:00Z"
        }"#;
        let result = parse_response::<HealthReport>(json);
        assert!(matches!(result, Err(SimError::InvalidResponse(msg)) if msg.contains("battery")));
    }

    #[test]
    fn test_parse_rejects_unknown_enum() {
        let json = r#"[{ "version": "1.0", "channel": "canary", "releasedAt": "2024-01-01T00:00:00Z" }]"#;
        assert!(parse_response::<Vec<FirmwareVersion>>(json).is_err());
    }

    #[tokio::test]
    async fn test_static_service_lookups() {
        let service = StaticHardwareService::fixture().unwrap();

        assert_eq!(service.devices("owner-demo").await.unwrap().len(), 2);
        assert!(service.devices("someone-else").await.unwrap().is_empty());

        let firmware = service.firmware_versions("hw-hub-01").await.unwrap();
        assert_eq!(firmware.iter().filter(|f| f.installed).count(), 1);

        assert!(matches!(
            service.health_report("missing").await,
            Err(SimError::DeviceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fetcher_captures_error_and_retries() {
        let service = Arc::new(StaticHardwareService::fixture().unwrap().with_failures(2));
        let mut fetcher = Fetcher::new({
            let service = service.clone();
            move || {
                let service = service.clone();
                async move { service.health_report("hw-hub-01").await }
            }
        });
        assert_eq!(fetcher.state(), &FetchState::Idle);

        let state = fetcher.load().await;
        assert!(state.error().unwrap().contains("retry"));

        assert!(fetcher.retry().await.is_failed());
        let state = fetcher.retry().await;
        assert_eq!(state.value().unwrap().status, HealthStatus::Healthy);
        assert_eq!(fetcher.attempts(), 3);
    }

    #[tokio::test]
    async fn test_loading_visible_between_begin_and_finish() {
        let service = Arc::new(StaticHardwareService::fixture().unwrap());
        let mut fetcher = Fetcher::new({
            let service = service.clone();
            move || {
                let service = service.clone();
                async move { service.firmware_versions("hw-sensor-02").await }
            }
        });

        let request = fetcher.begin();
        assert_eq!(fetcher.state(), &FetchState::Loading);
        assert_eq!(fetcher.attempts(), 1);

        let result = request.await;
        let state = fetcher.finish(result);
        assert_eq!(state.value().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_load_with_retries_gives_up() {
        let service = Arc::new(StaticHardwareService::fixture().unwrap().with_failures(5));
        let mut fetcher = Fetcher::new({
            let service = service.clone();
            move || {
                let service = service.clone();
                async move { service.devices("owner-demo").await }
            }
        });

        assert!(fetcher.load_with_retries(3).await.is_failed());
        assert_eq!(fetcher.attempts(), 3);
    }
}
