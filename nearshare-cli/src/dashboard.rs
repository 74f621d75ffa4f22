//! Hardware Dashboard
//!
//! Prints devices, firmware and health for an owner. Each panel is loaded
//! through a [`Fetcher`], so a failing request shows its message instead of
//! aborting the whole dashboard.

use anyhow::{Context, Result};
use nearshare_core::service::{
    FetchState, Fetcher, FirmwareVersion, HardwareDevice, HardwareService, HealthReport,
    StaticHardwareService,
};
use std::future::Future;
use std::sync::Arc;

/// Build a fetcher that calls `call` with the service and `id`
fn request<T, F, Fut>(service: &Arc<dyn HardwareService>, id: &str, call: F) -> Fetcher<T>
where
    T: Send + 'static,
    F: Fn(Arc<dyn HardwareService>, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = nearshare_core::Result<T>> + Send + 'static,
{
    let service = service.clone();
    let id = id.to_string();
    Fetcher::new(move || call(service.clone(), id.clone()))
}

fn attempts_note<T>(fetcher: &Fetcher<T>) -> String {
    match fetcher.attempts() {
        0 | 1 => String::new(),
        n => format!(" (after {} attempts)", n),
    }
}

/// Firmware and health panels of one device
pub struct DevicePanel {
    pub device: HardwareDevice,
    pub firmware: Fetcher<Vec<FirmwareVersion>>,
    pub health: Fetcher<HealthReport>,
}

/// Everything fetched for one owner
pub struct Dashboard {
    pub devices: Fetcher<Vec<HardwareDevice>>,
    pub panels: Vec<DevicePanel>,
}

/// Fetch the device list, then firmware and health for every device
pub async fn load(
    service: Arc<dyn HardwareService>,
    owner_id: &str,
    max_attempts: u32,
) -> Dashboard {
    let mut devices = request(&service, owner_id, |service, owner| async move {
        service.devices(&owner).await
    });
    devices.load_with_retries(max_attempts).await;

    let mut panels = Vec::new();
    for device in devices.state().value().cloned().unwrap_or_default() {
        let mut firmware = request(&service, &device.id, |service, id| async move {
            service.firmware_versions(&id).await
        });
        firmware.load_with_retries(max_attempts).await;

        let mut health = request(&service, &device.id, |service, id| async move {
            service.health_report(&id).await
        });
        health.load_with_retries(max_attempts).await;

        panels.push(DevicePanel {
            device,
            firmware,
            health,
        });
    }

    Dashboard { devices, panels }
}

pub async fn run(owner_id: &str, retries: u32, fail_first: u32) -> Result<()> {
    let service: Arc<dyn HardwareService> = Arc::new(
        StaticHardwareService::fixture()
            .context("Failed to load hardware service fixtures")?
            .with_failures(fail_first),
    );

    let dashboard = load(service, owner_id, retries.saturating_add(1)).await;
    print_dashboard(owner_id, &dashboard);
    Ok(())
}

fn print_dashboard(owner_id: &str, dashboard: &Dashboard) {
    println!(
        "\n=== Hardware for {} ==={}",
        owner_id,
        attempts_note(&dashboard.devices)
    );
    match dashboard.devices.state() {
        FetchState::Loaded(devices) if devices.is_empty() => {
            println!("No devices registered.");
        }
        FetchState::Loaded(_) => {}
        FetchState::Failed(message) => println!("{}", message),
        FetchState::Idle | FetchState::Loading => {}
    }

    for panel in &dashboard.panels {
        let device = &panel.device;
        println!(
            "\n[{}] {} ({}, serial {})",
            device.id, device.name, device.model, device.serial_number
        );
        println!(
            "Status: {}",
            if device.online { "online" } else { "offline" }
        );
        if let Some(last_seen) = device.last_seen {
            println!("Last seen: {}", last_seen.format("%Y-%m-%d %H:%M UTC"));
        }

        print_firmware(device, &panel.firmware);
        print_health(&panel.health);
    }
}

fn print_firmware(device: &HardwareDevice, fetcher: &Fetcher<Vec<FirmwareVersion>>) {
    println!("Firmware{}:", attempts_note(fetcher));
    match fetcher.state() {
        FetchState::Loaded(versions) => {
            for version in versions {
                let marker = if version.installed || version.version == device.firmware_version {
                    " (installed)"
                } else {
                    ""
                };
                println!(
                    "  - {} [{:?}] released {}{}",
                    version.version,
                    version.channel,
                    version.released_at.format("%Y-%m-%d"),
                    marker
                );
                if !version.notes.is_empty() {
                    println!("      {}", version.notes);
                }
            }
        }
        FetchState::Failed(message) => println!("  {}", message),
        FetchState::Idle | FetchState::Loading => {}
    }
}

fn print_health(fetcher: &Fetcher<HealthReport>) {
    println!("Health{}:", attempts_note(fetcher));
    match fetcher.state() {
        FetchState::Loaded(report) => {
            println!("  Status: {:?}", report.status);
            if let Some(battery) = report.battery {
                println!("  Battery: {}%", battery);
            }
            if let Some(temperature) = report.temperature_c {
                println!("  Temperature: {:.1} C", temperature);
            }
            if let Some(storage) = report.storage_used {
                println!("  Storage used: {}%", storage);
            }
            for issue in &report.issues {
                println!("  ! {}", issue);
            }
        }
        FetchState::Failed(message) => println!("  {}", message),
        FetchState::Idle | FetchState::Loading => {}
    }
}
