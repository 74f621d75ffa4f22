mod cli;
mod clipboard;
mod config;
mod dashboard;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use clipboard::SystemClipboard;
use config::Config;
use nearshare_core::discovery::DiscoveryEvent;
use nearshare_core::transfer::{TransferEvent, TransferStatus};
use nearshare_core::{
    copy_text, DiscoverySimulator, MockDeviceRegistry, SelectionState, ShareableItem,
    SimulatedDevice, TransferSimulator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tracing::{info, warn};

fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn print_device(device: &SimulatedDevice, verbose: bool) {
    println!(
        "{:<22} {:<20} {:<10} {:>5.1} m  {}",
        device.id,
        device.name,
        device.kind.as_str(),
        device.distance_m,
        device.status.as_str()
    );

    if verbose {
        println!("    {} {} ({})", device.brand, device.model, device.os);
        println!(
            "    Network: {}, signal {}%, speed {}",
            device.network.as_str(),
            device.signal,
            device.transfer_speed
        );
        if let Some(battery) = device.battery {
            println!("    Battery: {}%", battery);
        }
        println!("    Capabilities: {}", device.capabilities.join(", "));
    }
}

fn list_devices(verbose: bool) -> Result<()> {
    let registry = MockDeviceRegistry::reference();

    println!("\n=== Reference Devices ({}) ===", registry.len());
    for device in registry.devices() {
        print_device(device, verbose);
    }

    Ok(())
}

async fn scan(config: &Config, no_sort: bool) -> Result<()> {
    let mut discovery_config = config.discovery.to_config();
    if no_sort {
        discovery_config.sort_by_distance = false;
    }

    let mut discovery = DiscoverySimulator::new(MockDeviceRegistry::reference(), discovery_config);
    let mut events = discovery.subscribe();

    let expected = discovery.start().await;
    println!("Scanning for nearby devices (Ctrl-C to stop)...");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(DiscoveryEvent::DeviceRevealed { device, visible, .. }) => {
                    println!("  [{}/{}] {}", visible, expected, device.summary());
                }
                Ok(DiscoveryEvent::ScanCompleted { count, .. }) => {
                    println!("Scan complete: {} devices found", count);
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} discovery events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                discovery.stop().await;
                println!("\nScan stopped: {} devices found", discovery.visible_count().await);
                break;
            }
        }
    }

    println!();
    for device in discovery.devices().await {
        print_device(&device, false);
    }

    Ok(())
}

async fn send(
    config: &Config,
    device_id: &str,
    texts: Vec<String>,
    files: Vec<PathBuf>,
) -> Result<()> {
    let registry = MockDeviceRegistry::reference();
    let device = registry
        .require(device_id)
        .map_err(|e| anyhow!(e.user_message()))?
        .clone();

    let mut library: Vec<ShareableItem> = texts.into_iter().map(ShareableItem::text).collect();
    for path in files {
        let size = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
            .len();
        library.push(ShareableItem::file(path, size));
    }

    let selection = Arc::new(RwLock::new(SelectionState::new()));
    {
        let mut selection = selection.write().await;
        for item in &library {
            selection.select(&item.id);
        }
    }
    let payload = selection.read().await.payload(&library);

    let transfers =
        TransferSimulator::new(config.transfer.to_config()).with_selection(selection.clone());
    let mut events = transfers.subscribe();

    let session_id = transfers
        .start_transfer(device.clone(), payload)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    println!(
        "Sending {} item(s) to {} (Ctrl-C to cancel)",
        library.len(),
        device.name
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancelled = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(TransferEvent::StatusChanged { status, .. }) => println!("  {}", status),
                Ok(TransferEvent::Progress { progress, .. }) => {
                    if let Some(session) = transfers.session(&session_id).await {
                        let eta = session
                            .time_remaining()
                            .map(|eta| format!("{:.1}s", eta.as_secs_f64()))
                            .unwrap_or_else(|| "--".to_string());
                        println!(
                            "  {:>3}%  {}/s  ETA {}",
                            progress,
                            format_bytes(session.transfer_rate()),
                            eta
                        );
                    }
                }
                Ok(event) if event.is_terminal() => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} transfer events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c, if !cancelled => {
                cancelled = true;
                if let Err(e) = transfers.cancel_transfer(&session_id).await {
                    warn!("Cancel failed: {}", e);
                }
            }
        }
    }

    let session = transfers.wait(&session_id).await?;
    match &session.error {
        Some(reason) => println!("Transfer {}: {}", session.status, reason),
        None => println!(
            "Transfer {} at {}% ({} of {})",
            session.status,
            session.progress,
            format_bytes(session.bytes_transferred() as f64),
            format_bytes(session.total_bytes() as f64)
        ),
    }
    if session.status == TransferStatus::Completed {
        for item in library.iter_mut() {
            item.record_share();
        }
        info!(
            "Shared {} item(s) with {}",
            library.iter().filter(|i| i.share_count > 0).count(),
            device.name
        );
    }
    if selection.read().await.is_empty() {
        info!("Selection cleared after transfer {}", session_id);
    }

    Ok(())
}

fn copy(text: &str) -> Result<()> {
    let copied = match SystemClipboard::new() {
        Ok(mut clipboard) => copy_text(&mut clipboard, text),
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            false
        }
    };

    if copied {
        println!("Copied {} characters", text.chars().count());
    } else {
        println!("Clipboard unavailable, nothing copied");
    }
    Ok(())
}

fn dump_config(config: &Config, path: Option<&std::path::Path>) -> Result<()> {
    let path = path.map(|p| p.to_path_buf()).unwrap_or_else(Config::default_path);
    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize config")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    cli::init_logging(&cli).context("Failed to initialize logging")?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Devices { verbose } => list_devices(verbose),
        Command::Scan { no_sort } => scan(&config, no_sort).await,
        Command::Send {
            device_id,
            text,
            file,
        } => send(&config, &device_id, text, file).await,
        Command::Copy { text } => copy(&text),
        Command::Dashboard {
            owner_id,
            retries,
            fail_first,
        } => dashboard::run(&owner_id, retries, fail_first).await,
        Command::DumpConfig => dump_config(&config, cli.config.as_deref()),
    }
}
