//! Command Line Interface and Logging Setup

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// NearShare simulator command-line interface
#[derive(Parser, Debug)]
#[command(name = "nearshare")]
#[command(about = "Simulated nearby-device discovery and sharing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(short, long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Enable JSON structured logging
    #[arg(long)]
    pub json_logs: bool,

    /// Show timestamps in logs
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    pub timestamps: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the reference devices
    Devices {
        /// Show detailed device information
        #[arg(long)]
        verbose: bool,
    },

    /// Run a discovery scan, printing devices as they appear
    Scan {
        /// Keep discovery order instead of sorting by distance
        #[arg(long)]
        no_sort: bool,
    },

    /// Send text snippets and files to a device
    Send {
        /// Target device ID
        device_id: String,

        /// Text snippet to send (repeatable)
        #[arg(long)]
        text: Vec<String>,

        /// File to send (repeatable)
        #[arg(long)]
        file: Vec<PathBuf>,
    },

    /// Copy text to the system clipboard
    Copy {
        /// Text to copy
        text: String,
    },

    /// Show hardware, firmware and health for an owner
    Dashboard {
        /// Owner ID
        owner_id: String,

        /// Retries per request after a failure
        #[arg(short, long, default_value = "2")]
        retries: u32,

        /// Make the first N service calls fail
        #[arg(long, default_value = "0")]
        fail_first: u32,
    },

    /// Show the effective configuration
    DumpConfig,
}

/// Initialize logging based on CLI configuration
///
/// `RUST_LOG` takes precedence over `--log-level`.
pub fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = cli.log_level.parse::<Level>().with_context(|| {
        format!(
            "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
            cli.log_level
        )
    })?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.as_str()))
        .context("Failed to create log filter")?;

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    match (cli.json_logs, cli.timestamps) {
        (true, true) => subscriber.json().init(),
        (true, false) => subscriber.without_time().json().init(),
        (false, true) => subscriber.init(),
        (false, false) => subscriber.without_time().init(),
    }

    info!(
        "Logging initialized: level={}, json={}, timestamps={}",
        log_level, cli.json_logs, cli.timestamps
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from([
            "nearshare",
            "send",
            "tv-lg-oled",
            "--text",
            "hello",
            "--text",
            "world",
            "--file",
            "/tmp/a.txt",
        ]);

        match cli.command {
            Command::Send {
                device_id,
                text,
                file,
            } => {
                assert_eq!(device_id, "tv-lg-oled");
                assert_eq!(text, vec!["hello", "world"]);
                assert_eq!(file, vec![PathBuf::from("/tmp/a.txt")]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "nearshare",
            "--log-level",
            "debug",
            "--json-logs",
            "--config",
            "/tmp/ns.toml",
            "scan",
            "--no-sort",
        ]);

        assert_eq!(cli.log_level, "debug");
        assert!(cli.json_logs);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ns.toml")));
        assert!(matches!(cli.command, Command::Scan { no_sort: true }));
    }

    #[test]
    fn test_dashboard_defaults() {
        let cli = Cli::parse_from(["nearshare", "dashboard", "owner-demo"]);
        assert!(matches!(
            cli.command,
            Command::Dashboard {
                retries: 2,
                fail_first: 0,
                ..
            }
        ));
    }
}
