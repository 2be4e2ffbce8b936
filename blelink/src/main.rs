//! Talk to one characteristic of a BLE peripheral
//!
//! Connects to a device advertising a service, then reads, writes or
//! subscribes to one of its characteristics. UUIDs can be typed the way
//! datasheets print them: `0x180F`, `6109` or full 128-bit form.

mod config;
mod interactive;
mod logging;

use blelink_controller::{Event, Session, Target, ble};
use blelink_uuid::ble::{BATTERY_LEVEL, BATTERY_SERVICE};
use btleplug::api::WriteType;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "blelink")]
#[command(about = "Read, write and subscribe to a BLE characteristic")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List nearby BLE devices
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Connect and read the characteristic once
    Read {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Subscribe and print notifications until Ctrl-C
    Notify {
        #[command(flatten)]
        target: TargetArgs,
        /// Stop after this many seconds
        #[arg(long = "for")]
        duration: Option<u64>,
    },
    /// Write bytes to the characteristic
    Write {
        #[command(flatten)]
        target: TargetArgs,
        /// Bytes as hex
        #[arg(short, long, default_value = "01")]
        value: String,
        #[arg(long)]
        without_response: bool,
    },
    /// Keep one connection and take actions from stdin
    Session {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        without_response: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Service UUID (0x180F, 6109 or 128-bit)
    #[arg(short, long)]
    service: Option<String>,
    /// Characteristic UUID
    #[arg(short, long)]
    characteristic: Option<String>,
    /// Device name or address to connect to
    #[arg(short, long)]
    device: Option<String>,
    /// How long to look for the device, in seconds
    #[arg(long)]
    scan_secs: Option<u64>,
}

impl TargetArgs {
    fn resolve(self, config: &config::Config) -> blelink_controller::Result<Target> {
        let service = self
            .service
            .or_else(|| config.service_uuid.clone())
            .unwrap_or_else(|| BATTERY_SERVICE.to_string());
        let characteristic = self
            .characteristic
            .or_else(|| config.characteristic_uuid.clone())
            .unwrap_or_else(|| BATTERY_LEVEL.to_string());

        let mut target = Target::from_input(&service, &characteristic)?
            .with_device(self.device.or_else(|| config.device.clone()));
        if let Some(secs) = self.scan_secs.or(config.scan_secs) {
            target = target.with_scan_timeout(Duration::from_secs(secs));
        }
        Ok(target)
    }
}

fn write_type(without_response: bool) -> WriteType {
    if without_response {
        WriteType::WithoutResponse
    } else {
        WriteType::WithResponse
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let home = config::home()?;
    let config = config::load(&home)?;
    logging::init(config.log.as_deref());
    tracing::debug!(home = %home.display(), ?config, "loaded config");

    let adapter = ble::get_adapter().await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{event}");
        }
    });

    let result = run(cli.command, &config, adapter, tx).await;
    // every sender is gone by now, let the printer drain before reporting
    let _ = printer.await;
    result
}

async fn run(
    command: Commands,
    config: &config::Config,
    adapter: btleplug::platform::Adapter,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Scan { duration } => {
            drop(tx);
            println!("Scanning for BLE devices ({duration} seconds)...");
            let devices = ble::scan(&adapter, Duration::from_secs(duration)).await?;
            println!("\nFound {} devices:", devices.len());
            for device in devices {
                let name = device.name.as_deref().unwrap_or("Unknown");
                let rssi = device
                    .rssi
                    .map(|r| format!("{r} dBm"))
                    .unwrap_or_else(|| "N/A".to_string());
                println!("  {} ({}) RSSI: {}", name, device.address, rssi);
                for service in device.services {
                    println!("    service {service}");
                }
            }
        }
        Commands::Read { target } => {
            let mut session = Session::new(adapter, target.resolve(config)?, tx);
            session.read().await?;
            session.disconnect().await?;
        }
        Commands::Notify { target, duration } => {
            let mut session = Session::new(adapter, target.resolve(config)?, tx);
            session.subscribe().await?;
            match duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => tokio::signal::ctrl_c().await?,
            }
            session.disconnect().await?;
        }
        Commands::Write {
            target,
            value,
            without_response,
        } => {
            let bytes = interactive::parse_hex(&value)?;
            let mut session = Session::new(adapter, target.resolve(config)?, tx);
            session.write(&bytes, write_type(without_response)).await?;
            session.disconnect().await?;
        }
        Commands::Session {
            target,
            without_response,
        } => {
            let session = Session::new(adapter, target.resolve(config)?, tx);
            interactive::run(session, write_type(without_response)).await?;
        }
    }
    Ok(())
}
