//! Adapter access and device discovery

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{Error, Result};

const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// A peripheral seen during a scan
#[derive(Debug, Clone)]
pub struct Device {
    pub name: Option<String>,
    pub address: String,
    pub rssi: Option<i16>,
    pub services: Vec<Uuid>,
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// Scan for BLE devices for `duration` and list everything seen
pub async fn scan(adapter: &Adapter, duration: Duration) -> Result<Vec<Device>> {
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(duration).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            devices.push(Device {
                name: props.local_name,
                address: peripheral.address().to_string(),
                rssi: props.rssi,
                services: props.services,
            });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Does an advertisement match what we are looking for?
///
/// The device must advertise `service`. When `pattern` is given it must also
/// appear in the device name or address.
pub fn matches(
    name: Option<&str>,
    address: &str,
    services: &[Uuid],
    service: &Uuid,
    pattern: Option<&str>,
) -> bool {
    if !services.contains(service) {
        return false;
    }
    match pattern {
        Some(p) => name.is_some_and(|n| n.contains(p)) || address.contains(p),
        None => true,
    }
}

/// Scan until a device advertising `service` shows up, or `timeout` passes.
///
/// Returns the peripheral and its advertised name.
pub async fn find_device(
    adapter: &Adapter,
    service: Uuid,
    pattern: Option<&str>,
    timeout: Duration,
) -> Result<(Peripheral, Option<String>)> {
    adapter
        .start_scan(ScanFilter {
            services: vec![service],
        })
        .await?;

    let deadline = Instant::now() + timeout;
    let mut found = None;

    'scan: while Instant::now() < deadline {
        for peripheral in adapter.peripherals().await? {
            let Some(props) = peripheral.properties().await? else {
                continue;
            };
            let address = peripheral.address().to_string();
            if matches(
                props.local_name.as_deref(),
                &address,
                &props.services,
                &service,
                pattern,
            ) {
                tracing::debug!(%address, name = ?props.local_name, "matched device");
                found = Some((peripheral, props.local_name));
                break 'scan;
            }
        }
        tokio::time::sleep(SCAN_POLL_INTERVAL).await;
    }

    if let Err(e) = adapter.stop_scan().await {
        tracing::warn!("failed to stop scan: {e}");
    }
    found.ok_or(Error::DeviceNotFound { service })
}

#[cfg(test)]
mod tests {
    use super::matches;

    const BATTERY: uuid::Uuid = blelink_uuid::from_short(0x180f);
    const HEART_RATE: uuid::Uuid = blelink_uuid::from_short(0x180d);

    #[test]
    fn needs_service() {
        assert!(matches(None, "AA:BB", &[BATTERY], &BATTERY, None));
        assert!(!matches(Some("Band"), "AA:BB", &[HEART_RATE], &BATTERY, None));
        assert!(!matches(Some("Band"), "AA:BB", &[], &BATTERY, None));
    }

    #[test]
    fn pattern_on_name_or_address() {
        let services = [HEART_RATE, BATTERY];
        assert!(matches(Some("Band 7"), "AA:BB", &services, &BATTERY, Some("Band")));
        assert!(matches(None, "AA:BB:CC", &services, &BATTERY, Some("BB:CC")));
        assert!(!matches(Some("Watch"), "AA:BB", &services, &BATTERY, Some("Band")));
        assert!(!matches(None, "AA:BB", &services, &BATTERY, Some("Band")));
    }
}
