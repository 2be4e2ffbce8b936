//! Connection state kept between user actions

use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{Error, Event, Result, ble};

const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(5);

/// Which device, service and characteristic the session works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub service: Uuid,
    pub characteristic: Uuid,
    /// Name or address pattern; any device advertising the service if unset
    pub device: Option<String>,
    pub scan_timeout: Duration,
}

impl Target {
    /// Build a target from UUIDs as the user typed them
    pub fn from_input(service: &str, characteristic: &str) -> Result<Self> {
        if service.trim().is_empty() || characteristic.trim().is_empty() {
            return Err(Error::MissingUuid);
        }
        Ok(Self {
            service: blelink_uuid::parse(service)?,
            characteristic: blelink_uuid::parse(characteristic)?,
            device: None,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        })
    }

    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }
}

/// Background tasks serving one link: the disconnect watcher and at most
/// one notification forwarder. Dropping it stops both.
struct Tasks {
    watcher: JoinHandle<()>,
    notifier: Option<JoinHandle<()>>,
}

impl Tasks {
    fn new(watcher: JoinHandle<()>) -> Self {
        Self {
            watcher,
            notifier: None,
        }
    }

    /// A new subscription replaces the old forwarder, never stacks on it
    fn set_notifier(&mut self, notifier: JoinHandle<()>) {
        if let Some(previous) = self.notifier.replace(notifier) {
            previous.abort();
        }
    }
}

impl Drop for Tasks {
    fn drop(&mut self) {
        self.watcher.abort();
        if let Some(notifier) = &self.notifier {
            notifier.abort();
        }
    }
}

struct Link {
    peripheral: Peripheral,
    characteristic: Characteristic,
    tasks: Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Read,
    Subscribe,
    Write,
}

/// Read always starts from a fresh connection, the rest reuse a live link
fn needs_connect(op: Op, linked: bool) -> bool {
    op == Op::Read || !linked
}

/// `None` when there was no link at all
fn disconnect_event(was_connected: Option<bool>) -> Event {
    match was_connected {
        Some(true) => Event::ManuallyDisconnected,
        Some(false) | None => Event::AlreadyDisconnected,
    }
}

/// A connection to one characteristic of one peripheral.
///
/// Operations that need a link connect on demand. Everything worth telling
/// the user is sent on the event channel; failures are returned.
pub struct Session {
    adapter: Adapter,
    target: Target,
    events: UnboundedSender<Event>,
    link: Option<Link>,
}

impl Session {
    pub fn new(adapter: Adapter, target: Target, events: UnboundedSender<Event>) -> Self {
        Self {
            adapter,
            target,
            events,
            link: None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    fn emit(&self, event: Event) {
        tracing::debug!(?event, "session event");
        // nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Find the device, connect and resolve the characteristic.
    ///
    /// Replaces any link the session already had.
    pub async fn connect(&mut self) -> Result<()> {
        if let Some(old) = self.link.take() {
            release(&old.peripheral).await;
        }
        let link = self.establish().await?;
        self.link = Some(link);
        Ok(())
    }

    async fn establish(&self) -> Result<Link> {
        self.emit(Event::Scanning);
        let (peripheral, name) = ble::find_device(
            &self.adapter,
            self.target.service,
            self.target.device.as_deref(),
            self.target.scan_timeout,
        )
        .await?;

        let tasks = Tasks::new(self.watch_disconnect(&peripheral, name.clone()).await?);
        let characteristic = match self.attach(&peripheral, &name).await {
            Ok(c) => c,
            Err(e) => {
                // connect may have gone through before discovery or lookup
                // failed; nothing would own that connection afterwards
                drop(tasks);
                release(&peripheral).await;
                return Err(e);
            }
        };

        self.emit(Event::Connected {
            name,
            service: self.target.service,
            characteristic: self.target.characteristic,
        });
        Ok(Link {
            peripheral,
            characteristic,
            tasks,
        })
    }

    async fn attach(&self, peripheral: &Peripheral, name: &Option<String>) -> Result<Characteristic> {
        self.emit(Event::Connecting { name: name.clone() });
        peripheral.connect().await?;
        peripheral.discover_services().await?;
        resolve(peripheral, self.target.service, self.target.characteristic)
    }

    async fn watch_disconnect(
        &self,
        peripheral: &Peripheral,
        name: Option<String>,
    ) -> Result<JoinHandle<()>> {
        let mut stream = self.adapter.events().await?;
        let id = peripheral.id();
        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                if let CentralEvent::DeviceDisconnected(gone) = event {
                    if gone == id {
                        tracing::info!(?id, "peripheral disconnected");
                        let _ = events.send(Event::Disconnected { name: name.clone() });
                    }
                }
            }
        }))
    }

    async fn link_for(&mut self, op: Op) -> Result<&mut Link> {
        if needs_connect(op, self.is_linked()) {
            self.connect().await?;
        }
        self.link.as_mut().ok_or(Error::NotConnected)
    }

    /// Connect afresh and read the characteristic, returning its first byte
    pub async fn read(&mut self) -> Result<u8> {
        let link = self.link_for(Op::Read).await?;
        let value = link.peripheral.read(&link.characteristic).await?;
        let first = value.first().copied().ok_or(Error::EmptyValue)?;
        self.emit(Event::Read { value: first });
        Ok(first)
    }

    /// Subscribe to notifications; each one is sent as [`Event::Notification`]
    pub async fn subscribe(&mut self) -> Result<()> {
        let events = self.events.clone();
        let link = self.link_for(Op::Subscribe).await?;

        link.peripheral.subscribe(&link.characteristic).await?;
        let mut stream = link.peripheral.notifications().await?;
        let uuid = link.characteristic.uuid;
        link.tasks.set_notifier(tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid == uuid {
                    let _ = events.send(Event::Notification {
                        value: notification.value,
                    });
                }
            }
        }));

        self.emit(Event::Subscribed);
        Ok(())
    }

    pub async fn write(&mut self, bytes: &[u8], write_type: WriteType) -> Result<()> {
        let link = self.link_for(Op::Write).await?;
        link.peripheral
            .write(&link.characteristic, bytes, write_type)
            .await?;
        self.emit(Event::Wrote {
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    /// Disconnect if connected. Not being connected is not an error.
    pub async fn disconnect(&mut self) -> Result<()> {
        let was_connected = match self.link.take() {
            None => None,
            Some(link) => {
                let connected = link.peripheral.is_connected().await?;
                if connected {
                    link.peripheral.disconnect().await?;
                }
                Some(connected)
            }
        };
        self.emit(disconnect_event(was_connected));
        Ok(())
    }
}

/// Best-effort disconnect of a peripheral nobody will hold on to
async fn release(peripheral: &Peripheral) {
    if peripheral.is_connected().await.unwrap_or(false) {
        if let Err(e) = peripheral.disconnect().await {
            tracing::warn!("failed to drop connection: {e}");
        }
    }
}

fn resolve(peripheral: &Peripheral, service: Uuid, characteristic: Uuid) -> Result<Characteristic> {
    let services = peripheral.services();
    let found = services
        .iter()
        .filter(|s| s.uuid == service)
        // prefer the primary declaration when a service shows up twice
        .max_by_key(|s| s.primary)
        .ok_or(Error::ServiceNotFound(service))?;

    found
        .characteristics
        .iter()
        .find(|c| c.uuid == characteristic)
        .cloned()
        .ok_or(Error::CharacteristicNotFound(characteristic))
}
