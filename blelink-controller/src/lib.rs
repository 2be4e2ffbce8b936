//! blelink controller
//!
//! Talks to one BLE peripheral through the platform stack: connect to a
//! device advertising a service, then read, write or subscribe to one of its
//! characteristics.
//!
//! # Example
//!
//! ```ignore
//! use blelink_controller::{ble, Session, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!     tokio::spawn(async move {
//!         while let Some(event) = rx.recv().await {
//!             println!("{event}");
//!         }
//!     });
//!
//!     let adapter = ble::get_adapter().await?;
//!     let target = Target::from_input("0x180F", "0x2A19")?;
//!     let mut session = Session::new(adapter, target, tx);
//!
//!     let level = session.read().await?;
//!     println!("battery: {level}%");
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod ble;
mod event;
mod session;

pub use event::Event;
pub use session::{Session, Target};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("enter both a service UUID and a characteristic UUID")]
    MissingUuid,
    #[error("invalid UUID: {0}")]
    Uuid(#[from] blelink_uuid::ParseError),
    #[error("no device advertising service {service} found")]
    DeviceNotFound { service: uuid::Uuid },
    #[error("service {0} not found on device")]
    ServiceNotFound(uuid::Uuid),
    #[error("characteristic {0} not found in service")]
    CharacteristicNotFound(uuid::Uuid),
    #[error("not connected")]
    NotConnected,
    #[error("characteristic returned an empty value")]
    EmptyValue,
    #[error(transparent)]
    Ble(#[from] btleplug::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
