use std::fmt;

/// Something the session wants the user to see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Scanning,
    Connecting {
        name: Option<String>,
    },
    Connected {
        name: Option<String>,
        service: uuid::Uuid,
        characteristic: uuid::Uuid,
    },
    Read {
        value: u8,
    },
    Subscribed,
    Notification {
        value: Vec<u8>,
    },
    Wrote {
        bytes: Vec<u8>,
    },
    /// The peripheral went away without us asking
    Disconnected {
        name: Option<String>,
    },
    ManuallyDisconnected,
    AlreadyDisconnected,
}

fn unnamed(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("(unnamed)")
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Scanning => write!(f, "scanning..."),
            Event::Connecting { name } => write!(f, "connecting: {}", unnamed(name)),
            Event::Connected {
                name,
                service,
                characteristic,
            } => write!(
                f,
                "connected: {} / service: {service} / characteristic: {characteristic}",
                unnamed(name)
            ),
            Event::Read { value } => write!(f, "read: {value}"),
            Event::Subscribed => write!(f, "subscribed to notifications"),
            Event::Notification { value } => match value.first() {
                Some(v) => write!(f, "notification: {v}"),
                None => write!(f, "notification: (empty)"),
            },
            Event::Wrote { bytes } => {
                write!(f, "wrote")?;
                for b in bytes {
                    write!(f, " 0x{b:02x}")?;
                }
                Ok(())
            }
            Event::Disconnected { name } => write!(
                f,
                "disconnected: {}",
                name.as_deref().unwrap_or("Unknown device")
            ),
            Event::ManuallyDisconnected => write!(f, "disconnected manually"),
            Event::AlreadyDisconnected => write!(f, "already disconnected"),
        }
    }
}
