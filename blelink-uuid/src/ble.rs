//! Bluetooth SIG assigned numbers used as defaults by the blelink tools
//!
//! Short forms are kept as strings, the way a user would type them, so they
//! go through the same normalization as anything read from the command line.

/// Battery Service
pub const BATTERY_SERVICE: &str = "0x180F";

/// Battery Level characteristic (read/notify, one byte, percent)
pub const BATTERY_LEVEL: &str = "0x2A19";
