//! BLE UUID normalization
//!
//! Users type UUIDs in whatever form the datasheet printed them: `0x180F`,
//! `6109`, or a full hyphenated UUID in upper case. [`normalize`] maps all of
//! these to the lowercase 128-bit form the platform BLE stack expects.
//!
//! [`normalize`] never fails, so some inputs come out as strings that only
//! look like UUIDs (`0x12345`, `0xZZ`, `70000`). Anything that has to become
//! a real [`uuid::Uuid`] should go through [`parse`] instead, which rejects
//! those.
//!
//! Known limitation: a bare short hex form with a letter in it and no `0x`
//! prefix (`180F`) is not expanded, only lowercased. [`parse`] rejects it and
//! suggests the prefix.

pub mod ble;

use uuid::Uuid;

const BASE: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Bluetooth Base UUID: 00000000-0000-1000-8000-00805f9b34fb
pub const BLUETOOTH_BASE_UUID: Uuid = Uuid::from_u128(BASE);

/// Everything after the leading 8 hex digits of a SIG short-form UUID
const BASE_SUFFIX: &str = "-0000-1000-8000-00805f9b34fb";

/// Expand a 16-bit SIG short form onto the Bluetooth Base UUID
pub const fn from_short(short: u16) -> Uuid {
    Uuid::from_u128(BASE | ((short as u128) << 96))
}

/// Map a user-entered UUID string to its canonical lowercase form.
///
/// Rules, first match wins:
/// 1. `0x`/`0X` followed by at most 4 characters: zero-padded into the base UUID
/// 2. contains `-`: lowercased as is
/// 3. only decimal digits: converted to hex, zero-padded into the base UUID
/// 4. anything else: lowercased as is
///
/// Surrounding whitespace is ignored. Content is not validated.
pub fn normalize(input: &str) -> String {
    let s = input.trim();

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.chars().count() <= 4 {
            return expand(hex);
        }
    }

    if s.contains('-') {
        return s.to_lowercase();
    }

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        // too large for u128 cannot be a short form either, leave it alone
        if let Ok(n) = s.parse::<u128>() {
            return expand(&format!("{n:x}"));
        }
    }

    s.to_lowercase()
}

fn expand(hex: &str) -> String {
    format!("0000{:0>4}{BASE_SUFFIX}", hex).to_lowercase()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("UUID is empty")]
    Empty,
    #[error("{input:?} is not a valid UUID (normalized to {normalized:?}){}", hint(.input))]
    Malformed { input: String, normalized: String },
}

fn hint(input: &str) -> &'static str {
    let s = input.trim();
    if !s.is_empty() && s.len() <= 4 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        ", did you mean 0x-prefixed short form?"
    } else {
        ""
    }
}

/// Normalize `input` and require the result to be a real 128-bit UUID.
pub fn parse(input: &str) -> Result<Uuid, ParseError> {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return Err(ParseError::Empty);
    }
    Uuid::parse_str(&normalized).map_err(|_| ParseError::Malformed {
        input: input.trim().to_string(),
        normalized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATTERY: &str = "0000180f-0000-1000-8000-00805f9b34fb";

    #[test]
    fn short_hex() {
        assert_eq!(normalize("0x180F"), BATTERY);
        assert_eq!(normalize("0X180f"), BATTERY);
        assert_eq!(normalize("0x1"), "00000001-0000-1000-8000-00805f9b34fb");
        assert_eq!(normalize("0x2a19"), "00002a19-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn every_short_hex_width() {
        for hex in ["a", "ab", "abc", "abcd"] {
            let expected = format!("0000{hex:0>4}-0000-1000-8000-00805f9b34fb");
            assert_eq!(normalize(&format!("0x{hex}")), expected);
            assert_eq!(normalize(&format!("0x{}", hex.to_uppercase())), expected);
        }
    }

    #[test]
    fn decimal_matches_hex() {
        for n in 0..=u16::MAX {
            assert_eq!(normalize(&n.to_string()), normalize(&format!("0x{n:x}")), "{n}");
        }
        assert_eq!(normalize("6109"), "0000017d-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn hyphenated_is_lowercased() {
        assert_eq!(normalize("0000180F-0000-1000-8000-00805F9B34FB"), BATTERY);
        assert_eq!(
            normalize("6E400001-B5A3-F393-E0A9-E50E24DCCA9E"),
            "6e400001-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }

    #[test]
    fn idempotent() {
        for input in ["0x180F", "6109", "0000180F-0000-1000-8000-00805F9B34FB", "Heart-Rate"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "{input}");
        }
    }

    #[test]
    fn whitespace() {
        assert_eq!(normalize("  0x180F  "), normalize("0x180F"));
        assert_eq!(normalize("\t6109\n"), normalize("6109"));
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn passthrough() {
        // bare hex with a letter is not expanded
        assert_eq!(normalize("180F"), "180f");
        assert_eq!(normalize("Battery"), "battery");
        // more than 4 digits after 0x is not a 16-bit short form
        assert_eq!(normalize("0x0000180F"), "0x0000180f");
    }

    #[test]
    fn malformed_but_uuid_shaped() {
        assert_eq!(normalize("0xZZ"), "000000zz-0000-1000-8000-00805f9b34fb");
        assert_eq!(normalize("0x"), "00000000-0000-1000-8000-00805f9b34fb");
        assert_eq!(normalize("70000"), "000011170-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn short_constant() {
        assert_eq!(from_short(0x180f).to_string(), BATTERY);
        assert_eq!(from_short(0).to_string(), BLUETOOTH_BASE_UUID.to_string());
        assert_eq!(parse(ble::BATTERY_SERVICE), Ok(from_short(0x180f)));
        assert_eq!(parse(ble::BATTERY_LEVEL), Ok(from_short(0x2a19)));
    }

    #[test]
    fn parse_accepts() {
        assert_eq!(parse("0x180F"), Ok(from_short(0x180f)));
        assert_eq!(parse(" 6109 "), Ok(from_short(6109)));
        assert_eq!(
            parse("6E400001-B5A3-F393-E0A9-E50E24DCCA9E"),
            Ok(Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E))
        );
    }

    #[test]
    fn parse_rejects() {
        assert_eq!(parse("  "), Err(ParseError::Empty));
        for input in ["0xZZ", "70000", "180F", "0x12345", "not-a-uuid"] {
            assert!(
                matches!(parse(input), Err(ParseError::Malformed { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn parse_hints_prefix() {
        let e = parse("180F").unwrap_err().to_string();
        assert!(e.contains("0x-prefixed"), "{e}");
        let e = parse("0xZZ").unwrap_err().to_string();
        assert!(!e.contains("0x-prefixed"), "{e}");
    }
}
