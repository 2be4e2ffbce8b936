//! `blelink session`: one connection, many actions
//!
//! Each line on stdin is an action. A failing action prints `error: ...` and
//! the loop carries on with whatever link the session still has.

use blelink_controller::Session;
use btleplug::api::WriteType;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Written when `write` is given no value
pub const DEFAULT_VALUE: &[u8] = &[0x01];

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Notify,
    Write(Vec<u8>),
    Disconnect,
    Help,
    Quit,
}

pub fn parse_action(line: &str) -> Result<Action, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "read" | "scan" => Ok(Action::Read),
        "notify" => Ok(Action::Notify),
        "write" if rest.is_empty() => Ok(Action::Write(DEFAULT_VALUE.to_vec())),
        "write" => parse_hex(rest).map(Action::Write),
        "disconnect" => Ok(Action::Disconnect),
        "help" | "?" => Ok(Action::Help),
        "quit" | "exit" => Ok(Action::Quit),
        other => Err(format!("unknown action: {other}, try help")),
    }
}

/// Bytes from hex: `01`, `0x01`, `DE AD`, `dead`, `1`
pub fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let mut digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err("no bytes given".to_string());
    }
    if digits.len() == 1 {
        digits.insert(0, '0');
    } else if digits.len() % 2 == 1 {
        return Err(format!("odd number of hex digits in {s:?}"));
    }
    data_encoding::HEXLOWER_PERMISSIVE
        .decode(digits.as_bytes())
        .map_err(|e| format!("invalid hex {s:?}: {e}"))
}

const HELP: &str = "\
actions:
  read            connect and read the characteristic
  notify          subscribe to notifications
  write [HEX]     write bytes (default 01)
  disconnect      disconnect from the device
  quit";

pub async fn run(mut session: Session, write_type: WriteType) -> Result<(), Box<dyn std::error::Error>> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let action = match parse_action(&line) {
            Ok(action) => action,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let result = match action {
            Action::Read => session.read().await.map(|_| ()),
            Action::Notify => session.subscribe().await,
            Action::Write(bytes) => session.write(&bytes, write_type).await,
            Action::Disconnect => session.disconnect().await,
            Action::Help => {
                println!("{HELP}");
                Ok(())
            }
            Action::Quit => break,
        };

        if let Err(e) = result {
            tracing::debug!(error = ?e, "action failed");
            println!("error: {e}");
        }
    }

    if session.is_linked() {
        session.disconnect().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions() {
        assert_eq!(parse_action("read"), Ok(Action::Read));
        assert_eq!(parse_action(" Scan "), Ok(Action::Read));
        assert_eq!(parse_action("notify"), Ok(Action::Notify));
        assert_eq!(parse_action("write"), Ok(Action::Write(vec![0x01])));
        assert_eq!(parse_action("write 0xff 00"), Ok(Action::Write(vec![0xff, 0x00])));
        assert_eq!(parse_action("disconnect"), Ok(Action::Disconnect));
        assert_eq!(parse_action("exit"), Ok(Action::Quit));
        assert!(parse_action("connect").is_err());
        assert!(parse_action("write zz").is_err());
    }

    #[test]
    fn hex() {
        assert_eq!(parse_hex("01"), Ok(vec![0x01]));
        assert_eq!(parse_hex("0x01"), Ok(vec![0x01]));
        assert_eq!(parse_hex("1"), Ok(vec![0x01]));
        assert_eq!(parse_hex("DE AD"), Ok(vec![0xde, 0xad]));
        assert_eq!(parse_hex("0Xbeef"), Ok(vec![0xbe, 0xef]));
        assert!(parse_hex("").is_err());
        assert!(parse_hex("0x").is_err());
        assert!(parse_hex("g1").is_err());
        // a lone nibble is padded, a dangling one in longer input is refused
        assert!(parse_hex("DE A").is_err());
        assert!(parse_hex("123").is_err());
    }
}
