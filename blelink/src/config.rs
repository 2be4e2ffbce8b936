//! `$BLELINK_HOME/config.json`
//!
//! Every field is optional; command line flags win over the file.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub service_uuid: Option<String>,
    pub characteristic_uuid: Option<String>,
    pub device: Option<String>,
    pub scan_secs: Option<u64>,
    /// tracing filter directive, e.g. `debug` or `blelink_controller=trace`
    pub log: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory, set BLELINK_HOME")]
    NoHome,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// `$BLELINK_HOME`, or `~/.blelink`
pub fn home() -> Result<PathBuf, ConfigError> {
    match std::env::var_os("BLELINK_HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => dirs::home_dir()
            .map(|h| h.join(".blelink"))
            .ok_or(ConfigError::NoHome),
    }
}

/// Load the config from `home`; a missing file means defaults.
pub fn load(home: &Path) -> Result<Config, ConfigError> {
    let path = home.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_home(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blelink-config-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_default() {
        let home = temp_home("missing");
        assert_eq!(load(&home).unwrap(), Config::default());
    }

    #[test]
    fn partial_file() {
        let home = temp_home("partial");
        std::fs::write(
            home.join(CONFIG_FILE),
            r#"{"service_uuid": "0x180D", "scan_secs": 10}"#,
        )
        .unwrap();
        let config = load(&home).unwrap();
        assert_eq!(config.service_uuid.as_deref(), Some("0x180D"));
        assert_eq!(config.scan_secs, Some(10));
        assert_eq!(config.characteristic_uuid, None);
        assert_eq!(config.log, None);
    }

    #[test]
    fn invalid_file() {
        let home = temp_home("invalid");
        std::fs::write(home.join(CONFIG_FILE), "{ not json").unwrap();
        let e = load(&home).unwrap_err();
        assert!(matches!(e, ConfigError::Parse { .. }), "{e}");
    }
}
