//! TOML configuration for projectors and session timeouts.
//!
//! A deployment typically lists its projectors once in a config file and
//! builds a [`crate::Projector`] per entry at start-up:
//!
//! ```toml
//! [timeouts]
//! idle_secs = 20
//! start_secs = 10
//! stop_secs = 10
//!
//! [[projectors]]
//! id = "aula-left"
//! host = "192.168.0.20"
//! connect_on_start = true
//!
//! [[projectors]]
//! id = "aula-right"
//! host = "192.168.0.21"
//! ```
//!
//! Fields annotated with `#[serde(default)]` fall back to their documented
//! defaults when absent, so a minimal file (or none at all) works on first
//! run and across upgrades.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClientConfig {
    /// Session timeouts, shared by every projector.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// One entry per projector to control.
    #[serde(default)]
    pub projectors: Vec<ProjectorEntry>,
}

/// Session timeouts in whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutConfig {
    /// Seconds without a response before an idle connection is closed.
    /// A library policy, not a protocol mandate; the next send reconnects.
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,
    /// Seconds `start()` waits for connect-and-authenticate when
    /// `connect_on_start` is set.
    #[serde(default = "default_start_secs")]
    pub start_secs: u64,
    /// Seconds `stop()` waits for a connection to close.
    #[serde(default = "default_stop_secs")]
    pub stop_secs: u64,
}

/// One projector to control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectorEntry {
    /// Stable identifier, used in logs and error messages.
    pub id: String,
    /// IPv4/IPv6 address, optionally with an explicit port. Without a port
    /// the standard PJLink port 4352 is assumed.
    pub host: String,
    /// Whether `start()` synchronously connects and authenticates.
    #[serde(default)]
    pub connect_on_start: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_idle_secs() -> u64 {
    20
}
fn default_start_secs() -> u64 {
    10
}
fn default_stop_secs() -> u64 {
    10
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle_secs: default_idle_secs(),
            start_secs: default_start_secs(),
            stop_secs: default_stop_secs(),
        }
    }
}

// ── Runtime settings ──────────────────────────────────────────────────────────

/// Resolved session timeouts as durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Close an idle connection after this long without a response.
    pub idle_timeout: Duration,
    /// Upper bound on a synchronous `start()`.
    pub start_timeout: Duration,
    /// Upper bound on a synchronous `stop()`.
    pub stop_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        TimeoutConfig::default().settings()
    }
}

impl TimeoutConfig {
    /// Converts the configured seconds into runtime [`Settings`].
    pub fn settings(&self) -> Settings {
        Settings {
            idle_timeout: Duration::from_secs(self.idle_secs),
            start_timeout: Duration::from_secs(self.start_secs),
            stop_timeout: Duration::from_secs(self.stop_secs),
        }
    }
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Loads a [`ClientConfig`] from `path`, returning defaults when the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_defaults() {
        let cfg = TimeoutConfig::default();
        assert_eq!(cfg.idle_secs, 20);
        assert_eq!(cfg.start_secs, 10);
        assert_eq!(cfg.stop_secs, 10);
    }

    #[test]
    fn test_settings_conversion() {
        let settings = TimeoutConfig::default().settings();
        assert_eq!(settings.idle_timeout, Duration::from_secs(20));
        assert_eq!(settings.start_timeout, Duration::from_secs(10));
        assert_eq!(settings.stop_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = ClientConfig::default();
        cfg.timeouts.idle_secs = 5;
        cfg.projectors.push(ProjectorEntry {
            id: "aula-left".to_string(),
            host: "192.168.0.20".to_string(),
            connect_on_start: true,
        });

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: ClientConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let cfg: ClientConfig = toml::from_str(
            r#"
[[projectors]]
id = "foyer"
host = "10.0.0.5"
"#,
        )
        .expect("deserialize minimal");

        assert_eq!(cfg.timeouts.idle_secs, 20);
        assert_eq!(cfg.projectors.len(), 1);
        assert!(!cfg.projectors[0].connect_on_start);
    }

    #[test]
    fn test_empty_toml_is_a_valid_config() {
        let cfg: ClientConfig = toml::from_str("").expect("deserialize empty");
        assert!(cfg.projectors.is_empty());
        assert_eq!(cfg.timeouts, TimeoutConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result: Result<ClientConfig, toml::de::Error> = toml::from_str("[[[ not toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = Path::new("/nonexistent/path/that/cannot/exist/pjlink.toml");
        let cfg = load_config(path).expect("absent file must yield defaults");
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip_via_temp_dir() {
        let dir = std::env::temp_dir().join(format!("pjlink_cfg_{}", std::process::id()));
        let path = dir.join("pjlink.toml");

        let mut cfg = ClientConfig::default();
        cfg.timeouts.stop_secs = 3;
        cfg.projectors.push(ProjectorEntry {
            id: "studio".to_string(),
            host: "192.168.1.77".to_string(),
            connect_on_start: false,
        });

        save_config(&path, &cfg).expect("save");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);

        std::fs::remove_dir_all(&dir).ok();
    }
}
