//! Configuration for the huelink CLI.
//!
//! TOML config file, `HUELINK_` environment overrides, credential
//! resolution (env + keyring + plaintext), and translation to
//! `huelink_core::ControllerConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use huelink_core::config::{
    DEFAULT_DEVICE_LABEL, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SENSOR_POLL_INTERVAL_MS,
};
use huelink_core::{ControllerConfig, Protocol, TlsMode};

/// Environment variable holding the bridge username.
pub const CREDENTIAL_ENV: &str = "HUELINK_USERNAME";

const KEYRING_SERVICE: &str = "huelink";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeSection,

    #[serde(default)]
    pub defaults: Defaults,
}

/// The one bridge this installation talks to.
#[derive(Debug, Deserialize, Serialize)]
pub struct BridgeSection {
    /// Host name or IP address.
    pub host: Option<String>,

    /// Override the protocol's default port.
    pub port: Option<u16>,

    /// "http" or "https".
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Bridge username in plaintext. The keyring or env var take precedence.
    pub username: Option<String>,

    /// `devicetype` sent when pairing.
    #[serde(default = "default_device_label")]
    pub device_label: String,

    /// Accept the bridge's self-signed certificate.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Light and group poll period in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: i64,

    /// Sensor poll period in milliseconds; 0 disables sensor polling.
    #[serde(default = "default_sensor_poll_interval")]
    pub sensor_poll_interval: i64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            protocol: default_protocol(),
            username: None,
            device_label: default_device_label(),
            insecure: default_insecure(),
            ca_cert: None,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            sensor_poll_interval: default_sensor_poll_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// "table" or "json".
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_protocol() -> String {
    "http".into()
}
fn default_device_label() -> String {
    DEFAULT_DEVICE_LABEL.into()
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    5
}
fn default_poll_interval() -> i64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_sensor_poll_interval() -> i64 {
    DEFAULT_SENSOR_POLL_INTERVAL_MS
}
fn default_output() -> String {
    "table".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "huelink", "huelink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("huelink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// A missing file yields the defaults. Environment overrides use a
/// double underscore between section and key, e.g. `HUELINK_BRIDGE__HOST`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HUELINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

/// Where a freshly paired credential ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStore {
    Keyring,
    ConfigFile,
}

fn keyring_account(section: &BridgeSection) -> String {
    format!("{}/username", section.host.as_deref().unwrap_or("default"))
}

/// Resolve the bridge username: `HUELINK_USERNAME`, then the system
/// keyring, then plaintext in the config file.
pub fn resolve_credential(section: &BridgeSection) -> Option<SecretString> {
    let from_env = std::env::var(CREDENTIAL_ENV).ok();
    let from_keyring = || {
        keyring::Entry::new(KEYRING_SERVICE, &keyring_account(section))
            .and_then(|entry| entry.get_password())
            .ok()
    };
    credential_chain(from_env, from_keyring, section.username.as_deref())
}

fn credential_chain(
    from_env: Option<String>,
    from_keyring: impl FnOnce() -> Option<String>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    let non_empty = |s: &String| !s.trim().is_empty();

    if let Some(value) = from_env.filter(non_empty) {
        debug!("using bridge username from {CREDENTIAL_ENV}");
        return Some(SecretString::from(value));
    }
    if let Some(value) = from_keyring().filter(non_empty) {
        debug!("using bridge username from keyring");
        return Some(SecretString::from(value));
    }
    plaintext
        .filter(|s| !s.trim().is_empty())
        .map(|s| SecretString::from(s.to_owned()))
}

/// Persist a paired credential: keyring first, plaintext in the config
/// file at `path` when the keyring is unavailable.
pub fn store_credential(
    cfg: &mut Config,
    credential: &SecretString,
    path: &Path,
) -> Result<CredentialStore, ConfigError> {
    let account = keyring_account(&cfg.bridge);
    let stored = keyring::Entry::new(KEYRING_SERVICE, &account)
        .and_then(|entry| entry.set_password(credential.expose_secret()));

    match stored {
        Ok(()) => {
            debug!(account = %account, "credential stored in keyring");
            Ok(CredentialStore::Keyring)
        }
        Err(e) => {
            warn!(error = %e, "keyring unavailable, storing credential in config file");
            cfg.bridge.username = Some(credential.expose_secret().to_owned());
            save_config_to(path, cfg)?;
            Ok(CredentialStore::ConfigFile)
        }
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ControllerConfig` from the loaded config.
pub fn to_controller_config(cfg: &Config) -> Result<ControllerConfig, ConfigError> {
    let bridge = &cfg.bridge;

    let protocol: Protocol = bridge
        .protocol
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "bridge.protocol".into(),
            reason: format!("expected 'http' or 'https', got '{}'", bridge.protocol),
        })?;

    let tls = if let Some(ref ca_path) = bridge.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else if bridge.insecure {
        TlsMode::DangerAcceptInvalid
    } else {
        TlsMode::System
    };

    if bridge.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "bridge.timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    Ok(ControllerConfig {
        host: bridge.host.clone().filter(|h| !h.trim().is_empty()),
        port: bridge.port,
        protocol,
        tls,
        credential: resolve_credential(bridge),
        device_label: bridge.device_label.clone(),
        timeout: Duration::from_secs(bridge.timeout),
        poll_interval_secs: bridge.poll_interval,
        sensor_poll_interval_ms: bridge.sensor_poll_interval,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.bridge.protocol, "http");
        assert_eq!(cfg.bridge.device_label, DEFAULT_DEVICE_LABEL);
        assert_eq!(cfg.bridge.poll_interval, 10);
        assert_eq!(cfg.bridge.sensor_poll_interval, 500);
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn partial_file_is_merged_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bridge]\nhost = \"192.168.1.20\"\nprotocol = \"https\"\nsensor_poll_interval = 0\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.bridge.host.as_deref(), Some("192.168.1.20"));
        assert_eq!(cfg.bridge.protocol, "https");
        assert_eq!(cfg.bridge.sensor_poll_interval, 0);
        assert_eq!(cfg.bridge.timeout, 5);
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.bridge.host = Some("hue.local".into());
        cfg.bridge.port = Some(8080);
        cfg.defaults.output = "json".into();

        save_config_to(&path, &cfg).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.bridge.host.as_deref(), Some("hue.local"));
        assert_eq!(loaded.bridge.port, Some(8080));
        assert_eq!(loaded.defaults.output, "json");
    }

    #[test]
    fn credential_chain_prefers_env_then_keyring_then_plaintext() {
        let env = credential_chain(Some("from-env".into()), || Some("from-keyring".into()), Some("plain"));
        assert_eq!(env.unwrap().expose_secret(), "from-env");

        let keyring = credential_chain(None, || Some("from-keyring".into()), Some("plain"));
        assert_eq!(keyring.unwrap().expose_secret(), "from-keyring");

        let plain = credential_chain(Some("  ".into()), || None, Some("plain"));
        assert_eq!(plain.unwrap().expose_secret(), "plain");

        assert!(credential_chain(None, || None, Some("")).is_none());
    }

    #[test]
    fn controller_config_translation() {
        let mut cfg = Config::default();
        cfg.bridge.host = Some("10.0.0.2".into());
        cfg.bridge.protocol = "HTTPS".into();
        cfg.bridge.insecure = false;
        cfg.bridge.poll_interval = 3;

        let controller = to_controller_config(&cfg).unwrap();
        assert_eq!(controller.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(controller.protocol, Protocol::Https);
        assert!(matches!(controller.tls, TlsMode::System));
        assert_eq!(controller.poll_interval_secs, 3);
        assert_eq!(controller.timeout, Duration::from_secs(5));
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let mut cfg = Config::default();
        cfg.bridge.protocol = "ftp".into();
        let err = to_controller_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("bridge.protocol"));
    }

    #[test]
    fn blank_host_means_no_host() {
        let mut cfg = Config::default();
        cfg.bridge.host = Some("  ".into());
        assert!(to_controller_config(&cfg).unwrap().host.is_none());
    }
}
