// ── Controller configuration ──
//
// Built by the CLI (via `huelink-config`) and handed to `Controller`.
// The core never reads configuration files itself.

use std::time::Duration;

use secrecy::SecretString;
use tracing::warn;
use url::Url;

pub use huelink_api::transport::{Protocol, TlsMode};
use huelink_api::transport::{TransportConfig, bridge_url};

use crate::error::CoreError;
use crate::model::StatusReason;

pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 10;
pub const MIN_POLL_INTERVAL_SECS: i64 = 1;
pub const DEFAULT_SENSOR_POLL_INTERVAL_MS: i64 = 500;
pub const MIN_SENSOR_POLL_INTERVAL_MS: i64 = 50;
pub const DEFAULT_DEVICE_LABEL: &str = "huelink";

/// Configuration for one bridge.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Bridge host name or IP address. Required.
    pub host: Option<String>,
    /// `None` uses the protocol's default port.
    pub port: Option<u16>,
    pub protocol: Protocol,
    pub tls: TlsMode,
    /// Whitelisted bridge username. Obtained by pairing when absent.
    pub credential: Option<SecretString>,
    /// `devicetype` sent when pairing.
    pub device_label: String,
    pub timeout: Duration,
    /// Light and group poll period in seconds.
    pub poll_interval_secs: i64,
    /// Sensor poll period in milliseconds. Zero or negative disables sensor polling.
    pub sensor_poll_interval_ms: i64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            protocol: Protocol::default(),
            tls: TlsMode::default(),
            credential: None,
            device_label: DEFAULT_DEVICE_LABEL.into(),
            timeout: Duration::from_secs(5),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            sensor_poll_interval_ms: DEFAULT_SENSOR_POLL_INTERVAL_MS,
        }
    }
}

/// A problem an operator needs to fix before the bridge can come online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    MissingHost,
    InvalidPollInterval(i64),
    SensorPollIntervalTooLow(i64),
}

impl ConfigIssue {
    /// Only a missing host prevents the controller from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingHost)
    }

    pub fn reason(&self) -> StatusReason {
        match self {
            Self::MissingHost => StatusReason::NoHost,
            Self::InvalidPollInterval(v) => StatusReason::Message(format!(
                "poll interval {v}s is below {MIN_POLL_INTERVAL_SECS}s; using {DEFAULT_POLL_INTERVAL_SECS}s"
            )),
            Self::SensorPollIntervalTooLow(v) => StatusReason::Message(format!(
                "sensor poll interval {v}ms is below {MIN_SENSOR_POLL_INTERVAL_MS}ms; using {DEFAULT_SENSOR_POLL_INTERVAL_MS}ms"
            )),
        }
    }
}

impl ControllerConfig {
    /// Effective light/group poll period. Invalid values fall back to the default.
    pub fn poll_interval(&self) -> Duration {
        let secs = if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            warn!(
                configured = self.poll_interval_secs,
                default = DEFAULT_POLL_INTERVAL_SECS,
                "invalid poll interval, using default"
            );
            DEFAULT_POLL_INTERVAL_SECS
        } else {
            self.poll_interval_secs
        };
        Duration::from_secs(secs.unsigned_abs())
    }

    /// Effective sensor poll period, or `None` when sensor polling is disabled.
    pub fn sensor_poll_interval(&self) -> Option<Duration> {
        let ms = match self.sensor_poll_interval_ms {
            ms if ms <= 0 => return None,
            ms if ms < MIN_SENSOR_POLL_INTERVAL_MS => {
                warn!(
                    configured = ms,
                    default = DEFAULT_SENSOR_POLL_INTERVAL_MS,
                    "sensor poll interval too low, using default"
                );
                DEFAULT_SENSOR_POLL_INTERVAL_MS
            }
            ms => ms,
        };
        Some(Duration::from_millis(ms.unsigned_abs()))
    }

    /// Validate the configuration. Empty means nothing to report.
    pub fn config_status(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.host.as_deref().is_none_or(|h| h.trim().is_empty()) {
            issues.push(ConfigIssue::MissingHost);
        }
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            issues.push(ConfigIssue::InvalidPollInterval(self.poll_interval_secs));
        }
        if (1..MIN_SENSOR_POLL_INTERVAL_MS).contains(&self.sensor_poll_interval_ms) {
            issues.push(ConfigIssue::SensorPollIntervalTooLow(
                self.sensor_poll_interval_ms,
            ));
        }
        issues
    }

    /// Bridge root URL built from host, port and protocol.
    pub fn bridge_url(&self) -> Result<Url, CoreError> {
        let host = self
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| CoreError::Config {
                message: "no bridge host configured".into(),
            })?;
        bridge_url(host.trim(), self.port, self.protocol).map_err(|e| CoreError::Config {
            message: e.to_string(),
        })
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_falls_back_when_invalid() {
        let mut config = ControllerConfig {
            poll_interval_secs: 0,
            ..ControllerConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        config.poll_interval_secs = 3;
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn sensor_poll_interval_rules() {
        let mut config = ControllerConfig::default();
        assert_eq!(
            config.sensor_poll_interval(),
            Some(Duration::from_millis(500))
        );

        config.sensor_poll_interval_ms = 0;
        assert_eq!(config.sensor_poll_interval(), None);
        config.sensor_poll_interval_ms = -5;
        assert_eq!(config.sensor_poll_interval(), None);

        config.sensor_poll_interval_ms = 20;
        assert_eq!(
            config.sensor_poll_interval(),
            Some(Duration::from_millis(500))
        );

        config.sensor_poll_interval_ms = 50;
        assert_eq!(
            config.sensor_poll_interval(),
            Some(Duration::from_millis(50))
        );
    }

    #[test]
    fn config_status_reports_missing_host() {
        let config = ControllerConfig::default();
        assert_eq!(config.config_status(), vec![ConfigIssue::MissingHost]);
        assert!(config.bridge_url().is_err());

        let config = ControllerConfig {
            host: Some("192.168.1.20".into()),
            ..ControllerConfig::default()
        };
        assert!(config.config_status().is_empty());
        assert_eq!(
            config.bridge_url().unwrap().as_str(),
            "http://192.168.1.20/"
        );
    }
}
