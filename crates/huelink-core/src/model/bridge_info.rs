// ── Bridge metadata ──

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::group::Group;
use super::light::Light;
use super::sensor::Sensor;

/// Unauthenticated bridge description, as returned by the metadata probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeInfo {
    pub name: String,
    pub bridge_id: String,
    pub model_id: String,
    pub mac: String,
    pub sw_version: String,
    pub api_version: String,
}

/// Properties recorded once after the first successful authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeProperties {
    pub serial_number: String,
    pub model_id: String,
    pub mac_address: String,
    pub firmware_version: String,
    pub api_version: String,
}

impl From<&BridgeInfo> for BridgeProperties {
    fn from(info: &BridgeInfo) -> Self {
        Self {
            serial_number: serial_number(&info.bridge_id),
            model_id: info.model_id.clone(),
            mac_address: info.mac.clone(),
            firmware_version: info.sw_version.clone(),
            api_version: info.api_version.clone(),
        }
    }
}

/// Strip the `FFFE` filler from a 16-character bridge id
/// (`001788FFFE23BFC2` becomes `00178823BFC2`).
///
/// Ids too short to carry the filler are returned unchanged.
pub(crate) fn serial_number(bridge_id: &str) -> String {
    match (bridge_id.get(..6), bridge_id.get(10..)) {
        (Some(head), Some(tail)) => format!("{head}{tail}"),
        _ => bridge_id.to_owned(),
    }
}

/// Everything `GET /api/{user}` reports, converted.
#[derive(Debug, Clone, Default)]
pub struct FullConfig {
    pub bridge: BridgeInfo,
    pub lights: Vec<Light>,
    pub groups: Vec<Group>,
    pub sensors: Vec<Sensor>,
}

/// Dotted `major.minor.patch` API version. Missing parts count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    /// First API version that reports complete light state from `/lights`.
    pub const FULL_LIGHTS: Self = Self::new(1, 11, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ApiVersion {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '.');
        let mut next = || -> Result<u32, Self::Err> {
            match parts.next() {
                Some(p) if !p.is_empty() => p.parse(),
                _ => Ok(0),
            }
        };
        Ok(Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serial_number_strips_filler() {
        assert_eq!(serial_number("001788FFFE23BFC2"), "00178823BFC2");
    }

    #[test]
    fn serial_number_tolerates_short_ids() {
        assert_eq!(serial_number("ABC"), "ABC");
        assert_eq!(serial_number(""), "");
    }

    #[test]
    fn api_version_ordering() {
        let v: ApiVersion = "1.10.0".parse().unwrap();
        assert!(v < ApiVersion::FULL_LIGHTS);
        let v: ApiVersion = "1.16".parse().unwrap();
        assert_eq!(v, ApiVersion::new(1, 16, 0));
        assert!(v >= ApiVersion::FULL_LIGHTS);
        assert!("1.x.0".parse::<ApiVersion>().is_err());
    }
}
