// Wire types for the bridge v1 REST API.
//
// Collections are returned as JSON objects keyed by resource id
// (`{"1": {...}, "2": {...}}`), so they deserialize into `BTreeMap`s
// and the id travels as the map key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error object embedded in a response array: `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub error_type: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

/// One entry of a write response array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResult {
    Success(Value),
    Error(ApiErrorBody),
}

/// Color mode reported alongside a light's color attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiColorMode {
    Hs,
    Xy,
    Ct,
}

/// `state` object of a light (also the shape of a group's `action`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiLightState {
    #[serde(default)]
    pub on: bool,
    pub bri: Option<u8>,
    pub hue: Option<u16>,
    pub sat: Option<u8>,
    pub xy: Option<[f64; 2]>,
    pub ct: Option<u16>,
    pub alert: Option<String>,
    pub effect: Option<String>,
    pub colormode: Option<ApiColorMode>,
    pub reachable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLight {
    pub name: String,
    #[serde(rename = "type", default)]
    pub light_type: String,
    #[serde(default)]
    pub state: ApiLightState,
    pub modelid: Option<String>,
    pub uniqueid: Option<String>,
    pub swversion: Option<String>,
    pub manufacturername: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiGroupState {
    #[serde(default)]
    pub all_on: bool,
    #[serde(default)]
    pub any_on: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGroup {
    pub name: String,
    #[serde(rename = "type", default)]
    pub group_type: String,
    #[serde(default)]
    pub lights: Vec<String>,
    #[serde(default)]
    pub action: ApiLightState,
    #[serde(default)]
    pub state: ApiGroupState,
    pub class: Option<String>,
}

/// Sensor payloads vary wildly by sensor type, so `state` and
/// `config` stay loosely typed.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSensor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub sensor_type: String,
    pub modelid: Option<String>,
    pub uniqueid: Option<String>,
    pub swversion: Option<String>,
    pub manufacturername: Option<String>,
    #[serde(default)]
    pub state: Map<String, Value>,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// The bridge's `config` section. The unauthenticated `/api/config`
/// endpoint returns the subset of fields modelled here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiBridgeConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bridgeid: String,
    #[serde(default)]
    pub modelid: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub swversion: String,
    #[serde(default)]
    pub apiversion: String,
}

/// Response of `GET /api/{username}`: every resource in one document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiFullConfig {
    #[serde(default)]
    pub config: ApiBridgeConfig,
    #[serde(default)]
    pub lights: BTreeMap<String, ApiLight>,
    #[serde(default)]
    pub groups: BTreeMap<String, ApiGroup>,
    #[serde(default)]
    pub sensors: BTreeMap<String, ApiSensor>,
}

/// Body of a light state or group action write. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiStateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    /// Transition time in multiples of 100 ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewUser<'a> {
    pub devicetype: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NewUserReply {
    pub username: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_update_omits_unset_fields() {
        let update = ApiStateUpdate {
            bri: Some(120),
            transitiontime: Some(4),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "bri": 120, "transitiontime": 4 })
        );
    }

    #[test]
    fn write_response_entries_parse() {
        let raw = json!([
            { "success": { "/lights/1/state/on": true } },
            { "error": { "type": 201, "address": "/lights/1/state/bri", "description": "device is set to off" } }
        ]);
        let entries: Vec<ApiResult> = serde_json::from_value(raw).unwrap();
        assert!(matches!(entries[0], ApiResult::Success(_)));
        match &entries[1] {
            ApiResult::Error(e) => assert_eq!(e.error_type, 201),
            ApiResult::Success(_) => panic!("expected error entry"),
        }
    }

    #[test]
    fn light_state_defaults_missing_fields() {
        let light: ApiLight = serde_json::from_value(json!({
            "name": "Hall",
            "type": "Dimmable light",
            "state": { "on": true, "bri": 200, "reachable": true }
        }))
        .unwrap();
        assert!(light.state.on);
        assert_eq!(light.state.bri, Some(200));
        assert_eq!(light.state.colormode, None);
    }
}
