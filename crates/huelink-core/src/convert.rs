// ── Wire-to-domain conversions ──
//
// `huelink-api` wire types keyed by id become the domain types in
// `crate::model`. Updates go the other way.

use std::collections::BTreeMap;

use huelink_api::models::{
    ApiBridgeConfig, ApiColorMode, ApiFullConfig, ApiGroup, ApiLight, ApiLightState, ApiSensor,
    ApiStateUpdate,
};

use crate::model::{
    BridgeInfo, ColorMode, FullConfig, Group, Light, LightState, Sensor, StateUpdate,
};

impl From<ApiColorMode> for ColorMode {
    fn from(mode: ApiColorMode) -> Self {
        match mode {
            ApiColorMode::Hs => Self::Hs,
            ApiColorMode::Xy => Self::Xy,
            ApiColorMode::Ct => Self::Ct,
        }
    }
}

impl From<ApiLightState> for LightState {
    fn from(s: ApiLightState) -> Self {
        Self {
            on: s.on,
            brightness: s.bri,
            hue: s.hue,
            saturation: s.sat,
            xy: s.xy,
            color_temperature: s.ct,
            color_mode: s.colormode.map(ColorMode::from),
            // Groups and older firmware omit `reachable`.
            reachable: s.reachable.unwrap_or(true),
        }
    }
}

pub(crate) fn light_from_api(id: String, light: ApiLight) -> Light {
    Light {
        id,
        name: light.name,
        light_type: light.light_type,
        model_id: light.modelid,
        unique_id: light.uniqueid,
        sw_version: light.swversion,
        manufacturer: light.manufacturername,
        state: light.state.into(),
    }
}

pub(crate) fn group_from_api(id: String, group: ApiGroup) -> Group {
    Group {
        id,
        name: group.name,
        group_type: group.group_type,
        lights: group.lights,
        state: LightState {
            on: group.state.any_on,
            ..group.action.into()
        },
    }
}

pub(crate) fn sensor_from_api(id: String, sensor: ApiSensor) -> Sensor {
    Sensor {
        id,
        name: sensor.name,
        sensor_type: sensor.sensor_type,
        model_id: sensor.modelid,
        unique_id: sensor.uniqueid,
        sw_version: sensor.swversion,
        manufacturer: sensor.manufacturername,
        state: sensor.state,
        config: sensor.config,
    }
}

pub(crate) fn lights_from_api(raw: BTreeMap<String, ApiLight>) -> Vec<Light> {
    raw.into_iter()
        .map(|(id, l)| light_from_api(id, l))
        .collect()
}

pub(crate) fn groups_from_api(raw: BTreeMap<String, ApiGroup>) -> Vec<Group> {
    raw.into_iter()
        .map(|(id, g)| group_from_api(id, g))
        .collect()
}

pub(crate) fn sensors_from_api(raw: BTreeMap<String, ApiSensor>) -> Vec<Sensor> {
    raw.into_iter()
        .map(|(id, s)| sensor_from_api(id, s))
        .collect()
}

impl From<ApiBridgeConfig> for BridgeInfo {
    fn from(c: ApiBridgeConfig) -> Self {
        Self {
            name: c.name,
            bridge_id: c.bridgeid,
            model_id: c.modelid,
            mac: c.mac,
            sw_version: c.swversion,
            api_version: c.apiversion,
        }
    }
}

impl From<ApiFullConfig> for FullConfig {
    fn from(c: ApiFullConfig) -> Self {
        Self {
            bridge: c.config.into(),
            lights: lights_from_api(c.lights),
            groups: groups_from_api(c.groups),
            sensors: sensors_from_api(c.sensors),
        }
    }
}

impl From<&StateUpdate> for ApiStateUpdate {
    fn from(u: &StateUpdate) -> Self {
        Self {
            on: u.on,
            bri: u.brightness,
            hue: u.hue,
            sat: u.saturation,
            xy: u.xy,
            ct: u.color_temperature,
            alert: u.alert.clone(),
            effect: u.effect.clone(),
            transitiontime: u.transition.map(|d| {
                u16::try_from((d.as_millis() + 50) / 100).unwrap_or(u16::MAX)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn transition_rounds_to_deciseconds() {
        let update = StateUpdate::turn_on().with_transition(Duration::from_millis(1_260));
        let api = ApiStateUpdate::from(&update);
        assert_eq!(api.transitiontime, Some(13));
        assert_eq!(api.on, Some(true));
    }

    #[test]
    fn missing_reachable_defaults_to_true() {
        let state = LightState::from(ApiLightState {
            on: true,
            bri: Some(10),
            ..ApiLightState::default()
        });
        assert!(state.reachable);
        assert_eq!(state.brightness, Some(10));
    }
}
