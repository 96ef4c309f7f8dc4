// ── Sensor domain type ──
//
// Sensor payloads differ per sensor type (presence, temperature, switch
// button events, daylight...), so state and config stay loosely typed.

use serde::Serialize;
use serde_json::{Map, Value};

use super::entity::{Discovered, Entity, EntityKind};

/// Body of a sensor state or config write.
pub type SensorUpdate = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    /// e.g. `"ZLLPresence"`, `"ZLLTemperature"`, `"Daylight"`.
    pub sensor_type: String,
    pub model_id: Option<String>,
    pub unique_id: Option<String>,
    pub sw_version: Option<String>,
    pub manufacturer: Option<String>,
    pub state: Map<String, Value>,
    pub config: Map<String, Value>,
}

impl Sensor {
    /// `config.reachable`, for sensors that report it.
    pub fn is_reachable(&self) -> Option<bool> {
        self.config.get("reachable").and_then(Value::as_bool)
    }

    /// `state.lastupdated`, the bridge's own timestamp of the last event.
    pub fn last_updated(&self) -> Option<&str> {
        self.state.get("lastupdated").and_then(Value::as_str)
    }
}

impl Entity for Sensor {
    const KIND: EntityKind = EntityKind::Sensor;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_discovered(&self) -> Discovered {
        Discovered {
            kind: Self::KIND,
            id: self.id.clone(),
            name: self.name.clone(),
            type_name: self.sensor_type.clone(),
            model_id: self.model_id.clone(),
            unique_id: self.unique_id.clone(),
        }
    }
}
