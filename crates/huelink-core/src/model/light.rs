// ── Light domain type ──

use serde::Serialize;

use super::entity::{Discovered, Entity, EntityKind};
use super::state::LightState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    pub id: String,
    pub name: String,
    /// Bridge-reported type, e.g. `"Extended color light"`.
    pub light_type: String,
    pub model_id: Option<String>,
    pub unique_id: Option<String>,
    pub sw_version: Option<String>,
    pub manufacturer: Option<String>,
    pub state: LightState,
}

impl Entity for Light {
    const KIND: EntityKind = EntityKind::Light;

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
            type_name: self.light_type.clone(),
            model_id: self.model_id.clone(),
            unique_id: self.unique_id.clone(),
        }
    }
}
