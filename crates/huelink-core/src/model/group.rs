// ── Group domain type ──
//
// A group's `state` is never taken from the bridge: it is derived from
// the cached states of its member lights on every light poll.

use serde::Serialize;

use super::entity::{Discovered, Entity, EntityKind};
use super::state::LightState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// `"Room"`, `"Zone"`, `"LightGroup"`, ...
    pub group_type: String,
    /// Member light ids.
    pub lights: Vec<String>,
    pub state: LightState,
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

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
            type_name: self.group_type.clone(),
            model_id: None,
            unique_id: None,
        }
    }
}
