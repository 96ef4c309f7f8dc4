// ── Entity capability ──
//
// The small per-kind surface the generic reconciliation routine and the
// listener registry are written against.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The three kinds of child entity a bridge reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Light,
    Sensor,
    Group,
}

/// What the discovery collaborator learns about an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovered {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    /// Light/sensor type string or group type.
    pub type_name: String,
    pub model_id: Option<String>,
    pub unique_id: Option<String>,
}

/// A cached, reconcilable bridge entity.
///
/// Values are immutable snapshots: the caches hold `Arc<Self>` and swap
/// whole values when the bridge reports something new.
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn to_discovered(&self) -> Discovered;
}
