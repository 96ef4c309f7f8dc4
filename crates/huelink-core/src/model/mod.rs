// ── Domain model ──
//
// Canonical representations of the bridge's child entities. Wire types
// from `huelink-api` are converted into these in `crate::convert`; the
// caches, listeners and commands only ever see the types below.

pub mod bridge_info;
pub mod entity;
pub mod group;
pub mod light;
pub mod sensor;
pub mod state;
pub mod status;

// ── Re-exports ──────────────────────────────────────────────────────

pub use bridge_info::{ApiVersion, BridgeInfo, BridgeProperties, FullConfig};
pub use entity::{Discovered, Entity, EntityKind};
pub use group::Group;
pub use light::Light;
pub use sensor::{Sensor, SensorUpdate};
pub use state::{Color, ColorMode, LightState, StateUpdate};
pub use status::{BridgeStatus, StatusDetail, StatusReason};
