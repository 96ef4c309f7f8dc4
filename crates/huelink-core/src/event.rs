// ── Bridge events ──
//
// Broadcast to any number of observers (CLI `watch`, tests). Listeners
// and the discovery collaborator get direct callbacks; events are the
// fan-out for everything else.

use secrecy::SecretString;

use crate::model::{BridgeProperties, BridgeStatus, EntityKind};

#[derive(Debug, Clone)]
pub enum BridgeEvent {
    EntityAdded { kind: EntityKind, id: String },
    EntityChanged { kind: EntityKind, id: String },
    EntityRemoved { kind: EntityKind, id: String },
    StatusChanged(BridgeStatus),
    /// Fired once, after the first successful authentication.
    PropertiesInitialized(BridgeProperties),
    /// Pairing minted a new credential. The outer layer should persist it.
    PairingCompleted { credential: SecretString },
}
