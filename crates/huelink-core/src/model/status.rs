// ── Bridge status ──
//
// Operator-facing status, separate from the connection state machine:
// a bridge can be connected yet misconfigured, or configured yet offline.

use std::fmt;

use serde::Serialize;

/// Why the bridge is offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDetail {
    None,
    /// Transient; retried on every poll tick.
    CommunicationError,
    /// Needs operator action before polling can succeed.
    ConfigurationError,
}

/// Reason code attached to an offline status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    NoHost,
    InvalidCredential,
    PressPairingButton,
    CredentialCreationFailed,
    ConnectionLost,
    Message(String),
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHost => f.write_str("no bridge host configured"),
            Self::InvalidCredential => f.write_str("credential rejected by the bridge"),
            Self::PressPairingButton => f.write_str("press the link button on the bridge to pair"),
            Self::CredentialCreationFailed => f.write_str("pairing with the bridge failed"),
            Self::ConnectionLost => f.write_str("connection to the bridge lost"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeStatus {
    Initializing,
    Online,
    Offline {
        detail: StatusDetail,
        reason: StatusReason,
    },
}

impl BridgeStatus {
    pub fn offline(detail: StatusDetail, reason: StatusReason) -> Self {
        Self::Offline { detail, reason }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => f.write_str("initializing"),
            Self::Online => f.write_str("online"),
            Self::Offline { reason, .. } => write!(f, "offline: {reason}"),
        }
    }
}
