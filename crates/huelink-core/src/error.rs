// ── Core error types ──
//
// `BridgeError` is the failure taxonomy of the `Bridge` contract; every
// poll and command decision branches on it. `CoreError` is what the
// public `Controller` API returns. Transport details from `huelink-api`
// are translated at the seam and never surface directly.

use thiserror::Error;

/// Failure of a single bridge call.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// Credential missing from the bridge's whitelist.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The bridge no longer knows the addressed entity.
    #[error("entity not available: {0}")]
    EntityNotAvailable(String),

    #[error("link button not pressed")]
    LinkButtonNotPressed,

    /// A parameter could not be changed because the device is off.
    #[error("device is off: {0}")]
    DeviceOff(String),

    /// Network or I/O failure; the bridge did not answer.
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other error the bridge reported.
    #[error("bridge API error {code}: {message}")]
    Api { code: u16, message: String },

    /// The client is not in a state to make the call (e.g. no credential).
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A bug on our side.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Errors that call for a reachability probe and re-authentication.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::IllegalState(_))
    }
}

impl From<huelink_api::Error> for BridgeError {
    fn from(err: huelink_api::Error) -> Self {
        use huelink_api::Error as Api;

        match err {
            Api::Unauthorized { description } => Self::Unauthorized(description),
            Api::NotAuthenticated => Self::IllegalState("no bridge username set".into()),
            Api::ResourceNotAvailable {
                address,
                description,
            } => Self::EntityNotAvailable(format!("{address}: {description}")),
            Api::LinkButtonNotPressed => Self::LinkButtonNotPressed,
            Api::DeviceOff {
                address,
                description,
            } => Self::DeviceOff(format!("{address}: {description}")),
            Api::Api {
                code,
                address,
                description,
            } => Self::Api {
                code,
                message: format!("{address}: {description}"),
            },
            Api::Transport(e) => Self::Io(e.to_string()),
            Api::Http { status, message } => Self::Io(format!("HTTP {status}: {message}")),
            Api::Deserialization { message, .. } => Self::Api { code: 0, message },
            Api::InvalidUrl(e) => Self::Internal(format!("invalid bridge URL: {e}")),
            Api::Tls(message) => Self::Internal(message),
        }
    }
}

/// Error type of the public `Controller` API.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("No bridge client configured")]
    NoBridge,

    #[error("Pairing failed: {message}")]
    PairingFailed { message: String },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    // ── Bridge errors (wrapped) ──────────────────────────────────────
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<huelink_api::Error> for CoreError {
    fn from(err: huelink_api::Error) -> Self {
        Self::Bridge(BridgeError::from(err))
    }
}
