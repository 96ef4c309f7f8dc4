use thiserror::Error;

use crate::models::ApiErrorBody;

/// Hue error type: unauthorized user.
pub const ERROR_UNAUTHORIZED: u16 = 1;
/// Hue error type: resource not available.
pub const ERROR_RESOURCE_NOT_AVAILABLE: u16 = 3;
/// Hue error type: link button not pressed.
pub const ERROR_LINK_BUTTON_NOT_PRESSED: u16 = 101;
/// Hue error type: parameter not modifiable, device is set to off.
pub const ERROR_DEVICE_OFF: u16 = 201;

/// Top-level error type for the `huelink-api` crate.
///
/// Covers transport failures and the typed error objects the bridge
/// embeds in its `[{"error": {...}}]` response arrays.
/// `huelink-core` maps these into its `BridgeError` taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Bridge error objects ────────────────────────────────────────
    /// The whitelisted user is missing or was revoked (type 1).
    #[error("Unauthorized: {description}")]
    Unauthorized { description: String },

    /// The addressed light, group or sensor does not exist (type 3).
    #[error("Resource not available at {address}: {description}")]
    ResourceNotAvailable {
        address: String,
        description: String,
    },

    /// Pairing requires the physical link button (type 101).
    #[error("Link button not pressed")]
    LinkButtonNotPressed,

    /// The device is off, so the parameter cannot be changed (type 201).
    #[error("Device is off at {address}: {description}")]
    DeviceOff {
        address: String,
        description: String,
    },

    /// Any other bridge error object.
    #[error("Bridge API error {code} at {address}: {description}")]
    Api {
        code: u16,
        address: String,
        description: String,
    },

    /// No username is set, so user-scoped endpoints cannot be addressed.
    #[error("Not authenticated -- pairing with the bridge is required")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status outside the bridge's error envelope.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Translate a bridge error object into a typed error.
    pub fn from_api_error(err: ApiErrorBody) -> Self {
        match err.error_type {
            ERROR_UNAUTHORIZED => Self::Unauthorized {
                description: err.description,
            },
            ERROR_RESOURCE_NOT_AVAILABLE => Self::ResourceNotAvailable {
                address: err.address,
                description: err.description,
            },
            ERROR_LINK_BUTTON_NOT_PRESSED => Self::LinkButtonNotPressed,
            ERROR_DEVICE_OFF => Self::DeviceOff {
                address: err.address,
                description: err.description,
            },
            code => Self::Api {
                code,
                address: err.address,
                description: err.description,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(error_type: u16) -> ApiErrorBody {
        ApiErrorBody {
            error_type,
            address: "/lights/3/state/bri".into(),
            description: "something".into(),
        }
    }

    #[test]
    fn maps_known_error_types() {
        assert!(matches!(Error::from_api_error(body(1)), Error::Unauthorized { .. }));
        assert!(matches!(
            Error::from_api_error(body(3)),
            Error::ResourceNotAvailable { .. }
        ));
        assert!(matches!(Error::from_api_error(body(101)), Error::LinkButtonNotPressed));
        assert!(matches!(Error::from_api_error(body(201)), Error::DeviceOff { .. }));
    }

    #[test]
    fn unknown_error_type_keeps_code() {
        match Error::from_api_error(body(7)) {
            Error::Api { code, address, .. } => {
                assert_eq!(code, 7);
                assert_eq!(address, "/lights/3/state/bri");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
