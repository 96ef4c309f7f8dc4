//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use huelink_config::ConfigError;
use huelink_core::{BridgeError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the bridge at {host}")]
    #[diagnostic(
        code(huelink::connection_failed),
        help(
            "Check that the bridge is powered and on the same network.\n\
             Bridge status: {status}"
        )
    )]
    ConnectionFailed { host: String, status: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Not paired with the bridge")]
    #[diagnostic(
        code(huelink::not_paired),
        help(
            "Press the link button on the bridge, then run: huelink pair\n\
             Or set HUELINK_USERNAME to an existing bridge username."
        )
    )]
    NotPaired,

    #[error("The bridge rejected the stored credential")]
    #[diagnostic(
        code(huelink::auth_failed),
        help(
            "The username is no longer whitelisted on the bridge.\n\
             Run: huelink pair"
        )
    )]
    AuthFailed,

    #[error("Pairing failed: {message}")]
    #[diagnostic(code(huelink::pairing_failed))]
    PairingFailed { message: String },

    #[error("Link button was not pressed within {seconds}s")]
    #[diagnostic(
        code(huelink::pairing_timeout),
        help("Press the round button on top of the bridge, then run: huelink pair")
    )]
    PairingTimeout { seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(huelink::not_found),
        help("Run: huelink {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(huelink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No bridge host configured")]
    #[diagnostic(
        code(huelink::no_host),
        help(
            "Set [bridge] host in {path}\n\
             Or pass --host / set HUELINK_HOST."
        )
    )]
    NoHost { path: String },

    #[error(transparent)]
    #[diagnostic(code(huelink::config))]
    Config(#[from] ConfigError),

    // ── Core ─────────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(huelink::bridge))]
    Bridge(BridgeError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    #[diagnostic(code(huelink::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotPaired | Self::AuthFailed | Self::PairingFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PairingTimeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoHost { .. } | Self::Config(_) => exit_code::USAGE,
            Self::Bridge(BridgeError::Io(_)) => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::NoBridge => CliError::NoHost {
                path: huelink_config::config_path().display().to_string(),
            },
            CoreError::PairingFailed { message } => CliError::PairingFailed { message },
            CoreError::NotFound { kind, id } => CliError::NotFound {
                list_command: format!("list {kind}s"),
                resource_type: kind,
                identifier: id,
            },
            CoreError::Bridge(BridgeError::Unauthorized(_)) => CliError::AuthFailed,
            CoreError::Bridge(e) => CliError::Bridge(e),
        }
    }
}
