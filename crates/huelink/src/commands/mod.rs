//! Command handlers and the helpers they share.

pub mod config_cmd;
pub mod list;
pub mod pair;
pub mod set;
pub mod watch;

use std::path::PathBuf;

use huelink_config::Config;
use huelink_core::{BridgeStatus, Controller, StatusReason};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A controller built from the config file and global flags.
pub struct Session {
    pub controller: Controller,
    pub config: Config,
    pub config_path: PathBuf,
    pub host: String,
}

/// Load the config file named by `--config` (or the default) and apply
/// flag overrides.
pub fn load(global: &GlobalOpts) -> Result<(Config, PathBuf), CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(huelink_config::config_path);
    let mut cfg = huelink_config::load_config_from(&path)?;
    if let Some(ref host) = global.host {
        cfg.bridge.host = Some(host.clone());
    }
    Ok((cfg, path))
}

pub fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let (config, config_path) = load(global)?;
    let controller_config = huelink_config::to_controller_config(&config)?;
    let host = controller_config
        .host
        .clone()
        .ok_or_else(|| CliError::NoHost {
            path: config_path.display().to_string(),
        })?;
    let controller = Controller::new(controller_config)?;
    Ok(Session {
        controller,
        config,
        config_path,
        host,
    })
}

/// Run one light and one sensor pass and insist the bridge came online.
///
/// Refuses to run unpaired, so a pass never pairs as a side effect.
pub async fn sync_once(session: &Session) -> Result<(), CliError> {
    if session.controller.credential().is_none() {
        return Err(CliError::NotPaired);
    }
    session.controller.poll_now().await;

    let status = session.controller.status().borrow().clone();
    match status {
        BridgeStatus::Online => Ok(()),
        BridgeStatus::Offline {
            reason: StatusReason::InvalidCredential,
            ..
        } => Err(CliError::AuthFailed),
        BridgeStatus::Offline {
            reason: StatusReason::PressPairingButton,
            ..
        } => Err(CliError::NotPaired),
        other => Err(CliError::ConnectionFailed {
            host: session.host.clone(),
            status: other.to_string(),
        }),
    }
}
