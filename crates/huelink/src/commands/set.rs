//! Set command handler: change one light's state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::warn;

use huelink_core::{
    BridgeStatus, Light, PollBypass, StateUpdate, StatusDetail, StatusListener,
};

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

/// Poll bypass after the write lands.
const SETTLE: Duration = Duration::from_secs(2);

/// Tracks what happened to the addressed light while the command ran.
struct CommandWatcher {
    light_id: String,
    gone: AtomicBool,
    bypass: PollBypass,
}

impl StatusListener<Light> for CommandWatcher {
    fn entity_id(&self) -> &str {
        &self.light_id
    }

    fn on_added(&self, _light: Arc<Light>) {}

    fn on_changed(&self, _light: Arc<Light>) -> bool {
        !self.bypass.is_active()
    }

    fn on_removed(&self) {
        self.gone.store(true, Ordering::Relaxed);
    }

    fn on_gone(&self) {
        self.gone.store(true, Ordering::Relaxed);
    }

    fn set_poll_bypass(&self, duration: Duration) {
        self.bypass.engage(duration);
    }

    fn clear_poll_bypass(&self) {
        self.bypass.clear();
    }
}

fn build_update(args: &SetArgs) -> StateUpdate {
    let mut update = if args.off {
        StateUpdate::turn_off()
    } else if args.on {
        StateUpdate::turn_on()
    } else {
        StateUpdate::default()
    };
    if let Some(bri) = args.bri {
        update = update.with_brightness(bri);
    }
    if let Some(ct) = args.ct {
        update = update.with_color_temperature(ct);
    }
    if let Some(ms) = args.transition_ms {
        update = update.with_transition(Duration::from_millis(ms));
    }
    update
}

pub async fn handle(args: &SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = super::connect(global)?;
    super::sync_once(&session).await?;
    let controller = &session.controller;

    let light = controller.find_light(&args.light)?;
    let watcher = Arc::new(CommandWatcher {
        light_id: light.id.clone(),
        gone: AtomicBool::new(false),
        bypass: PollBypass::new(),
    });
    let listener: Arc<dyn StatusListener<Light>> = watcher.clone();
    let registered = controller.register_light_listener(listener);

    let update = build_update(args);
    let skipped = !light.state.on && !args.on && update.is_color_temperature_only();
    let task = controller.set_light_state(None, Arc::clone(&light), update, SETTLE);
    if let Err(e) = task.await {
        warn!(error = %e, "light command task failed");
    }

    if registered {
        controller.unregister_light_listener(&light.id);
    }

    if watcher.gone.load(Ordering::Relaxed) {
        return Err(CliError::NotFound {
            resource_type: "light".into(),
            identifier: args.light.clone(),
            list_command: "list lights".into(),
        });
    }
    let status = controller.status().borrow().clone();
    if let BridgeStatus::Offline {
        detail: StatusDetail::CommunicationError,
        ..
    } = status
    {
        return Err(CliError::ConnectionFailed {
            host: session.host.clone(),
            status: status.to_string(),
        });
    }

    let message = if skipped {
        format!("Light {} is off; color temperature change skipped", light.name)
    } else {
        format!("Updated light {} ({})", light.name, light.id)
    };
    output::print_output(&message, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(on: bool, off: bool, bri: Option<u8>, ct: Option<u16>) -> SetArgs {
        SetArgs {
            light: "1".into(),
            on,
            off,
            bri,
            ct,
            transition_ms: None,
        }
    }

    #[test]
    fn off_flag_turns_the_light_off() {
        let update = build_update(&args(false, true, None, None));
        assert_eq!(update.on, Some(false));
    }

    #[test]
    fn ct_alone_stays_color_temperature_only() {
        let update = build_update(&args(false, false, None, Some(300)));
        assert!(update.is_color_temperature_only());
        assert_eq!(update.on, None);
    }

    #[test]
    fn brightness_keeps_power_untouched() {
        let update = build_update(&args(false, false, Some(120), None));
        assert_eq!(update.brightness, Some(120));
        assert_eq!(update.on, None);
    }
}
