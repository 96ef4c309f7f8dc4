// ── Command routing ──
//
// Sends a command, manages the poll bypass around it, and classifies
// failures. Nothing here returns an error: every outcome ends in a
// listener callback, a status update or a log line.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, trace, warn};

use super::Command;
use crate::bridge::Bridge;
use crate::controller::ControllerInner;
use crate::error::BridgeError;
use crate::listener::StatusListener;
use crate::model::{BridgeStatus, Entity, Group, Light, StateUpdate, StatusDetail, StatusReason};

/// Minimum poll bypass engaged before any light write is sent.
pub const BYPASS_MIN_DURATION_BEFORE_CMD: Duration = Duration::from_millis(1500);

/// Fill in the registered light listener when the caller passed none.
pub(super) fn resolve_listener(inner: &ControllerInner, cmd: Command) -> Command {
    match cmd {
        Command::SetLightState {
            listener: None,
            light,
            update,
            settle,
            retry_on_device_off,
        } => Command::SetLightState {
            listener: inner.store.lights.listener(&light.id),
            light,
            update,
            settle,
            retry_on_device_off,
        },
        other => other,
    }
}

pub(super) fn engage_bypass(inner: &ControllerInner, cmd: &Command) {
    match cmd {
        Command::SetLightState {
            listener: Some(listener),
            ..
        } => listener.set_poll_bypass(BYPASS_MIN_DURATION_BEFORE_CMD),
        Command::SetGroupState { group, .. } => {
            for listener in member_listeners(inner, group) {
                listener.set_poll_bypass(BYPASS_MIN_DURATION_BEFORE_CMD);
            }
        }
        _ => {}
    }
}

pub(super) async fn route_command(inner: &ControllerInner, bridge: &dyn Bridge, cmd: Command) {
    match cmd {
        Command::SetLightState {
            listener,
            light,
            update,
            settle,
            retry_on_device_off,
        } => {
            dispatch_light(
                inner,
                bridge,
                listener,
                light,
                update,
                settle,
                retry_on_device_off,
            )
            .await;
        }

        Command::SetGroupState {
            group,
            update,
            settle,
        } => {
            let members = member_listeners(inner, &group);
            match bridge.set_group_state(&group.id, &update).await {
                Ok(()) => {
                    trace!(group_id = %group.id, "group state sent");
                    for listener in &members {
                        listener.set_poll_bypass(settle);
                    }
                }
                Err(err) => {
                    for listener in &members {
                        listener.clear_poll_bypass();
                    }
                    let listener = inner.store.groups.listener(&group.id);
                    classify_failure(inner, group.as_ref(), listener.as_ref(), err);
                }
            }
        }

        Command::SetSensorState { sensor, update } => {
            match bridge.set_sensor_state(&sensor.id, &update).await {
                Ok(()) => trace!(sensor_id = %sensor.id, "sensor state sent"),
                Err(err) => {
                    let listener = inner.store.sensors.listener(&sensor.id);
                    classify_failure(inner, sensor.as_ref(), listener.as_ref(), err);
                }
            }
        }

        Command::UpdateSensorConfig { sensor, update } => {
            match bridge.update_sensor_config(&sensor.id, &update).await {
                Ok(()) => trace!(sensor_id = %sensor.id, "sensor config sent"),
                Err(err) => {
                    let listener = inner.store.sensors.listener(&sensor.id);
                    classify_failure(inner, sensor.as_ref(), listener.as_ref(), err);
                }
            }
        }
    }
}

/// Boxed so the device-off retry can recurse.
fn dispatch_light<'a>(
    inner: &'a ControllerInner,
    bridge: &'a dyn Bridge,
    listener: Option<Arc<dyn StatusListener<Light>>>,
    light: Arc<Light>,
    update: StateUpdate,
    settle: Duration,
    retry_on_device_off: bool,
) -> BoxFuture<'a, ()> {
    async move {
        let err = match bridge.set_light_state(&light.id, &update).await {
            Ok(()) => {
                trace!(light_id = %light.id, "light state sent");
                if let Some(listener) = &listener {
                    listener.set_poll_bypass(settle);
                }
                return;
            }
            Err(err) => err,
        };

        if let Some(listener) = &listener {
            listener.clear_poll_bypass();
        }

        match err {
            BridgeError::DeviceOff(_) if update.is_color_temperature_only() => {
                trace!(light_id = %light.id, "light is off, color temperature change dropped");
            }
            BridgeError::DeviceOff(_) if retry_on_device_off => {
                debug!(light_id = %light.id, "light is off, switching it on and resending");
                if let Some(listener) = &listener {
                    listener.set_poll_bypass(BYPASS_MIN_DURATION_BEFORE_CMD);
                }
                dispatch_light(
                    inner,
                    bridge,
                    listener.clone(),
                    Arc::clone(&light),
                    StateUpdate::turn_on(),
                    settle,
                    false,
                )
                .await;
                if let Some(listener) = &listener {
                    listener.set_poll_bypass(BYPASS_MIN_DURATION_BEFORE_CMD);
                }
                dispatch_light(inner, bridge, listener, light, update, settle, false).await;
            }
            other => classify_failure(inner, light.as_ref(), listener.as_ref(), other),
        }
    }
    .boxed()
}

fn classify_failure<E: Entity>(
    inner: &ControllerInner,
    entity: &E,
    listener: Option<&Arc<dyn StatusListener<E>>>,
    err: BridgeError,
) {
    let id = entity.id();
    match err {
        BridgeError::EntityNotAvailable(message) => {
            debug!(kind = %E::KIND, id = %id, %message, "bridge no longer knows the entity");
            if let Some(discovery) = inner.discovery() {
                discovery.entity_removed(&entity.to_discovered());
            }
            if let Some(listener) = listener {
                listener.on_gone();
            }
        }
        BridgeError::Io(message) => {
            debug!(kind = %E::KIND, id = %id, %message, "command failed to reach the bridge");
            inner.set_status(BridgeStatus::offline(
                StatusDetail::CommunicationError,
                StatusReason::Message(message),
            ));
        }
        BridgeError::IllegalState(message) => {
            trace!(kind = %E::KIND, id = %id, %message, "command skipped, not authenticated");
        }
        BridgeError::DeviceOff(message) => {
            debug!(kind = %E::KIND, id = %id, %message, "device is off, command not applied");
        }
        other => {
            warn!(
                kind = %E::KIND,
                id = %id,
                error = %other,
                "error sending command to bridge, likely a bug"
            );
        }
    }
}

fn member_listeners(inner: &ControllerInner, group: &Group) -> Vec<Arc<dyn StatusListener<Light>>> {
    group
        .lights
        .iter()
        .filter_map(|id| inner.store.lights.listener(id))
        .collect()
}
