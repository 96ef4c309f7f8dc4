// ── Commands ──
//
// Writes to the bridge. Every write is a `Command` routed by
// `dispatch::route_command` on its own task; callers get the task
// handle back immediately and never see bridge errors.

mod dispatch;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::Controller;
use crate::listener::StatusListener;
use crate::model::{Group, Light, Sensor, SensorUpdate, StateUpdate};

pub use dispatch::BYPASS_MIN_DURATION_BEFORE_CMD;

/// A write to one light, group or sensor.
pub enum Command {
    SetLightState {
        /// Listener whose poll bypass covers the write. `None` falls back
        /// to the listener registered for the light, if any.
        listener: Option<Arc<dyn StatusListener<Light>>>,
        light: Arc<Light>,
        update: StateUpdate,
        /// How long polls may still report pre-command state after success.
        settle: Duration,
        /// Switch the light on and resend when the bridge reports it off.
        retry_on_device_off: bool,
    },
    SetGroupState {
        group: Arc<Group>,
        update: StateUpdate,
        settle: Duration,
    },
    SetSensorState {
        sensor: Arc<Sensor>,
        update: SensorUpdate,
    },
    UpdateSensorConfig {
        sensor: Arc<Sensor>,
        update: SensorUpdate,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetLightState { .. } => "set light state",
            Self::SetGroupState { .. } => "set group state",
            Self::SetSensorState { .. } => "set sensor state",
            Self::UpdateSensorConfig { .. } => "update sensor config",
        }
    }

    /// Id of the addressed entity.
    pub fn target(&self) -> &str {
        match self {
            Self::SetLightState { light, .. } => &light.id,
            Self::SetGroupState { group, .. } => &group.id,
            Self::SetSensorState { sensor, .. } | Self::UpdateSensorConfig { sensor, .. } => {
                &sensor.id
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetLightState {
                listener,
                light,
                update,
                settle,
                retry_on_device_off,
            } => f
                .debug_struct("SetLightState")
                .field("light", &light.id)
                .field("has_listener", &listener.is_some())
                .field("update", update)
                .field("settle", settle)
                .field("retry_on_device_off", retry_on_device_off)
                .finish(),
            Self::SetGroupState {
                group,
                update,
                settle,
            } => f
                .debug_struct("SetGroupState")
                .field("group", &group.id)
                .field("update", update)
                .field("settle", settle)
                .finish(),
            Self::SetSensorState { sensor, update } => f
                .debug_struct("SetSensorState")
                .field("sensor", &sensor.id)
                .field("update", update)
                .finish(),
            Self::UpdateSensorConfig { sensor, update } => f
                .debug_struct("UpdateSensorConfig")
                .field("sensor", &sensor.id)
                .field("update", update)
                .finish(),
        }
    }
}

impl Controller {
    /// Dispatch a command on its own task.
    ///
    /// The poll bypass for the affected light listeners is engaged before
    /// this returns. Without a bridge the command is dropped and the
    /// returned handle completes immediately.
    pub fn execute(&self, cmd: Command) -> JoinHandle<()> {
        let Some(bridge) = self.inner.bridge.clone() else {
            debug!(
                command = cmd.name(),
                target = cmd.target(),
                "no bridge configured, command dropped"
            );
            return tokio::spawn(async {});
        };

        let cmd = dispatch::resolve_listener(&self.inner, cmd);
        dispatch::engage_bypass(&self.inner, &cmd);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { dispatch::route_command(&inner, bridge.as_ref(), cmd).await })
    }

    pub fn set_light_state(
        &self,
        listener: Option<Arc<dyn StatusListener<Light>>>,
        light: Arc<Light>,
        update: StateUpdate,
        settle: Duration,
    ) -> JoinHandle<()> {
        self.execute(Command::SetLightState {
            listener,
            light,
            update,
            settle,
            retry_on_device_off: true,
        })
    }

    pub fn set_group_state(
        &self,
        group: Arc<Group>,
        update: StateUpdate,
        settle: Duration,
    ) -> JoinHandle<()> {
        self.execute(Command::SetGroupState {
            group,
            update,
            settle,
        })
    }

    pub fn set_sensor_state(&self, sensor: Arc<Sensor>, update: SensorUpdate) -> JoinHandle<()> {
        self.execute(Command::SetSensorState { sensor, update })
    }

    pub fn update_sensor_config(
        &self,
        sensor: Arc<Sensor>,
        update: SensorUpdate,
    ) -> JoinHandle<()> {
        self.execute(Command::UpdateSensorConfig { sensor, update })
    }
}
