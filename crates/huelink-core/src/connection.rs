// ── Connection state machine ──
//
// Every poll tick runs here under the poll lock: resume or pair when not
// authenticated, reconcile when authenticated, and classify failures
// into re-authentication, connection loss or nothing at all.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};

use futures_util::FutureExt;
use secrecy::SecretString;
use tracing::{debug, info, trace, warn};

use crate::bridge::Bridge;
use crate::controller::{ConnectionState, ControllerInner, PollKind};
use crate::error::BridgeError;
use crate::event::BridgeEvent;
use crate::listener::DiscoveryListener;
use crate::model::{
    ApiVersion, BridgeProperties, BridgeStatus, Entity, StatusDetail, StatusReason,
};
use crate::store::group_state::aggregate;
use crate::store::reconcile::reconcile;

impl ControllerInner {
    // ── Poll tick ────────────────────────────────────────────────────

    /// One scheduled pass. Never fails: every error becomes a state
    /// transition, a status update, or a log line.
    pub(crate) async fn poll(&self, kind: PollKind) {
        let Some(bridge) = self.bridge.clone() else {
            return;
        };
        let _guard = self.poll_lock.lock().await;
        trace!(kind = %kind, "poll tick");

        match AssertUnwindSafe(self.poll_once(bridge.as_ref(), kind))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.handle_poll_failure(bridge.as_ref(), err).await,
            Err(panic) => {
                warn!(
                    kind = %kind,
                    panic = panic_message(panic.as_ref()),
                    "unexpected fault during poll"
                );
                self.set_connection(ConnectionState::Disconnected);
                self.on_connection_lost();
            }
        }
    }

    async fn poll_once(&self, bridge: &dyn Bridge, kind: PollKind) -> Result<(), BridgeError> {
        if !self.is_authenticated() {
            if self.credential.load().is_none() {
                // Keeps the bridge answering while we wait for pairing.
                bridge.fetch_metadata().await?;
                self.set_connection(ConnectionState::ConnectedUnauthenticated);
                // Pairing sets the status, whatever its outcome.
                if !self.on_not_authenticated(bridge).await {
                    return Ok(());
                }
            }
            self.resume(bridge).await?;
        }

        match kind {
            PollKind::Lights => self.poll_lights(bridge).await?,
            PollKind::Sensors => self.poll_sensors(bridge).await?,
        }
        self.store.mark_polled();

        if !self.status.borrow().is_online() {
            self.set_status(BridgeStatus::Online);
        }
        Ok(())
    }

    async fn poll_lights(&self, bridge: &dyn Bridge) -> Result<(), BridgeError> {
        let lights = if self.api_version(bridge).await? >= ApiVersion::FULL_LIGHTS {
            bridge.fetch_lights().await?
        } else {
            bridge.fetch_full_config().await?.lights
        };
        let discovery = self.discovery();
        let report = reconcile(&self.store.lights, lights, discovery.as_ref(), &self.events);
        trace!(?report, "lights reconciled");

        let mut groups = bridge.fetch_groups().await?;
        for group in &mut groups {
            aggregate(group, &self.store.lights.cache);
        }
        let report = reconcile(&self.store.groups, groups, discovery.as_ref(), &self.events);
        trace!(?report, "groups reconciled");
        Ok(())
    }

    async fn poll_sensors(&self, bridge: &dyn Bridge) -> Result<(), BridgeError> {
        let sensors = bridge.fetch_sensors().await?;
        let discovery = self.discovery();
        let report = reconcile(&self.store.sensors, sensors, discovery.as_ref(), &self.events);
        trace!(?report, "sensors reconciled");
        Ok(())
    }

    async fn api_version(&self, bridge: &dyn Bridge) -> Result<ApiVersion, BridgeError> {
        if let Some(version) = self.api_version.load_full() {
            return Ok(*version);
        }
        let version = bridge.api_version().await?;
        debug!(%version, "bridge API version");
        self.api_version.store(Some(Arc::new(version)));
        Ok(version)
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// A credential is present: treat the connection as resumed.
    async fn resume(&self, bridge: &dyn Bridge) -> Result<(), BridgeError> {
        debug!("bridge connection resumed");
        self.init_properties(bridge).await?;
        self.set_connection(ConnectionState::ConnectedAuthenticated);
        Ok(())
    }

    /// Fetch bridge properties once per controller lifetime.
    async fn init_properties(&self, bridge: &dyn Bridge) -> Result<(), BridgeError> {
        if self.properties_initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let full = bridge.fetch_full_config().await?;
        if let Ok(version) = full.bridge.api_version.parse::<ApiVersion>() {
            self.api_version.store(Some(Arc::new(version)));
        }
        let properties = BridgeProperties::from(&full.bridge);
        info!(
            serial = %properties.serial_number,
            model = %properties.model_id,
            firmware = %properties.firmware_version,
            "bridge properties initialized"
        );
        self.properties.store(Some(Arc::new(properties.clone())));
        self.properties_initialized.store(true, Ordering::Release);
        let _ = self
            .events
            .send(BridgeEvent::PropertiesInitialized(properties));
        Ok(())
    }

    async fn handle_poll_failure(&self, bridge: &dyn Bridge, err: BridgeError) {
        let was_connected = self.is_authenticated();
        let initializing = matches!(*self.status.borrow(), BridgeStatus::Initializing);
        let unreachable = matches!(err, BridgeError::Io(_));

        if err.is_auth_failure() {
            if is_reachable(bridge).await {
                debug!(error = %err, "bridge reachable but not authenticated");
                self.set_connection(ConnectionState::ConnectedUnauthenticated);
                self.on_not_authenticated(bridge).await;
            } else if was_connected || initializing {
                self.set_connection(ConnectionState::Disconnected);
                self.on_connection_lost();
            }
            return;
        }

        if let BridgeError::Internal(message) = &err {
            warn!(error = %message, "unexpected error during poll");
            self.set_connection(ConnectionState::Disconnected);
            self.on_connection_lost();
            return;
        }

        if was_connected || (initializing && unreachable) {
            debug!(error = %err, "connection to bridge lost");
            self.set_connection(ConnectionState::Disconnected);
            self.on_connection_lost();
        } else {
            trace!(error = %err, "bridge still unavailable");
        }
    }

    /// Re-authenticate with the stored credential, or pair when there is none.
    /// Returns whether the bridge now accepts us.
    pub(crate) async fn on_not_authenticated(&self, bridge: &dyn Bridge) -> bool {
        let Some(credential) = self.credential.load_full() else {
            return self.request_credential(bridge).await.is_ok();
        };
        match bridge.authenticate(&credential).await {
            Ok(()) => {
                info!("re-authenticated with bridge");
                true
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "credential not accepted by bridge; configure a valid one or remove it to pair again"
                );
                self.set_status(BridgeStatus::offline(
                    StatusDetail::ConfigurationError,
                    StatusReason::InvalidCredential,
                ));
                false
            }
        }
    }

    /// Mint a new credential via link-button pairing and adopt it.
    pub(crate) async fn request_credential(
        &self,
        bridge: &dyn Bridge,
    ) -> Result<SecretString, BridgeError> {
        info!(
            label = %self.config.device_label,
            "requesting new credential, press the link button on the bridge"
        );
        match bridge.request_new_credential(&self.config.device_label).await {
            Ok(credential) => {
                info!("paired with bridge");
                self.credential.store(Some(Arc::new(credential.clone())));
                let _ = self.events.send(BridgeEvent::PairingCompleted {
                    credential: credential.clone(),
                });
                Ok(credential)
            }
            Err(BridgeError::LinkButtonNotPressed) => {
                debug!("link button not pressed");
                self.set_status(BridgeStatus::offline(
                    StatusDetail::ConfigurationError,
                    StatusReason::PressPairingButton,
                ));
                Err(BridgeError::LinkButtonNotPressed)
            }
            Err(e) => {
                warn!(error = %e, "failed to create credential on bridge");
                self.set_status(BridgeStatus::offline(
                    StatusDetail::ConfigurationError,
                    StatusReason::CredentialCreationFailed,
                ));
                Err(e)
            }
        }
    }

    pub(crate) fn on_connection_lost(&self) {
        debug!("bridge connection lost");
        self.set_status(BridgeStatus::offline(
            StatusDetail::None,
            StatusReason::ConnectionLost,
        ));
    }

    // ── Re-authenticating calls ──────────────────────────────────────

    /// Run a bridge call outside the poll loop. An auth failure triggers
    /// one re-authentication and one retry. Failures are logged and
    /// yield `None`.
    pub(crate) async fn with_reauthentication<T, F, Fut>(&self, task: &str, call: F) -> Option<T>
    where
        F: Fn(Arc<dyn Bridge>) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let bridge = self.bridge.clone()?;
        let result = match call(Arc::clone(&bridge)).await {
            Err(e) if e.is_auth_failure() => {
                self.set_connection(ConnectionState::ConnectedUnauthenticated);
                if self.on_not_authenticated(bridge.as_ref()).await {
                    call(bridge).await
                } else {
                    Err(e)
                }
            }
            other => other,
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(task, error = %e, "bridge cannot complete task");
                None
            }
        }
    }

    /// Announce every light, sensor and group the bridge reports.
    pub(crate) async fn announce_all(&self, listener: &dyn DiscoveryListener) {
        let lights = self
            .with_reauthentication("search for new lights", |b| async move {
                b.fetch_lights().await
            })
            .await
            .unwrap_or_default();
        for light in &lights {
            listener.entity_added(&light.to_discovered());
        }

        let sensors = self
            .with_reauthentication("search for new sensors", |b| async move {
                b.fetch_sensors().await
            })
            .await
            .unwrap_or_default();
        for sensor in &sensors {
            listener.entity_added(&sensor.to_discovered());
        }

        let groups = self
            .with_reauthentication("search for new groups", |b| async move {
                b.fetch_groups().await
            })
            .await
            .unwrap_or_default();
        for group in &groups {
            listener.entity_added(&group.to_discovered());
        }
    }

    // ── Shared state helpers ─────────────────────────────────────────

    pub(crate) fn discovery(&self) -> Option<Arc<dyn DiscoveryListener>> {
        self.discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_authenticated(&self) -> bool {
        *self.connection.borrow() == ConnectionState::ConnectedAuthenticated
    }

    pub(crate) fn set_connection(&self, state: ConnectionState) {
        let previous = self.connection.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "connection state changed");
        }
    }

    pub(crate) fn set_status(&self, status: BridgeStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status.clone();
                true
            }
        });
        if changed {
            info!(%status, "bridge status changed");
            let _ = self.events.send(BridgeEvent::StatusChanged(status));
        }
    }
}

/// Any answer from the bridge, even an error, means it is reachable.
async fn is_reachable(bridge: &dyn Bridge) -> bool {
    !matches!(bridge.probe().await, Err(BridgeError::Io(_)))
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
