// ── Controller ──
//
// Lifecycle for one bridge: owns the bridge client, the entity store,
// the listener registries and the two poll jobs. The connection state
// machine lives in `connection.rs`, command dispatch in `command/`.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use huelink_api::HueClient;

use crate::bridge::Bridge;
use crate::config::ControllerConfig;
use crate::error::{BridgeError, CoreError};
use crate::event::BridgeEvent;
use crate::listener::{DiscoveryListener, StatusListener};
use crate::model::{
    ApiVersion, BridgeProperties, BridgeStatus, EntityKind, Group, Light, Sensor, StatusDetail,
    StatusReason,
};
use crate::store::DataStore;
use crate::stream::EntityStream;

const EVENT_CHANNEL_SIZE: usize = 256;
const LIGHT_POLL_INITIAL_DELAY: Duration = Duration::from_secs(1);
const SENSOR_POLL_INITIAL_DELAY: Duration = Duration::from_millis(1);

// ── ConnectionState ──────────────────────────────────────────────

/// Reachability and authentication of the bridge, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Disconnected,
    ConnectedUnauthenticated,
    ConnectedAuthenticated,
}

/// Which reconciliation a poll tick runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum PollKind {
    Lights,
    Sensors,
}

struct PollJob {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Nothing touches the
/// network until [`start()`](Self::start) spawns the poll jobs.
#[derive(Clone)]
pub struct Controller {
    pub(crate) inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    pub(crate) config: ControllerConfig,
    /// Absent when no host is configured.
    pub(crate) bridge: Option<Arc<dyn Bridge>>,
    pub(crate) store: Arc<DataStore>,
    pub(crate) credential: ArcSwapOption<SecretString>,
    pub(crate) properties: ArcSwapOption<BridgeProperties>,
    pub(crate) properties_initialized: AtomicBool,
    pub(crate) api_version: ArcSwapOption<ApiVersion>,
    pub(crate) connection: watch::Sender<ConnectionState>,
    pub(crate) status: watch::Sender<BridgeStatus>,
    pub(crate) events: broadcast::Sender<BridgeEvent>,
    pub(crate) discovery: Mutex<Option<Arc<dyn DiscoveryListener>>>,
    /// Serializes every reconciliation pass, across both poll jobs.
    pub(crate) poll_lock: tokio::sync::Mutex<()>,
    light_job: Mutex<Option<PollJob>>,
    sensor_job: Mutex<Option<PollJob>>,
}

impl Controller {
    /// Build a controller talking HTTP to the configured bridge.
    ///
    /// A missing host is not an error: the controller reports
    /// `Offline(ConfigurationError, NoHost)` and never polls.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let bridge: Option<Arc<dyn Bridge>> = match config.bridge_url() {
            Ok(url) => {
                let client = HueClient::new(url, &config.transport())?;
                if let Some(credential) = &config.credential {
                    client.set_username(credential.clone());
                }
                Some(Arc::new(client))
            }
            Err(_) => None,
        };
        Ok(Self::build(config, bridge))
    }

    /// Build a controller over any `Bridge` implementation.
    pub fn with_bridge(config: ControllerConfig, bridge: Arc<dyn Bridge>) -> Self {
        Self::build(config, Some(bridge))
    }

    fn build(config: ControllerConfig, bridge: Option<Arc<dyn Bridge>>) -> Self {
        let initial = if bridge.is_some() {
            BridgeStatus::Initializing
        } else {
            BridgeStatus::offline(StatusDetail::ConfigurationError, StatusReason::NoHost)
        };
        let (status, _) = watch::channel(initial);
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let credential = ArcSwapOption::from(config.credential.clone().map(Arc::new));

        Self {
            inner: Arc::new(ControllerInner {
                config,
                bridge,
                store: Arc::new(DataStore::new()),
                credential,
                properties: ArcSwapOption::empty(),
                properties_initialized: AtomicBool::new(false),
                api_version: ArcSwapOption::empty(),
                connection,
                status,
                events,
                discovery: Mutex::new(None),
                poll_lock: tokio::sync::Mutex::new(()),
                light_job: Mutex::new(None),
                sensor_job: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start both poll jobs. Without a bridge this only logs.
    pub fn start(&self) {
        if self.inner.bridge.is_none() {
            debug!("no bridge host configured, polling not started");
            return;
        }
        self.start_light_polling();
        self.start_sensor_polling();
    }

    /// Stop both poll jobs. Cache contents are kept.
    pub fn shutdown(&self) {
        self.stop_light_polling();
        self.stop_sensor_polling();
        debug!("controller shut down");
    }

    /// Spawn the light/group poll job unless one is already running.
    pub fn start_light_polling(&self) {
        let period = self.inner.config.poll_interval();
        self.start_job(&self.inner.light_job, PollKind::Lights, LIGHT_POLL_INITIAL_DELAY, period);
    }

    pub fn stop_light_polling(&self) {
        stop_job(&self.inner.light_job, PollKind::Lights);
    }

    /// Spawn the sensor poll job unless one is running or sensor polling is disabled.
    pub fn start_sensor_polling(&self) {
        let Some(period) = self.inner.config.sensor_poll_interval() else {
            debug!("sensor polling disabled");
            return;
        };
        self.start_job(&self.inner.sensor_job, PollKind::Sensors, SENSOR_POLL_INITIAL_DELAY, period);
    }

    pub fn stop_sensor_polling(&self) {
        stop_job(&self.inner.sensor_job, PollKind::Sensors);
    }

    pub fn is_light_polling(&self) -> bool {
        job_running(&self.inner.light_job)
    }

    pub fn is_sensor_polling(&self) -> bool {
        job_running(&self.inner.sensor_job)
    }

    fn start_job(
        &self,
        slot: &Mutex<Option<PollJob>>,
        kind: PollKind,
        initial_delay: Duration,
        period: Duration,
    ) {
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|job| !job.handle.is_finished()) {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(
            Arc::downgrade(&self.inner),
            kind,
            initial_delay,
            period,
            cancel.clone(),
        ));
        info!(kind = %kind, period_ms = period.as_millis(), "polling started");
        *slot = Some(PollJob { cancel, handle });
    }

    /// Run one light pass and one sensor pass right now, outside the schedule.
    pub async fn poll_now(&self) {
        self.inner.poll(PollKind::Lights).await;
        self.inner.poll(PollKind::Sensors).await;
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.inner.status.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.events.subscribe()
    }

    /// Bridge properties, once the first authenticated connection fetched them.
    pub fn properties(&self) -> Option<Arc<BridgeProperties>> {
        self.inner.properties.load_full()
    }

    /// The credential currently in use (configured or freshly paired).
    pub fn credential(&self) -> Option<Arc<SecretString>> {
        self.inner.credential.load_full()
    }

    pub fn lights(&self) -> EntityStream<Light> {
        EntityStream::new(self.inner.store.lights.cache.subscribe())
    }

    pub fn sensors(&self) -> EntityStream<Sensor> {
        EntityStream::new(self.inner.store.sensors.cache.subscribe())
    }

    pub fn groups(&self) -> EntityStream<Group> {
        EntityStream::new(self.inner.store.groups.cache.subscribe())
    }

    pub fn light_by_id(&self, id: &str) -> Option<Arc<Light>> {
        self.inner.store.light(id)
    }

    pub fn sensor_by_id(&self, id: &str) -> Option<Arc<Sensor>> {
        self.inner.store.sensor(id)
    }

    pub fn group_by_id(&self, id: &str) -> Option<Arc<Group>> {
        self.inner.store.group(id)
    }

    /// Look a cached light up by id, then by case-insensitive name.
    pub fn find_light(&self, query: &str) -> Result<Arc<Light>, CoreError> {
        if let Some(light) = self.light_by_id(query) {
            return Ok(light);
        }
        self.inner
            .store
            .lights_snapshot()
            .iter()
            .find(|light| light.name.eq_ignore_ascii_case(query))
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                kind: EntityKind::Light.to_string(),
                id: query.to_owned(),
            })
    }

    // ── Listener registry ────────────────────────────────────────

    /// Returns `false` if a listener already holds the id.
    pub fn register_light_listener(&self, listener: Arc<dyn StatusListener<Light>>) -> bool {
        self.inner.store.lights.register(listener)
    }

    pub fn unregister_light_listener(&self, light_id: &str) -> bool {
        self.inner.store.lights.unregister(light_id)
    }

    pub fn register_sensor_listener(&self, listener: Arc<dyn StatusListener<Sensor>>) -> bool {
        self.inner.store.sensors.register(listener)
    }

    pub fn unregister_sensor_listener(&self, sensor_id: &str) -> bool {
        self.inner.store.sensors.unregister(sensor_id)
    }

    pub fn register_group_listener(&self, listener: Arc<dyn StatusListener<Group>>) -> bool {
        self.inner.store.groups.register(listener)
    }

    pub fn unregister_group_listener(&self, group_id: &str) -> bool {
        self.inner.store.groups.unregister(group_id)
    }

    /// Attach the discovery collaborator and announce everything the
    /// bridge currently reports. Fails if one is already attached.
    pub async fn register_discovery(&self, listener: Arc<dyn DiscoveryListener>) -> bool {
        {
            let mut slot = self.inner.discovery.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return false;
            }
            *slot = Some(Arc::clone(&listener));
        }
        self.inner.announce_all(listener.as_ref()).await;
        true
    }

    pub fn unregister_discovery(&self) -> bool {
        self.inner
            .discovery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    /// Ask the bridge to search for new lights, optionally by serial number.
    pub async fn start_search(&self, serials: Vec<String>) {
        let serials = Arc::new(serials);
        self.inner
            .with_reauthentication("start search mode", move |bridge| {
                let serials = Arc::clone(&serials);
                async move { bridge.start_search(&serials).await }
            })
            .await;
    }

    /// Pair with the bridge now. The caller is expected to have pressed
    /// the link button; `LinkButtonNotPressed` is returned otherwise.
    /// Transport failures come back as `Bridge(Io)`.
    pub async fn pair(&self) -> Result<SecretString, CoreError> {
        let bridge = self.inner.bridge.clone().ok_or(CoreError::NoBridge)?;
        match self.inner.request_credential(bridge.as_ref()).await {
            Ok(credential) => Ok(credential),
            Err(e @ (BridgeError::LinkButtonNotPressed | BridgeError::Io(_))) => {
                Err(CoreError::Bridge(e))
            }
            Err(e) => Err(CoreError::PairingFailed {
                message: e.to_string(),
            }),
        }
    }
}

fn stop_job(slot: &Mutex<Option<PollJob>>, kind: PollKind) {
    if let Some(job) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
        job.cancel.cancel();
        debug!(kind = %kind, "polling stopped");
    }
}

fn job_running(slot: &Mutex<Option<PollJob>>) -> bool {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|job| !job.handle.is_finished())
}

// ── Background tasks ─────────────────────────────────────────────

/// Fixed-delay poll loop. A slow pass delays the next tick rather than
/// bunching up missed ones. Ends when cancelled or when the controller
/// is dropped.
async fn poll_task(
    inner: Weak<ControllerInner>,
    kind: PollKind,
    initial_delay: Duration,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = interval_at(Instant::now() + initial_delay, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                inner.poll(kind).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_host_reports_configuration_error() {
        let controller = Controller::new(ControllerConfig::default()).unwrap();
        assert_eq!(
            *controller.status().borrow(),
            BridgeStatus::offline(StatusDetail::ConfigurationError, StatusReason::NoHost)
        );
        controller.start();
        assert!(!controller.is_light_polling());
        assert!(matches!(controller.pair().await, Err(CoreError::NoBridge)));
    }

    #[tokio::test]
    async fn configured_host_starts_initializing() {
        let config = ControllerConfig {
            host: Some("127.0.0.1".into()),
            port: Some(9),
            sensor_poll_interval_ms: 0,
            ..ControllerConfig::default()
        };
        let controller = Controller::new(config).unwrap();
        assert_eq!(*controller.status().borrow(), BridgeStatus::Initializing);
        assert_eq!(
            *controller.connection_state().borrow(),
            ConnectionState::Disconnected
        );

        controller.start();
        assert!(controller.is_light_polling());
        assert!(!controller.is_sensor_polling());

        controller.stop_light_polling();
        assert!(!controller.is_light_polling());
    }
}
