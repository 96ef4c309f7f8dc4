// ── Entity storage ──
//
// One `EntityTable` per kind: the last-known-state cache plus the
// listener registry slot for each id.

mod cache;
pub(crate) mod group_state;
pub(crate) mod reconcile;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::debug;

pub(crate) use cache::EntityCache;
pub use reconcile::ReconcileReport;

use crate::listener::StatusListener;
use crate::model::{Entity, Group, Light, Sensor};

/// Cache and listener registry for one entity kind.
pub(crate) struct EntityTable<E: Entity> {
    pub(crate) cache: EntityCache<E>,
    listeners: DashMap<String, Arc<dyn StatusListener<E>>>,
}

impl<E: Entity> EntityTable<E> {
    pub(crate) fn new() -> Self {
        Self {
            cache: EntityCache::new(),
            listeners: DashMap::new(),
        }
    }

    /// Attach a listener to its entity id. Fails if the slot is taken.
    ///
    /// A cached entity is delivered to `on_added` before returning.
    pub(crate) fn register(&self, listener: Arc<dyn StatusListener<E>>) -> bool {
        let id = listener.entity_id().to_owned();
        match self.listeners.entry(id.clone()) {
            Entry::Occupied(_) => {
                debug!(kind = %E::KIND, id = %id, "listener slot already taken");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&listener));
            }
        }

        if let Some(entity) = self.cache.get(&id) {
            listener.on_added(entity);
        }
        true
    }

    pub(crate) fn unregister(&self, id: &str) -> bool {
        self.listeners.remove(id).is_some()
    }

    /// Clone the listener out of the map so callbacks run without a shard lock.
    pub(crate) fn listener(&self, id: &str) -> Option<Arc<dyn StatusListener<E>>> {
        self.listeners.get(id).map(|r| Arc::clone(r.value()))
    }
}

/// All per-kind tables plus poll bookkeeping.
pub struct DataStore {
    pub(crate) lights: EntityTable<Light>,
    pub(crate) sensors: EntityTable<Sensor>,
    pub(crate) groups: EntityTable<Group>,
    last_poll: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub(crate) fn new() -> Self {
        let (last_poll, _) = watch::channel(None);
        Self {
            lights: EntityTable::new(),
            sensors: EntityTable::new(),
            groups: EntityTable::new(),
            last_poll,
        }
    }

    pub fn light(&self, id: &str) -> Option<Arc<Light>> {
        self.lights.cache.get(id)
    }

    pub fn sensor(&self, id: &str) -> Option<Arc<Sensor>> {
        self.sensors.cache.get(id)
    }

    pub fn group(&self, id: &str) -> Option<Arc<Group>> {
        self.groups.cache.get(id)
    }

    pub fn lights_snapshot(&self) -> Arc<Vec<Arc<Light>>> {
        self.lights.cache.snapshot()
    }

    pub fn sensors_snapshot(&self) -> Arc<Vec<Arc<Sensor>>> {
        self.sensors.cache.snapshot()
    }

    pub fn groups_snapshot(&self) -> Arc<Vec<Arc<Group>>> {
        self.groups.cache.snapshot()
    }

    pub fn entity_counts(&self) -> (usize, usize, usize) {
        (
            self.lights.cache.len(),
            self.sensors.cache.len(),
            self.groups.cache.len(),
        )
    }

    /// Time of the last completed reconciliation pass of any kind.
    pub fn last_poll(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_poll.subscribe()
    }

    pub(crate) fn mark_polled(&self) {
        let _ = self.last_poll.send_replace(Some(Utc::now()));
    }
}
