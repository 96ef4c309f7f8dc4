// ── Reconciliation ──
//
// One fetch-diff-notify-cache pass for a single entity kind. Shared by
// lights, sensors and groups through the `Entity` capability.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use super::EntityTable;
use crate::event::BridgeEvent;
use crate::listener::DiscoveryListener;
use crate::model::Entity;

/// Counts from one pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub changed: usize,
    pub declined: usize,
    pub removed: usize,
}

/// Reconcile the cache of `table` against a freshly fetched entity list.
///
/// Entities without a listener are announced to discovery only when the
/// cache did not know them. Entities with a listener go through
/// `on_changed`, which decides whether the cache takes the new value.
/// Cached ids missing from `fetched` are evicted and reported removed.
pub(crate) fn reconcile<E: Entity>(
    table: &EntityTable<E>,
    fetched: Vec<E>,
    discovery: Option<&Arc<dyn DiscoveryListener>>,
    events: &broadcast::Sender<BridgeEvent>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut previous = table.cache.to_map();

    for entity in fetched {
        let id = entity.id().to_owned();
        let old = previous.remove(&id);
        let entity = Arc::new(entity);

        let accepted = match table.listener(&id) {
            None => {
                if old.is_none() {
                    trace!(kind = %E::KIND, id = %id, name = entity.name(), "entity discovered");
                    if let Some(discovery) = discovery {
                        discovery.entity_added(&entity.to_discovered());
                    }
                }
                true
            }
            Some(listener) => listener.on_changed(Arc::clone(&entity)),
        };

        if !accepted {
            report.declined += 1;
            continue;
        }

        match old {
            None => {
                table.cache.insert(id.clone(), entity);
                report.added += 1;
                let _ = events.send(BridgeEvent::EntityAdded { kind: E::KIND, id });
            }
            Some(old) if *old != *entity => {
                table.cache.insert(id.clone(), entity);
                report.changed += 1;
                let _ = events.send(BridgeEvent::EntityChanged { kind: E::KIND, id });
            }
            Some(_) => {}
        }
    }

    for (id, old) in previous {
        trace!(kind = %E::KIND, id = %id, "entity removed");
        table.cache.remove(&id);
        if let Some(listener) = table.listener(&id) {
            listener.on_removed();
        }
        if let Some(discovery) = discovery {
            discovery.entity_removed(&old.to_discovered());
        }
        report.removed += 1;
        let _ = events.send(BridgeEvent::EntityRemoved { kind: E::KIND, id });
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::listener::StatusListener;
    use crate::model::{Discovered, Light, LightState};

    #[derive(Default)]
    struct RecordingDiscovery {
        added: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    impl DiscoveryListener for RecordingDiscovery {
        fn entity_added(&self, entity: &Discovered) {
            self.added.lock().unwrap().push(entity.id.clone());
        }

        fn entity_removed(&self, entity: &Discovered) {
            self.removed.lock().unwrap().push(entity.id.clone());
        }
    }

    struct Gate {
        id: String,
        accept: AtomicBool,
        changed: AtomicUsize,
        removed: AtomicUsize,
    }

    impl StatusListener<Light> for Gate {
        fn entity_id(&self) -> &str {
            &self.id
        }

        fn on_added(&self, _entity: Arc<Light>) {}

        fn on_changed(&self, _entity: Arc<Light>) -> bool {
            self.changed.fetch_add(1, Ordering::SeqCst);
            self.accept.load(Ordering::SeqCst)
        }

        fn on_removed(&self) {
            self.removed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_gone(&self) {}
    }

    fn light(id: &str, bri: u8) -> Light {
        Light {
            id: id.into(),
            name: format!("light {id}"),
            light_type: "Dimmable light".into(),
            model_id: None,
            unique_id: None,
            sw_version: None,
            manufacturer: None,
            state: LightState {
                on: true,
                brightness: Some(bri),
                reachable: true,
                ..LightState::default()
            },
        }
    }

    fn setup() -> (
        EntityTable<Light>,
        Arc<RecordingDiscovery>,
        broadcast::Sender<BridgeEvent>,
    ) {
        let (events, _) = broadcast::channel(16);
        (EntityTable::new(), Arc::new(RecordingDiscovery::default()), events)
    }

    #[test]
    fn stable_entities_are_announced_once() {
        let (table, rec, events) = setup();
        let discovery: Arc<dyn DiscoveryListener> = rec.clone();

        let first = reconcile(&table, vec![light("1", 10), light("2", 20)], Some(&discovery), &events);
        assert_eq!(first.added, 2);

        let second = reconcile(&table, vec![light("1", 10), light("2", 20)], Some(&discovery), &events);
        assert_eq!(second, ReconcileReport::default());
        assert_eq!(rec.added.lock().unwrap().len(), 2);
        assert!(rec.removed.lock().unwrap().is_empty());
    }

    #[test]
    fn vanished_entity_removed_exactly_once() {
        let (table, rec, events) = setup();
        let discovery: Arc<dyn DiscoveryListener> = rec.clone();
        let gate = Arc::new(Gate {
            id: "2".into(),
            accept: AtomicBool::new(true),
            changed: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        assert!(table.register(gate.clone()));

        reconcile(&table, vec![light("1", 10), light("2", 20)], Some(&discovery), &events);
        let report = reconcile(&table, vec![light("1", 10)], Some(&discovery), &events);
        assert_eq!(report.removed, 1);
        reconcile(&table, vec![light("1", 10)], Some(&discovery), &events);

        assert_eq!(gate.removed.load(Ordering::SeqCst), 1);
        assert_eq!(*rec.removed.lock().unwrap(), vec!["2".to_owned()]);
        assert!(!table.cache.contains("2"));
    }

    #[test]
    fn declining_listener_keeps_cached_value() {
        let (table, _rec, events) = setup();
        let gate = Arc::new(Gate {
            id: "1".into(),
            accept: AtomicBool::new(true),
            changed: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        table.register(gate.clone());
        reconcile(&table, vec![light("1", 10)], None, &events);

        gate.accept.store(false, Ordering::SeqCst);
        let report = reconcile(&table, vec![light("1", 99)], None, &events);
        assert_eq!(report.declined, 1);
        assert_eq!(table.cache.get("1").unwrap().state.brightness, Some(10));

        gate.accept.store(true, Ordering::SeqCst);
        let report = reconcile(&table, vec![light("1", 99)], None, &events);
        assert_eq!(report.changed, 1);
        assert_eq!(table.cache.get("1").unwrap().state.brightness, Some(99));
        assert_eq!(gate.changed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn known_entity_not_rediscovered_after_listener_detaches() {
        let (table, rec, events) = setup();
        let discovery: Arc<dyn DiscoveryListener> = rec.clone();
        let gate = Arc::new(Gate {
            id: "1".into(),
            accept: AtomicBool::new(true),
            changed: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });
        table.register(gate);
        reconcile(&table, vec![light("1", 10)], Some(&discovery), &events);
        assert!(rec.added.lock().unwrap().is_empty());

        assert!(table.unregister("1"));
        reconcile(&table, vec![light("1", 10)], Some(&discovery), &events);
        assert!(rec.added.lock().unwrap().is_empty());
    }

    #[test]
    fn events_follow_cache_changes() {
        let (table, _rec, events) = setup();
        let mut rx = events.subscribe();

        reconcile(&table, vec![light("1", 10)], None, &events);
        reconcile(&table, vec![light("1", 30)], None, &events);
        reconcile(&table, vec![], None, &events);

        assert!(matches!(rx.try_recv().unwrap(), BridgeEvent::EntityAdded { .. }));
        assert!(matches!(rx.try_recv().unwrap(), BridgeEvent::EntityChanged { .. }));
        assert!(matches!(rx.try_recv().unwrap(), BridgeEvent::EntityRemoved { .. }));
        assert!(rx.try_recv().is_err());
    }
}
