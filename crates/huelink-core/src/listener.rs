// ── Listener capabilities ──
//
// Per-entity status listeners and the discovery collaborator. Both are
// called synchronously from the poll task and from command tasks, so
// implementations must be quick and must not call back into the
// controller's registration methods from inside a callback.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::model::{Discovered, Entity};

/// Observer bound to exactly one entity id of one kind.
///
/// # Poll bypass contract
///
/// After a command the dispatcher calls [`set_poll_bypass`] on the
/// affected listeners. While that window is open a poll may still report
/// the pre-command (or mid-fade) state. A listener declines such an
/// overwrite by returning `false` from [`on_changed`]; the cache then
/// keeps its previous value and the next poll after the window closes
/// is accepted. [`PollBypass`] implements the window bookkeeping.
///
/// [`set_poll_bypass`]: StatusListener::set_poll_bypass
/// [`on_changed`]: StatusListener::on_changed
pub trait StatusListener<E: Entity>: Send + Sync {
    fn entity_id(&self) -> &str;

    /// Called on registration when the entity is already cached.
    fn on_added(&self, entity: Arc<E>);

    /// Called for every poll that reports the entity. Return `true` to
    /// let the cache take the new value.
    fn on_changed(&self, entity: Arc<E>) -> bool;

    /// The bridge stopped reporting the entity.
    fn on_removed(&self);

    /// A command addressed the entity and the bridge no longer knows it.
    fn on_gone(&self);

    fn set_poll_bypass(&self, _duration: Duration) {}

    fn clear_poll_bypass(&self) {}
}

/// Receives add/remove notifications for entities without a listener.
pub trait DiscoveryListener: Send + Sync {
    fn entity_added(&self, entity: &Discovered);

    fn entity_removed(&self, entity: &Discovered);
}

/// Expiry-based poll bypass window on the tokio (monotonic) clock.
#[derive(Debug, Default)]
pub struct PollBypass {
    until: Mutex<Option<Instant>>,
}

impl PollBypass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or move) the window to end `duration` from now.
    pub fn engage(&self, duration: Duration) {
        *self.until.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now() + duration);
    }

    pub fn clear(&self) {
        *self.until.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_active(&self) -> bool {
        self.until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|until| Instant::now() < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bypass_expires_on_the_monotonic_clock() {
        let bypass = PollBypass::new();
        assert!(!bypass.is_active());

        bypass.engage(Duration::from_millis(1500));
        assert!(bypass.is_active());

        tokio::time::advance(Duration::from_millis(1499)).await;
        assert!(bypass.is_active());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!bypass.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_closes_the_window() {
        let bypass = PollBypass::new();
        bypass.engage(Duration::from_secs(10));
        bypass.clear();
        assert!(!bypass.is_active());
    }
}
