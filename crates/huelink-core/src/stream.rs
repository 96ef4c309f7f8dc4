// ── Entity snapshot subscriptions ──
//
// Whole-collection views of one entity kind, for consumers that would
// rather diff snapshots than register a listener per id.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Entity;

/// Every cached entity of one kind, as one immutable value.
pub type Snapshot<E> = Arc<Vec<Arc<E>>>;

/// Subscription to one kind's cache. A new snapshot is published only
/// when a poll changes the cache, not on every tick.
pub struct EntityStream<E: Entity> {
    seen: Snapshot<E>,
    rx: watch::Receiver<Snapshot<E>>,
}

impl<E: Entity> EntityStream<E> {
    pub(crate) fn new(rx: watch::Receiver<Snapshot<E>>) -> Self {
        let seen = Arc::clone(&*rx.borrow());
        Self { seen, rx }
    }

    /// The snapshot as of subscription or the last [`next_change`](Self::next_change).
    pub fn seen(&self) -> &Snapshot<E> {
        &self.seen
    }

    /// Look an entity up in the seen snapshot.
    pub fn get(&self, id: &str) -> Option<Arc<E>> {
        self.seen.iter().find(|e| e.id() == id).cloned()
    }

    /// Wait for the cache to change. `None` once the controller is gone.
    pub async fn next_change(&mut self) -> Option<Snapshot<E>> {
        self.rx.changed().await.ok()?;
        self.seen = Arc::clone(&*self.rx.borrow_and_update());
        Some(Arc::clone(&self.seen))
    }

    /// Adapt into a `Stream` that starts with the current snapshot.
    pub fn into_stream(self) -> SnapshotStream<E> {
        SnapshotStream(WatchStream::new(self.rx))
    }
}

pub struct SnapshotStream<E: Entity>(WatchStream<Snapshot<E>>);

impl<E: Entity> Stream for SnapshotStream<E> {
    type Item = Snapshot<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.0).poll_next(cx)
    }
}
