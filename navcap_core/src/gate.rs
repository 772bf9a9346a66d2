use crate::storage::{self, KeyValueStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The persisted flag has not been read yet; reads as disabled
    Loading,
    Ready(bool),
}

impl GateState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, GateState::Ready(true))
    }
}

/// Process-wide tracking flag with change notification.
///
/// Fail-closed: until [`TrackingGate::load`] resolves, every read reports
/// tracking as disabled.
#[derive(Debug, Clone)]
pub struct TrackingGate {
    tx: Arc<watch::Sender<GateState>>,
}

impl TrackingGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(GateState::Loading);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_tracking(&self) -> bool {
        self.tx.borrow().is_tracking()
    }

    pub fn state(&self) -> GateState {
        *self.tx.borrow()
    }

    pub fn is_loaded(&self) -> bool {
        self.state() != GateState::Loading
    }

    /// Resolve the gate from the persisted flag (absent means `false`).
    /// A value set through [`TrackingGate::set`] while the load was in
    /// flight takes precedence over the stored one.
    pub async fn load(&self, store: &dyn KeyValueStore) -> storage::Result<bool> {
        let stored = storage::load_tracking(store).await?;
        let applied = self.tx.send_if_modified(|state| {
            if *state == GateState::Loading {
                *state = GateState::Ready(stored);
                true
            } else {
                false
            }
        });
        if applied {
            info!(tracking = stored, "Loaded tracking state");
        } else {
            debug!("Tracking state was set before load completed; keeping it");
        }
        Ok(self.is_tracking())
    }

    /// Flip the flag. Only the control channel calls this.
    pub(crate) fn set(&self, tracking: bool) {
        let previous = self.tx.send_replace(GateState::Ready(tracking));
        debug!(?previous, tracking, "Tracking state changed");
    }

    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.tx.subscribe()
    }

    /// Stream of the effective flag, starting with the current value
    pub fn changes(&self) -> impl Stream<Item = bool> {
        WatchStream::new(self.subscribe()).map(|state| state.is_tracking())
    }

    /// Wait for the initial load and report the flag
    pub async fn ready(&self) -> bool {
        let mut rx = self.subscribe();
        rx.wait_for(|state| *state != GateState::Loading)
            .await
            .map(|state| state.is_tracking())
            .unwrap_or(false)
    }
}

impl Default for TrackingGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_fail_closed_until_loaded() {
        let store = MemoryStore::new();
        storage::save_tracking(&store, true).await.unwrap();

        let gate = TrackingGate::new();
        assert_eq!(gate.state(), GateState::Loading);
        assert!(!gate.is_tracking());

        assert!(gate.load(&store).await.unwrap());
        assert!(gate.is_tracking());
    }

    #[tokio::test]
    async fn test_load_defaults_to_disabled() {
        let gate = TrackingGate::new();
        assert!(!gate.load(&MemoryStore::new()).await.unwrap());
        assert_eq!(gate.state(), GateState::Ready(false));
    }

    #[tokio::test]
    async fn test_set_before_load_wins() {
        let store = MemoryStore::new();
        let gate = TrackingGate::new();
        gate.set(true);

        assert!(gate.load(&store).await.unwrap());
        assert!(gate.is_tracking());
    }

    #[tokio::test]
    async fn test_ready_waits_for_load() {
        let gate = TrackingGate::new();
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.ready().await })
        };
        gate.set(true);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_changes_stream() {
        let gate = TrackingGate::new();
        let mut changes = Box::pin(gate.changes());

        assert_eq!(changes.next().await, Some(false));
        gate.set(true);
        assert_eq!(changes.next().await, Some(true));
        gate.set(false);
        assert_eq!(changes.next().await, Some(false));
    }
}
