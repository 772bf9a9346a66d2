use super::{KeyValueStore, Result, StorageError, StoreMap};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// In-process store. Optional latency stretches every round trip so
/// interleavings between concurrent callers become observable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<StoreMap>>,
    latency: Option<Duration>,
    failing_writes: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make the next `count` calls to `set` fail
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, defaults: StoreMap) -> Result<StoreMap> {
        self.round_trip().await;
        let values = self
            .values
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        Ok(defaults
            .into_iter()
            .map(|(key, default)| {
                let value = values.get(&key).cloned().unwrap_or(default);
                (key, value)
            })
            .collect())
    }

    async fn set(&self, entries: StoreMap) -> Result<()> {
        self.round_trip().await;
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!("Injected write failure");
            return Err(StorageError::Other("injected write failure".to_string()));
        }

        let mut values = self
            .values
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        values.extend(entries);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
