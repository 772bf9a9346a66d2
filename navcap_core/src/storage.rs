//! Persistent key-value store the capture runtime reads from and writes to.
//!
//! Two logical keys are used: [`IS_TRACKING_KEY`] holding a boolean and
//! [`EVENTS_KEY`] holding the array of event records.

mod error;
mod file;
mod memory;

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::record::EventRecord;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::fmt::Debug;

pub type StoreMap = Map<String, Value>;

pub const IS_TRACKING_KEY: &str = "isTracking";
pub const EVENTS_KEY: &str = "navigationEvents";

/// Asynchronous, eventually durable get/set store
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Values for every key of `defaults`; keys absent from the store
    /// yield the supplied default.
    async fn get(&self, defaults: StoreMap) -> Result<StoreMap>;

    /// Overwrite the given keys, leaving all others untouched
    async fn set(&self, entries: StoreMap) -> Result<()>;
}

fn single(key: &str, value: Value) -> StoreMap {
    let mut map = StoreMap::new();
    map.insert(key.to_string(), value);
    map
}

pub async fn load_tracking(store: &dyn KeyValueStore) -> Result<bool> {
    let values = store.get(single(IS_TRACKING_KEY, json!(false))).await?;
    match values.get(IS_TRACKING_KEY) {
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Null) | None => Ok(false),
        Some(other) => Err(StorageError::InvalidData {
            key: IS_TRACKING_KEY.to_string(),
            reason: format!("expected boolean, found {}", other),
        }),
    }
}

pub async fn save_tracking(store: &dyn KeyValueStore, tracking: bool) -> Result<()> {
    store.set(single(IS_TRACKING_KEY, json!(tracking))).await
}

pub async fn load_events(store: &dyn KeyValueStore) -> Result<Vec<EventRecord>> {
    let mut values = store.get(single(EVENTS_KEY, json!([]))).await?;
    match values.remove(EVENTS_KEY) {
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(events) => Ok(serde_json::from_value(events)?),
    }
}

pub async fn save_events(store: &dyn KeyValueStore, events: &[EventRecord]) -> Result<()> {
    store
        .set(single(EVENTS_KEY, serde_json::to_value(events)?))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EventContext, EventType};

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let store = MemoryStore::new();
        assert!(!load_tracking(&store).await.unwrap());
        assert!(load_events(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tracking_round_trip() {
        let store = MemoryStore::new();
        save_tracking(&store, true).await.unwrap();
        assert!(load_tracking(&store).await.unwrap());
    }

    #[tokio::test]
    async fn test_events_round_trip() {
        let store = MemoryStore::new();
        let record = EventRecord::new(
            "https://example.com/",
            "Home",
            EventType::Click,
            EventContext::described("Clicked on \"Next\""),
        );
        save_events(&store, &[record.clone()]).await.unwrap();

        let events = load_events(&store).await.unwrap();
        assert_eq!(events, vec![record]);
    }

    #[tokio::test]
    async fn test_invalid_tracking_value() {
        let store = MemoryStore::new();
        store
            .set(single(IS_TRACKING_KEY, json!("yes")))
            .await
            .unwrap();

        let err = load_tracking(&store).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData { .. }));
    }
}
