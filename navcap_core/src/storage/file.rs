use super::{KeyValueStore, Result, StorageError, StoreMap};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Store persisted as a single JSON object on disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!("Creating FileStore at {:?}", path);
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<StoreMap> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {:?} does not exist yet", self.path);
                return Ok(StoreMap::new());
            }
            Err(e) => {
                error!("Failed to read store file: {}", e);
                return Err(e.into());
            }
        };
        if json.trim().is_empty() {
            return Ok(StoreMap::new());
        }

        match serde_json::from_str::<Value>(&json)? {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::InvalidData {
                key: self.path.display().to_string(),
                reason: format!("expected a JSON object, found {}", other),
            }),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, defaults: StoreMap) -> Result<StoreMap> {
        let stored = self.read_all().await?;
        Ok(defaults
            .into_iter()
            .map(|(key, default)| {
                let value = stored.get(&key).cloned().unwrap_or(default);
                (key, value)
            })
            .collect())
    }

    async fn set(&self, entries: StoreMap) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.read_all().await?;
        stored.extend(entries);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Write beside the target and rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&Value::Object(stored))?;
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Wrote store file {:?}", self.path);
        Ok(())
    }
}
