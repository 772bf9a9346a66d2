use super::BoundedLog;
use crate::config::RetryPolicy;
use crate::error::{CaptureError, Result};
use crate::record::EventRecord;
use crate::storage::{self, KeyValueStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Reply = oneshot::Sender<storage::Result<()>>;

#[derive(Debug, Clone)]
enum Mutation {
    Append(EventRecord),
    Clear,
    SetTracking(bool),
}

#[derive(Debug)]
enum WriteCommand {
    Apply {
        mutation: Mutation,
        reply: Option<Reply>,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the task that owns every mutation of the store.
///
/// Commands are applied strictly in submission order, one read-modify-write
/// at a time, so concurrent producers cannot overwrite each other's records.
#[derive(Debug, Clone)]
pub struct EventLogWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
    store: Arc<dyn KeyValueStore>,
}

impl EventLogWriter {
    /// Start the writer task. It stops once every handle has been dropped
    /// and the queue is drained.
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        max_events: usize,
        retry: RetryPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = WriterTask {
            store: Arc::clone(&store),
            rx,
            max_events,
            retry,
        };
        debug!(max_events, "Spawning event log writer");
        let handle = tokio::spawn(task.run());
        (Self { tx, store }, handle)
    }

    /// Queue a record without waiting for it to be persisted
    pub fn submit(&self, record: EventRecord) -> Result<()> {
        self.send(Mutation::Append(record), None)
    }

    /// Append a record and wait until the store has acknowledged it
    pub async fn append(&self, record: EventRecord) -> Result<()> {
        self.apply(Mutation::Append(record)).await
    }

    pub fn submit_clear(&self) -> Result<()> {
        self.send(Mutation::Clear, None)
    }

    /// Replace the stored log with an empty sequence
    pub async fn clear(&self) -> Result<()> {
        self.apply(Mutation::Clear).await
    }

    pub fn submit_tracking(&self, tracking: bool) -> Result<()> {
        self.send(Mutation::SetTracking(tracking), None)
    }

    pub async fn persist_tracking(&self, tracking: bool) -> Result<()> {
        self.apply(Mutation::SetTracking(tracking)).await
    }

    /// Wait until everything queued before this call has been applied
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(WriteCommand::Flush(tx))
            .map_err(|_| CaptureError::WriterClosed)?;
        rx.await.map_err(|_| CaptureError::WriterClosed)
    }

    /// The log as currently persisted
    pub async fn read_all(&self) -> Result<Vec<EventRecord>> {
        Ok(storage::load_events(self.store.as_ref()).await?)
    }

    fn send(&self, mutation: Mutation, reply: Option<Reply>) -> Result<()> {
        self.tx
            .send(WriteCommand::Apply { mutation, reply })
            .map_err(|_| CaptureError::WriterClosed)
    }

    async fn apply(&self, mutation: Mutation) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(mutation, Some(tx))?;
        rx.await.map_err(|_| CaptureError::WriterClosed)??;
        Ok(())
    }
}

struct WriterTask {
    store: Arc<dyn KeyValueStore>,
    rx: mpsc::UnboundedReceiver<WriteCommand>,
    max_events: usize,
    retry: RetryPolicy,
}

impl WriterTask {
    async fn run(mut self) {
        info!("Starting event log writer");

        while let Some(command) = self.rx.recv().await {
            match command {
                WriteCommand::Apply { mutation, reply } => {
                    let result = self.apply_with_retry(&mutation).await;
                    if let Err(e) = &result {
                        warn!(error = %e, ?mutation, "Dropping store write");
                    }
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                WriteCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        info!("Event log writer shutting down");
    }

    async fn apply_with_retry(&self, mutation: &Mutation) -> storage::Result<()> {
        let mut attempt = 0;
        loop {
            match self.apply(mutation).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retry.attempts => {
                    attempt += 1;
                    debug!(attempt, error = %e, "Retrying store write");
                    tokio::time::sleep(self.retry.backoff()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn apply(&self, mutation: &Mutation) -> storage::Result<()> {
        let store = self.store.as_ref();
        match mutation {
            Mutation::Append(record) => {
                let stored = storage::load_events(store).await?;
                let mut log = BoundedLog::from_vec(stored, self.max_events);
                let evicted = log.log_event(record.clone());
                if evicted > 0 {
                    debug!(evicted, "Evicted oldest events");
                }
                storage::save_events(store, &log.into_vec()).await
            }
            Mutation::Clear => {
                debug!("Clearing event log");
                storage::save_events(store, &[]).await
            }
            Mutation::SetTracking(tracking) => storage::save_tracking(store, *tracking).await,
        }
    }
}
