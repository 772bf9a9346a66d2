use crate::capture::Capture;
use crate::config::{CaptureConfig, ViewChangeMode};
use crate::control::{ControlAck, ControlCommand, ControlHandler};
use crate::error::Result;
use crate::event_log::EventLogWriter;
use crate::export;
use crate::gate::TrackingGate;
use crate::interceptors::{
    BrowserSignal, ChildListHeuristic, HeadingChangeHeuristic, InstallToken, Interceptors,
    NetworkHooks, ViewChangeHeuristic,
};
use crate::page::Page;
use crate::record::EventRecord;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Capture attached to one page: the writer task, the gate, every
/// interceptor and the control handler, wired around a shared [`Capture`].
#[derive(Debug)]
pub struct CaptureRuntime {
    session_id: Uuid,
    capture: Capture,
    interceptors: Interceptors,
    network: NetworkHooks,
    control: ControlHandler,
    writer_task: JoinHandle<()>,
}

impl CaptureRuntime {
    pub async fn attach(
        store: Arc<dyn KeyValueStore>,
        page: Arc<dyn Page>,
        config: CaptureConfig,
    ) -> Result<Self> {
        let heuristic: Arc<dyn ViewChangeHeuristic> = match config.view_change {
            ViewChangeMode::Any => Arc::new(ChildListHeuristic::from_config(&config)),
            ViewChangeMode::HeadingChange => {
                Arc::new(HeadingChangeHeuristic::from_config(&config))
            }
        };
        Self::attach_with_heuristic(store, page, config, heuristic).await
    }

    /// Attach with a caller-supplied view-change heuristic
    pub async fn attach_with_heuristic(
        store: Arc<dyn KeyValueStore>,
        page: Arc<dyn Page>,
        config: CaptureConfig,
        heuristic: Arc<dyn ViewChangeHeuristic>,
    ) -> Result<Self> {
        config.validate()?;
        let session_id = Uuid::new_v4();
        info!(session = %session_id, url = %page.url(), "Attaching capture runtime");

        let (writer, writer_task) =
            EventLogWriter::spawn(Arc::clone(&store), config.max_events, config.retry);

        // Interceptors are built only after the load settles; a failed load
        // leaves the gate closed until a control command opens it.
        let gate = TrackingGate::new();
        if let Err(e) = gate.load(store.as_ref()).await {
            warn!(session = %session_id, error = %e, "Failed to load tracking state");
        }

        let capture = Capture::new(gate, writer, page, Arc::new(config));
        let interceptors = Interceptors::new(capture.clone(), heuristic);
        let phase = interceptors.lifecycle().attach();
        info!(
            session = %session_id,
            tracking = capture.is_tracking(),
            ?phase,
            "Capture runtime attached"
        );

        Ok(Self {
            session_id,
            network: NetworkHooks::new(capture.clone()),
            control: ControlHandler::new(capture.clone()),
            capture,
            interceptors,
            writer_task,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    pub fn is_tracking(&self) -> bool {
        self.capture.is_tracking()
    }

    pub fn dispatch(&self, signal: &BrowserSignal) -> bool {
        self.interceptors.dispatch(signal)
    }

    /// The one-time capability to wrap the page's network primitives
    pub fn install_network(&self) -> Option<InstallToken> {
        self.network.install()
    }

    pub fn control(&self) -> &ControlHandler {
        &self.control
    }

    pub fn handle(&self, command: ControlCommand) -> Result<ControlAck> {
        self.control.handle(command)
    }

    /// Wait until every queued write has reached the store
    pub async fn flush(&self) -> Result<()> {
        self.capture.writer().flush().await
    }

    /// The persisted log after pending writes have landed
    pub async fn events(&self) -> Result<Vec<EventRecord>> {
        self.flush().await?;
        self.capture.writer().read_all().await
    }

    pub async fn export_json(&self) -> Result<String> {
        export::export_json(&self.events().await?)
    }

    /// Flush and detach. Handles still held elsewhere (wrapped network
    /// primitives, a serving control channel) keep the writer task alive.
    pub async fn shutdown(self) -> Result<()> {
        self.flush().await?;
        info!(session = %self.session_id, "Capture runtime detached");
        if self.writer_task.is_finished() {
            warn!(session = %self.session_id, "Event log writer exited early");
        }
        Ok(())
    }
}
