use crate::config::CaptureConfig;
use crate::event_log::EventLogWriter;
use crate::gate::TrackingGate;
use crate::page::Page;
use crate::record::{EventContext, EventRecord, EventType};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Everything an interceptor needs to emit: the tracking gate, the log
/// writer and the page being observed. Cheap to clone.
#[derive(Clone)]
pub struct Capture {
    gate: TrackingGate,
    writer: EventLogWriter,
    page: Arc<dyn Page>,
    config: Arc<CaptureConfig>,
}

impl Capture {
    pub fn new(
        gate: TrackingGate,
        writer: EventLogWriter,
        page: Arc<dyn Page>,
        config: Arc<CaptureConfig>,
    ) -> Self {
        Self {
            gate,
            writer,
            page,
            config,
        }
    }

    /// The single emission path for interceptors. Returns whether a record
    /// was queued; nothing happens while tracking is off.
    pub fn capture_event(&self, event_type: EventType, context: EventContext) -> bool {
        if !self.gate.is_tracking() {
            trace!(%event_type, "Tracking disabled, ignoring signal");
            return false;
        }
        self.record(event_type, context)
    }

    /// Queue a record regardless of the gate
    pub(crate) fn record(&self, event_type: EventType, context: EventContext) -> bool {
        let record = EventRecord::new(self.page.url(), self.page.title(), event_type, context);
        trace!(%record, "Captured event");
        match self.writer.submit(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, %event_type, "Failed to queue event");
                false
            }
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.gate.is_tracking()
    }

    pub fn gate(&self) -> &TrackingGate {
        &self.gate
    }

    pub fn writer(&self) -> &EventLogWriter {
        &self.writer
    }

    pub fn page(&self) -> &dyn Page {
        self.page.as_ref()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("gate", &self.gate.state())
            .field("url", &self.page.url())
            .finish_non_exhaustive()
    }
}
