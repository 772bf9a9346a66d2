use crate::capture::Capture;
use crate::describe::{describe, Action, LoadPhase};
use crate::page::ReadyState;
use crate::record::{EventContext, EventType};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Emits the single page-load record of an attach
#[derive(Debug)]
pub struct LifecycleInterceptor {
    capture: Capture,
    attached: AtomicBool,
    pending: AtomicBool,
}

impl LifecycleInterceptor {
    pub fn new(capture: Capture) -> Self {
        Self {
            capture,
            attached: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    /// Called once when the runtime attaches. While the document is still
    /// loading the record is deferred to DOMContentLoaded; otherwise it is
    /// emitted now. Later calls are no-ops.
    pub fn attach(&self) -> Option<LoadPhase> {
        if self.attached.swap(true, Ordering::SeqCst) {
            debug!("Lifecycle interceptor already attached");
            return None;
        }
        if self.capture.page().ready_state() == ReadyState::Loading {
            self.pending.store(true, Ordering::SeqCst);
            return Some(LoadPhase::Deferred);
        }
        self.emit(LoadPhase::Immediate);
        Some(LoadPhase::Immediate)
    }

    pub fn on_dom_content_loaded(&self) -> bool {
        if !self.pending.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.emit(LoadPhase::Deferred)
    }

    fn emit(&self, phase: LoadPhase) -> bool {
        self.capture.capture_event(
            EventType::Navigation,
            EventContext::described(describe(&Action::PageLoaded(phase))),
        )
    }
}
