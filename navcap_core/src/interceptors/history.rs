use crate::capture::Capture;
use crate::describe::{describe, Action};
use crate::record::{EventContext, EventType};

/// Back/forward traversal and fragment changes
#[derive(Debug, Clone)]
pub struct HistoryInterceptor {
    capture: Capture,
}

impl HistoryInterceptor {
    pub fn new(capture: Capture) -> Self {
        Self { capture }
    }

    pub fn on_popstate(&self) -> bool {
        self.capture.capture_event(
            EventType::Navigation,
            EventContext::described(describe(&Action::HistoryTraversal)),
        )
    }

    pub fn on_hashchange(&self) -> bool {
        let hash = self.capture.page().hash();
        let context = EventContext::described(describe(&Action::HashChange { hash: &hash }))
            .with("hash", hash.as_str());
        self.capture.capture_event(EventType::Navigation, context)
    }
}
