//! Natural-language sentences for captured actions.

use crate::record::EventType;

/// How the document had progressed when the capture runtime attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Emitted on DOMContentLoaded after attaching during `loading`
    Deferred,
    /// Emitted at attach because the document was already parsed
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingTransition {
    Started,
    Stopped,
    Cleared,
}

/// A raw signal reduced to what its description needs
#[derive(Debug, Clone, PartialEq)]
pub enum Action<'a> {
    Click { label: &'a str, tag: &'a str },
    Submit { label: &'a str },
    Keystroke { key: &'a str, label: &'a str },
    ViewSwitch { heading: Option<&'a str> },
    Fetch { url: &'a str },
    RequestObject { url: &'a str },
    PageLoaded(LoadPhase),
    HistoryTraversal,
    HashChange { hash: &'a str },
    Tracking(TrackingTransition),
}

pub fn describe(action: &Action<'_>) -> String {
    match action {
        Action::Click { label, tag } => {
            if label.is_empty() {
                format!("Clicked on {}", tag)
            } else {
                format!("Clicked on \"{}\"", label)
            }
        }
        Action::Submit { label } => {
            let label = if label.is_empty() { "form" } else { label };
            format!("Submitted {}", label)
        }
        Action::Keystroke { key, label } => format!("Typed \"{}\" in \"{}\"", key, label),
        Action::ViewSwitch { heading } => match heading.filter(|h| !h.is_empty()) {
            Some(heading) => format!("Switched view to \"{}\"", heading),
            None => "Switched dynamic view (SPA detected)".to_string(),
        },
        Action::Fetch { url } => format!("Triggered fetch({})", url),
        Action::RequestObject { url } => format!("Triggered XHR to \"{}\"", url),
        Action::PageLoaded(LoadPhase::Deferred) => "Page loaded (DOMContentLoaded)".to_string(),
        Action::PageLoaded(LoadPhase::Immediate) => "Page loaded (quick start)".to_string(),
        Action::HistoryTraversal => "Navigated using browser back/forward".to_string(),
        Action::HashChange { hash } => format!("Changed hash to \"{}\"", hash),
        Action::Tracking(TrackingTransition::Started) => "Tracking started".to_string(),
        Action::Tracking(TrackingTransition::Stopped) => "Tracking stopped".to_string(),
        Action::Tracking(TrackingTransition::Cleared) => "Events cleared".to_string(),
    }
}

/// Generic phrase used when a record arrives without a description
pub fn fallback(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Navigation => "Navigated",
        EventType::Click => "Clicked on element",
        EventType::FormSubmit => "Submitted form",
        EventType::InputEdit => "Edited input",
        EventType::Network => "Triggered network request",
        EventType::InternalNav => "Switched dynamic view (SPA detected)",
        EventType::Tracking => "Tracking state changed",
    }
}
