//! Sources that turn browser signals into event records.
//!
//! Every interceptor holds a [`Capture`] and emits only through
//! [`Capture::capture_event`], so all of them share the tracking gate and
//! the single log writer.

mod dom;
mod history;
mod lifecycle;
mod mutation;
mod network;

pub use dom::DomEventInterceptor;
pub use history::HistoryInterceptor;
pub use lifecycle::LifecycleInterceptor;
pub use mutation::{
    ChildListHeuristic, HeadingChangeHeuristic, Mutation, MutationInterceptor, MutationKind,
    NavigationHint, ViewChangeHeuristic,
};
pub use network::{
    FetchInput, FetchPrimitive, InstallToken, InstalledNetwork, NetworkHooks, ObservedFetch,
    ObservedRequest, ObservedRequestFactory, RequestFactory, RequestInfo, RequestPrimitive,
};

use crate::capture::Capture;
use crate::element::ElementSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A signal observed on the page and handed to the runtime by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserSignal {
    Click { target: ElementSnapshot },
    Submit { form: ElementSnapshot },
    KeyDown { key: String, target: ElementSnapshot },
    PopState,
    HashChange,
    DomContentLoaded,
    Mutations { records: Vec<Mutation> },
}

/// The DOM, history, mutation and lifecycle interceptors of one page
#[derive(Debug)]
pub struct Interceptors {
    dom: DomEventInterceptor,
    history: HistoryInterceptor,
    mutation: MutationInterceptor,
    lifecycle: LifecycleInterceptor,
}

impl Interceptors {
    pub fn new(capture: Capture, heuristic: Arc<dyn ViewChangeHeuristic>) -> Self {
        Self {
            dom: DomEventInterceptor::new(capture.clone()),
            history: HistoryInterceptor::new(capture.clone()),
            mutation: MutationInterceptor::new(capture.clone(), heuristic),
            lifecycle: LifecycleInterceptor::new(capture),
        }
    }

    pub fn lifecycle(&self) -> &LifecycleInterceptor {
        &self.lifecycle
    }

    /// Route a signal to its interceptor. Returns whether a record was queued.
    pub fn dispatch(&self, signal: &BrowserSignal) -> bool {
        debug!(?signal, "Dispatching browser signal");
        match signal {
            BrowserSignal::Click { target } => self.dom.on_click(target),
            BrowserSignal::Submit { form } => self.dom.on_submit(form),
            BrowserSignal::KeyDown { key, target } => self.dom.on_keydown(key, target),
            BrowserSignal::PopState => self.history.on_popstate(),
            BrowserSignal::HashChange => self.history.on_hashchange(),
            BrowserSignal::DomContentLoaded => self.lifecycle.on_dom_content_loaded(),
            BrowserSignal::Mutations { records } => self.mutation.on_mutations(records),
        }
    }
}

/// First `max` characters of `value`
pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
