//! Replays a recorded signal script through a fully attached capture
//! runtime, with stand-in network primitives.

use crate::error::CliError;
use async_trait::async_trait;
use navcap_core::interceptors::{FetchInput, FetchPrimitive, RequestFactory, RequestPrimitive};
use navcap_core::storage::KeyValueStore;
use navcap_core::{
    BrowserSignal, CaptureConfig, CaptureRuntime, ControlCommand, EventRecord, ReadyState,
    StaticPage,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ready_state: ReadyState,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let source = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&source)?)
    }
}

/// One step of a script: a control command, a page signal, a change to
/// the page itself, or a network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplayStep {
    Control(ControlCommand),
    Signal(BrowserSignal),
    Navigate(String),
    Title(String),
    Heading { selector: String, text: String },
    ReadyState(ReadyState),
    Fetch(FetchInput),
    Xhr { method: String, url: String },
}

#[derive(Debug)]
pub struct ReplayReport {
    pub session_id: String,
    pub steps: usize,
    pub events: Vec<EventRecord>,
}

/// Answers every fetch with 200
#[derive(Debug, Default)]
struct ReplayFetch;

#[async_trait]
impl FetchPrimitive for ReplayFetch {
    type Response = u16;

    async fn fetch(&self, input: FetchInput) -> u16 {
        debug!(url = input.url(), "Replayed fetch");
        200
    }
}

#[derive(Debug, Default)]
struct ReplayRequest {
    target: Option<(String, String)>,
}

impl RequestPrimitive for ReplayRequest {
    type Output = u16;

    fn open(&mut self, method: &str, url: &str) {
        self.target = Some((method.to_string(), url.to_string()));
    }

    fn send(&mut self, _body: Option<&str>) -> u16 {
        match &self.target {
            Some((method, url)) => {
                debug!(method = %method, url = %url, "Replayed request");
                200
            }
            None => 0,
        }
    }
}

#[derive(Debug, Default)]
struct ReplayRequests;

impl RequestFactory for ReplayRequests {
    type Request = ReplayRequest;

    fn create(&self) -> ReplayRequest {
        ReplayRequest::default()
    }
}

pub async fn run(
    store: Arc<dyn KeyValueStore>,
    config: CaptureConfig,
    script: ReplayScript,
) -> Result<ReplayReport, CliError> {
    let page = StaticPage::new(script.url.as_str(), script.title.as_str())
        .with_ready_state(script.ready_state);
    let runtime = CaptureRuntime::attach(store, Arc::new(page.clone()), config).await?;
    let network = runtime
        .install_network()
        .map(|token| token.wrap(ReplayFetch, ReplayRequests));

    let session_id = runtime.session_id().to_string();
    info!(session = %session_id, steps = script.steps.len(), "Replaying script");

    for (index, step) in script.steps.iter().enumerate() {
        match step {
            ReplayStep::Control(command) => {
                runtime.handle(*command)?;
            }
            ReplayStep::Signal(signal) => {
                let recorded = runtime.dispatch(signal);
                debug!(index, recorded, "Replayed signal");
            }
            ReplayStep::Navigate(url) => page.navigate(url.as_str()),
            ReplayStep::Title(title) => page.set_title(title.as_str()),
            ReplayStep::Heading { selector, text } => {
                page.set_text(selector.as_str(), text.as_str())
            }
            ReplayStep::ReadyState(state) => page.set_ready_state(*state),
            ReplayStep::Fetch(input) => match &network {
                Some(network) => {
                    network.fetch.fetch(input.clone()).await;
                }
                None => warn!(index, "Network hooks unavailable, skipping fetch"),
            },
            ReplayStep::Xhr { method, url } => match &network {
                Some(network) => {
                    let mut request = network.requests.create();
                    request.open(method, url);
                    request.send(None);
                }
                None => warn!(index, "Network hooks unavailable, skipping request"),
            },
        }
    }

    let events = runtime.events().await?;
    drop(network);
    runtime.shutdown().await?;

    Ok(ReplayReport {
        session_id,
        steps: script.steps.len(),
        events,
    })
}
