use crate::capture::Capture;
use crate::describe::{describe, Action};
use crate::record::{EventContext, EventType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

/// First argument of the generic fetch primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FetchInput {
    Url(String),
    Request(RequestInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl FetchInput {
    /// Target URL, or empty when a request object carries none
    pub fn url(&self) -> &str {
        match self {
            FetchInput::Url(url) => url,
            FetchInput::Request(info) => info.url.as_deref().unwrap_or_default(),
        }
    }
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        FetchInput::Url(url.to_string())
    }
}

/// The page's generic asynchronous network primitive
#[async_trait]
pub trait FetchPrimitive: Send + Sync {
    type Response: Send;

    async fn fetch(&self, input: FetchInput) -> Self::Response;
}

/// One instance of the lower-level request-object primitive
pub trait RequestPrimitive: Send {
    type Output;

    fn open(&mut self, method: &str, url: &str);
    fn send(&mut self, body: Option<&str>) -> Self::Output;
}

/// Constructs request objects, the way the page's constructor does
pub trait RequestFactory: Send + Sync {
    type Request: RequestPrimitive;

    fn create(&self) -> Self::Request;
}

/// Guards installation of the network decorators: at most one
/// [`InstallToken`] is ever issued per runtime.
#[derive(Debug)]
pub struct NetworkHooks {
    capture: Capture,
    issued: AtomicBool,
}

impl NetworkHooks {
    pub fn new(capture: Capture) -> Self {
        Self {
            capture,
            issued: AtomicBool::new(false),
        }
    }

    /// The install capability, or `None` if it was handed out before
    pub fn install(&self) -> Option<InstallToken> {
        if self.issued.swap(true, Ordering::SeqCst) {
            debug!("Network hooks already installed");
            return None;
        }
        let token = InstallToken {
            id: Uuid::new_v4(),
            capture: self.capture.clone(),
        };
        info!(token = %token.id, "Issued network install token");
        Some(token)
    }

    pub fn is_installed(&self) -> bool {
        self.issued.load(Ordering::SeqCst)
    }
}

/// Single-use capability to wrap the page's network primitives
#[derive(Debug)]
pub struct InstallToken {
    id: Uuid,
    capture: Capture,
}

/// Both primitives, observed
#[derive(Debug)]
pub struct InstalledNetwork<F, R> {
    pub fetch: ObservedFetch<F>,
    pub requests: ObservedRequestFactory<R>,
}

impl InstallToken {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wrap both primitives. Consumes the token so nothing is wrapped twice.
    pub fn wrap<F, R>(self, fetch: F, requests: R) -> InstalledNetwork<F, R>
    where
        F: FetchPrimitive,
        R: RequestFactory,
    {
        InstalledNetwork {
            fetch: ObservedFetch {
                inner: fetch,
                capture: self.capture.clone(),
            },
            requests: ObservedRequestFactory {
                inner: requests,
                capture: self.capture,
            },
        }
    }
}

/// Records the target URL, then delegates unchanged
#[derive(Debug)]
pub struct ObservedFetch<F> {
    inner: F,
    capture: Capture,
}

impl<F: FetchPrimitive> ObservedFetch<F> {
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: FetchPrimitive> FetchPrimitive for ObservedFetch<F> {
    type Response = F::Response;

    async fn fetch(&self, input: FetchInput) -> Self::Response {
        if self.capture.is_tracking() {
            let url = input.url();
            let context = EventContext::described(describe(&Action::Fetch { url }))
                .with("method", "fetch")
                .with("url", url);
            self.capture.capture_event(EventType::Network, context);
        }
        self.inner.fetch(input).await
    }
}

#[derive(Debug)]
pub struct ObservedRequestFactory<R> {
    inner: R,
    capture: Capture,
}

impl<R: RequestFactory> RequestFactory for ObservedRequestFactory<R> {
    type Request = ObservedRequest<R::Request>;

    fn create(&self) -> Self::Request {
        ObservedRequest {
            inner: self.inner.create(),
            capture: self.capture.clone(),
            url: None,
        }
    }
}

/// Remembers the URL passed to `open` and records it at `send`
#[derive(Debug)]
pub struct ObservedRequest<R> {
    inner: R,
    capture: Capture,
    url: Option<String>,
}

impl<R> ObservedRequest<R> {
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: RequestPrimitive> RequestPrimitive for ObservedRequest<R> {
    type Output = R::Output;

    fn open(&mut self, method: &str, url: &str) {
        self.url = Some(url.to_string());
        self.inner.open(method, url);
    }

    fn send(&mut self, body: Option<&str>) -> Self::Output {
        match self.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) if self.capture.is_tracking() => {
                let context = EventContext::described(describe(&Action::RequestObject { url }))
                    .with("method", "xhr")
                    .with("url", url);
                self.capture.capture_event(EventType::Network, context);
            }
            Some(_) => {}
            None => debug!("Request sent without open, not recorded"),
        }
        self.inner.send(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::capture_fixture;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default, Clone)]
    struct EchoFetch {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl FetchPrimitive for EchoFetch {
        type Response = String;

        async fn fetch(&self, input: FetchInput) -> String {
            self.calls.lock().unwrap().push(input.url().to_string());
            format!("body of {}", input.url())
        }
    }

    #[derive(Debug, Default)]
    struct FakeRequest {
        opened: Option<(String, String)>,
    }

    impl RequestPrimitive for FakeRequest {
        type Output = u16;

        fn open(&mut self, method: &str, url: &str) {
            self.opened = Some((method.to_string(), url.to_string()));
        }

        fn send(&mut self, _body: Option<&str>) -> u16 {
            if self.opened.is_some() {
                200
            } else {
                0
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakeRequests;

    impl RequestFactory for FakeRequests {
        type Request = FakeRequest;

        fn create(&self) -> FakeRequest {
            FakeRequest::default()
        }
    }

    #[tokio::test]
    async fn test_install_token_is_issued_once() {
        let (capture, _page) = capture_fixture(true).await;
        let hooks = NetworkHooks::new(capture);

        assert!(!hooks.is_installed());
        assert!(hooks.install().is_some());
        assert!(hooks.install().is_none());
        assert!(hooks.is_installed());
    }

    #[tokio::test]
    async fn test_fetch_records_and_returns_original_result() {
        let (capture, _page) = capture_fixture(true).await;
        let hooks = NetworkHooks::new(capture.clone());
        let echo = EchoFetch::default();
        let network = hooks.install().unwrap().wrap(echo.clone(), FakeRequests);

        assert_eq!(network.fetch.fetch("/api/a".into()).await, "body of /api/a");
        let request = FetchInput::Request(RequestInfo {
            url: Some("/api/b".to_string()),
            method: Some("POST".to_string()),
        });
        assert_eq!(network.fetch.fetch(request).await, "body of /api/b");
        capture.writer().flush().await.unwrap();

        assert_eq!(*echo.calls.lock().unwrap(), vec!["/api/a", "/api/b"]);
        let events = capture.writer().read_all().await.unwrap();
        assert_eq!(events.len(), 2);
        for (event, url) in events.iter().zip(["/api/a", "/api/b"]) {
            assert_eq!(event.event_type, EventType::Network);
            assert_eq!(event.context.get_str("url"), Some(url));
            assert_eq!(event.context.get_str("method"), Some("fetch"));
            assert!(event.natural_description().contains(url));
        }
    }

    #[tokio::test]
    async fn test_request_records_url_from_open() {
        let (capture, _page) = capture_fixture(true).await;
        let hooks = NetworkHooks::new(capture.clone());
        let network = hooks.install().unwrap().wrap(EchoFetch::default(), FakeRequests);

        let mut request = network.requests.create();
        request.open("GET", "/api/items");
        assert_eq!(request.send(None), 200);
        assert_eq!(
            request.inner().opened,
            Some(("GET".to_string(), "/api/items".to_string()))
        );
        capture.writer().flush().await.unwrap();

        let events = capture.writer().read_all().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].natural_description(),
            "Triggered XHR to \"/api/items\""
        );
        assert_eq!(events[0].context.get_str("method"), Some("xhr"));
    }

    #[tokio::test]
    async fn test_send_without_open_is_skipped() {
        let (capture, _page) = capture_fixture(true).await;
        let hooks = NetworkHooks::new(capture.clone());
        let network = hooks.install().unwrap().wrap(EchoFetch::default(), FakeRequests);

        let mut request = network.requests.create();
        assert_eq!(request.send(Some("payload")), 0);
        capture.writer().flush().await.unwrap();
        assert!(capture.writer().read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_gate_still_delegates() {
        let (capture, _page) = capture_fixture(false).await;
        let hooks = NetworkHooks::new(capture.clone());
        let network = hooks.install().unwrap().wrap(EchoFetch::default(), FakeRequests);

        assert_eq!(network.fetch.fetch("/api/a".into()).await, "body of /api/a");
        let mut request = network.requests.create();
        request.open("GET", "/api/b");
        assert_eq!(request.send(None), 200);
        capture.writer().flush().await.unwrap();
        assert!(capture.writer().read_all().await.unwrap().is_empty());
    }
}
