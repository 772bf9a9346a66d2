use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// `document.readyState` of the hosting page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

/// Read access to the page the runtime is attached to
pub trait Page: Send + Sync {
    fn url(&self) -> String;
    fn title(&self) -> String;
    fn ready_state(&self) -> ReadyState;

    /// Trimmed rendered text of the first element matching `selector`
    fn query_text(&self, selector: &str) -> Option<String>;

    /// Fragment of the current URL including the leading `#`, or empty
    fn hash(&self) -> String {
        fragment_of(&self.url()).to_string()
    }
}

fn fragment_of(url: &str) -> &str {
    match url.find('#') {
        Some(idx) if idx + 1 < url.len() => &url[idx..],
        _ => "",
    }
}

#[derive(Debug, Default)]
struct PageState {
    url: String,
    title: String,
    ready_state: ReadyState,
    texts: HashMap<String, String>,
}

/// Page whose state is pushed in by the host or a replay script
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    state: Arc<RwLock<PageState>>,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let page = Self::default();
        page.update(|s| {
            s.url = url.into();
            s.title = title.into();
        });
        page
    }

    pub fn with_ready_state(self, ready_state: ReadyState) -> Self {
        self.set_ready_state(ready_state);
        self
    }

    pub fn navigate(&self, url: impl Into<String>) {
        let url = url.into();
        self.update(|s| s.url = url);
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.update(|s| s.title = title);
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.update(|s| s.ready_state = ready_state);
    }

    /// Make `selector` resolve to an element rendering `text`
    pub fn set_text(&self, selector: impl Into<String>, text: impl Into<String>) {
        let (selector, text) = (selector.into(), text.into());
        self.update(|s| {
            s.texts.insert(selector, text);
        });
    }

    pub fn remove_text(&self, selector: &str) {
        self.update(|s| {
            s.texts.remove(selector);
        });
    }

    fn update(&self, f: impl FnOnce(&mut PageState)) {
        if let Ok(mut state) = self.state.write() {
            f(&mut *state);
        }
    }

    fn read<T: Default>(&self, f: impl FnOnce(&PageState) -> T) -> T {
        self.state.read().map(|s| f(&*s)).unwrap_or_default()
    }
}

impl Page for StaticPage {
    fn url(&self) -> String {
        self.read(|s| s.url.clone())
    }

    fn title(&self) -> String {
        self.read(|s| s.title.clone())
    }

    fn ready_state(&self) -> ReadyState {
        self.read(|s| s.ready_state)
    }

    fn query_text(&self, selector: &str) -> Option<String> {
        self.read(|s| s.texts.get(selector).map(|t| t.trim().to_string()))
    }
}
