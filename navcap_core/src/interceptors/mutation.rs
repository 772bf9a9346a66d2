use crate::capture::Capture;
use crate::config::CaptureConfig;
use crate::describe::{describe, Action};
use crate::page::Page;
use crate::record::{EventContext, EventType, NATURAL_DESCRIPTION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One record of a mutation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    pub kind: MutationKind,
    #[serde(default)]
    pub added_nodes: usize,
    #[serde(default)]
    pub removed_nodes: usize,
}

impl Mutation {
    pub fn child_list(added_nodes: usize, removed_nodes: usize) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added_nodes,
            removed_nodes,
        }
    }

    pub fn attributes() -> Self {
        Self {
            kind: MutationKind::Attributes,
            added_nodes: 0,
            removed_nodes: 0,
        }
    }

    /// A child-list change that inserted or removed at least one node
    pub fn changes_structure(&self) -> bool {
        self.kind == MutationKind::ChildList && (self.added_nodes > 0 || self.removed_nodes > 0)
    }
}

/// What a heuristic inferred from a mutation batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationHint {
    pub heading: Option<String>,
}

/// Infers an in-page navigation from unstructured DOM changes
pub trait ViewChangeHeuristic: Send + Sync + fmt::Debug {
    fn matches(&self, batch: &[Mutation], page: &dyn Page) -> Option<NavigationHint>;
}

fn probe_heading(selectors: &[String], page: &dyn Page) -> Option<String> {
    selectors
        .iter()
        .filter_map(|selector| page.query_text(selector))
        .find(|text| !text.is_empty())
}

/// Fires on any batch containing a structural child-list change, then
/// looks for the best current section title.
#[derive(Debug, Clone)]
pub struct ChildListHeuristic {
    heading_selectors: Vec<String>,
}

impl ChildListHeuristic {
    pub fn new(heading_selectors: Vec<String>) -> Self {
        Self { heading_selectors }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.heading_selectors.clone())
    }
}

impl Default for ChildListHeuristic {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

impl ViewChangeHeuristic for ChildListHeuristic {
    fn matches(&self, batch: &[Mutation], page: &dyn Page) -> Option<NavigationHint> {
        if !batch.iter().any(Mutation::changes_structure) {
            return None;
        }
        Some(NavigationHint {
            heading: probe_heading(&self.heading_selectors, page),
        })
    }
}

/// Stricter variant: fires only when a structural change comes with a
/// heading different from the last one reported. Incremental updates
/// under an unchanged heading, and changes on pages without one, are
/// ignored.
#[derive(Debug)]
pub struct HeadingChangeHeuristic {
    heading_selectors: Vec<String>,
    last_heading: Mutex<Option<String>>,
}

impl HeadingChangeHeuristic {
    pub fn new(heading_selectors: Vec<String>) -> Self {
        Self {
            heading_selectors,
            last_heading: Mutex::new(None),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.heading_selectors.clone())
    }
}

impl ViewChangeHeuristic for HeadingChangeHeuristic {
    fn matches(&self, batch: &[Mutation], page: &dyn Page) -> Option<NavigationHint> {
        if !batch.iter().any(Mutation::changes_structure) {
            return None;
        }
        let heading = probe_heading(&self.heading_selectors, page)?;
        let mut last = self.last_heading.lock().ok()?;
        if last.as_deref() == Some(heading.as_str()) {
            return None;
        }
        *last = Some(heading.clone());
        Some(NavigationHint {
            heading: Some(heading),
        })
    }
}

/// Watches the body subtree and reports inferred SPA view switches
#[derive(Debug, Clone)]
pub struct MutationInterceptor {
    capture: Capture,
    heuristic: Arc<dyn ViewChangeHeuristic>,
}

impl MutationInterceptor {
    pub fn new(capture: Capture, heuristic: Arc<dyn ViewChangeHeuristic>) -> Self {
        Self { capture, heuristic }
    }

    pub fn on_mutations(&self, batch: &[Mutation]) -> bool {
        if !self.capture.is_tracking() {
            return false;
        }
        let Some(hint) = self.heuristic.matches(batch, self.capture.page()) else {
            return false;
        };

        let heading = hint.heading.as_deref();
        let mut context = EventContext::new();
        if let Some(heading) = heading {
            context = context.with("heading", heading);
        }
        let context = context.with(NATURAL_DESCRIPTION, describe(&Action::ViewSwitch { heading }));
        self.capture.capture_event(EventType::InternalNav, context)
    }
}
