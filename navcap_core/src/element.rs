use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point-in-time view of a DOM element as delivered by the host,
/// including its ancestor chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    #[serde(rename = "tagName")]
    tag: String,

    /// Rendered text (`innerText`)
    #[serde(default)]
    pub text: Option<String>,

    /// Current form value, for inputs and text areas
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub content_editable: bool,

    #[serde(default)]
    pub parent: Option<Box<ElementSnapshot>>,
}

/// One entry of an element selector allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Tag(&'static str),
    Role(&'static str),
}

/// Elements a click is attributed to, nearest first.
pub const INTERACTIVE_SELECTORS: [Selector; 8] = [
    Selector::Tag("A"),
    Selector::Tag("BUTTON"),
    Selector::Role("button"),
    Selector::Role("tab"),
    Selector::Tag("INPUT"),
    Selector::Tag("LI"),
    Selector::Tag("DIV"),
    Selector::Tag("SPAN"),
];

impl Selector {
    pub fn matches(&self, element: &ElementSnapshot) -> bool {
        match self {
            Selector::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
            Selector::Role(role) => element.attribute("role") == Some(*role),
        }
    }
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn editable(mut self) -> Self {
        self.content_editable = true;
        self
    }

    pub fn within(mut self, parent: ElementSnapshot) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Upper-case tag name, as the DOM reports it for HTML elements
    pub fn tag_name(&self) -> String {
        self.tag.to_ascii_uppercase()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> &str {
        self.attribute("id").unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.attribute("name").unwrap_or_default()
    }

    pub fn class_name(&self) -> &str {
        self.attribute("class").unwrap_or_default()
    }

    pub fn href(&self) -> &str {
        self.attribute("href").unwrap_or_default()
    }

    pub fn input_type(&self) -> &str {
        self.attribute("type").unwrap_or_default()
    }

    pub fn role(&self) -> &str {
        self.attribute("role").unwrap_or_default()
    }

    pub fn parent(&self) -> Option<&ElementSnapshot> {
        self.parent.as_deref()
    }

    /// Nearest ancestor-or-self matching any of `selectors`
    pub fn closest(&self, selectors: &[Selector]) -> Option<&ElementSnapshot> {
        let mut current = Some(self);
        while let Some(element) = current {
            if selectors.iter().any(|s| s.matches(element)) {
                return Some(element);
            }
            current = element.parent();
        }
        None
    }

    /// Whether keystrokes on this element edit text
    pub fn accepts_text(&self) -> bool {
        let tag = self.tag_name();
        tag == "INPUT" || tag == "TEXTAREA" || self.content_editable
    }
}
