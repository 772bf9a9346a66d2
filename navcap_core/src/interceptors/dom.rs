use super::truncate_chars;
use crate::capture::Capture;
use crate::describe::{describe, Action};
use crate::element::{ElementSnapshot, INTERACTIVE_SELECTORS};
use crate::label::resolve_label;
use crate::record::{EventContext, EventType, NATURAL_DESCRIPTION};

/// Click, submit and keydown, observed at the document root in the
/// capture phase.
#[derive(Debug, Clone)]
pub struct DomEventInterceptor {
    capture: Capture,
}

impl DomEventInterceptor {
    pub fn new(capture: Capture) -> Self {
        Self { capture }
    }

    /// Attribute the click to the nearest interactive ancestor-or-self;
    /// clicks outside any such element are ignored.
    pub fn on_click(&self, target: &ElementSnapshot) -> bool {
        if !self.capture.is_tracking() {
            return false;
        }
        let Some(el) = target.closest(&INTERACTIVE_SELECTORS) else {
            return false;
        };

        let tag = el.tag_name();
        let label = resolve_label(Some(el));
        let description = describe(&Action::Click {
            label: &label,
            tag: &tag,
        });
        let text = el
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(el.value.as_deref())
            .unwrap_or_default();

        let context = EventContext::new()
            .with("tag", tag.as_str())
            .with("text", truncate_chars(text, self.capture.config().max_field_len))
            .with("id", el.id())
            .with("class", el.class_name())
            .with("href", el.href())
            .with("type", el.input_type())
            .with("role", el.role())
            .with(NATURAL_DESCRIPTION, description);
        self.capture.capture_event(EventType::Click, context)
    }

    pub fn on_submit(&self, form: &ElementSnapshot) -> bool {
        if !self.capture.is_tracking() {
            return false;
        }
        let label = [form.attribute("name"), form.attribute("id")]
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| resolve_label(Some(form)));
        let description = describe(&Action::Submit { label: &label });

        let page_url = self.capture.page().url();
        let context = EventContext::new()
            .with("action", form.attribute("action").unwrap_or(page_url.as_str()))
            .with("method", form.attribute("method").unwrap_or("get"))
            .with(NATURAL_DESCRIPTION, description);
        self.capture.capture_event(EventType::FormSubmit, context)
    }

    /// Keystrokes are recorded only inside text inputs, text areas and
    /// content-editable regions.
    pub fn on_keydown(&self, key: &str, target: &ElementSnapshot) -> bool {
        if !self.capture.is_tracking() || !target.accepts_text() {
            return false;
        }
        let max = self.capture.config().max_field_len;
        let label = resolve_label(Some(target));
        let name = Some(target.name())
            .filter(|n| !n.is_empty())
            .unwrap_or(target.id());

        let context = EventContext::new()
            .with("key", key)
            .with("name", name)
            .with("type", target.input_type())
            .with(
                "value",
                truncate_chars(target.value.as_deref().unwrap_or_default(), max),
            )
            .with(
                NATURAL_DESCRIPTION,
                describe(&Action::Keystroke { key, label: &label }),
            );
        self.capture.capture_event(EventType::InputEdit, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::capture_fixture;
    use crate::record::EventRecord;

    async fn recorded(capture: &Capture) -> Vec<EventRecord> {
        capture.writer().flush().await.unwrap();
        capture.writer().read_all().await.unwrap()
    }

    #[tokio::test]
    async fn test_click_on_nested_button() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        let icon = ElementSnapshot::new("svg").within(
            ElementSnapshot::new("button")
                .with_text("Next")
                .with_attr("id", "next-btn")
                .with_attr("type", "button"),
        );
        assert!(interceptor.on_click(&icon));

        let events = recorded(&capture).await;
        assert_eq!(events.len(), 1);
        let ctx = &events[0].context;
        assert_eq!(events[0].natural_description(), "Clicked on \"Next\"");
        assert_eq!(ctx.get_str("tag"), Some("BUTTON"));
        assert_eq!(ctx.get_str("text"), Some("Next"));
        assert_eq!(ctx.get_str("id"), Some("next-btn"));
        assert_eq!(ctx.get_str("type"), Some("button"));
        assert_eq!(ctx.get_str("href"), Some(""));
    }

    #[tokio::test]
    async fn test_click_without_interactive_ancestor_is_ignored() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        let img = ElementSnapshot::new("img").within(ElementSnapshot::new("body"));
        assert!(!interceptor.on_click(&img));
        assert!(recorded(&capture).await.is_empty());
    }

    #[tokio::test]
    async fn test_unlabeled_click_quotes_tag_name() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        assert!(interceptor.on_click(&ElementSnapshot::new("span")));

        let events = recorded(&capture).await;
        assert_eq!(events[0].natural_description(), "Clicked on \"SPAN\"");
        assert_eq!(events[0].context.get_str("text"), Some(""));
    }

    #[tokio::test]
    async fn test_submit_prefers_form_name() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        let form = ElementSnapshot::new("form")
            .with_attr("name", "login")
            .with_attr("id", "login-form")
            .with_attr("method", "post")
            .with_attr("action", "/session");
        assert!(interceptor.on_submit(&form));

        let events = recorded(&capture).await;
        assert_eq!(events[0].event_type, EventType::FormSubmit);
        assert_eq!(events[0].natural_description(), "Submitted login");
        assert_eq!(events[0].context.get_str("method"), Some("post"));
        assert_eq!(events[0].context.get_str("action"), Some("/session"));
    }

    #[tokio::test]
    async fn test_submit_defaults_to_page_url() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        assert!(interceptor.on_submit(&ElementSnapshot::new("form")));
        let events = recorded(&capture).await;
        assert_eq!(events[0].natural_description(), "Submitted FORM");
        assert_eq!(
            events[0].context.get_str("action"),
            Some("https://example.com/app")
        );
        assert_eq!(events[0].context.get_str("method"), Some("get"));
    }

    #[tokio::test]
    async fn test_keydown_in_input_truncates_value() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        let input = ElementSnapshot::new("input")
            .with_attr("placeholder", "Search box")
            .with_attr("id", "q")
            .with_attr("type", "text")
            .with_value("x".repeat(250));
        assert!(interceptor.on_keydown("Enter", &input));

        let events = recorded(&capture).await;
        let ctx = &events[0].context;
        assert_eq!(events[0].event_type, EventType::InputEdit);
        assert_eq!(ctx.get_str("key"), Some("Enter"));
        assert_eq!(ctx.get_str("name"), Some("q"));
        assert_eq!(ctx.get_str("value").map(str::len), Some(100));
        // The value outranks the placeholder as a label
        assert!(events[0]
            .natural_description()
            .starts_with("Typed \"Enter\" in \"xxx"));
    }

    #[tokio::test]
    async fn test_keydown_labels_empty_input_by_placeholder() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        let input = ElementSnapshot::new("input").with_attr("placeholder", "Search box");
        assert!(interceptor.on_keydown("a", &input));

        let events = recorded(&capture).await;
        assert_eq!(events[0].natural_description(), "Typed \"a\" in \"Search box\"");
    }

    #[tokio::test]
    async fn test_keydown_outside_text_fields_is_ignored() {
        let (capture, _page) = capture_fixture(true).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        assert!(!interceptor.on_keydown("a", &ElementSnapshot::new("button")));
        assert!(interceptor.on_keydown("a", &ElementSnapshot::new("div").editable()));
        assert_eq!(recorded(&capture).await.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_recorded_when_disabled() {
        let (capture, _page) = capture_fixture(false).await;
        let interceptor = DomEventInterceptor::new(capture.clone());

        let button = ElementSnapshot::new("button").with_text("Next");
        for _ in 0..20 {
            assert!(!interceptor.on_click(&button));
            assert!(!interceptor.on_keydown("a", &ElementSnapshot::new("input")));
        }
        assert!(recorded(&capture).await.is_empty());
    }
}
