//! Short human-readable names for interactive elements.

use crate::element::ElementSnapshot;

/// Best available label for `element`, or an empty string for `None`.
///
/// Candidates in priority order: rendered text, current value, `aria-label`,
/// `title`, `alt`, `placeholder`, `name`, `id`, the first class token longer
/// than three characters, and finally the tag name. Empty candidates fall
/// through to the next one.
pub fn resolve_label(element: Option<&ElementSnapshot>) -> String {
    let Some(el) = element else {
        return String::new();
    };

    let trimmed = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let present = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());

    trimmed(el.text.as_deref())
        .or_else(|| trimmed(el.value.as_deref()))
        .or_else(|| trimmed(el.attribute("aria-label")))
        .or_else(|| trimmed(el.attribute("title")))
        .or_else(|| trimmed(el.attribute("alt")))
        .or_else(|| trimmed(el.attribute("placeholder")))
        .or_else(|| present(el.name()))
        .or_else(|| present(el.id()))
        .or_else(|| {
            el.class_name()
                .split(' ')
                .find(|token| token.chars().count() > 3)
                .map(str::to_string)
        })
        .unwrap_or_else(|| el.tag_name())
}
