//! CSS selector-based extraction
//!
//! Element-level helpers used by the schema extractor. Everything here works
//! on an already-parsed element, scoped to its descendants.

use scraper::{ElementRef, Selector};

/// First descendant of `scope` matching `selector`, in document order
pub fn first_match<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Visible text of an element, whitespace-normalized.
///
/// Text under any element named in `invisible_tags` is skipped.
pub fn element_text(element: ElementRef<'_>, invisible_tags: &[String]) -> String {
    let mut raw = String::new();
    collect_text(element, invisible_tags, &mut raw);
    normalize_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, invisible_tags: &[String], out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let tag = child_el.value().name();
            if invisible_tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                continue;
            }
            collect_text(child_el, invisible_tags, out);
        }
    }
}

/// Raw attribute value, exactly as written in the markup
pub fn element_attr(element: ElementRef<'_>, attr_name: &str) -> Option<String> {
    element.value().attr(attr_name).map(String::from)
}

/// Inner HTML of an element, unmodified
pub fn element_inner_html(element: ElementRef<'_>) -> String {
    element.inner_html()
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
