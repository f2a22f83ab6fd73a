//! Locator evaluation over a static HTML document

use crate::render::{ElementHandle, Locator, RenderError, RenderResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Evaluates `locator` against `source` and snapshots every match
///
/// # Arguments
///
/// * `source` - Serialized HTML of the page
/// * `locator` - What to look for
///
/// # Returns
///
/// * `Ok(Vec<ElementHandle>)` - Matches in document order, possibly empty
/// * `Err(RenderError::Selector)` - The CSS selector does not parse
pub fn select(source: &str, locator: &Locator) -> RenderResult<Vec<ElementHandle>> {
    select_in(&Html::parse_document(source), locator)
}

/// Evaluates `locator` against an already parsed document
pub fn select_in(document: &Html, locator: &Locator) -> RenderResult<Vec<ElementHandle>> {
    let handles: Vec<ElementHandle> = match locator {
        Locator::Css(css) => {
            let selector = Selector::parse(css).map_err(|e| RenderError::Selector {
                selector: css.clone(),
                reason: e.to_string(),
            })?;
            document.select(&selector).map(snapshot).collect()
        }
        Locator::LinkText(pattern) => {
            let wanted = pattern.trim().to_lowercase();
            anchors(document)
                .filter(|anchor| visible_text(anchor).to_lowercase() == wanted)
                .map(snapshot)
                .collect()
        }
        Locator::TextInAnchor(pattern) => {
            let wanted = pattern.to_lowercase();
            let mut seen = HashSet::new();
            document
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|element| own_text(element).to_lowercase().contains(&wanted))
                .filter_map(enclosing_anchor)
                .filter(|anchor| seen.insert(anchor.id()))
                .map(snapshot)
                .collect()
        }
    };

    Ok(handles)
}

fn anchors(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(is_anchor)
}

fn is_anchor(element: &ElementRef<'_>) -> bool {
    element.value().name().eq_ignore_ascii_case("a")
}

/// All descendant text with whitespace collapsed
fn visible_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the element's direct text children only
fn own_text(element: &ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let Some(node) = child.value().as_text() {
            text.push_str(node);
        }
    }
    text
}

fn enclosing_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if is_anchor(&element) {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| is_anchor(ancestor))
}

fn snapshot(element: ElementRef<'_>) -> ElementHandle {
    let value = element.value();
    ElementHandle {
        tag: value.name().to_string(),
        attrs: value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    }
}
