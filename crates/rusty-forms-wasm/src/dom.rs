// File: src/dom.rs
// Purpose: Dom implementation over the browser document

use rusty_forms::Dom;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlInputElement, HtmlSelectElement, HtmlTemplateElement,
    HtmlTextAreaElement, ScrollBehavior, ScrollToOptions, Window,
};

use crate::console_warn;

/// The live page document.
///
/// `ref:name` selectors are rewritten to `[data-ref="name"]` before they
/// reach the browser. Other selectors are passed through as CSS.
#[derive(Debug, Clone)]
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    /// The current window's document, if running in a page
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self::new(window, document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Parse rendered markup into the one element that will be inserted.
    ///
    /// Markup that is a single element is used as is. Anything else (plain
    /// text, several siblings) is wrapped in a `span`, so the returned
    /// element always owns everything the markup produced.
    pub fn marker_from(&self, markup: &str) -> Option<Element> {
        let template = self
            .document
            .create_element("template")
            .ok()?
            .dyn_into::<HtmlTemplateElement>()
            .ok()?;
        template.set_inner_html(markup.trim());
        let content = template.content();

        if content.child_element_count() == 1 && content.child_nodes().length() == 1 {
            return content.first_element_child();
        }

        let wrapper = self.document.create_element("span").ok()?;
        wrapper.append_with_node_1(&content).ok()?;
        Some(wrapper)
    }
}

/// Rewrite `ref:` shorthand inside a selector list into attribute selectors
pub fn to_css(selector: &str) -> String {
    selector
        .split(',')
        .map(|part| {
            let part = part.trim();
            match part.strip_prefix("ref:") {
                Some(name) => format!("[data-ref=\"{}\"]", name),
                None => part.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prefix every alternative of `selector` with the ancestor chain
fn descendant_selector(selector: &str, within: &[&str]) -> String {
    if within.is_empty() {
        return to_css(selector);
    }

    let chain = within.iter().map(|s| to_css(s)).collect::<Vec<_>>().join(" ");

    to_css(selector)
        .split(", ")
        .map(|part| format!("{} {}", chain, part))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Dom for WebDom {
    type Handle = Element;

    fn query(&self, selector: &str, within: &[&str]) -> Vec<Element> {
        let css = descendant_selector(selector, within);

        let list = match self.document.query_selector_all(&css) {
            Ok(list) => list,
            Err(_) => {
                console_warn(&format!("invalid selector: {}", css));
                return Vec::new();
            }
        };

        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(&to_css(selector)).unwrap_or(false)
    }

    fn attr(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            return input.value();
        }
        if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            return area.value();
        }
        if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            return select.value();
        }
        node.text_content().unwrap_or_default()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn siblings(&self, node: &Element, selector: &str) -> Vec<Element> {
        let Some(parent) = node.parent_element() else {
            return Vec::new();
        };
        let css = to_css(selector);
        let children = parent.children();

        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|child| child != node && child.matches(&css).unwrap_or(false))
            .collect()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(&to_css(selector)).ok().flatten()
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        if node.class_list().add_1(class).is_err() {
            console_warn(&format!("cannot add class {:?}", class));
        }
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        if node.class_list().remove_1(class).is_err() {
            console_warn(&format!("cannot remove class {:?}", class));
        }
    }

    fn insert_after(&mut self, node: &Element, markup: &str) -> Option<Element> {
        let marker = self.marker_from(markup)?;
        node.after_with_node_1(&marker).ok()?;
        Some(marker)
    }

    fn append(&mut self, parent: &Element, markup: &str) -> Option<Element> {
        let marker = self.marker_from(markup)?;
        parent.append_with_node_1(&marker).ok()?;
        Some(marker)
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn empty(&mut self, node: &Element) {
        node.set_inner_html("");
    }

    fn offset_top(&self, node: &Element) -> f64 {
        let scrolled = self.window.scroll_y().unwrap_or(0.0);
        node.get_bounding_client_rect().top() + scrolled
    }

    fn scroll_to(&mut self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_selectors_become_attribute_selectors() {
        assert_eq!(to_css("ref:form"), "[data-ref=\"form\"]");
        assert_eq!(to_css("ref:a, .b"), "[data-ref=\"a\"], .b");
        assert_eq!(to_css("#checkout"), "#checkout");
    }

    #[test]
    fn test_descendant_chain_applies_to_each_alternative() {
        assert_eq!(
            descendant_selector("ref:formField, select", &["#page", "ref:form"]),
            "#page [data-ref=\"form\"] [data-ref=\"formField\"], #page [data-ref=\"form\"] select"
        );
        assert_eq!(descendant_selector("input", &[]), "input");
    }
}
