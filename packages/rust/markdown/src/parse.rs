//! HTML5 parsing into the owned [`Node`] tree.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{ElementRef, Html};

use crate::tree::{Element, Node, VOID_ELEMENTS};

/// Matches a self-closing tag such as `<ref name="x"/>`.
static SELF_CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9_-]*)(\s[^<>]*?)?\s*/>").expect("self-closing regex")
});

/// Parse an HTML fragment (body content) into owned nodes.
///
/// HTML5 ignores the self-closing flag on non-void elements, which would make
/// `<ref name="x"/>` swallow the rest of its paragraph. Such tags are expanded
/// to an explicit open/close pair before parsing. Comments are dropped.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let expanded = expand_self_closing(html);
    let fragment = Html::parse_fragment(&expanded);
    convert_children(fragment.root_element())
}

fn expand_self_closing(html: &str) -> String {
    SELF_CLOSING_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let name = &caps[1];
            if VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
                return caps[0].to_string();
            }
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            format!("<{name}{attrs}></{name}>")
        })
        .into_owned()
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            nodes.push(Node::Element(convert_element(child_el)));
        } else if let scraper::Node::Text(text) = child.value() {
            let text: &str = text;
            // Adjacent text nodes are merged so sibling checks see one run.
            match nodes.last_mut() {
                Some(Node::Text(prev)) => prev.push_str(text),
                _ => nodes.push(Node::Text(text.to_string())),
            }
        }
    }
    nodes
}

fn convert_element(el: ElementRef<'_>) -> Element {
    let value = el.value();
    let mut element = Element::new(value.name());
    for (name, attr_value) in value.attrs() {
        element.attrs.push((name.to_string(), attr_value.to_string()));
    }
    element.children = convert_children(el);
    element
}
