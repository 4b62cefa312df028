//! Rewriting of a validated scenario body into a standalone HTML page.
//!
//! The rewrite runs as a fixed sequence of passes, each consuming a tree and
//! returning a new one:
//!
//! 1. drop residual metadata blocks
//! 2. `def` / `model` become titled, anchored sections
//! 3. `ref` / `modelref` become links
//! 4. `phase` / `level` become highlighted spans with numbered anchors
//! 5. the phase and level indices are appended
//! 6. the `<head>` is built
//! 7. the page header (back-link, title, contact, image, relations) is
//!    prepended, item by item, to the front of the body
//!
//! Names have been checked beforehand, so a missing `name` is rendered as an
//! empty name rather than reported.

use std::path::Path;

use rasaeco_markdown::{Element, Node};
use rasaeco_shared::{META_TAG, RenderConfig, TagKind};

use crate::ontology::{Ontology, Scenario, relative_href};
use crate::pluralize::Pluralizer;
use crate::resolve::{Target, split_reference};

const STYLESHEET: &str = "
body {
    margin: 5%;
    padding: 1%;
    border: 1px solid black;
    font-family: sans-serif;
}

a.anchor {
    text-decoration: none;
    font-size: x-small;
    margin-right: 1em;
}

span.phase {
    background-color: #eefbfb;
}

span.level {
    background-color: #eefbee;
}

section.relations {
    background-color: #f8f8f8;
    padding: 0.5em 1em;
    margin-bottom: 1em;
}

img.volumetric {
    border: 1px solid #eeeeee;
    padding: 10px;
}

pre {
    background-color: #eeeefb;
    padding: 1em;
}
";

/// An anchor left by a `phase` or `level` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MarkerAnchor {
    id: String,
    name: String,
}

/// Rewrites scenario bodies into pages. Holds no per-document state.
pub struct Rewriter<'a> {
    ontology: &'a Ontology,
    config: &'a RenderConfig,
    pluralizer: &'a Pluralizer,
}

impl<'a> Rewriter<'a> {
    pub fn new(ontology: &'a Ontology, config: &'a RenderConfig, pluralizer: &'a Pluralizer) -> Self {
        Self {
            ontology,
            config,
            pluralizer,
        }
    }

    /// Produce the `<html>` page of `scenario` from its converted `body`.
    pub fn rewrite(&self, scenario: &Scenario, body: &Element) -> Element {
        let body = strip_meta(body.clone());
        let body = map_elements(body, &mut rewrite_declaration);
        let body = self.rewrite_references(scenario, body);

        let mut phases = Vec::new();
        let mut levels = Vec::new();
        let mut body = map_elements(body, &mut |el| match TagKind::from_tag(&el.name) {
            Some(TagKind::Phase) => rewrite_marker(el, "phase", &mut phases),
            Some(TagKind::Level) => rewrite_marker(el, "level", &mut levels),
            _ => el,
        });

        append_index(&mut body, "Phase Index", &phases);
        append_index(&mut body, "Level Index", &levels);

        let head = self.head(scenario);
        let body = self.prepend_header(scenario, body);

        Element::new("html").with_child(head).with_child(body)
    }

    // -- references ---------------------------------------------------------

    fn rewrite_references(&self, scenario: &Scenario, mut el: Element) -> Element {
        let mut children = Vec::with_capacity(el.children.len());
        let mut nodes = std::mem::take(&mut el.children).into_iter().peekable();

        while let Some(node) = nodes.next() {
            let child = match node {
                Node::Element(child) => child,
                text => {
                    children.push(text);
                    continue;
                }
            };

            let kind = match TagKind::from_tag(&child.name) {
                Some(kind @ (TagKind::Reference | TagKind::ModelReference)) => kind,
                _ => {
                    children.push(self.rewrite_references(scenario, child).into());
                    continue;
                }
            };

            // A bare reference directly followed by `s` reads as a plural.
            let suffix = if child.has_content() {
                None
            } else {
                nodes.next_if(|next| matches!(next, Node::Text(text) if starts_with_plural_s(text)))
            };

            children.push(self.reference_link(scenario, kind, child, suffix.is_some()).into());
            if let Some(Node::Text(text)) = suffix {
                if text.len() > 1 {
                    children.push(Node::Text(text[1..].to_string()));
                }
            }
        }

        el.children = children;
        el
    }

    fn reference_link(&self, scenario: &Scenario, kind: TagKind, el: Element, plural: bool) -> Element {
        let (prefix, class) = match kind {
            TagKind::ModelReference => ("model", "modelref"),
            _ => ("def", "ref"),
        };
        let reference = el.attr("name").unwrap_or_default().to_string();
        let target = split_reference(&reference);
        let name = target.name();

        let (href, remote) = match target {
            Target::Local(_) => (format!("#{prefix}-{name}"), None),
            Target::Remote { scenario: id, .. } => match self.ontology.scenario(id) {
                Some(other) => {
                    let page = other.rendered_path(&self.config.output_extension);
                    let path = relative_href(scenario.location(), &page);
                    (format!("{path}#{prefix}-{name}"), Some(id))
                }
                None => (format!("#{prefix}-{name}"), None),
            },
        };

        let link = Element::new("a").with_attr("href", href).with_attr("class", class);
        if el.has_content() {
            return link.with_children(el.children);
        }

        let mut text = name.replace('_', " ");
        if plural {
            text = self.pluralizer.plural(&text);
        }
        let link = link.with_text(text);
        match remote {
            Some(id) => link
                .with_text(" (from ")
                .with_child(Element::new("code").with_text(id))
                .with_text(")"),
            None => link,
        }
    }

    // -- head and header ----------------------------------------------------

    fn head(&self, scenario: &Scenario) -> Element {
        Element::new("head")
            .with_child(Element::new("meta").with_attr("charset", "utf-8"))
            .with_child(Element::new("title").with_text(&scenario.title))
            .with_child(Element::new("style").with_text(STYLESHEET))
    }

    fn prepend_header(&self, scenario: &Scenario, mut body: Element) -> Element {
        let back = relative_href(scenario.location(), Path::new(&self.config.ontology_file));
        let mut header: Vec<Node> = vec![
            Element::new("a")
                .with_attr("href", back)
                .with_attr("class", "back")
                .with_text("Back to ontology")
                .into(),
            Element::new("h1").with_text(&scenario.title).into(),
            Element::new("p")
                .with_attr("class", "contact")
                .with_text(format!("Contact: {}", scenario.contact))
                .into(),
            Element::new("img")
                .with_attr("src", scenario.volumetric_name(&self.config.volumetric_file))
                .with_attr("class", "volumetric")
                .with_attr("alt", format!("Volumetric extent of {}", scenario.title))
                .into(),
        ];

        let incoming: Vec<Element> = self
            .ontology
            .relations_to(&scenario.identifier)
            .filter_map(|relation| {
                let source = self.ontology.scenario(&relation.source)?;
                Some(
                    Element::new("li")
                        .with_child(self.scenario_link(scenario, source))
                        .with_text(format!(" {} {}", relation.nature, scenario.title)),
                )
            })
            .collect();
        if !incoming.is_empty() {
            header.push(relations_section("Relations from Other Scenarios", incoming).into());
        }

        let outgoing: Vec<Element> = self
            .ontology
            .relations_from(&scenario.identifier)
            .filter_map(|relation| {
                let target = self.ontology.scenario(&relation.target)?;
                Some(
                    Element::new("li")
                        .with_text(format!("{} {} ", scenario.title, relation.nature))
                        .with_child(self.scenario_link(scenario, target)),
                )
            })
            .collect();
        if !outgoing.is_empty() {
            header.push(relations_section("Relations to Other Scenarios", outgoing).into());
        }

        for node in header {
            body.children.insert(0, node);
        }
        body
    }

    fn scenario_link(&self, from: &Scenario, to: &Scenario) -> Element {
        let page = to.rendered_path(&self.config.output_extension);
        Element::new("a")
            .with_attr("href", relative_href(from.location(), &page))
            .with_text(&to.title)
    }
}

fn relations_section(title: &str, items: Vec<Element>) -> Element {
    Element::new("section")
        .with_attr("class", "relations")
        .with_child(Element::new("h2").with_text(title))
        .with_child(Element::new("ul").with_children(items.into_iter().map(Node::from)))
}

/// Whether `text` starts with an `s` that ends the word.
fn starts_with_plural_s(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some('s') && chars.next().is_none_or(|c| !c.is_alphanumeric())
}

// ---------------------------------------------------------------------------
// Tree passes
// ---------------------------------------------------------------------------

/// Apply `f` to `el` and then, recursively, to every element child of the
/// result.
fn map_elements<F>(el: Element, f: &mut F) -> Element
where
    F: FnMut(Element) -> Element,
{
    let mut el = f(el);
    el.children = std::mem::take(&mut el.children)
        .into_iter()
        .map(|node| match node {
            Node::Element(child) => Node::Element(map_elements(child, f)),
            text => text,
        })
        .collect();
    el
}

fn strip_meta(mut el: Element) -> Element {
    el.children = std::mem::take(&mut el.children)
        .into_iter()
        .filter_map(|node| match node {
            Node::Element(child) if child.name == META_TAG => None,
            Node::Element(child) => Some(Node::Element(strip_meta(child))),
            text => Some(text),
        })
        .collect();
    el
}

fn rewrite_declaration(el: Element) -> Element {
    let (class, prefix) = match TagKind::from_tag(&el.name) {
        Some(TagKind::Definition) => ("definition", "def"),
        Some(TagKind::Model) => ("model", "model"),
        _ => return el,
    };
    let name = el.attr("name").unwrap_or_default();
    let title = if prefix == "def" {
        name.replace('_', " ")
    } else {
        name.to_string()
    };
    let anchor = format!("{prefix}-{name}");

    let heading = Element::new("h3")
        .with_attr("id", &anchor)
        .with_child(
            Element::new("a")
                .with_attr("href", format!("#{anchor}"))
                .with_attr("class", "anchor")
                .with_text("🔗"),
        )
        .with_text(title);

    Element::new("div")
        .with_attr("class", class)
        .with_child(heading)
        .with_children(el.children)
}

fn rewrite_marker(el: Element, class: &str, anchors: &mut Vec<MarkerAnchor>) -> Element {
    let name = el.attr("name").unwrap_or_default().to_string();
    let id = format!("{class}-anchor-{}", anchors.len() + 1);

    let span = Element::new("span")
        .with_attr("class", class)
        .with_attr("data-text", &name)
        .with_child(Element::new("a").with_attr("id", &id))
        .with_children(el.children)
        .with_child(Element::new("sup").with_text(&name));

    anchors.push(MarkerAnchor { id, name });
    span
}

fn append_index(body: &mut Element, title: &str, anchors: &[MarkerAnchor]) {
    if anchors.is_empty() {
        return;
    }
    let items = anchors.iter().map(|anchor| {
        Node::from(
            Element::new("li").with_child(
                Element::new("a")
                    .with_attr("href", format!("#{}", anchor.id))
                    .with_text(&anchor.name),
            ),
        )
    });
    body.children.push(Element::new("h2").with_text(title).into());
    body.children.push(Element::new("ul").with_children(items).into());
}
