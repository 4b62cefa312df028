//! The ontology overview page.

use serde::Serialize;

use rasaeco_markdown::{Element, Node, to_html};
use rasaeco_shared::{RasaecoError, RenderConfig, Result};

use crate::ontology::{Ontology, posix_path};

/// Graph of the ontology as embedded in the overview page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub nodes: Vec<DatasetNode>,
    pub edges: Vec<DatasetEdge>,
}

/// A scenario, linked by its rendered page relative to the scenarios root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetNode {
    pub name: String,
    pub url: String,
}

/// A relation between the nodes at `source` and `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetEdge {
    pub source: usize,
    pub target: usize,
    pub label: String,
}

impl Dataset {
    /// Nodes follow the scenario order of the ontology; edges the relation
    /// order.
    pub fn from_ontology(ontology: &Ontology, config: &RenderConfig) -> Self {
        let scenarios = ontology.scenarios();
        let position = |identifier: &str| scenarios.iter().position(|s| s.identifier == identifier);

        let nodes = scenarios
            .iter()
            .map(|scenario| DatasetNode {
                name: scenario.title.clone(),
                url: posix_path(&scenario.rendered_path(&config.output_extension)),
            })
            .collect();

        let edges = ontology
            .relations()
            .iter()
            .filter_map(|relation| {
                Some(DatasetEdge {
                    source: position(&relation.source)?,
                    target: position(&relation.target)?,
                    label: relation.nature.clone(),
                })
            })
            .collect();

        Self { nodes, edges }
    }
}

/// Render the overview page: the dataset embedded as JSON for scripts, and
/// the same graph as plain lists.
pub fn render_overview_html(dataset: &Dataset) -> Result<String> {
    let json = serde_json::to_string_pretty(dataset)
        .map_err(|err| RasaecoError::markup(format!("failed to serialize the ontology: {err}")))?;
    // The JSON sits in a raw-text element and must not close it.
    let json = json.replace("</", "<\\/");

    let head = Element::new("head")
        .with_child(Element::new("meta").with_attr("charset", "utf-8"))
        .with_child(Element::new("title").with_text("Ontology"))
        .with_child(
            Element::new("style")
                .with_text("body { margin: 5%; font-family: sans-serif; }\nli { margin: 0.2em 0; }\n"),
        );

    let scenarios = dataset.nodes.iter().map(|node| {
        Node::from(
            Element::new("li")
                .with_child(Element::new("a").with_attr("href", &node.url).with_text(&node.name)),
        )
    });

    let relations: Vec<Node> = dataset
        .edges
        .iter()
        .filter_map(|edge| {
            let source = dataset.nodes.get(edge.source)?;
            let target = dataset.nodes.get(edge.target)?;
            let item = Element::new("li")
                .with_child(Element::new("a").with_attr("href", &source.url).with_text(&source.name))
                .with_text(format!(" {} ", edge.label))
                .with_child(Element::new("a").with_attr("href", &target.url).with_text(&target.name));
            Some(Node::from(item))
        })
        .collect();

    let mut body = Element::new("body")
        .with_child(Element::new("h1").with_text("Ontology"))
        .with_child(Element::new("h2").with_text("Scenarios"))
        .with_child(Element::new("ul").with_attr("class", "scenarios").with_children(scenarios));
    if !relations.is_empty() {
        body = body
            .with_child(Element::new("h2").with_text("Relations"))
            .with_child(Element::new("ul").with_attr("class", "relations").with_children(relations));
    }
    body = body.with_child(
        Element::new("script")
            .with_attr("type", "application/json")
            .with_attr("id", "dataset")
            .with_text(json),
    );

    Ok(to_html(&Element::new("html").with_child(head).with_child(body)))
}
