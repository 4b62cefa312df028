//! Markdown-to-HTML conversion and the owned markup tree.
//!
//! This crate is the markup collaborator of the scenario core:
//! 1. [`markdown_to_html`] renders CommonMark via `pulldown-cmark`, passing
//!    the custom scenario tags through as raw HTML
//! 2. [`parse_fragment`] parses the HTML with `scraper` into an owned [`Node`] tree
//! 3. [`to_html`] serializes a (rewritten) tree back to a document

mod parse;
pub mod tree;

use pulldown_cmark::{Options, Parser};
use tracing::{debug, instrument};

pub use parse::parse_fragment;
pub use tree::{Descendants, Element, Node, fragment_to_html, to_html};

/// Render Markdown to HTML.
///
/// Tables and strikethrough are enabled on top of CommonMark. Inline and
/// block HTML, including the scenario tags, is passed through verbatim.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options);

    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

/// Convert a Markdown document into the body nodes of its markup tree.
#[instrument(skip_all, fields(len = markdown.len()))]
pub fn convert(markdown: &str) -> Vec<Node> {
    let html = markdown_to_html(markdown);
    let nodes = parse_fragment(&html);
    debug!(html_len = html.len(), nodes = nodes.len(), "markdown converted");
    nodes
}
