//! First-pass reading of a single scenario document.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use rasaeco_markdown::{Element, convert};
use rasaeco_shared::{Diagnostic, Diagnostics};

use crate::cube::Cubelet;
use crate::definitions::{Definitions, check_names, extract_definitions};
use crate::meta::{MetaBlock, excise, extract_meta};
use crate::normalize::{frame_block_tags, normalize};

/// A scenario document that got past metadata extraction.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Path relative to the scenarios directory.
    pub path: PathBuf,
    pub meta: MetaBlock,
    pub cubelets: Vec<Cubelet>,
    pub definitions: Definitions,
    /// The converted body, rooted at a `<body>` element.
    pub body: Element,
}

/// Read one document, recording its problems in `diagnostics`.
///
/// Returns `None` only when the metadata block cannot be extracted; anything
/// found after that is recorded while the document is still returned, so the
/// identifier takes part in duplicate detection. When a custom tag lacks its
/// name the definitions are not extracted.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_document(
    path: &Path,
    text: &str,
    diagnostics: &mut Diagnostics,
) -> Option<ParsedDocument> {
    let meta = match extract_meta(text) {
        Ok(meta) => meta,
        Err(issue) => {
            diagnostics.push(Diagnostic::new(path, issue));
            return None;
        }
    };

    let mut cubelets = Vec::with_capacity(meta.volumetric.len());
    for (i, entry) in meta.volumetric.iter().enumerate() {
        match Cubelet::from_entry(entry) {
            Ok(cubelet) => cubelets.push(cubelet),
            Err(issues) => diagnostics.extend(
                issues
                    .into_iter()
                    .map(|issue| Diagnostic::in_cubelet(path, i + 1, issue)),
            ),
        }
    }

    let markdown = frame_block_tags(&normalize(&excise(text, &meta.span)));
    let body = Element::new("body").with_children(convert(&markdown));

    let unnamed = check_names(&body);
    let definitions = if unnamed.is_empty() {
        let (definitions, duplicates) = extract_definitions(&body);
        diagnostics.extend_issues(path, duplicates);
        definitions
    } else {
        diagnostics.extend_issues(path, unnamed);
        Definitions::default()
    };

    debug!(
        identifier = %meta.identifier,
        cubelets = cubelets.len(),
        definitions = definitions.definitions.len(),
        models = definitions.models.len(),
        "document read"
    );

    Some(ParsedDocument {
        path: path.to_path_buf(),
        meta,
        cubelets,
        definitions,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(meta_volumetric: &str, body: &str) -> String {
        format!(
            "# Pumps\n\n<rasaeco-meta>\n{{\"identifier\": \"pumps\", \"title\": \"Pumps\", \
             \"contact\": \"c\", \"relations\": [], \"volumetric\": [{meta_volumetric}]}}\n\
             </rasaeco-meta>\n\n{body}"
        )
    }

    const GOOD_CUBELET: &str = r#"{"aspect_from": "cost", "aspect_to": "cost",
        "phase_from": "design", "phase_to": "design",
        "level_from": "site", "level_to": "site"}"#;

    #[test]
    fn reads_a_valid_document() {
        let text = scenario(GOOD_CUBELET, "A <def name=\"pump\">\n\npump\n\n</def> here.\n");
        let mut diagnostics = Diagnostics::new();
        let doc = read_document(Path::new("pumps.md"), &text, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());
        assert_eq!(doc.meta.identifier, "pumps");
        assert_eq!(doc.cubelets.len(), 1);
        assert!(doc.definitions.has_definition("pump"));
        assert_eq!(doc.body.find_all("rasaeco-meta").count(), 0);
        assert_eq!(doc.body.find_all("def").next().unwrap().text_content(), "pump");
    }

    #[test]
    fn block_tags_keep_all_their_paragraphs() {
        let body = "<model name=\"flow\">\n\nfirst paragraph\n\nsecond paragraph\n\n</model>\n\n\
                    A pump <def name=\"pump\">\n\nmoves water.\n\nIt has a motor.\n\n</def>\nAfter.\n";
        let text = scenario(GOOD_CUBELET, body);
        let mut diagnostics = Diagnostics::new();
        let doc = read_document(Path::new("pumps.md"), &text, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.messages());

        let model = doc.body.find_all("model").next().unwrap();
        assert_eq!(model.find_all("p").count(), 2);
        assert!(model.text_content().contains("second paragraph"));
        assert!(doc.definitions.has_model("flow"));

        let def = doc.body.find_all("def").next().unwrap();
        assert_eq!(def.find_all("p").count(), 2);
        assert!(def.text_content().contains("It has a motor."));
        assert!(doc.definitions.has_definition("pump"));

        let last = doc.body.find_all("p").last().unwrap();
        assert_eq!(last.text_content(), "After.");
    }

    #[test]
    fn meta_failure_stops_the_document() {
        let mut diagnostics = Diagnostics::new();
        assert!(read_document(Path::new("x.md"), "no meta here", &mut diagnostics).is_none());
        assert_eq!(
            diagnostics.messages(),
            vec!["In file x.md: No opening <rasaeco-meta> could be found."]
        );
    }

    #[test]
    fn cubelet_errors_are_numbered_from_one() {
        let bad = r#"{"aspect_from": "cost", "aspect_to": "cost",
            "phase_from": "operation", "phase_to": "design",
            "level_from": "site", "level_to": "moon"}"#;
        let text = scenario(&format!("{GOOD_CUBELET}, {bad}"), "Body.\n");
        let mut diagnostics = Diagnostics::new();
        let doc = read_document(Path::new("pumps.md"), &text, &mut diagnostics).unwrap();
        assert_eq!(doc.cubelets.len(), 1);
        let messages = diagnostics.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.starts_with("In file pumps.md and cubelet 2: ")));
    }

    #[test]
    fn unnamed_tags_skip_definition_extraction() {
        let text = scenario(
            GOOD_CUBELET,
            "<def>x</def> <def name=\"a\">1</def> <def name=\"a\">2</def>\n",
        );
        let mut diagnostics = Diagnostics::new();
        let doc = read_document(Path::new("pumps.md"), &text, &mut diagnostics).unwrap();
        assert!(doc.definitions.definitions.is_empty());
        assert_eq!(
            diagnostics.messages(),
            vec!["In file pumps.md: A <def> lacks the `name` attribute"]
        );
    }
}
