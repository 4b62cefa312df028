//! Resolution of `ref` and `modelref` tags against the ontology.

use tracing::instrument;

use rasaeco_shared::{Diagnostic, Diagnostics, Issue, TagKind};

use crate::ontology::{Ontology, Scenario, ScenarioBody};

/// Where a reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A name in the referring scenario.
    Local(&'a str),
    /// A name in another scenario, written `scenario#name`.
    Remote { scenario: &'a str, name: &'a str },
}

impl<'a> Target<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Local(name) | Self::Remote { name, .. } => name,
        }
    }
}

/// Split a reference at its first `#`. An empty scenario part (`#name`)
/// means the referring scenario.
pub fn split_reference(reference: &str) -> Target<'_> {
    match reference.split_once('#') {
        Some(("", name)) => Target::Local(name),
        Some((scenario, name)) => Target::Remote { scenario, name },
        None => Target::Local(reference),
    }
}

/// Check every reference in every body. All problems across all documents
/// are returned together.
#[instrument(skip_all, fields(documents = bodies.len()))]
pub fn resolve_references(ontology: &Ontology, bodies: &[ScenarioBody]) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for doc in bodies {
        let Some(scenario) = ontology.scenario(&doc.identifier) else {
            continue;
        };

        for el in doc.body.descendants() {
            let kind = match TagKind::from_tag(&el.name) {
                Some(kind @ (TagKind::Reference | TagKind::ModelReference)) => kind,
                _ => continue,
            };
            let Some(reference) = el.attr("name") else { continue };

            if let Err(issue) = check_reference(ontology, scenario, kind, reference) {
                diagnostics.push(Diagnostic::new(&scenario.path, issue));
            }
        }
    }

    diagnostics
}

fn check_reference(
    ontology: &Ontology,
    scenario: &Scenario,
    kind: TagKind,
    reference: &str,
) -> Result<(), Issue> {
    let target = split_reference(reference);
    let referred = match target {
        Target::Local(_) => scenario,
        Target::Remote { scenario: id, .. } => {
            ontology
                .scenario(id)
                .ok_or_else(|| Issue::UnknownTargetScenario {
                    reference: reference.to_string(),
                    scenario: id.to_string(),
                })?
        }
    };

    let name = target.name();
    match kind {
        TagKind::ModelReference if !referred.definitions.has_model(name) => {
            Err(Issue::UndefinedModelReference {
                reference: reference.to_string(),
                name: name.to_string(),
                scenario: referred.identifier.clone(),
            })
        }
        TagKind::Reference if !referred.definitions.has_definition(name) => {
            Err(Issue::UndefinedReference {
                reference: reference.to_string(),
                name: name.to_string(),
                scenario: referred.identifier.clone(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::OntologyBuilder;

    fn scenario_text(identifier: &str, body: &str) -> String {
        format!(
            "<rasaeco-meta>{{\"identifier\": \"{identifier}\", \"title\": \"{identifier}\", \
             \"contact\": \"c\", \"relations\": [], \"volumetric\": []}}</rasaeco-meta>\n\n{body}"
        )
    }

    fn build(docs: &[(&str, &str)]) -> (Ontology, Vec<ScenarioBody>) {
        let mut builder = OntologyBuilder::new();
        for (identifier, body) in docs {
            builder.add_document(format!("{identifier}/scenario.md"), &scenario_text(identifier, body));
        }
        builder.build().unwrap()
    }

    #[test]
    fn split_reference_forms() {
        assert_eq!(split_reference("pump"), Target::Local("pump"));
        assert_eq!(split_reference("#pump"), Target::Local("pump"));
        assert_eq!(
            split_reference("other#pump"),
            Target::Remote {
                scenario: "other",
                name: "pump"
            }
        );
        assert_eq!(
            split_reference("other#a#b"),
            Target::Remote {
                scenario: "other",
                name: "a#b"
            }
        );
    }

    #[test]
    fn resolved_references_pass() {
        let (ontology, bodies) = build(&[
            ("a", "A <def name=\"pump\">pump</def> with <ref name=\"pump\"/>s and <ref name=\"b#valve\"/>.\n"),
            ("b", "<def name=\"valve\">valve</def> <model name=\"flow\">flow</model> <modelref name=\"flow\"/> <modelref name=\"a#nothing\"/>\n"),
        ]);
        let diagnostics = resolve_references(&ontology, &bodies);
        assert_eq!(
            diagnostics.messages(),
            vec![
                "In file b/scenario.md: The model reference \"a#nothing\" points to an undefined model \"nothing\" in the scenario a"
            ]
        );
    }

    #[test]
    fn unknown_scenario_and_undefined_names() {
        let (ontology, bodies) = build(&[
            ("a", "<ref name=\"ghost#pump\"/> <ref name=\"missing\"/> <modelref name=\"pump\"/> <def name=\"pump\">p</def>\n"),
        ]);
        let messages = resolve_references(&ontology, &bodies).messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            "In file a/scenario.md: The reference \"ghost#pump\" points to an unknown scenario: ghost"
        );
        assert!(messages[1].contains("undefined definition \"missing\""));
        // A definition does not satisfy a model reference.
        assert!(messages[2].contains("undefined model \"pump\""));
    }

    #[test]
    fn errors_from_all_documents_are_collected() {
        let (ontology, bodies) = build(&[
            ("a", "<ref name=\"x\"/>\n"),
            ("b", "<ref name=\"y\"/>\n"),
        ]);
        let messages = resolve_references(&ontology, &bodies).messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("In file a/scenario.md"));
        assert!(messages[1].starts_with("In file b/scenario.md"));
    }
}
