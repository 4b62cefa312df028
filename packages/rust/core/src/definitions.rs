//! Definitions and models declared in a scenario body.

use std::collections::BTreeSet;

use rasaeco_markdown::Element;
use rasaeco_shared::{Issue, TagKind};

/// Names declared by one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    pub definitions: BTreeSet<String>,
    pub models: BTreeSet<String>,
}

impl Definitions {
    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains(name)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains(name)
    }
}

/// Report every custom tag in `body` that lacks a `name` attribute.
pub fn check_names(body: &Element) -> Vec<Issue> {
    body.descendants()
        .filter(|el| TagKind::from_tag(&el.name).is_some() && el.attr("name").is_none())
        .map(|el| Issue::MissingNameAttribute {
            tag: el.name.clone(),
        })
        .collect()
}

/// Collect the names of all `def` and `model` tags.
///
/// Names must be unique per kind within a scenario; every repeat is reported.
/// Tags without a name are skipped, [`check_names`] reports them.
pub fn extract_definitions(body: &Element) -> (Definitions, Vec<Issue>) {
    let mut found = Definitions::default();
    let mut issues = Vec::new();

    for el in body.descendants() {
        let (set, kind) = match TagKind::from_tag(&el.name) {
            Some(TagKind::Definition) => (&mut found.definitions, "definition"),
            Some(TagKind::Model) => (&mut found.models, "model"),
            _ => continue,
        };
        let Some(name) = el.attr("name") else { continue };
        if !set.insert(name.to_string()) {
            issues.push(Issue::DuplicateDefinition {
                kind,
                name: name.to_string(),
            });
        }
    }

    (found, issues)
}
