//! The ontology: all scenarios of a run and the relations between them.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use rasaeco_markdown::Element;
use rasaeco_shared::{Diagnostic, Diagnostics, Issue, Result};

use crate::cube::Cubelet;
use crate::definitions::Definitions;
use crate::document::{ParsedDocument, read_document};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A validated scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub identifier: String,
    pub title: String,
    pub contact: String,
    /// Source path relative to the scenarios directory.
    pub path: PathBuf,
    pub cubelets: Vec<Cubelet>,
    pub definitions: Definitions,
}

impl Scenario {
    /// Directory of the scenario, relative to the scenarios directory.
    pub fn location(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Relative path of the rendered page.
    pub fn rendered_path(&self, output_extension: &str) -> PathBuf {
        self.path.with_extension(output_extension)
    }

    /// File name of the region image, `volumetric_file` prefixed with the
    /// document stem. Scenarios sharing a directory each get their own.
    pub fn volumetric_name(&self, volumetric_file: &str) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        format!("{stem}.{volumetric_file}")
    }

    /// Relative path of the region image.
    pub fn volumetric_path(&self, volumetric_file: &str) -> PathBuf {
        self.location().join(self.volumetric_name(volumetric_file))
    }
}

/// A directed, labelled edge between two scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub nature: String,
}

/// The converted body of a scenario, kept next to the ontology for the
/// resolution and rewrite passes.
#[derive(Debug, Clone)]
pub struct ScenarioBody {
    pub identifier: String,
    pub body: Element,
}

/// Scenarios keyed by identifier, with relations indexed both ways.
///
/// Every relation endpoint names a scenario of the ontology.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    scenarios: Vec<Scenario>,
    index: HashMap<String, usize>,
    relations: Vec<Relation>,
    by_source: HashMap<String, Vec<usize>>,
    by_target: HashMap<String, Vec<usize>>,
}

impl Ontology {
    /// Assemble an ontology from scenarios and relations already known to
    /// be consistent.
    pub fn new(scenarios: Vec<Scenario>, relations: Vec<Relation>) -> Self {
        let index = scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| (s.identifier.clone(), i))
            .collect();

        let mut by_source: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_target: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, relation) in relations.iter().enumerate() {
            by_source.entry(relation.source.clone()).or_default().push(i);
            by_target.entry(relation.target.clone()).or_default().push(i);
        }

        Self {
            scenarios,
            index,
            relations,
            by_source,
            by_target,
        }
    }

    /// Scenarios in discovery order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, identifier: &str) -> Option<&Scenario> {
        self.index.get(identifier).map(|&i| &self.scenarios[i])
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Relations whose source is `identifier`, in declaration order.
    pub fn relations_from<'a>(&'a self, identifier: &str) -> impl Iterator<Item = &'a Relation> + use<'a> {
        Self::lookup(&self.by_source, &self.relations, identifier)
    }

    /// Relations whose target is `identifier`, in declaration order.
    pub fn relations_to<'a>(&'a self, identifier: &str) -> impl Iterator<Item = &'a Relation> + use<'a> {
        Self::lookup(&self.by_target, &self.relations, identifier)
    }

    fn lookup<'a>(
        index: &'a HashMap<String, Vec<usize>>,
        relations: &'a [Relation],
        identifier: &str,
    ) -> impl Iterator<Item = &'a Relation> + use<'a> {
        index
            .get(identifier)
            .into_iter()
            .flatten()
            .map(move |&i| &relations[i])
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds an [`Ontology`] in two passes with a gate after each.
///
/// Pass one reads every document and checks it on its own, including that
/// its identifier is not taken yet. Pass two checks that every relation
/// target exists. Problems are accumulated over all documents; a gate fails
/// with every message collected so far.
#[derive(Debug, Default)]
pub struct OntologyBuilder {
    documents: Vec<ParsedDocument>,
    index: HashMap<String, usize>,
    diagnostics: Diagnostics,
}

impl OntologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and check one document. `path` is relative to the scenarios
    /// directory and is used in messages and links.
    pub fn add_document(&mut self, path: impl Into<PathBuf>, text: &str) {
        let path = path.into();
        let Some(doc) = read_document(&path, text, &mut self.diagnostics) else {
            return;
        };

        if let Some(&existing) = self.index.get(&doc.meta.identifier) {
            warn!(identifier = %doc.meta.identifier, path = %path.display(), "duplicate identifier");
            self.diagnostics.push(Diagnostic::new(
                &path,
                Issue::DuplicateIdentifier {
                    identifier: doc.meta.identifier.clone(),
                    other: self.documents[existing].path.clone(),
                },
            ));
            return;
        }

        self.index
            .insert(doc.meta.identifier.clone(), self.documents.len());
        self.documents.push(doc);
    }

    /// Number of documents registered so far.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Record a problem found outside the builder, e.g. an unreadable file.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Run both gates and assemble the ontology.
    #[instrument(skip_all, fields(documents = self.documents.len()))]
    pub fn build(self) -> Result<(Ontology, Vec<ScenarioBody>)> {
        if !self.diagnostics.is_empty() {
            info!(errors = self.diagnostics.len(), "document checks failed");
        }
        self.diagnostics.into_gate()?;

        let mut dangling = Diagnostics::new();
        for doc in &self.documents {
            for relation in &doc.meta.relations {
                if !self.index.contains_key(&relation.target) {
                    dangling.push(Diagnostic::new(
                        &doc.path,
                        Issue::DanglingRelationTarget {
                            nature: relation.nature.clone(),
                            target: relation.target.clone(),
                        },
                    ));
                }
            }
        }
        if !dangling.is_empty() {
            info!(errors = dangling.len(), "relation checks failed");
        }
        dangling.into_gate()?;

        let mut scenarios = Vec::with_capacity(self.documents.len());
        let mut bodies = Vec::with_capacity(self.documents.len());
        let mut relations = Vec::new();
        for doc in self.documents {
            let ParsedDocument {
                path,
                meta,
                cubelets,
                definitions,
                body,
            } = doc;
            relations.extend(meta.relations.into_iter().map(|r| Relation {
                source: meta.identifier.clone(),
                target: r.target,
                nature: r.nature,
            }));
            bodies.push(ScenarioBody {
                identifier: meta.identifier.clone(),
                body,
            });
            scenarios.push(Scenario {
                identifier: meta.identifier,
                title: meta.title,
                contact: meta.contact,
                path,
                cubelets,
                definitions,
            });
        }

        let ontology = Ontology::new(scenarios, relations);
        debug!(
            scenarios = ontology.scenarios().len(),
            relations = ontology.relations().len(),
            "ontology built"
        );
        Ok((ontology, bodies))
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// A link from a page in directory `from` to the file `to`, both relative to
/// the scenarios directory, using `/` separators.
pub fn relative_href(from: &Path, to: &Path) -> String {
    let from: Vec<_> = normal_components(from).collect();
    let to: Vec<_> = normal_components(to).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(to[common..].iter().map(|c| c.to_string_lossy().into_owned()));
    parts.join("/")
}

/// The path with `/` separators, as used in links.
pub fn posix_path(path: &Path) -> String {
    normal_components(path)
        .map(|c| c.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn normal_components(path: &Path) -> impl Iterator<Item = &std::ffi::OsStr> {
    path.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part),
        _ => None,
    })
}
