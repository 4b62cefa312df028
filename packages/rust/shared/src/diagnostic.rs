//! Accumulated validation problems.
//!
//! Every stage of the pipeline collects [`Diagnostic`]s for all documents
//! before the run decides whether to continue. Across the crate boundary they
//! travel as plain strings, each prefixed with the offending document.

use std::path::{Path, PathBuf};

use crate::types::{Axis, Bound};

/// A single validation problem, independent of the document it was found in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Issue {
    #[error("No opening <rasaeco-meta> could be found.")]
    MissingOpenDelimiter,

    #[error("No closing </rasaeco-meta> could be found.")]
    MissingCloseDelimiter,

    #[error("Opening <rasaeco-meta> comes after closing </rasaeco-meta>.")]
    DelimiterOrder,

    #[error("A second <rasaeco-meta> block starts at line {line}; only one is allowed.")]
    DuplicateMetaBlock { line: usize },

    #[error("Failed to parse the JSON in <rasaeco-meta> at line {line}: {message}")]
    MalformedMetaSyntax { line: usize, message: String },

    #[error("The <rasaeco-meta> data does not match the expected schema: {}", .fields.join("; "))]
    SchemaMismatch { fields: Vec<String> },

    #[error("Invalid {bound} of a {axis} range: {value:?}")]
    UnknownAxisValue {
        axis: Axis,
        bound: Bound,
        value: String,
    },

    #[error("Invalid {axis} range: {first:?} comes after {last:?}")]
    InvertedRange {
        axis: Axis,
        first: String,
        last: String,
    },

    #[error("A <{tag}> lacks the `name` attribute")]
    MissingNameAttribute { tag: String },

    #[error("The {kind} {name:?} is declared more than once")]
    DuplicateDefinition { kind: &'static str, name: String },

    #[error("Identifier {identifier:?} conflicts with the file {}", .other.display())]
    DuplicateIdentifier { identifier: String, other: PathBuf },

    #[error(
        "The relation {nature:?} is invalid as the identifier of the target scenario can not be found: {target}"
    )]
    DanglingRelationTarget { nature: String, target: String },

    #[error("The reference {reference:?} points to an unknown scenario: {scenario}")]
    UnknownTargetScenario { reference: String, scenario: String },

    #[error("The reference {reference:?} points to an undefined definition {name:?} in the scenario {scenario}")]
    UndefinedReference {
        reference: String,
        name: String,
        scenario: String,
    },

    #[error("The model reference {reference:?} points to an undefined model {name:?} in the scenario {scenario}")]
    UndefinedModelReference {
        reference: String,
        name: String,
        scenario: String,
    },

    /// A collaborator (file system, markup converter) failed for this document.
    #[error("{message}")]
    Collaborator { message: String },
}

/// An [`Issue`] located in a document, optionally in one of its cubelets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub document: PathBuf,
    /// 1-based index of the cubelet the issue belongs to.
    pub cubelet: Option<usize>,
    pub issue: Issue,
}

impl Diagnostic {
    pub fn new(document: impl Into<PathBuf>, issue: Issue) -> Self {
        Self {
            document: document.into(),
            cubelet: None,
            issue,
        }
    }

    pub fn in_cubelet(document: impl Into<PathBuf>, cubelet: usize, issue: Issue) -> Self {
        Self {
            document: document.into(),
            cubelet: Some(cubelet),
            issue,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cubelet {
            Some(n) => write!(
                f,
                "In file {} and cubelet {n}: {}",
                self.document.display(),
                self.issue
            ),
            None => write!(f, "In file {}: {}", self.document.display(), self.issue),
        }
    }
}

/// Ordered collection of diagnostics gathered by one pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Attach every issue to `document` and record it.
    pub fn extend_issues(&mut self, document: &Path, issues: impl IntoIterator<Item = Issue>) {
        self.items
            .extend(issues.into_iter().map(|issue| Diagnostic::new(document, issue)));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Render every diagnostic to its human-readable message.
    pub fn messages(&self) -> Vec<String> {
        self.items.iter().map(ToString::to_string).collect()
    }

    /// Pass the stage gate: `Ok` if nothing was collected, otherwise a
    /// [`RasaecoError::Validation`](crate::RasaecoError::Validation) carrying
    /// every message.
    pub fn into_gate(self) -> crate::Result<()> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(crate::RasaecoError::validation(self.messages()))
        }
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
