//! Scenario checking and rendering for rasaeco.
//!
//! This crate holds the domain logic: reading scenario documents, building
//! the ontology, resolving references and rewriting the bodies into pages.
//! [`pipeline::render_once`] ties it together into one batch run.

pub mod cube;
pub mod definitions;
pub mod document;
pub mod meta;
pub mod normalize;
pub mod ontology;
pub mod overview;
pub mod pipeline;
pub mod pluralize;
pub mod resolve;
pub mod rewrite;
pub mod volumetric;

pub use ontology::{Ontology, OntologyBuilder, Relation, Scenario, ScenarioBody};
pub use pipeline::{ProgressReporter, RenderSummary, SilentProgress, fingerprint, render_once};
