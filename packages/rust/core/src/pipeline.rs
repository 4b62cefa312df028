//! End-to-end `once` pipeline: discover → read & check → build ontology →
//! resolve references → rewrite → write.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use rasaeco_markdown::to_html;
use rasaeco_shared::{AppConfig, Diagnostic, Issue, RasaecoError, RenderConfig, Result};

use crate::ontology::OntologyBuilder;
use crate::overview::{Dataset, render_overview_html};
use crate::pluralize::Pluralizer;
use crate::resolve::resolve_references;
use crate::rewrite::Rewriter;
use crate::volumetric::render_volumetric_svg;

/// Result of a successful run.
#[derive(Debug)]
pub struct RenderSummary {
    /// Number of scenarios rendered.
    pub scenario_count: usize,
    /// Number of relations in the ontology.
    pub relation_count: usize,
    /// Every file written, in write order.
    pub written: Vec<PathBuf>,
    /// Path of the ontology overview.
    pub overview: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a scenario page has been rendered.
    fn scenario_rendered(&self, identifier: &str, current: usize, total: usize);
    /// Called when the run completes successfully.
    fn done(&self, summary: &RenderSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn scenario_rendered(&self, _identifier: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RenderSummary) {}
}

/// Render every scenario below `scenarios_dir`, plus the overview.
///
/// Problems in the scenarios are accumulated and reported together as
/// [`RasaecoError::Validation`]. Nothing is written unless every check
/// passed, so the output of an earlier run survives a failed one.
#[instrument(skip_all, fields(dir = %scenarios_dir.display()))]
pub fn render_once(
    scenarios_dir: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<RenderSummary> {
    let start = Instant::now();
    let render = &config.render;

    // --- Phase 1: Discovery ---
    progress.phase("Discovering scenarios");
    let paths = discover_scenarios(scenarios_dir, &render.scenario_extension)?;
    info!(count = paths.len(), "scenarios discovered");

    // --- Phase 2: Read and check documents, build the ontology ---
    progress.phase("Checking scenarios");
    let mut builder = OntologyBuilder::new();
    for path in &paths {
        let relative = path.strip_prefix(scenarios_dir).unwrap_or(path);
        match fs::read_to_string(path) {
            Ok(text) => builder.add_document(relative, &text),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read scenario");
                builder.report(Diagnostic::new(
                    relative,
                    Issue::Collaborator {
                        message: format!("Failed to read the scenario: {err}"),
                    },
                ));
            }
        }
    }
    let (ontology, bodies) = builder.build()?;

    // --- Phase 3: References ---
    progress.phase("Resolving references");
    resolve_references(&ontology, &bodies).into_gate()?;

    // --- Phase 4: Rewrite, all in memory ---
    progress.phase("Rendering");
    let pluralizer = Pluralizer::new();
    let rewriter = Rewriter::new(&ontology, render, &pluralizer);
    let total = bodies.len();

    let mut artifacts: Vec<(PathBuf, String)> = Vec::with_capacity(2 * total + 1);
    for (i, doc) in bodies.iter().enumerate() {
        let Some(scenario) = ontology.scenario(&doc.identifier) else {
            continue;
        };
        let page = rewriter.rewrite(scenario, &doc.body);
        artifacts.push((
            scenarios_dir.join(scenario.rendered_path(&render.output_extension)),
            to_html(&page),
        ));
        artifacts.push((
            scenarios_dir.join(scenario.volumetric_path(&render.volumetric_file)),
            render_volumetric_svg(scenario),
        ));
        progress.scenario_rendered(&scenario.identifier, i + 1, total);
    }

    let overview = scenarios_dir.join(&render.ontology_file);
    let dataset = Dataset::from_ontology(&ontology, render);
    artifacts.push((overview.clone(), render_overview_html(&dataset)?));

    // --- Phase 5: Write ---
    progress.phase("Writing");
    let mut written = Vec::with_capacity(artifacts.len());
    for (path, contents) in artifacts {
        fs::write(&path, contents).map_err(|e| RasaecoError::io(&path, e))?;
        debug!(path = %path.display(), "written");
        written.push(path);
    }

    let summary = RenderSummary {
        scenario_count: ontology.scenarios().len(),
        relation_count: ontology.relations().len(),
        written,
        overview,
        elapsed: start.elapsed(),
    };

    info!(
        scenarios = summary.scenario_count,
        relations = summary.relation_count,
        files = summary.written.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "render complete"
    );

    progress.done(&summary);
    Ok(summary)
}

/// All files with the scenario extension below `root`, sorted by path.
pub fn discover_scenarios(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(RasaecoError::config(format!(
            "the scenarios directory does not exist: {}",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RasaecoError::io(path, e.into())
        })?;
        let matches = entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension);
        if matches {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// SHA-256 over the paths and contents of all scenario files. Changes when a
/// scenario is added, removed, renamed or edited; rendered output does not
/// affect it.
pub fn fingerprint(scenarios_dir: &Path, config: &RenderConfig) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in discover_scenarios(scenarios_dir, &config.scenario_extension)? {
        let contents = fs::read(&path).map_err(|e| RasaecoError::io(&path, e))?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
