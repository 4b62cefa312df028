//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use rasaeco_core::{ProgressReporter, RenderSummary, fingerprint, render_once};
use rasaeco_shared::{AppConfig, RasaecoError, init_config, load_config};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// rasaeco: check and render a scenario ontology.
#[derive(Parser)]
#[command(
    name = "rasaeco",
    version,
    about = "Check scenario documents and render them, with their ontology, to HTML.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Explicit config file; overrides the lookup next to the scenarios and
    /// in the home directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render the scenarios and the ontology once.
    Once {
        /// Directory containing the scenario documents.
        #[arg(short, long)]
        scenarios_dir: PathBuf,
    },

    /// Re-render the scenarios and the ontology whenever a scenario changes.
    Continuously {
        /// Directory containing the scenario documents.
        #[arg(short, long)]
        scenarios_dir: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Also consider the config file of this scenarios directory.
        #[arg(short, long)]
        scenarios_dir: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "rasaeco=info",
        1 => "rasaeco=debug",
        _ => "rasaeco=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let explicit = cli.config.as_deref();
    match cli.command {
        Command::Once { scenarios_dir } => cmd_once(&scenarios_dir, explicit).await,
        Command::Continuously { scenarios_dir } => {
            cmd_continuously(&scenarios_dir, explicit).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show { scenarios_dir } => {
                cmd_config_show(explicit, scenarios_dir.as_deref()).await
            }
        },
    }
}

async fn cmd_once(scenarios_dir: &Path, explicit: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(explicit, Some(scenarios_dir))?;
    let reporter = CliProgress::new();

    match render_once(scenarios_dir, &config, &reporter) {
        Ok(summary) => {
            print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ RasaecoError::Validation { .. }) => {
            drop(reporter);
            print_errors(&err);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).wrap_err("rendering failed"),
    }
}

async fn cmd_continuously(scenarios_dir: &Path, explicit: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(explicit, Some(scenarios_dir))?;
    let debounce = Duration::from_millis(config.watch.debounce_ms);

    let (tx, mut changes) = mpsc::unbounded_channel();
    let extension = config.render.scenario_extension.clone();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| match event {
        Ok(event) if is_scenario_change(&event, &extension) => {
            let _ = tx.send(());
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "file watcher error"),
    })
    .wrap_err("failed to start the file watcher")?;
    watcher
        .watch(scenarios_dir, RecursiveMode::Recursive)
        .wrap_err_with(|| format!("failed to watch {}", scenarios_dir.display()))?;

    println!(
        "Watching {} for changes. Press Ctrl-C to stop.",
        scenarios_dir.display()
    );

    let mut last_rendered = render_if_changed(scenarios_dir, &config, None).await?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped.");
                return Ok(ExitCode::SUCCESS);
            }
            change = changes.recv() => {
                if change.is_none() {
                    warn!("file watcher stopped");
                    return Ok(ExitCode::FAILURE);
                }
                // Let a burst of events (editor save, checkout) settle.
                while let Ok(Some(())) = tokio::time::timeout(debounce, changes.recv()).await {}
                last_rendered = render_if_changed(scenarios_dir, &config, last_rendered).await?;
            }
        }
    }
}

/// Whether `event` touches a scenario file. Reads are ignored, since every
/// render reads all the scenarios.
fn is_scenario_change(event: &Event, extension: &str) -> bool {
    !matches!(event.kind, EventKind::Access(_))
        && event
            .paths
            .iter()
            .any(|path| path.extension().is_some_and(|ext| ext == extension))
}

/// Render unless the scenario files still have the fingerprint of the last
/// render. Returns the fingerprint now on disk.
async fn render_if_changed(
    scenarios_dir: &Path,
    config: &AppConfig,
    last_rendered: Option<String>,
) -> Result<Option<String>> {
    let current = match fingerprint(scenarios_dir, &config.render) {
        Ok(current) => current,
        Err(err) => {
            warn!(error = %err, "failed to scan the scenarios");
            return Ok(last_rendered);
        }
    };
    if last_rendered.as_deref() == Some(current.as_str()) {
        debug!("scenario contents unchanged, render skipped");
        return Ok(last_rendered);
    }

    info!(dir = %scenarios_dir.display(), "scenarios changed, re-rendering");
    render_in_background(scenarios_dir, config).await?;
    Ok(Some(current))
}

/// One run on the blocking pool. Failed runs are reported and leave the
/// previous output in place.
async fn render_in_background(scenarios_dir: &Path, config: &AppConfig) -> Result<()> {
    let dir = scenarios_dir.to_path_buf();
    let config = config.clone();
    let outcome =
        tokio::task::spawn_blocking(move || render_once(&dir, &config, &CliProgress::new()))
            .await
            .wrap_err("render task panicked")?;

    match outcome {
        Ok(summary) => print_summary(&summary),
        Err(err) => {
            print_errors(&err);
            eprintln!("The previous output was kept.");
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn cmd_config_show(explicit: Option<&Path>, scenarios_dir: Option<&Path>) -> Result<ExitCode> {
    let config: AppConfig = load_config(explicit, scenarios_dir)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_summary(summary: &RenderSummary) {
    println!(
        "Rendered {} scenario(s) with {} relation(s) in {:.1}s.",
        summary.scenario_count,
        summary.relation_count,
        summary.elapsed.as_secs_f64()
    );
    let overview = std::fs::canonicalize(&summary.overview).unwrap_or_else(|_| summary.overview.clone());
    println!("Open the ontology: file://{}", overview.display());
}

/// Validation problems go to stderr one per line.
fn print_errors(err: &RasaecoError) {
    for message in err.messages() {
        eprintln!("{message}");
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn scenario_rendered(&self, identifier: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Rendering [{current}/{total}] {identifier}"));
    }

    fn done(&self, _summary: &RenderSummary) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn once_takes_the_scenarios_dir() {
        let cli = Cli::parse_from(["rasaeco", "once", "-s", "scenarios"]);
        match cli.command {
            Command::Once { scenarios_dir } => assert_eq!(scenarios_dir, PathBuf::from("scenarios")),
            _ => panic!("expected the once command"),
        }
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn only_scenario_writes_trigger_a_render() {
        use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

        let modify = || EventKind::Modify(ModifyKind::Any);
        assert!(is_scenario_change(&event(modify(), "s/a/scenario.md"), "md"));
        assert!(is_scenario_change(&event(EventKind::Create(CreateKind::File), "s/b.md"), "md"));
        assert!(is_scenario_change(&event(EventKind::Remove(RemoveKind::File), "s/b.md"), "md"));

        assert!(!is_scenario_change(&event(modify(), "s/a/scenario.html"), "md"));
        assert!(!is_scenario_change(&event(modify(), "s/a/scenario.volumetric.svg"), "md"));
        assert!(!is_scenario_change(&event(EventKind::Access(AccessKind::Any), "s/a.md"), "md"));
        assert!(!is_scenario_change(&Event::new(modify()), "md"));
    }

    #[test]
    fn global_flags_after_the_subcommand() {
        let cli = Cli::parse_from([
            "rasaeco",
            "continuously",
            "--scenarios-dir",
            "s",
            "-vv",
            "--log-format",
            "json",
            "--config",
            "r.toml",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("r.toml")));
        assert!(matches!(cli.command, Command::Continuously { .. }));
    }
}
