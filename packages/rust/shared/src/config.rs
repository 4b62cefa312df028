//! Application configuration for rasaeco.
//!
//! Config is looked up, in order, at an explicit path, at
//! `<scenarios_dir>/rasaeco.toml`, and at `~/.rasaeco/rasaeco.toml`.
//! Missing files fall back to the built-in defaults field by field.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RasaecoError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "rasaeco.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".rasaeco";

// ---------------------------------------------------------------------------
// Config structs (matching rasaeco.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Rendering artifacts and scenario discovery.
    #[serde(default)]
    pub render: RenderConfig,

    /// Continuous re-rendering.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Extension (without the dot) of the scenario documents.
    #[serde(default = "default_scenario_extension")]
    pub scenario_extension: String,

    /// Extension (without the dot) of the rendered sibling document.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// File name of the ontology overview, written to the scenarios root.
    #[serde(default = "default_ontology_file")]
    pub ontology_file: String,

    /// File name of the region visualization, written next to each scenario.
    #[serde(default = "default_volumetric_file")]
    pub volumetric_file: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scenario_extension: default_scenario_extension(),
            output_extension: default_output_extension(),
            ontology_file: default_ontology_file(),
            volumetric_file: default_volumetric_file(),
        }
    }
}

fn default_scenario_extension() -> String {
    "md".into()
}
fn default_output_extension() -> String {
    "html".into()
}
fn default_ontology_file() -> String {
    "ontology.html".into()
}
fn default_volumetric_file() -> String {
    "volumetric.svg".into()
}

/// `[watch]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after a scenario change before re-rendering, in
    /// milliseconds. Bursts of changes within it cause a single render.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
        }
    }
}

fn default_debounce() -> u64 {
    300
}

impl AppConfig {
    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        let render = &self.render;
        for (field, value) in [
            ("render.scenario_extension", &render.scenario_extension),
            ("render.output_extension", &render.output_extension),
            ("render.ontology_file", &render.ontology_file),
            ("render.volumetric_file", &render.volumetric_file),
        ] {
            if value.is_empty() {
                return Err(RasaecoError::config(format!("{field} must not be empty")));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(RasaecoError::config(format!(
                    "{field} must be a bare file name, got {value:?}"
                )));
            }
        }

        if render.scenario_extension == render.output_extension {
            return Err(RasaecoError::config(
                "render.output_extension must differ from render.scenario_extension",
            ));
        }

        if self.watch.debounce_ms == 0 {
            return Err(RasaecoError::config(
                "watch.debounce_ms must be positive",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.rasaeco/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RasaecoError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.rasaeco/rasaeco.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the configuration for a run over `scenarios_dir`.
///
/// An explicit path must exist. Otherwise the first existing file of
/// `<scenarios_dir>/rasaeco.toml` and the user config file is used, and the
/// defaults if there is none.
pub fn load_config(explicit: Option<&Path>, scenarios_dir: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let mut candidates = Vec::new();
    if let Some(dir) = scenarios_dir {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(path) = config_file_path() {
        candidates.push(path);
    }

    for path in candidates {
        if path.is_file() {
            return load_config_from(&path);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RasaecoError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        RasaecoError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;

    tracing::debug!(?path, "loaded config");
    Ok(config)
}

/// Create the user config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RasaecoError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| RasaecoError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RasaecoError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("ontology_file"));
        assert!(toml_str.contains("debounce_ms"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed, config);
        assert_eq!(parsed.render.volumetric_file, "volumetric.svg");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[render]
ontology_file = "index.html"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.render.ontology_file, "index.html");
        assert_eq!(config.render.scenario_extension, "md");
        assert_eq!(config.watch.debounce_ms, 300);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let toml_str = "[watch]\npolling = 3\n";
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn validation_rejects_paths_and_zero_debounce() {
        let mut config = AppConfig::default();
        config.render.ontology_file = "out/ontology.html".into();
        assert!(config.validate().unwrap_err().to_string().contains("bare file name"));

        let mut config = AppConfig::default();
        config.watch.debounce_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.output_extension = "md".into();
        assert!(config.validate().is_err());

        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn scenarios_dir_config_wins_over_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[render]\nvolumetric_file = \"region.svg\"\n",
        )
        .expect("write config");

        let config = load_config(None, Some(dir.path())).expect("load");
        assert_eq!(config.render.volumetric_file, "region.svg");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_config(Some(&dir.path().join("nope.toml")), None);
        assert!(matches!(result, Err(RasaecoError::Io { .. })));
    }
}
