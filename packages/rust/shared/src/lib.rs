//! Shared types, error model, and configuration for rasaeco.
//!
//! This crate is the foundation depended on by all other rasaeco crates.
//! It provides:
//! - [`RasaecoError`] - the unified error type
//! - [`Diagnostic`] / [`Issue`] - accumulated validation problems
//! - Vocabulary types ([`Axis`], [`TagKind`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RenderConfig, WatchConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use diagnostic::{Diagnostic, Diagnostics, Issue};
pub use error::{RasaecoError, Result};
pub use types::{Axis, Bound, META_TAG, TagKind};
