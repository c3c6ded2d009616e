//! CLI command implementations.

pub mod build;
pub mod check;

pub use build::build_site;
pub use check::check_site;

use anyhow::{Context, Result};
use minwiki_core::{Config, Diagnostic};
use std::path::Path;

/// Load the config at `path`, or defaults when the file does not exist
pub fn load_config(path: &Path) -> Result<Config> {
    tracing::info!("Loading config from {:?}", path);
    Config::load_or_default(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))
}

/// Print one `error[kind] path: message` line per diagnostic
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}", diag);
    }
}
