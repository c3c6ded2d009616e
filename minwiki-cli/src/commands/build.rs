//! Build command implementation.

use super::{load_config, print_diagnostics};
use anyhow::{bail, Context, Result};
use minwiki_core::{discover_documents, BuildError, Config, Corpus, STATIC_DIR};
use minwiki_render::{DirSink, RenderSummary};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Build the static site described by the config at `config_path`
pub fn build_site(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    build_site_with_config(&config).map(|_| ())
}

/// Load, resolve and render the site, replacing the output directory
///
/// The corpus is resolved before anything on disk is touched, so invalid
/// input leaves a previous build in place.
pub fn build_site_with_config(config: &Config) -> Result<RenderSummary> {
    tracing::info!("Building site: {}", config.site.title);

    let corpus = resolve_corpus(config)?;

    let output_dir = config.output_dir();
    let static_dir = config.static_dir();
    ensure_safe_output(&output_dir, &[config.content_dir().as_path(), static_dir.as_path()])?;

    if output_dir.exists() {
        fs::remove_dir_all(&output_dir)
            .with_context(|| format!("Failed to clear output directory {:?}", output_dir))?;
    }
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    if static_dir.is_dir() {
        copy_dir(&static_dir, &output_dir.join(STATIC_DIR))?;
    } else {
        tracing::debug!("No static directory at {:?}", static_dir);
    }

    let mut sink = DirSink::new(&output_dir);
    let summary = match minwiki_render::render(&corpus, config, &mut sink) {
        Ok(summary) => summary,
        Err(err) => {
            print_diagnostics(&[err.diagnostic()]);
            return Err(err).context("Failed to render site");
        }
    };

    for dead in corpus.dead_links() {
        tracing::warn!("Unresolved wikilink in {}: [[{}]]", dead.source_slug, dead.title);
    }

    tracing::info!(
        "Site built: {} pages written to {:?}",
        summary.pages,
        output_dir
    );

    Ok(summary)
}

/// Discover and resolve the corpus, printing diagnostics on failure
pub fn resolve_corpus(config: &Config) -> Result<Corpus> {
    let content_dir = config.content_dir();
    tracing::info!("Loading documents from {:?}", content_dir);

    discover_documents(&content_dir, &config.ignore_regexes())
        .and_then(|paths| Corpus::resolve(&paths))
        .or_else(fail_with_diagnostics)
}

fn fail_with_diagnostics(err: BuildError) -> Result<Corpus> {
    print_diagnostics(&err.diagnostics());
    Err(err).context("Failed to resolve documents")
}

/// Refuse to wipe an output directory that holds the site's own inputs
fn ensure_safe_output(output_dir: &Path, inputs: &[&Path]) -> Result<()> {
    if !output_dir.exists() {
        return Ok(());
    }

    let output = output_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve output directory {:?}", output_dir))?;

    for input in inputs.iter().filter(|p| p.exists()) {
        let input = input
            .canonicalize()
            .with_context(|| format!("Failed to resolve {:?}", input))?;
        if input.starts_with(&output) {
            bail!(
                "Refusing to clear output directory {:?}: it contains input {:?}",
                output_dir,
                input
            );
        }
    }

    Ok(())
}

/// Copy a directory tree, creating directories as needed
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {:?}", src))?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory {:?}", target))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
        }
    }

    tracing::debug!("Copied static assets from {:?}", src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_safe_output_rejects_nested_input() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();

        assert!(ensure_safe_output(dir.path(), &[content.as_path()]).is_err());
        assert!(ensure_safe_output(&dir.path().join("missing"), &[content.as_path()]).is_ok());
    }

    #[test]
    fn test_ensure_safe_output_allows_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        let output = dir.path().join("output");
        fs::create_dir_all(&content).unwrap();
        fs::create_dir_all(&output).unwrap();

        assert!(ensure_safe_output(&output, &[content.as_path()]).is_ok());
    }

    #[test]
    fn test_copy_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("static");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::write(src.join("css/style.css"), "body {}").unwrap();
        fs::write(src.join("logo.txt"), "logo").unwrap();

        let dst = dir.path().join("out/static");
        copy_dir(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("css/style.css")).unwrap(), "body {}");
        assert_eq!(fs::read_to_string(dst.join("logo.txt")).unwrap(), "logo");
    }
}
