//! Resolve the corpus without writing output and report its health.

use super::{load_config, print_diagnostics};
use anyhow::{bail, Result};
use minwiki_core::{discover_documents, Corpus, DeadLink, Diagnostic};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CheckSummary<'a> {
    ok: bool,
    documents: usize,
    links: usize,
    dead_links: &'a [DeadLink],
    diagnostics: &'a [Diagnostic],
}

/// Load and resolve every document, print a summary and write nothing
///
/// Fails (non-zero exit) exactly when a build would fail to resolve.
pub fn check_site(config_path: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let resolved = discover_documents(&config.content_dir(), &config.ignore_regexes())
        .and_then(|paths| Corpus::resolve(&paths));

    let (corpus, diagnostics) = match resolved {
        Ok(corpus) => (Some(corpus), Vec::new()),
        Err(err) => (None, err.diagnostics()),
    };
    let dead_links = corpus.as_ref().map(Corpus::dead_links).unwrap_or_default();

    let summary = CheckSummary {
        ok: corpus.is_some(),
        documents: corpus.as_ref().map_or(0, Corpus::len),
        links: corpus.as_ref().map_or(0, Corpus::link_count),
        dead_links: &dead_links,
        diagnostics: &diagnostics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_diagnostics(&diagnostics);
        if summary.ok {
            println!(
                "Check complete: {} documents, {} links, {} dead links",
                summary.documents,
                summary.links,
                dead_links.len()
            );
            for dead in &dead_links {
                println!("- {}: [[{}]]", dead.source_slug, dead.title);
            }
        }
    }

    if !summary.ok {
        bail!("Check failed with {} error(s)", diagnostics.len());
    }

    Ok(())
}
