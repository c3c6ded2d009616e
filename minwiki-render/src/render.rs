//! Page and index rendering over a resolved corpus.

use crate::templates::{BacklinkEntry, IndexTemplate, PostEntry, PostTemplate};
use askama::Template;
use minwiki_core::{Config, Corpus, Diagnostic, Document, ErrorKind, LinkResolver, MarkdownProcessor};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Relative path of the index page
pub const INDEX_PATH: &str = "index.html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render {name} for {}: {source}", .path.display())]
    Template {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: askama::Error,
    },

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl RenderError {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            RenderError::Template { name, path, source } => Diagnostic {
                path: path.clone(),
                kind: ErrorKind::TemplateError,
                message: format!("{}: {}", name, source),
            },
            RenderError::OutputWrite { path, source } => Diagnostic {
                path: PathBuf::from(path),
                kind: ErrorKind::OutputWriteError,
                message: source.to_string(),
            },
        }
    }
}

/// Destination for rendered output, addressed by relative path
pub trait OutputSink {
    /// Write `contents` at `rel_path`, creating intermediate locations
    fn write(&mut self, rel_path: &str, contents: &str) -> io::Result<()>;
}

/// Writes output below a root directory on disk
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for DirSink {
    fn write(&mut self, rel_path: &str, contents: &str) -> io::Result<()> {
        let path = self.root.join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)
    }
}

/// Keeps output in memory, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    files: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rel_path: &str) -> Option<&str> {
        self.files.get(rel_path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, rel_path: &str, contents: &str) -> io::Result<()> {
        self.files.insert(rel_path.to_string(), contents.to_string());
        Ok(())
    }
}

/// What a render pass produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub dead_links: usize,
}

/// Render every document page and the index into `sink`
///
/// Dead wikilinks render as placeholders and are counted, never fatal. The
/// first template or write failure aborts the pass.
pub fn render(
    corpus: &Corpus,
    config: &Config,
    sink: &mut dyn OutputSink,
) -> Result<RenderSummary, RenderError> {
    let base_url = config.normalized_base_url();
    let processor =
        MarkdownProcessor::new().with_unresolved_class(config.unresolved_link_class.as_str());
    let resolver = corpus.link_resolver(&base_url);

    let mut pages = 0;
    for doc in corpus.documents() {
        let html = render_page(doc, corpus, config, &processor, &resolver)?;
        write_output(sink, &doc.output_rel_path(), &html)?;
        tracing::debug!("Rendered {}", doc.output_rel_path());
        pages += 1;
    }

    let index = render_index(corpus, config)?;
    write_output(sink, INDEX_PATH, &index)?;

    let summary = RenderSummary {
        pages,
        dead_links: corpus.dead_links().len(),
    };
    tracing::info!(
        "Rendered {} pages and index ({} dead links)",
        summary.pages,
        summary.dead_links
    );

    Ok(summary)
}

/// Render one document page
pub fn render_page(
    doc: &Document,
    corpus: &Corpus,
    config: &Config,
    processor: &MarkdownProcessor,
    resolver: &dyn LinkResolver,
) -> Result<String, RenderError> {
    let base_url = config.normalized_base_url();

    let backlinks = corpus
        .backlinks(&doc.slug)
        .into_iter()
        .map(|source| BacklinkEntry {
            url: source.url_with_base(&base_url),
            title: source.title.clone(),
        })
        .collect();

    let template = PostTemplate {
        title: doc.title.clone(),
        description: doc.description.clone(),
        date: doc.display_date(),
        datetime: machine_date(doc),
        content: processor.convert(&doc.body_raw, resolver),
        backlinks,
        site_title: config.site.title.clone(),
        site_author: config.site.author.clone(),
        base_url,
    };

    template.render().map_err(|source| RenderError::Template {
        name: "post.html",
        path: doc.source_path.clone(),
        source,
    })
}

/// Render the index page listing every document newest first
pub fn render_index(corpus: &Corpus, config: &Config) -> Result<String, RenderError> {
    let base_url = config.normalized_base_url();

    let posts = corpus
        .sorted_by_date()
        .into_iter()
        .map(|doc| PostEntry {
            url: doc.url_with_base(&base_url),
            title: doc.title.clone(),
            date: doc.display_date(),
            datetime: machine_date(doc),
            description: doc.description.clone(),
        })
        .collect();

    let template = IndexTemplate {
        site_title: config.site.title.clone(),
        site_description: config.site.description.clone(),
        site_author: config.site.author.clone(),
        base_url,
        posts,
    };

    template.render().map_err(|source| RenderError::Template {
        name: "index.html",
        path: PathBuf::from(INDEX_PATH),
        source,
    })
}

fn machine_date(doc: &Document) -> String {
    doc.date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn write_output(sink: &mut dyn OutputSink, rel_path: &str, contents: &str) -> Result<(), RenderError> {
    sink.write(rel_path, contents)
        .map_err(|source| RenderError::OutputWrite {
            path: rel_path.to_string(),
            source,
        })
}
