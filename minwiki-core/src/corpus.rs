//! Corpus resolution - loads every document, assigns slugs and builds backlinks.

use crate::loader::{load_document, ParseError};
use crate::markdown::LinkResolver;
use crate::models::{Diagnostic, Document, ErrorKind};
use crate::slug::{fallback_slug, slugify};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to list content directory {}: {source}", .path.display())]
    ContentDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{} invalid document(s)", .0.len())]
    InvalidDocuments(Vec<ParseError>),

    #[error("Duplicate slug `{slug}` shared by {}", display_paths(.paths))]
    DuplicateSlug { slug: String, paths: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl BuildError {
    /// One diagnostic per offending source file
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            BuildError::ContentDir { path, source } => vec![Diagnostic {
                path: path.clone(),
                kind: ErrorKind::ReadError,
                message: source.to_string(),
            }],
            BuildError::InvalidDocuments(errors) => {
                errors.iter().map(ParseError::diagnostic).collect()
            }
            BuildError::DuplicateSlug { slug, paths } => paths
                .iter()
                .map(|path| Diagnostic {
                    path: path.clone(),
                    kind: ErrorKind::DuplicateSlug,
                    message: format!(
                        "slug `{}` is shared by {} documents: {}",
                        slug,
                        paths.len(),
                        display_paths(paths)
                    ),
                })
                .collect(),
        }
    }
}

/// A wikilink whose title no document carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadLink {
    pub source_slug: String,
    pub title: String,
}

/// The fully loaded and cross-resolved document set for one build
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: BTreeMap<String, Document>,
    load_order: Vec<String>,
    titles: HashMap<String, String>,
    backlinks: BTreeMap<String, Vec<String>>,
}

/// Load and resolve the documents at `paths`
///
/// Every document is loaded before any error is reported, so a single call
/// surfaces all invalid files at once.
pub fn resolve(paths: &[PathBuf]) -> Result<Corpus, BuildError> {
    Corpus::resolve(paths)
}

impl Corpus {
    /// Load and resolve the documents at `paths`, in the given order
    pub fn resolve(paths: &[PathBuf]) -> Result<Self, BuildError> {
        let mut documents = Vec::with_capacity(paths.len());
        let mut errors = Vec::new();

        for path in paths {
            match load_document(path) {
                Ok(doc) => documents.push(doc),
                Err(err) => {
                    tracing::error!("Failed to parse {:?}: {}", path, err.kind);
                    errors.push(err);
                }
            }
        }

        if !errors.is_empty() {
            return Err(BuildError::InvalidDocuments(errors));
        }

        Self::from_documents(documents)
    }

    /// Assign slugs and compute backlinks for already-loaded documents
    ///
    /// The order of `documents` is the load order: it decides fallback slugs
    /// and the order of every backlink list.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, BuildError> {
        let slugs = assign_slugs(&documents);
        let mut slugged = Vec::with_capacity(documents.len());
        let mut by_slug: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut titles: HashMap<String, String> = HashMap::new();
        let mut first_collision: Option<String> = None;

        for (mut doc, slug) in documents.into_iter().zip(slugs) {
            // Identical titles are indistinguishable link targets, even when
            // positional fallback slugs would keep their addresses apart
            let group = match titles.get(&doc.title) {
                Some(existing) => existing.clone(),
                None => {
                    titles.insert(doc.title.clone(), slug.clone());
                    slug.clone()
                }
            };

            let paths = by_slug.entry(group.clone()).or_default();
            paths.push(doc.source_path.clone());
            if paths.len() > 1 && first_collision.is_none() {
                first_collision = Some(group);
            }

            doc.slug = slug;
            slugged.push(doc);
        }

        if let Some(slug) = first_collision {
            let paths = by_slug.remove(&slug).unwrap_or_default();
            tracing::error!("Duplicate slug: {}", slug);
            return Err(BuildError::DuplicateSlug { slug, paths });
        }

        let load_order: Vec<String> = slugged.iter().map(|d| d.slug.clone()).collect();
        let backlinks = compute_backlinks(&slugged, &titles);
        let documents = slugged
            .into_iter()
            .map(|doc| (doc.slug.clone(), doc))
            .collect();

        let corpus = Self {
            documents,
            load_order,
            titles,
            backlinks,
        };

        tracing::info!(
            "Resolved {} documents with {} backlinks",
            corpus.len(),
            corpus.link_count()
        );

        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Find a document by slug
    pub fn get(&self, slug: &str) -> Option<&Document> {
        self.documents.get(slug)
    }

    /// Find a document by its exact (case-sensitive) title
    pub fn find_by_title(&self, title: &str) -> Option<&Document> {
        self.titles.get(title).and_then(|slug| self.documents.get(slug))
    }

    /// Documents in load order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.load_order
            .iter()
            .filter_map(|slug| self.documents.get(slug))
    }

    /// Slugs of documents linking to `slug`, in load order
    pub fn backlink_slugs(&self, slug: &str) -> &[String] {
        self.backlinks.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents linking to `slug`, in load order
    pub fn backlinks(&self, slug: &str) -> Vec<&Document> {
        self.backlink_slugs(slug)
            .iter()
            .filter_map(|s| self.documents.get(s))
            .collect()
    }

    /// Number of distinct (source, target) links between documents
    pub fn link_count(&self) -> usize {
        self.backlinks.values().map(Vec::len).sum()
    }

    /// Documents newest first; equal dates by title, then slug
    pub fn sorted_by_date(&self) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.documents.values().collect();
        docs.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.slug.cmp(&b.slug))
        });
        docs
    }

    /// Wikilinks to unknown titles, once per (source, title), in load order
    pub fn dead_links(&self) -> Vec<DeadLink> {
        let mut dead = Vec::new();
        for doc in self.documents() {
            let mut seen = HashSet::new();
            for title in &doc.outbound_links {
                if !self.titles.contains_key(title) && seen.insert(title.as_str()) {
                    dead.push(DeadLink {
                        source_slug: doc.slug.clone(),
                        title: title.clone(),
                    });
                }
            }
        }
        dead
    }

    /// Resolver mapping titles to document URLs under `base_url`
    pub fn link_resolver<'a>(&'a self, base_url: &str) -> impl LinkResolver + 'a {
        let base_url = crate::config::normalize_base_url(base_url);
        move |title: &str| -> Option<String> {
            self.find_by_title(title)
                .map(|doc| doc.url_with_base(&base_url))
        }
    }
}

/// Slugs for `documents` in load order
///
/// Titles that normalize to nothing get `untitled-<n>` (1-based load
/// position), suffixed with `-2`, `-3`, ... when another document already
/// owns that slug.
fn assign_slugs(documents: &[Document]) -> Vec<String> {
    let natural: Vec<String> = documents.iter().map(|doc| slugify(&doc.title)).collect();
    let mut taken: HashSet<String> = natural
        .iter()
        .filter(|slug| !slug.is_empty())
        .cloned()
        .collect();

    natural
        .into_iter()
        .zip(documents)
        .enumerate()
        .map(|(idx, (slug, doc))| {
            if !slug.is_empty() {
                return slug;
            }

            let base = fallback_slug(idx + 1);
            let mut candidate = base.clone();
            let mut n = 1;
            while taken.contains(&candidate) {
                n += 1;
                candidate = format!("{}-{}", base, n);
            }
            taken.insert(candidate.clone());

            tracing::warn!(
                "Title {:?} in {:?} has no URL-safe characters; using slug {}",
                doc.title,
                doc.source_path,
                candidate
            );
            candidate
        })
        .collect()
}

fn compute_backlinks(
    documents: &[Document],
    titles: &HashMap<String, String>,
) -> BTreeMap<String, Vec<String>> {
    let mut backlinks: BTreeMap<String, Vec<String>> = documents
        .iter()
        .map(|doc| (doc.slug.clone(), Vec::new()))
        .collect();

    for source in documents {
        let mut linked = HashSet::new();
        for title in &source.outbound_links {
            let Some(target) = titles.get(title) else {
                continue;
            };
            if *target == source.slug || !linked.insert(target.as_str()) {
                continue;
            }
            if let Some(list) = backlinks.get_mut(target) {
                list.push(source.slug.clone());
            }
        }
    }

    backlinks
}

/// List markdown documents under `content_dir`, sorted by path
///
/// Paths whose content-relative form matches one of `ignores` are skipped.
pub fn discover_documents(content_dir: &Path, ignores: &[Regex]) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = entry.map_err(|source| BuildError::ContentDir {
            path: content_dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(content_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if ignores.iter().any(|re| re.is_match(&rel)) {
            tracing::debug!("Ignoring {} due to ignore_patterns", rel);
            continue;
        }

        files.push(entry.path().to_path_buf());
    }

    tracing::info!("Found {} markdown files", files.len());

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn doc(title: &str, date: &str, body: &str) -> Document {
        Document {
            title: title.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            slug: String::new(),
            description: None,
            body_raw: body.to_string(),
            outbound_links: crate::links::extract_links(body),
            source_path: PathBuf::from(format!("content/{}.md", slugify(title))),
        }
    }

    fn titles(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|d| d.title.clone()).collect()
    }

    #[test]
    fn test_slugs_assigned() {
        let corpus = Corpus::from_documents(vec![doc("Hello World", "2024-01-01", "")]).unwrap();
        assert_eq!(corpus.get("hello-world").unwrap().title, "Hello World");
    }

    #[test]
    fn test_backlink_recorded_once() {
        let corpus = Corpus::from_documents(vec![
            doc("A", "2024-01-01", "[[B]] and again [[B]] and [[B|bee]]"),
            doc("B", "2024-01-02", "no links"),
        ])
        .unwrap();

        assert_eq!(corpus.backlink_slugs("b"), ["a"]);
        assert!(corpus.backlink_slugs("a").is_empty());
        assert_eq!(corpus.link_count(), 1);
    }

    #[test]
    fn test_self_reference_is_not_a_backlink() {
        let corpus = Corpus::from_documents(vec![
            doc("Loop", "2024-01-01", "I am [[Loop]]"),
            doc("Other", "2024-01-01", "see [[Loop]]"),
        ])
        .unwrap();

        assert_eq!(corpus.backlink_slugs("loop"), ["other"]);
        // the source link list itself is untouched
        assert_eq!(corpus.get("loop").unwrap().outbound_links, vec!["Loop"]);
    }

    #[test]
    fn test_backlinks_follow_load_order() {
        let corpus = Corpus::from_documents(vec![
            doc("Zed", "2024-01-01", "[[Target]]"),
            doc("Alpha", "2024-01-01", "[[Target]]"),
            doc("Target", "2024-01-01", ""),
            doc("Mid", "2024-01-01", "[[Target]]"),
        ])
        .unwrap();

        assert_eq!(corpus.backlink_slugs("target"), ["zed", "alpha", "mid"]);
        assert_eq!(
            titles(&corpus.backlinks("target")),
            vec!["Zed", "Alpha", "Mid"]
        );
    }

    #[test]
    fn test_every_document_has_backlink_entry() {
        let corpus = Corpus::from_documents(vec![
            doc("One", "2024-01-01", "[[Missing]]"),
            doc("Two", "2024-01-01", ""),
        ])
        .unwrap();

        for d in corpus.documents() {
            assert!(corpus.backlinks.contains_key(&d.slug));
        }
        assert_eq!(corpus.backlinks.len(), corpus.len());
    }

    #[test]
    fn test_title_matching_is_case_sensitive() {
        let corpus = Corpus::from_documents(vec![
            doc("Rust", "2024-01-01", ""),
            doc("Notes", "2024-01-01", "[[rust]] [[Rust ]] [[Rust]]"),
        ])
        .unwrap();

        // only the byte-identical `[[Rust]]` resolves
        assert_eq!(corpus.backlink_slugs("rust"), ["notes"]);
        assert_eq!(
            corpus.dead_links(),
            vec![
                DeadLink {
                    source_slug: "notes".into(),
                    title: "rust".into()
                },
                DeadLink {
                    source_slug: "notes".into(),
                    title: "Rust ".into()
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_slug_from_diacritics() {
        let err = Corpus::from_documents(vec![
            doc("Café", "2024-01-01", ""),
            doc("Other", "2024-01-01", ""),
            doc("cafe", "2024-01-02", ""),
        ])
        .unwrap_err();

        match err {
            BuildError::DuplicateSlug { ref slug, ref paths } => {
                assert_eq!(slug, "cafe");
                assert_eq!(paths.len(), 2);
            }
            other => panic!("expected DuplicateSlug, got {:?}", other),
        }
        let diags = err.diagnostics();
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind == ErrorKind::DuplicateSlug));
    }

    #[test]
    fn test_fallback_slug_for_unrepresentable_title() {
        let corpus = Corpus::from_documents(vec![
            doc("First", "2024-01-01", "[[日本語]]"),
            doc("日本語", "2024-01-01", ""),
        ])
        .unwrap();

        let target = corpus.find_by_title("日本語").unwrap();
        assert_eq!(target.slug, "untitled-2");
        assert_eq!(corpus.backlink_slugs("untitled-2"), ["first"]);
    }

    #[test]
    fn test_fallback_slug_avoids_natural_slugs() {
        let corpus = Corpus::from_documents(vec![
            doc("日本語", "2024-01-01", ""),
            doc("Untitled 1", "2024-01-01", ""),
            doc("Untitled 1 2", "2024-01-01", "[[日本語]]"),
        ])
        .unwrap();

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.get("untitled-1").unwrap().title, "Untitled 1");
        assert_eq!(corpus.get("untitled-1-2").unwrap().title, "Untitled 1 2");
        let fallback = corpus.find_by_title("日本語").unwrap();
        assert_eq!(fallback.slug, "untitled-1-3");
        assert_eq!(corpus.backlink_slugs("untitled-1-3"), ["untitled-1-2"]);
    }

    #[test]
    fn test_identical_unrepresentable_titles_collide() {
        let err = Corpus::from_documents(vec![
            doc("日本語", "2024-01-01", ""),
            doc("日本語", "2024-01-02", ""),
        ])
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateSlug { ref slug, .. } if slug == "untitled-1"));
    }

    #[test]
    fn test_sorted_by_date_descending() {
        let corpus = Corpus::from_documents(vec![
            doc("A", "2020-01-01", ""),
            doc("B", "2020-06-01", ""),
            doc("C", "2020-03-01", ""),
        ])
        .unwrap();

        assert_eq!(titles(&corpus.sorted_by_date()), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_sorted_ties_break_on_title() {
        let corpus = Corpus::from_documents(vec![
            doc("Pear", "2021-05-05", ""),
            doc("Apple", "2021-05-05", ""),
            doc("Older", "2021-01-01", ""),
            doc("Mango", "2021-05-05", ""),
        ])
        .unwrap();

        assert_eq!(
            titles(&corpus.sorted_by_date()),
            vec!["Apple", "Mango", "Pear", "Older"]
        );
    }

    #[test]
    fn test_link_resolver() {
        let corpus = Corpus::from_documents(vec![doc("Known Page", "2024-01-01", "")]).unwrap();
        let resolver = corpus.link_resolver("/site");

        assert_eq!(
            resolver.resolve("Known Page"),
            Some("/site/posts/known-page.html".to_string())
        );
        assert_eq!(resolver.resolve("known page"), None);
    }

    #[test]
    fn test_resolve_collects_all_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        let no_title = dir.path().join("no-title.md");
        let no_date = dir.path().join("no-date.md");
        std::fs::write(&good, "---\ntitle: Good\ndate: 2024-01-01\n---\nok").unwrap();
        std::fs::write(&no_title, "---\ndate: 2024-01-01\n---\n").unwrap();
        std::fs::write(&no_date, "---\ntitle: Undated\n---\n").unwrap();

        let err = resolve(&[good, no_title.clone(), no_date.clone()]).unwrap_err();
        let diags = err.diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].path, no_title);
        assert_eq!(diags[1].path, no_date);
        assert!(diags.iter().all(|d| d.kind == ErrorKind::MissingField));
    }

    #[test]
    fn test_discover_documents_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("drafts")).unwrap();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        for name in ["b.md", "a.md", "notes.txt", "nested/c.md", "drafts/d.md"] {
            std::fs::write(root.join(name), "x").unwrap();
        }

        let ignores = vec![Regex::new("^drafts/").unwrap()];
        let files = discover_documents(root, &ignores).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(rel, vec!["a.md", "b.md", "nested/c.md"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let err = discover_documents(Path::new("/no/such/content"), &[]).unwrap_err();
        assert!(matches!(err, BuildError::ContentDir { .. }));
        assert_eq!(err.diagnostics()[0].kind, ErrorKind::ReadError);
    }
}
