//! # minwiki-core
//!
//! Core library for the minwiki static site generator.
//!
//! This crate loads markdown documents with YAML front matter, extracts
//! `[[wiki-link]]` references, resolves the corpus (slugs, backlinks,
//! duplicate detection) and turns document bodies into HTML.

pub mod config;
pub mod corpus;
pub mod frontmatter;
pub mod links;
pub mod loader;
pub mod markdown;
pub mod models;
pub mod slug;

/// Output subdirectory holding one page per document
pub const POSTS_DIR: &str = "posts";

/// Output subdirectory receiving a copy of the static assets
pub const STATIC_DIR: &str = "static";

pub use config::{Config, ConfigError};
pub use corpus::{discover_documents, BuildError, Corpus, DeadLink};
pub use links::extract_links;
pub use loader::{load_document, parse_document, ParseError};
pub use markdown::{LinkResolver, MarkdownProcessor};
pub use models::{Diagnostic, Document, ErrorKind, Frontmatter};
pub use slug::slugify;
